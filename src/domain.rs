// ドメイン層
// エンティティ、値オブジェクト、出力ポート、在庫カウンター

pub mod counter;
pub mod error;
pub mod model;
pub mod port;
