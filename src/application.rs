// アプリケーション層
// ユースケースの調整とエラーの分類を担当

mod error;
pub mod service;

pub use error::ApplicationError;
