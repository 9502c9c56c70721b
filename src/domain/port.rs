// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{
    Guest, GuestProfile, InventoryDay, NewReservation, Reservation, ReservationId,
    ReservationStatus, RoomType, RoomTypeId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// 行ロックの待機時間が上限を超えた
    #[error("Lock wait timed out: {0}")]
    LockTimeout(String),
    /// リビジョン番号の不一致（ロックを経由しない更新の競合）
    #[error("Version conflict: room_type_id={room_type_id}, date={date}")]
    VersionConflict {
        room_type_id: RoomTypeId,
        date: NaiveDate,
    },
}

/// 時計トレイト
/// 本日の日付に依存する検証で使う。テストでは固定時刻の実装に差し替える
pub trait Clock: Send + Sync {
    /// 現在時刻
    fn now(&self) -> DateTime<Utc>;

    /// 本日の日付（UTC）
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// 客室タイプリポジトリトレイト
#[async_trait]
pub trait RoomTypeRepository: Send + Sync {
    /// 客室タイプIDで客室タイプを検索する
    ///
    /// # Returns
    /// * `Ok(Some(RoomType))` - 見つかった
    /// * `Ok(None)` - 見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, id: RoomTypeId) -> Result<Option<RoomType>, RepositoryError>;
}

/// 予約リポジトリトレイト（読み取り専用）
/// 予約台帳への書き込みは `ReservationTransaction` 経由でのみ行う
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// 予約IDで予約を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Reservation))` - 予約が見つかった
    /// * `Ok(None)` - 予約が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError>;
}

/// 在庫リポジトリトレイト（ロックを取らない操作）
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// すべての日別在庫を取得する
    /// 在庫カウンターの初期化に使用する
    async fn find_all(&self) -> Result<Vec<InventoryDay>, RepositoryError>;

    /// 指定期間 `[start, end)` の日別在庫を日付の昇順で取得する（ロックなし）
    ///
    /// # Arguments
    /// * `room_type_id` - 客室タイプID
    /// * `start` - 開始日（含む）
    /// * `end` - 終了日（含まない）
    async fn find_by_room_type_and_range(
        &self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InventoryDay>, RepositoryError>;

    /// まだ存在しない日別在庫だけを作成する
    /// 既存の日付は変更しない
    ///
    /// # Returns
    /// * `Ok(Vec<InventoryDay>)` - 新規に作成された日別在庫
    /// * `Err(RepositoryError)` - 作成失敗
    async fn insert_missing(
        &self,
        days: Vec<InventoryDay>,
    ) -> Result<Vec<InventoryDay>, RepositoryError>;
}

/// 予約の作成と取消を一貫して行うための永続化ポート
/// 正となる在庫ストアと予約台帳は同じ整合性ドメインに属する
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// 新しいトランザクションを開始する
    async fn begin(&self) -> Result<Box<dyn ReservationTransaction>, RepositoryError>;
}

/// 在庫と予約台帳に対するトランザクション
///
/// コミットせずに破棄した場合はすべての変更がロールバックされ、
/// 保持している行ロックも解放される。
#[async_trait]
pub trait ReservationTransaction: Send {
    /// 期間 `[start, end)` の日別在庫を日付の昇順で排他ロックし、ロックしたまま返す
    ///
    /// すべての呼び出し元が同じ昇順でロックを取得することでデッドロックを防ぐ。
    /// 待機時間が設定上限を超えた場合は `RepositoryError::LockTimeout` を返す。
    /// 1つのトランザクションで呼び出すのは1回だけにすること。
    async fn lock_range(
        &mut self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InventoryDay>, RepositoryError>;

    /// 日別在庫の空室数を書き込む
    ///
    /// `day.version()` が現在のリビジョン番号と一致しない場合は
    /// `RepositoryError::VersionConflict` を返す。成功するとリビジョン番号が1増える。
    async fn save_inventory_day(&mut self, day: &InventoryDay) -> Result<(), RepositoryError>;

    /// メールアドレスをキーに宿泊者を登録または更新する
    async fn upsert_guest(&mut self, profile: &GuestProfile) -> Result<Guest, RepositoryError>;

    /// 予約を台帳に追加する
    async fn insert_reservation(
        &mut self,
        reservation: NewReservation,
    ) -> Result<Reservation, RepositoryError>;

    /// 予約ステータスを `from` から `to` へ遷移させる
    ///
    /// # Returns
    /// * `Ok(true)` - 遷移した
    /// * `Ok(false)` - 現在のステータスが `from` ではなかった
    /// * `Err(RepositoryError)` - 更新失敗
    async fn transition_status(
        &mut self,
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// トランザクションをコミットし、すべての行ロックを解放する
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
