use crate::application::service::map_repository_error;
use crate::application::ApplicationError;
use crate::domain::counter::{CounterSnapshot, InventoryCounter};
use crate::domain::port::InventoryRepository;
use std::sync::Arc;
use uuid::Uuid;

const COMPONENT: &str = "CounterInitializer";

/// 在庫ストアの全日別在庫から在庫カウンターを構築する
///
/// 起動時、リクエストの受け付けを開始する前に一度だけ実行する。
/// 静止状態（処理中の予約がない状態）であれば再実行してカウンターを
/// 在庫ストアに合わせ直すこともできる。
pub struct InventoryCounterInitializer {
    inventory_repository: Arc<dyn InventoryRepository>,
    counter: Arc<InventoryCounter>,
}

impl InventoryCounterInitializer {
    pub fn new(
        inventory_repository: Arc<dyn InventoryRepository>,
        counter: Arc<InventoryCounter>,
    ) -> Self {
        Self {
            inventory_repository,
            counter,
        }
    }

    /// カウンターを初期化し、カウンターに登録されたキーの数を返す
    pub async fn run(&self) -> Result<usize, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        let days = self
            .inventory_repository
            .find_all()
            .await
            .map_err(|e| map_repository_error(e, correlation_id, COMPONENT))?;

        self.counter
            .initialize(days.iter().map(CounterSnapshot::from));

        let entries = self.counter.len();
        tracing::info!(
            component = COMPONENT,
            %correlation_id,
            loaded = days.len(),
            entries,
            "inventory counter initialized"
        );
        Ok(entries)
    }
}
