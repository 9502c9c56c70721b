use crate::domain::model::{
    Guest, GuestId, GuestProfile, InventoryDay, NewReservation, Reservation, ReservationId,
    ReservationStatus, RoomType, RoomTypeId,
};
use crate::domain::port::{
    InventoryRepository, RepositoryError, ReservationRepository, ReservationStore,
    ReservationTransaction, RoomTypeRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio::time::{timeout_at, Instant};

type InventoryKey = (RoomTypeId, NaiveDate);

/// 日別在庫1行分
/// 行ロックとコミット済みの値を分けて持ち、ロックなしの読み取りを妨げない
struct InventorySlot {
    row_lock: Arc<tokio::sync::Mutex<()>>,
    committed: RwLock<InventoryDay>,
}

impl InventorySlot {
    fn new(day: InventoryDay) -> Arc<Self> {
        Arc::new(Self {
            row_lock: Arc::new(tokio::sync::Mutex::new(())),
            committed: RwLock::new(day),
        })
    }

    fn read(&self) -> InventoryDay {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&self, day: InventoryDay) {
        *self
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = day;
    }
}

struct Inner {
    lock_timeout: Duration,
    room_types: RwLock<HashMap<RoomTypeId, RoomType>>,
    guests: Mutex<HashMap<String, Guest>>,
    inventory: RwLock<BTreeMap<InventoryKey, Arc<InventorySlot>>>,
    reservations: Mutex<BTreeMap<ReservationId, Reservation>>,
    next_guest_id: AtomicI64,
    next_reservation_id: AtomicI64,
    transactions_started: AtomicUsize,
    fail_next_reservation_insert: AtomicBool,
}

impl Inner {
    fn slot(&self, key: InventoryKey) -> Option<Arc<InventorySlot>> {
        self.inventory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn reservations(&self) -> MutexGuard<'_, BTreeMap<ReservationId, Reservation>> {
        self.reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// プロセス内メモリ上の在庫ストアと予約台帳
///
/// MySQL実装と同じ契約を満たす。行ロックは日付の昇順に取得し、待機が
/// 上限を超えると `LockTimeout` を返す。在庫と予約の変更はコミット時に
/// まとめて反映され、コミットせずに破棄したトランザクションの変更は残らない。
/// 宿泊者の登録のみ即時に反映される。
#[derive(Clone)]
pub struct InMemoryReservationStore {
    inner: Arc<Inner>,
}

impl InMemoryReservationStore {
    /// 空のストアを作成
    ///
    /// # Arguments
    /// * `lock_timeout` - 在庫行ロックの待機上限
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                lock_timeout,
                room_types: RwLock::new(HashMap::new()),
                guests: Mutex::new(HashMap::new()),
                inventory: RwLock::new(BTreeMap::new()),
                reservations: Mutex::new(BTreeMap::new()),
                next_guest_id: AtomicI64::new(1),
                next_reservation_id: AtomicI64::new(1),
                transactions_started: AtomicUsize::new(0),
                fail_next_reservation_insert: AtomicBool::new(false),
            }),
        }
    }

    /// サンプルの客室タイプと `today` から90日分の在庫を持つストアを作成
    pub fn with_sample_data(lock_timeout: Duration, today: NaiveDate) -> Self {
        let store = Self::new(lock_timeout);
        let samples = [
            (1, 1, "スタンダードダブル", 2, 10),
            (2, 1, "スタンダードツイン", 2, 5),
            (3, 1, "スイート", 4, 3),
            (4, 2, "デラックスツイン", 3, 8),
        ];
        for (id, hotel_id, name, max_occupancy, quantity) in samples {
            let room_type_id = RoomTypeId::new(id);
            store.add_room_type(RoomType::new(
                room_type_id,
                hotel_id,
                name.to_string(),
                max_occupancy,
            ));
            for offset in 0..90 {
                if let Some(date) = today.checked_add_days(Days::new(offset)) {
                    store.add_inventory_day(InventoryDay::new(room_type_id, date, quantity));
                }
            }
        }
        store
    }

    pub fn add_room_type(&self, room_type: RoomType) {
        self.inner
            .room_types
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(room_type.id(), room_type);
    }

    /// 日別在庫を追加する（同じキーがあれば置き換える）
    pub fn add_inventory_day(&self, day: InventoryDay) {
        let key = (day.room_type_id(), day.date());
        let mut inventory = self
            .inner
            .inventory
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match inventory.get(&key) {
            Some(slot) => slot.write(day),
            None => {
                inventory.insert(key, InventorySlot::new(day));
            }
        }
    }

    /// ロックを経由せずに空室数を書き換え、リビジョン番号を1進める
    ///
    /// # Returns
    /// * `true` - 書き換えた
    /// * `false` - 行が存在しないか、総客室数を超えている
    pub fn set_available_quantity(
        &self,
        room_type_id: RoomTypeId,
        date: NaiveDate,
        available_quantity: u32,
    ) -> bool {
        let Some(slot) = self.inner.slot((room_type_id, date)) else {
            return false;
        };
        let current = slot.read();
        match InventoryDay::reconstruct(
            room_type_id,
            date,
            current.total_quantity(),
            available_quantity,
            current.version() + 1,
        ) {
            Ok(day) => {
                slot.write(day);
                true
            }
            Err(_) => false,
        }
    }

    /// コミット済みの空室数
    pub fn available_quantity(&self, room_type_id: RoomTypeId, date: NaiveDate) -> Option<u32> {
        self.inner
            .slot((room_type_id, date))
            .map(|slot| slot.read().available_quantity())
    }

    /// コミット済みの全予約（ID順）
    pub fn reservations(&self) -> Vec<Reservation> {
        self.inner.reservations().values().cloned().collect()
    }

    /// 開始されたトランザクションの数
    pub fn transactions_started(&self) -> usize {
        self.inner.transactions_started.load(Ordering::Acquire)
    }

    /// 次の予約台帳への追加を1回だけ失敗させる
    pub fn fail_next_reservation_insert(&self) {
        self.inner
            .fail_next_reservation_insert
            .store(true, Ordering::Release);
    }
}

#[async_trait]
impl RoomTypeRepository for InMemoryReservationStore {
    async fn find_by_id(&self, id: RoomTypeId) -> Result<Option<RoomType>, RepositoryError> {
        Ok(self
            .inner
            .room_types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationStore {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        Ok(self.inner.reservations().get(&id).cloned())
    }
}

#[async_trait]
impl InventoryRepository for InMemoryReservationStore {
    async fn find_all(&self) -> Result<Vec<InventoryDay>, RepositoryError> {
        let inventory = self
            .inner
            .inventory
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(inventory.values().map(|slot| slot.read()).collect())
    }

    async fn find_by_room_type_and_range(
        &self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InventoryDay>, RepositoryError> {
        if start >= end {
            return Ok(Vec::new());
        }
        let inventory = self
            .inner
            .inventory
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(inventory
            .range((room_type_id, start)..(room_type_id, end))
            .map(|(_, slot)| slot.read())
            .collect())
    }

    async fn insert_missing(
        &self,
        days: Vec<InventoryDay>,
    ) -> Result<Vec<InventoryDay>, RepositoryError> {
        let mut inventory = self
            .inner
            .inventory
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut created = Vec::new();
        for day in days {
            let key = (day.room_type_id(), day.date());
            if inventory.contains_key(&key) {
                continue;
            }
            inventory.insert(key, InventorySlot::new(day.clone()));
            created.push(day);
        }
        Ok(created)
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn begin(&self) -> Result<Box<dyn ReservationTransaction>, RepositoryError> {
        self.inner
            .transactions_started
            .fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(InMemoryReservationTransaction {
            inner: self.inner.clone(),
            held: BTreeMap::new(),
            staged_days: BTreeMap::new(),
            staged_reservations: Vec::new(),
            staged_transitions: HashMap::new(),
        }))
    }
}

struct StagedTransition {
    expected: ReservationStatus,
    to: ReservationStatus,
    updated_at: DateTime<Utc>,
}

/// メモリ上のトランザクション
/// 破棄すると保持している行ロックが解放され、未コミットの変更は捨てられる
pub struct InMemoryReservationTransaction {
    inner: Arc<Inner>,
    held: BTreeMap<InventoryKey, (Arc<InventorySlot>, OwnedMutexGuard<()>)>,
    staged_days: BTreeMap<InventoryKey, InventoryDay>,
    staged_reservations: Vec<Reservation>,
    staged_transitions: HashMap<ReservationId, StagedTransition>,
}

impl InMemoryReservationTransaction {
    fn current_day(&self, key: InventoryKey, slot: &InventorySlot) -> InventoryDay {
        self.staged_days
            .get(&key)
            .cloned()
            .unwrap_or_else(|| slot.read())
    }

    async fn acquire(
        &mut self,
        key: InventoryKey,
        slot: Arc<InventorySlot>,
        deadline: Instant,
    ) -> Result<(), RepositoryError> {
        if self.held.contains_key(&key) {
            return Ok(());
        }
        let guard = timeout_at(deadline, slot.row_lock.clone().lock_owned())
            .await
            .map_err(|_| {
                RepositoryError::LockTimeout(format!(
                    "在庫行のロック待機が上限を超えました: room_type_id={}, date={}",
                    key.0, key.1
                ))
            })?;
        self.held.insert(key, (slot, guard));
        Ok(())
    }
}

#[async_trait]
impl ReservationTransaction for InMemoryReservationTransaction {
    async fn lock_range(
        &mut self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InventoryDay>, RepositoryError> {
        if start >= end {
            return Ok(Vec::new());
        }
        let slots: Vec<(InventoryKey, Arc<InventorySlot>)> = self
            .inner
            .inventory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range((room_type_id, start)..(room_type_id, end))
            .map(|(key, slot)| (*key, slot.clone()))
            .collect();

        let deadline = Instant::now() + self.inner.lock_timeout;
        let mut days = Vec::with_capacity(slots.len());
        for (key, slot) in slots {
            self.acquire(key, slot.clone(), deadline).await?;
            days.push(self.current_day(key, &slot));
        }
        Ok(days)
    }

    async fn save_inventory_day(&mut self, day: &InventoryDay) -> Result<(), RepositoryError> {
        let key = (day.room_type_id(), day.date());
        let conflict = || RepositoryError::VersionConflict {
            room_type_id: day.room_type_id(),
            date: day.date(),
        };
        let slot = self.inner.slot(key).ok_or_else(conflict)?;
        let current = self.current_day(key, &slot);
        if current.version() != day.version() {
            return Err(conflict());
        }

        let next = InventoryDay::reconstruct(
            day.room_type_id(),
            day.date(),
            current.total_quantity(),
            day.available_quantity(),
            current.version() + 1,
        )
        .map_err(|e| RepositoryError::OperationFailed(format!("在庫の更新に失敗しました: {}", e)))?;
        self.staged_days.insert(key, next);
        Ok(())
    }

    async fn upsert_guest(&mut self, profile: &GuestProfile) -> Result<Guest, RepositoryError> {
        let mut guests = self
            .inner
            .guests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = match guests.get(profile.email()) {
            Some(existing) => existing.id(),
            None => GuestId::new(self.inner.next_guest_id.fetch_add(1, Ordering::AcqRel)),
        };
        let guest = Guest::from_profile(id, profile);
        guests.insert(profile.email().to_string(), guest.clone());
        Ok(guest)
    }

    async fn insert_reservation(
        &mut self,
        reservation: NewReservation,
    ) -> Result<Reservation, RepositoryError> {
        if self
            .inner
            .fail_next_reservation_insert
            .swap(false, Ordering::AcqRel)
        {
            return Err(RepositoryError::OperationFailed(
                "予約台帳への書き込みに失敗しました".to_string(),
            ));
        }
        let id = ReservationId::new(
            self.inner
                .next_reservation_id
                .fetch_add(1, Ordering::AcqRel),
        );
        let reservation = reservation.into_reservation(id);
        self.staged_reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn transition_status(
        &mut self,
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let current = match self.staged_transitions.get(&id) {
            Some(staged) => Some(staged.to),
            None => self.inner.reservations().get(&id).map(|r| r.status()),
        };
        if current != Some(from) {
            return Ok(false);
        }

        let expected = self
            .staged_transitions
            .get(&id)
            .map_or(from, |staged| staged.expected);
        self.staged_transitions.insert(
            id,
            StagedTransition {
                expected,
                to,
                updated_at,
            },
        );
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let mut this = *self;

        // ロックせずに書き込んだ行は、ここでロックを取得してからリビジョン番号を再確認する
        let deadline = Instant::now() + this.inner.lock_timeout;
        let unlocked: Vec<InventoryKey> = this
            .staged_days
            .keys()
            .filter(|key| !this.held.contains_key(*key))
            .copied()
            .collect();
        for key in unlocked {
            let conflict = RepositoryError::VersionConflict {
                room_type_id: key.0,
                date: key.1,
            };
            let slot = this.inner.slot(key).ok_or_else(|| conflict.clone())?;
            this.acquire(key, slot.clone(), deadline).await?;
            let staged_version = this.staged_days.get(&key).map(|day| day.version());
            if staged_version != Some(slot.read().version() + 1) {
                return Err(conflict);
            }
        }

        let mut reservations = this.inner.reservations();
        for (id, staged) in &this.staged_transitions {
            let status = reservations.get(id).map(|r| r.status());
            if status != Some(staged.expected) {
                return Err(RepositoryError::OperationFailed(format!(
                    "予約ステータスが別のトランザクションで更新されました: reservation_id={}",
                    id
                )));
            }
        }

        let mut updated = Vec::with_capacity(this.staged_transitions.len());
        for (id, staged) in &this.staged_transitions {
            if let Some(current) = reservations.get(id) {
                let next = Reservation::reconstruct(
                    current.id(),
                    current.room_type().clone(),
                    current.guest().clone(),
                    current.stay(),
                    current.number_of_rooms(),
                    staged.to,
                    current.created_at(),
                    staged.updated_at,
                )
                .map_err(|e| {
                    RepositoryError::OperationFailed(format!(
                        "予約ステータスの更新に失敗しました: {}",
                        e
                    ))
                })?;
                updated.push(next);
            }
        }

        for (key, day) in std::mem::take(&mut this.staged_days) {
            if let Some((slot, _)) = this.held.get(&key) {
                slot.write(day);
            }
        }
        for reservation in this.staged_reservations.drain(..).chain(updated) {
            reservations.insert(reservation.id(), reservation);
        }
        Ok(())
    }
}
