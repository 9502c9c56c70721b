// 在庫カウンター
// 正となる在庫ストアにアクセスする前の事前フィルター

use crate::domain::model::{InventoryDay, RoomTypeId};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

/// カウンターのキー（客室タイプID + 日付）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CounterKey {
    room_type_id: RoomTypeId,
    date: NaiveDate,
}

impl CounterKey {
    fn new(room_type_id: RoomTypeId, date: NaiveDate) -> Self {
        Self { room_type_id, date }
    }
}

/// カウンター初期化用のスナップショット1件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub room_type_id: RoomTypeId,
    pub date: NaiveDate,
    pub available_quantity: u32,
}

impl From<&InventoryDay> for CounterSnapshot {
    fn from(day: &InventoryDay) -> Self {
        Self {
            room_type_id: day.room_type_id(),
            date: day.date(),
            available_quantity: day.available_quantity(),
        }
    }
}

/// インメモリ在庫カウンター
///
/// 客室タイプ・日付ごとの残り客室数を保持し、正となる在庫ストアに触れる前に
/// ほぼ確実に失敗するリクエストを安価に弾く。あくまでキャッシュであり、
/// 在庫ストアと食い違った場合は常に在庫ストアが正しい。
///
/// 初期化の契約:
/// - プロセス起動時、在庫ストアのマイグレーション完了後に `initialize` を1回呼ぶ
/// - 整合性が保証できなくなった場合は `initialize` を再度呼んで全体を再構築する
/// - 初期化前は `is_initialized` が false を返し、トラフィックを受け付けてはならない
///
/// 登録されていないキーは「容量不明」として扱い、予約を拒否する。
#[derive(Debug, Default)]
pub struct InventoryCounter {
    counters: RwLock<HashMap<CounterKey, AtomicI64>>,
    initialized: AtomicBool,
}

impl InventoryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 初期化済みかどうか
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// スナップショットでカウンター全体を置き換える
    /// 既存のカウンターはすべて破棄される（差分更新ではない）
    pub fn initialize<I>(&self, snapshot: I)
    where
        I: IntoIterator<Item = CounterSnapshot>,
    {
        let rebuilt: HashMap<CounterKey, AtomicI64> = snapshot
            .into_iter()
            .map(|entry| {
                (
                    CounterKey::new(entry.room_type_id, entry.date),
                    AtomicI64::new(i64::from(entry.available_quantity)),
                )
            })
            .collect();

        let mut counters = self
            .counters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *counters = rebuilt;
        self.initialized.store(true, Ordering::Release);
    }

    /// 未登録のキーだけを追加する
    /// 既存のキーは上書きしないため、処理中のリクエストの仮押さえを壊さない
    ///
    /// # Returns
    /// * 新たに登録されたキーの数
    pub fn register<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = CounterSnapshot>,
    {
        let mut counters = self
            .counters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut added = 0;
        for entry in entries {
            counters
                .entry(CounterKey::new(entry.room_type_id, entry.date))
                .or_insert_with(|| {
                    added += 1;
                    AtomicI64::new(i64::from(entry.available_quantity))
                });
        }
        added
    }

    /// 仮押さえを試みる
    ///
    /// 日付を順番に処理し、各日付のカウンターから `quantity` をアトミックに減算する。
    /// 未登録の日付があるか、減算結果が負になった場合は、その日付の減算と
    /// それまでに処理した日付の減算をすべて戻して `false` を返す。
    /// 部分的な仮押さえが残ることはない。
    pub fn try_reserve(&self, room_type_id: RoomTypeId, dates: &[NaiveDate], quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        let amount = i64::from(quantity);
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);

        let mut decremented: Vec<&AtomicI64> = Vec::with_capacity(dates.len());
        for date in dates {
            let Some(counter) = counters.get(&CounterKey::new(room_type_id, *date)) else {
                Self::rollback(&decremented, amount);
                return false;
            };

            let previous = counter.fetch_sub(amount, Ordering::AcqRel);
            if previous - amount < 0 {
                counter.fetch_add(amount, Ordering::AcqRel);
                Self::rollback(&decremented, amount);
                return false;
            }
            decremented.push(counter);
        }
        true
    }

    /// 仮押さえを試み、成功した場合は解放ガードを返す
    ///
    /// ガードは `confirm` されずに破棄されると仮押さえを戻す。
    /// 処理の途中で Future が破棄された場合にも補償が行われる。
    pub fn admit(
        &self,
        room_type_id: RoomTypeId,
        dates: Vec<NaiveDate>,
        quantity: u32,
    ) -> Option<CounterAdmission<'_>> {
        if !self.try_reserve(room_type_id, &dates, quantity) {
            return None;
        }
        Some(CounterAdmission {
            counter: self,
            room_type_id,
            dates,
            quantity,
            armed: true,
        })
    }

    /// カウンターを戻す
    /// 未登録のキーは無視する（エラーにはしない）
    pub fn release(&self, room_type_id: RoomTypeId, dates: &[NaiveDate], quantity: u32) {
        if quantity == 0 {
            return;
        }
        let amount = i64::from(quantity);
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        for date in dates {
            if let Some(counter) = counters.get(&CounterKey::new(room_type_id, *date)) {
                counter.fetch_add(amount, Ordering::AcqRel);
            }
        }
    }

    /// 現在値を参照する（観測・テスト用）
    /// 古い値を読む可能性があるため、業務判断には使わないこと
    pub fn peek(&self, room_type_id: RoomTypeId, date: NaiveDate) -> Option<i64> {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        counters
            .get(&CounterKey::new(room_type_id, date))
            .map(|counter| counter.load(Ordering::Acquire))
    }

    /// 登録されているキーの数
    pub(crate) fn len(&self) -> usize {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn rollback(decremented: &[&AtomicI64], amount: i64) {
        for counter in decremented {
            counter.fetch_add(amount, Ordering::AcqRel);
        }
    }
}

/// 在庫カウンターの仮押さえ
/// `confirm` せずに破棄されると、仮押さえした数量をカウンターに戻す
#[derive(Debug)]
#[must_use = "破棄すると仮押さえが即座に解放される"]
pub struct CounterAdmission<'a> {
    counter: &'a InventoryCounter,
    room_type_id: RoomTypeId,
    dates: Vec<NaiveDate>,
    quantity: u32,
    armed: bool,
}

impl CounterAdmission<'_> {
    /// 正となる在庫ストアへの反映が完了したので、仮押さえを確定する
    pub fn confirm(mut self) {
        self.armed = false;
    }
}

impl Drop for CounterAdmission<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.counter
                .release(self.room_type_id, &self.dates, self.quantity);
        }
    }
}
