use crate::domain::error::DomainError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use std::fmt;

/// 客室タイプの一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomTypeId(i64);

impl RoomTypeId {
    /// 数値から RoomTypeId を作成
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// 内部の数値を取得
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RoomTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 予約の一意識別子
/// 台帳への追加時に採番される
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationId(i64);

impl ReservationId {
    /// 数値から ReservationId を作成
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// 内部の数値を取得
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 宿泊者の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(i64);

impl GuestId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 宿泊期間を表す値オブジェクト
/// チェックイン日（含む）からチェックアウト日（含まない）までの半開区間
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayPeriod {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayPeriod {
    /// 新しい宿泊期間を作成
    ///
    /// # Arguments
    /// * `check_in` - チェックイン日（含む）
    /// * `check_out` - チェックアウト日（含まない）
    ///
    /// # Returns
    /// * `Ok(StayPeriod)` - 作成成功
    /// * `Err(DomainError::InvalidStayPeriod)` - チェックイン日がチェックアウト日より前でない
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, DomainError> {
        if check_in >= check_out {
            return Err(DomainError::InvalidStayPeriod {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// 宿泊数
    pub fn nights(&self) -> usize {
        (self.check_out - self.check_in).num_days() as usize
    }

    /// チェックイン日が `today` より前でないことを確認する
    ///
    /// # Returns
    /// * `Ok(())` - チェックイン日が本日以降
    /// * `Err(DomainError::CheckInInPast)` - チェックイン日が過去
    pub fn ensure_not_before(&self, today: NaiveDate) -> Result<(), DomainError> {
        if self.check_in < today {
            return Err(DomainError::CheckInInPast {
                check_in: self.check_in,
                today,
            });
        }
        Ok(())
    }

    /// 期間が `max_nights` 泊以下であることを確認する
    /// `dates` で日付を列挙する前に呼ぶこと
    pub fn ensure_at_most(&self, max_nights: usize) -> Result<(), DomainError> {
        let nights = self.nights();
        if nights > max_nights {
            return Err(DomainError::PeriodTooLong { nights, max_nights });
        }
        Ok(())
    }

    /// 宿泊対象の日付を昇順で列挙する（チェックアウト日は含まない）
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(self.nights());
        let mut current = self.check_in;
        while current < self.check_out {
            dates.push(current);
            current = match current.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }
        dates
    }
}

impl fmt::Display for StayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.check_in, self.check_out)
    }
}

/// 宿泊者の入力情報を表す値オブジェクト
/// 台帳に永続化される前の氏名とメールアドレス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestProfile {
    name: String,
    email: String,
}

impl GuestProfile {
    const MAX_LENGTH: usize = 255;

    /// 新しい宿泊者情報を作成
    ///
    /// # Arguments
    /// * `name` - 宿泊者氏名（必須、255文字以内）
    /// * `email` - メールアドレス（必須、255文字以内）
    ///
    /// # Returns
    /// * `Ok(GuestProfile)` - 作成成功
    /// * `Err(DomainError::InvalidValue)` - 入力値が不正
    pub fn new(name: String, email: String) -> Result<Self, DomainError> {
        let name = name.trim().to_string();
        let email = email.trim().to_string();

        if name.is_empty() {
            return Err(DomainError::InvalidValue(
                "宿泊者氏名は必須です".to_string(),
            ));
        }
        if name.chars().count() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidValue(
                "宿泊者氏名は255文字以内である必要があります".to_string(),
            ));
        }
        if email.is_empty() {
            return Err(DomainError::InvalidValue(
                "メールアドレスは必須です".to_string(),
            ));
        }
        if email.chars().count() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidValue(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => {
                return Err(DomainError::InvalidValue(format!(
                    "メールアドレスの形式が正しくありません: {}",
                    email
                )))
            }
        }

        Ok(Self { name, email })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// 予約ステータス
/// CONFIRMED → CANCELLED の一方向の遷移のみ許可する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// 確定済み
    Confirmed,
    /// 取消済み
    Cancelled,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", status_str)
    }
}

impl ReservationStatus {
    /// 文字列からReservationStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な予約ステータス: {}",
                s
            ))),
        }
    }
}
