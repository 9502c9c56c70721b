use crate::domain::model::{GuestId, GuestProfile};

/// 宿泊者
/// 同じメールアドレスの宿泊者は1件のレコードとして管理する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guest {
    id: GuestId,
    name: String,
    email: String,
}

impl Guest {
    pub fn new(id: GuestId, name: String, email: String) -> Self {
        Self { id, name, email }
    }

    /// 入力情報と採番済みIDから宿泊者を作成
    pub fn from_profile(id: GuestId, profile: &GuestProfile) -> Self {
        Self::new(id, profile.name().to_string(), profile.email().to_string())
    }

    pub fn id(&self) -> GuestId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
