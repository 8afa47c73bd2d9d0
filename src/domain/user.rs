use serde::{Deserialize, Serialize};

use super::{UserId, ValidationError};

/// User集約
///
/// 不変条件：名前は空白であってはならない。
/// 貸出履歴は集約外（UserLoanHistory）に保持し、読み取り時のみ結合する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub age: Option<i32>,
}

impl User {
    /// 新しい利用者を作成する
    ///
    /// # エラー
    /// 名前が空白のみの場合は`ValidationError::BlankUserName`
    pub fn new(name: impl Into<String>, age: Option<i32>) -> Result<Self, ValidationError> {
        let name = name.into();
        ensure_user_name(&name)?;

        Ok(Self {
            id: UserId::new(),
            name,
            age,
        })
    }

    /// 永続化層から復元する（バリデーション済みの値を前提とする）
    pub fn from_parts(id: UserId, name: String, age: Option<i32>) -> Self {
        Self { id, name, age }
    }

    /// 名前を変更する
    ///
    /// 生成時と同じ不変条件を変更後にも保証する。
    pub fn update_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        ensure_user_name(&name)?;
        self.name = name;
        Ok(())
    }
}

fn ensure_user_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::BlankUserName);
    }
    Ok(())
}
