use serde::{Deserialize, Serialize};

use super::{BookType, UserId};

/// コマンド：利用者を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveUser {
    pub name: String,
    pub age: Option<i32>,
}

/// コマンド：利用者名を変更する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserName {
    pub id: UserId,
    pub name: String,
}

/// コマンド：利用者を削除する（名前の完全一致）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUser {
    pub name: String,
}

/// コマンド：書籍を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveBook {
    pub name: String,
    #[serde(rename = "type")]
    pub book_type: BookType,
}

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanBook {
    pub user_name: String,
    pub book_name: String,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnBook {
    pub user_name: String,
    pub book_name: String,
}
