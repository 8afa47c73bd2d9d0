use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 利用者ID - 利用者集約の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 書籍ID - 蔵書の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 貸出履歴ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanHistoryId(Uuid);

impl LoanHistoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanHistoryId {
    fn default() -> Self {
        Self::new()
    }
}

/// 書籍の分野
///
/// 閉じた集合。分岐は常に網羅的なmatchで行う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookType {
    Computer,
    Economy,
    Society,
    Language,
    Science,
}

impl BookType {
    /// 永続化用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            BookType::Computer => "COMPUTER",
            BookType::Economy => "ECONOMY",
            BookType::Society => "SOCIETY",
            BookType::Language => "LANGUAGE",
            BookType::Science => "SCIENCE",
        }
    }
}

impl std::str::FromStr for BookType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPUTER" => Ok(BookType::Computer),
            "ECONOMY" => Ok(BookType::Economy),
            "SOCIETY" => Ok(BookType::Society),
            "LANGUAGE" => Ok(BookType::Language),
            "SCIENCE" => Ok(BookType::Science),
            _ => Err(format!("Invalid book type: {}", s)),
        }
    }
}

/// 貸出履歴のステータス
///
/// 状態遷移は LOANED -> RETURNED の一方向のみ。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserLoanStatus {
    /// 貸出中
    #[default]
    Loaned,
    /// 返却済み
    Returned,
}

impl UserLoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserLoanStatus::Loaned => "LOANED",
            UserLoanStatus::Returned => "RETURNED",
        }
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, UserLoanStatus::Returned)
    }
}

impl std::str::FromStr for UserLoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOANED" => Ok(UserLoanStatus::Loaned),
            "RETURNED" => Ok(UserLoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}
