use serde::{Deserialize, Serialize};

/// 利用者削除のクエリパラメータ（DELETE /user?name=）
#[derive(Debug, Deserialize)]
pub struct DeleteUserQuery {
    pub name: String,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
