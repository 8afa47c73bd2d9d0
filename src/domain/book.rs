use serde::{Deserialize, Serialize};

use super::{BookId, BookType, ValidationError};

/// 蔵書
///
/// 不変条件：書籍名は空白であってはならない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub book_type: BookType,
}

impl Book {
    pub fn new(name: impl Into<String>, book_type: BookType) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::BlankBookName);
        }

        Ok(Self {
            id: BookId::new(),
            name,
            book_type,
        })
    }

    pub fn from_parts(id: BookId, name: String, book_type: BookType) -> Self {
        Self {
            id,
            name,
            book_type,
        }
    }
}
