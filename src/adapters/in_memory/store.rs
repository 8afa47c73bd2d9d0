use crate::domain::{Book, BookType, User, UserId, UserLoanHistory, UserLoanStatus};
use crate::ports::book_repository::{BookRepository, BookTypeCount};
use crate::ports::loan_history_repository::{
    LoanHistoryRepository, LoanRecordOutcome, ReturnRecordOutcome,
};
use crate::ports::user_repository::{UserHistoryView, UserRepository};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Default)]
struct State {
    users: Vec<User>,
    books: Vec<Book>,
    histories: Vec<UserLoanHistory>,
}

/// In-memory implementation of all library repositories
///
/// Every table lives behind one mutex, so each port call is atomic.
/// Rows keep insertion order.
#[derive(Default)]
pub struct InMemoryLibraryStore {
    state: Mutex<State>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| "in-memory library store lock poisoned".into())
    }
}

#[async_trait]
impl UserRepository for InMemoryLibraryStore {
    async fn save(&self, user: &User) -> Result<()> {
        let mut state = self.state()?;
        match state.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => state.users.push(user.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let state = self.state()?;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        let state = self.state()?;
        Ok(state.users.iter().find(|u| u.name == name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        Ok(self.state()?.users.clone())
    }

    /// Removes the user together with its loan histories
    async fn delete(&self, id: UserId) -> Result<()> {
        let mut state = self.state()?;
        state.histories.retain(|h| h.user_id != id);
        state.users.retain(|u| u.id != id);
        Ok(())
    }

    async fn find_all_with_histories(&self) -> Result<Vec<UserHistoryView>> {
        let state = self.state()?;
        Ok(state
            .users
            .iter()
            .map(|user| UserHistoryView {
                user: user.clone(),
                histories: state
                    .histories
                    .iter()
                    .filter(|h| h.user_id == user.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn delete_all(&self) -> Result<()> {
        let mut state = self.state()?;
        state.histories.clear();
        state.users.clear();
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryLibraryStore {
    async fn save(&self, book: &Book) -> Result<()> {
        let mut state = self.state()?;
        match state.books.iter_mut().find(|b| b.id == book.id) {
            Some(existing) => *existing = book.clone(),
            None => state.books.push(book.clone()),
        }
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Book>> {
        let state = self.state()?;
        Ok(state.books.iter().find(|b| b.name == name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        Ok(self.state()?.books.clone())
    }

    async fn count_by_type(&self) -> Result<Vec<BookTypeCount>> {
        let state = self.state()?;
        let mut counts: BTreeMap<BookType, i64> = BTreeMap::new();
        for book in &state.books {
            *counts.entry(book.book_type).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(book_type, count)| BookTypeCount { book_type, count })
            .collect())
    }

    async fn delete_all(&self) -> Result<()> {
        self.state()?.books.clear();
        Ok(())
    }
}

#[async_trait]
impl LoanHistoryRepository for InMemoryLibraryStore {
    async fn record_loan(&self, history: &UserLoanHistory) -> Result<LoanRecordOutcome> {
        let mut state = self.state()?;
        let already_loaned = state.histories.iter().any(|h| {
            h.book_name == history.book_name && h.status == UserLoanStatus::Loaned
        });
        if already_loaned {
            return Ok(LoanRecordOutcome::BookAlreadyLoaned);
        }

        state.histories.push(history.clone());
        Ok(LoanRecordOutcome::Recorded)
    }

    async fn exists_by_book_name_and_status(
        &self,
        book_name: &str,
        status: UserLoanStatus,
    ) -> Result<bool> {
        let state = self.state()?;
        Ok(state
            .histories
            .iter()
            .any(|h| h.book_name == book_name && h.status == status))
    }

    async fn find_by_user_and_book_name(
        &self,
        user_id: UserId,
        book_name: &str,
        status: UserLoanStatus,
    ) -> Result<Option<UserLoanHistory>> {
        let state = self.state()?;
        Ok(state
            .histories
            .iter()
            .find(|h| h.user_id == user_id && h.book_name == book_name && h.status == status)
            .cloned())
    }

    async fn record_return(&self, history: &UserLoanHistory) -> Result<ReturnRecordOutcome> {
        let mut state = self.state()?;
        let active = state
            .histories
            .iter_mut()
            .find(|h| h.id == history.id && h.status == UserLoanStatus::Loaned);

        match active {
            Some(existing) => {
                existing.status = history.status;
                Ok(ReturnRecordOutcome::Returned)
            }
            None => Ok(ReturnRecordOutcome::NotOnLoan),
        }
    }

    async fn count_by_status(&self, status: UserLoanStatus) -> Result<i64> {
        let state = self.state()?;
        let count = state.histories.iter().filter(|h| h.status == status).count();
        Ok(i64::try_from(count)?)
    }

    async fn find_all(&self) -> Result<Vec<UserLoanHistory>> {
        Ok(self.state()?.histories.clone())
    }

    async fn delete_all(&self) -> Result<()> {
        self.state()?.histories.clear();
        Ok(())
    }
}
