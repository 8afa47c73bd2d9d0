use async_trait::async_trait;
use library_app::adapters::in_memory::InMemoryLibraryStore;
use library_app::application::library::{
    LibraryApplicationError, ServiceDependencies, count_loaned_book, delete_user, get_book_statistics, get_books,
    get_user_loan_histories, get_users, loan_book, return_book, save_book, save_user,
    update_user_name,
};
use library_app::domain::commands::*;
use library_app::domain::{BookType, UserId, UserLoanHistory, UserLoanStatus, ValidationError};
use library_app::ports::loan_history_repository::Result as RepositoryResult;
use library_app::ports::*;
use std::sync::Arc;

mod common;

use common::{book_fixture, history_fixture, in_memory_deps, user_fixture};

// ============================================================================
// テスト用のLoanHistoryRepository
// ============================================================================

/// 読み取りが常に一歩遅れる貸出履歴リポジトリ
///
/// 確認クエリの直後に別のリクエストが書き込んだ状況を再現する。
/// - `exists_by_book_name_and_status`は常に`false`
/// - `find_by_user_and_book_name`は返却済みの履歴もLOANEDとして返す
///
/// 書き込みはインメモリストアに委譲するため、二重貸出・二重返却は
/// ストア側の不可分な確認でのみ検出される。
struct StaleReadLoanHistoryRepository {
    store: Arc<InMemoryLibraryStore>,
}

#[async_trait]
impl LoanHistoryRepository for StaleReadLoanHistoryRepository {
    async fn record_loan(&self, history: &UserLoanHistory) -> RepositoryResult<LoanRecordOutcome> {
        self.store.record_loan(history).await
    }

    async fn exists_by_book_name_and_status(
        &self,
        _book_name: &str,
        _status: UserLoanStatus,
    ) -> RepositoryResult<bool> {
        Ok(false)
    }

    async fn find_by_user_and_book_name(
        &self,
        user_id: UserId,
        book_name: &str,
        _status: UserLoanStatus,
    ) -> RepositoryResult<Option<UserLoanHistory>> {
        let histories = LoanHistoryRepository::find_all(self.store.as_ref()).await?;
        Ok(histories
            .into_iter()
            .find(|h| h.user_id == user_id && h.book_name == book_name)
            .map(|h| UserLoanHistory {
                status: UserLoanStatus::Loaned,
                ..h
            }))
    }

    async fn record_return(
        &self,
        history: &UserLoanHistory,
    ) -> RepositoryResult<ReturnRecordOutcome> {
        self.store.record_return(history).await
    }

    async fn count_by_status(&self, status: UserLoanStatus) -> RepositoryResult<i64> {
        self.store.count_by_status(status).await
    }

    async fn find_all(&self) -> RepositoryResult<Vec<UserLoanHistory>> {
        LoanHistoryRepository::find_all(self.store.as_ref()).await
    }

    async fn delete_all(&self) -> RepositoryResult<()> {
        LoanHistoryRepository::delete_all(self.store.as_ref()).await
    }
}

fn stale_read_deps() -> (Arc<InMemoryLibraryStore>, ServiceDependencies) {
    let store = Arc::new(InMemoryLibraryStore::new());
    let deps = ServiceDependencies {
        user_repository: store.clone(),
        book_repository: store.clone(),
        loan_history_repository: Arc::new(StaleReadLoanHistoryRepository {
            store: store.clone(),
        }),
    };
    (store, deps)
}

// ============================================================================
// 利用者サービス
// ============================================================================

#[tokio::test]
async fn test_save_user_success() {
    let (store, deps) = in_memory_deps();

    save_user(
        &deps,
        SaveUser {
            name: "Alice".to_string(),
            age: None,
        },
    )
    .await
    .unwrap();

    let users = UserRepository::find_all(store.as_ref()).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Alice");
    assert_eq!(users[0].age, None);
}

#[tokio::test]
async fn test_save_user_then_get_users() {
    let (_store, deps) = in_memory_deps();

    save_user(
        &deps,
        SaveUser {
            name: "Alice".to_string(),
            age: Some(27),
        },
    )
    .await
    .unwrap();

    let users = get_users(&deps).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Alice");
    assert_eq!(users[0].age, Some(27));
}

#[tokio::test]
async fn test_save_user_blank_name_persists_nothing() {
    let (store, deps) = in_memory_deps();

    let result = save_user(
        &deps,
        SaveUser {
            name: "  ".to_string(),
            age: Some(10),
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(LibraryApplicationError::Validation(ValidationError::BlankUserName))
    ));
    assert!(UserRepository::find_all(store.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_user_allows_duplicate_names() {
    let (_store, deps) = in_memory_deps();

    for _ in 0..2 {
        save_user(
            &deps,
            SaveUser {
                name: "Alice".to_string(),
                age: None,
            },
        )
        .await
        .unwrap();
    }

    assert_eq!(get_users(&deps).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_users() {
    let (store, deps) = in_memory_deps();
    UserRepository::save(store.as_ref(), &user_fixture("A", Some(27)))
        .await
        .unwrap();
    UserRepository::save(store.as_ref(), &user_fixture("B", None))
        .await
        .unwrap();

    let users = get_users(&deps).await.unwrap();

    assert_eq!(users.len(), 2);
    let mut names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["A", "B"]);
    let mut ages: Vec<_> = users.iter().map(|u| u.age).collect();
    ages.sort();
    assert_eq!(ages, vec![None, Some(27)]);
}

#[tokio::test]
async fn test_update_user_name() {
    let (store, deps) = in_memory_deps();
    let user = user_fixture("Alice", Some(27));
    UserRepository::save(store.as_ref(), &user).await.unwrap();

    update_user_name(
        &deps,
        UpdateUserName {
            id: user.id,
            name: "Alicia".to_string(),
        },
    )
    .await
    .unwrap();

    let users = UserRepository::find_all(store.as_ref()).await.unwrap();
    assert_eq!(users[0].name, "Alicia");
    assert_eq!(users[0].age, Some(27));
}

#[tokio::test]
async fn test_update_user_name_not_found() {
    let (_store, deps) = in_memory_deps();

    let result = update_user_name(
        &deps,
        UpdateUserName {
            id: UserId::new(),
            name: "Alicia".to_string(),
        },
    )
    .await;

    assert!(matches!(result, Err(LibraryApplicationError::UserNotFound)));
}

#[tokio::test]
async fn test_update_user_name_blank_is_rejected() {
    let (store, deps) = in_memory_deps();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();

    let result = update_user_name(
        &deps,
        UpdateUserName {
            id: user.id,
            name: String::new(),
        },
    )
    .await;

    assert!(matches!(result, Err(LibraryApplicationError::Validation(_))));
    let stored = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Alice");
}

#[tokio::test]
async fn test_delete_user() {
    let (store, deps) = in_memory_deps();
    UserRepository::save(store.as_ref(), &user_fixture("Alice", Some(27)))
        .await
        .unwrap();

    delete_user(
        &deps,
        DeleteUser {
            name: "Alice".to_string(),
        },
    )
    .await
    .unwrap();

    let found = UserRepository::find_by_name(store.as_ref(), "Alice")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_delete_user_not_found_leaves_store_unchanged() {
    let (store, deps) = in_memory_deps();
    UserRepository::save(store.as_ref(), &user_fixture("Alice", None))
        .await
        .unwrap();

    let result = delete_user(
        &deps,
        DeleteUser {
            name: "Bob".to_string(),
        },
    )
    .await;

    assert!(matches!(result, Err(LibraryApplicationError::UserNotFound)));
    assert_eq!(UserRepository::find_all(store.as_ref()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_user_loan_histories_without_history() {
    let (store, deps) = in_memory_deps();
    UserRepository::save(store.as_ref(), &user_fixture("A", None))
        .await
        .unwrap();

    let results = get_user_loan_histories(&deps).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "A");
    assert!(results[0].books.is_empty());
}

#[tokio::test]
async fn test_get_user_loan_histories_with_many_histories() {
    let (store, deps) = in_memory_deps();
    let user = user_fixture("A", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();
    for (book_name, status) in [
        ("Book1", UserLoanStatus::Loaned),
        ("Book2", UserLoanStatus::Loaned),
        ("Book3", UserLoanStatus::Returned),
    ] {
        store
            .record_loan(&history_fixture(user.id, book_name, UserLoanStatus::Loaned))
            .await
            .unwrap();
        if status == UserLoanStatus::Returned {
            let history = store
                .find_by_user_and_book_name(user.id, book_name, UserLoanStatus::Loaned)
                .await
                .unwrap()
                .unwrap();
            let returned = library_app::domain::loan_history::return_book(&history).unwrap();
            store.record_return(&returned).await.unwrap();
        }
    }

    let results = get_user_loan_histories(&deps).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "A");
    let mut books: Vec<_> = results[0]
        .books
        .iter()
        .map(|b| (b.name.as_str(), b.is_return))
        .collect();
    books.sort();
    assert_eq!(
        books,
        vec![("Book1", false), ("Book2", false), ("Book3", true)]
    );
}

#[tokio::test]
async fn test_delete_user_removes_histories() {
    let (store, deps) = in_memory_deps();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();
    store
        .record_loan(&history_fixture(user.id, "Book1", UserLoanStatus::Loaned))
        .await
        .unwrap();

    delete_user(
        &deps,
        DeleteUser {
            name: "Alice".to_string(),
        },
    )
    .await
    .unwrap();

    assert!(LoanHistoryRepository::find_all(store.as_ref()).await.unwrap().is_empty());
    assert_eq!(count_loaned_book(&deps).await.unwrap(), 0);
}

// ============================================================================
// 書籍サービス
// ============================================================================

#[tokio::test]
async fn test_save_book() {
    let (store, deps) = in_memory_deps();

    save_book(
        &deps,
        SaveBook {
            name: "test".to_string(),
            book_type: BookType::Computer,
        },
    )
    .await
    .unwrap();

    let books = BookRepository::find_all(store.as_ref()).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].name, "test");
    assert_eq!(books[0].book_type, BookType::Computer);
    assert_eq!(get_books(&deps).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_save_book_blank_name_fails() {
    let (store, deps) = in_memory_deps();

    let result = save_book(
        &deps,
        SaveBook {
            name: String::new(),
            book_type: BookType::Science,
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(LibraryApplicationError::Validation(ValidationError::BlankBookName))
    ));
    assert!(BookRepository::find_all(store.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_loan_book_success() {
    let (store, deps) = in_memory_deps();
    BookRepository::save(store.as_ref(), &book_fixture("target", BookType::Computer))
        .await
        .unwrap();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();

    loan_book(
        &deps,
        LoanBook {
            user_name: "Alice".to_string(),
            book_name: "target".to_string(),
        },
    )
    .await
    .unwrap();

    let histories = LoanHistoryRepository::find_all(store.as_ref()).await.unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0].book_name, "target");
    assert_eq!(histories[0].user_id, user.id);
    assert_eq!(histories[0].status, UserLoanStatus::Loaned);
}

#[tokio::test]
async fn test_loan_book_user_not_found() {
    let (store, deps) = in_memory_deps();

    let result = loan_book(
        &deps,
        LoanBook {
            user_name: "nobody".to_string(),
            book_name: "target".to_string(),
        },
    )
    .await;

    assert!(matches!(result, Err(LibraryApplicationError::UserNotFound)));
    assert!(LoanHistoryRepository::find_all(store.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_loan_book_already_loaned_fails() {
    let (store, deps) = in_memory_deps();
    BookRepository::save(store.as_ref(), &book_fixture("test", BookType::Computer))
        .await
        .unwrap();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();
    store
        .record_loan(&history_fixture(user.id, "test", UserLoanStatus::Loaned))
        .await
        .unwrap();

    let result = loan_book(
        &deps,
        LoanBook {
            user_name: "Alice".to_string(),
            book_name: "test".to_string(),
        },
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, LibraryApplicationError::BookAlreadyLoaned));
    assert_eq!(err.to_string(), "Book is already on loan");
    assert_eq!(LoanHistoryRepository::find_all(store.as_ref()).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loans_of_same_book_create_one_record() {
    let (store, deps) = in_memory_deps();
    let names = ["Alice", "Bob", "Carol", "Dave"];
    for name in names {
        UserRepository::save(store.as_ref(), &user_fixture(name, None))
            .await
            .unwrap();
    }

    let barrier = Arc::new(tokio::sync::Barrier::new(names.len()));
    let handles: Vec<_> = names
        .into_iter()
        .map(|name| {
            let deps = deps.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                loan_book(
                    &deps,
                    LoanBook {
                        user_name: name.to_string(),
                        book_name: "X".to_string(),
                    },
                )
                .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(err) => assert!(matches!(err, LibraryApplicationError::BookAlreadyLoaned)),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(count_loaned_book(&deps).await.unwrap(), 1);
}

#[tokio::test]
async fn test_loan_book_rejected_by_store_after_stale_check() {
    let (store, deps) = stale_read_deps();
    let alice = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &alice).await.unwrap();
    UserRepository::save(store.as_ref(), &user_fixture("Bob", None))
        .await
        .unwrap();
    store
        .record_loan(&history_fixture(alice.id, "X", UserLoanStatus::Loaned))
        .await
        .unwrap();

    let result = loan_book(
        &deps,
        LoanBook {
            user_name: "Bob".to_string(),
            book_name: "X".to_string(),
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(LibraryApplicationError::BookAlreadyLoaned)
    ));
    let histories = LoanHistoryRepository::find_all(store.as_ref()).await.unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0].user_id, alice.id);
}

#[tokio::test]
async fn test_return_book_rejected_by_store_after_stale_read() {
    let (store, deps) = stale_read_deps();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();
    store
        .record_loan(&history_fixture(user.id, "X", UserLoanStatus::Loaned))
        .await
        .unwrap();
    let cmd = ReturnBook {
        user_name: "Alice".to_string(),
        book_name: "X".to_string(),
    };

    return_book(&deps, cmd.clone()).await.unwrap();
    // 読み取りは返却済みの履歴をLOANEDとして返すが、更新は行われない
    let result = return_book(&deps, cmd).await;

    assert!(matches!(
        result,
        Err(LibraryApplicationError::LoanHistoryNotFound)
    ));
    assert_eq!(
        store.count_by_status(UserLoanStatus::Returned).await.unwrap(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_returns_of_same_loan_succeed_once() {
    let (store, deps) = in_memory_deps();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();
    store
        .record_loan(&history_fixture(user.id, "X", UserLoanStatus::Loaned))
        .await
        .unwrap();

    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let deps = deps.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                return_book(
                    &deps,
                    ReturnBook {
                        user_name: "Alice".to_string(),
                        book_name: "X".to_string(),
                    },
                )
                .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(err) => assert!(matches!(err, LibraryApplicationError::LoanHistoryNotFound)),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(
        store.count_by_status(UserLoanStatus::Returned).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_return_book() {
    let (store, deps) = in_memory_deps();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();
    store
        .record_loan(&history_fixture(user.id, "test", UserLoanStatus::Loaned))
        .await
        .unwrap();

    return_book(
        &deps,
        ReturnBook {
            user_name: "Alice".to_string(),
            book_name: "test".to_string(),
        },
    )
    .await
    .unwrap();

    let histories = LoanHistoryRepository::find_all(store.as_ref()).await.unwrap();
    assert_eq!(histories[0].status, UserLoanStatus::Returned);
}

#[tokio::test]
async fn test_return_book_leaves_other_records_untouched() {
    let (store, deps) = in_memory_deps();
    let alice = user_fixture("Alice", None);
    let bob = user_fixture("Bob", None);
    UserRepository::save(store.as_ref(), &alice).await.unwrap();
    UserRepository::save(store.as_ref(), &bob).await.unwrap();
    store
        .record_loan(&history_fixture(alice.id, "A", UserLoanStatus::Loaned))
        .await
        .unwrap();
    store
        .record_loan(&history_fixture(alice.id, "B", UserLoanStatus::Loaned))
        .await
        .unwrap();
    store
        .record_loan(&history_fixture(bob.id, "C", UserLoanStatus::Loaned))
        .await
        .unwrap();

    return_book(
        &deps,
        ReturnBook {
            user_name: "Alice".to_string(),
            book_name: "A".to_string(),
        },
    )
    .await
    .unwrap();

    let histories = LoanHistoryRepository::find_all(store.as_ref()).await.unwrap();
    for history in histories {
        let expected = if history.book_name == "A" {
            UserLoanStatus::Returned
        } else {
            UserLoanStatus::Loaned
        };
        assert_eq!(history.status, expected, "book {}", history.book_name);
    }
}

#[tokio::test]
async fn test_return_book_without_active_loan_fails() {
    let (store, deps) = in_memory_deps();
    UserRepository::save(store.as_ref(), &user_fixture("Alice", None))
        .await
        .unwrap();

    let result = return_book(
        &deps,
        ReturnBook {
            user_name: "Alice".to_string(),
            book_name: "test".to_string(),
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(LibraryApplicationError::LoanHistoryNotFound)
    ));
}

#[tokio::test]
async fn test_return_book_twice_fails() {
    let (store, deps) = in_memory_deps();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();
    store
        .record_loan(&history_fixture(user.id, "test", UserLoanStatus::Loaned))
        .await
        .unwrap();
    let cmd = ReturnBook {
        user_name: "Alice".to_string(),
        book_name: "test".to_string(),
    };

    return_book(&deps, cmd.clone()).await.unwrap();
    let result = return_book(&deps, cmd).await;

    assert!(matches!(
        result,
        Err(LibraryApplicationError::LoanHistoryNotFound)
    ));
}

#[tokio::test]
async fn test_count_loaned_book() {
    let (store, deps) = in_memory_deps();
    let user = user_fixture("Alice", None);
    UserRepository::save(store.as_ref(), &user).await.unwrap();
    for book_name in ["A", "B", "C"] {
        store
            .record_loan(&history_fixture(user.id, book_name, UserLoanStatus::Loaned))
            .await
            .unwrap();
    }
    for book_name in ["B", "C"] {
        return_book(
            &deps,
            ReturnBook {
                user_name: "Alice".to_string(),
                book_name: book_name.to_string(),
            },
        )
        .await
        .unwrap();
    }

    assert_eq!(count_loaned_book(&deps).await.unwrap(), 1);
}

#[tokio::test]
async fn test_get_book_statistics() {
    let (store, deps) = in_memory_deps();
    for (name, book_type) in [
        ("A", BookType::Computer),
        ("B", BookType::Computer),
        ("C", BookType::Science),
    ] {
        BookRepository::save(store.as_ref(), &book_fixture(name, book_type))
            .await
            .unwrap();
    }

    let result = get_book_statistics(&deps).await.unwrap();

    assert_eq!(result.len(), 2);
    let count_of = |book_type: BookType| {
        result
            .iter()
            .find(|stat| stat.book_type == book_type)
            .map(|stat| stat.count)
    };
    assert_eq!(count_of(BookType::Computer), Some(2));
    assert_eq!(count_of(BookType::Science), Some(1));
    assert_eq!(count_of(BookType::Economy), None);
}

#[tokio::test]
async fn test_loan_return_scenario() {
    let (_store, deps) = in_memory_deps();
    save_user(
        &deps,
        SaveUser {
            name: "Alice".to_string(),
            age: None,
        },
    )
    .await
    .unwrap();
    save_user(
        &deps,
        SaveUser {
            name: "Bob".to_string(),
            age: None,
        },
    )
    .await
    .unwrap();
    save_book(
        &deps,
        SaveBook {
            name: "X".to_string(),
            book_type: BookType::Computer,
        },
    )
    .await
    .unwrap();

    let loan = |user_name: &str| LoanBook {
        user_name: user_name.to_string(),
        book_name: "X".to_string(),
    };

    loan_book(&deps, loan("Alice")).await.unwrap();
    assert_eq!(count_loaned_book(&deps).await.unwrap(), 1);

    let second = loan_book(&deps, loan("Bob")).await;
    assert!(matches!(
        second,
        Err(LibraryApplicationError::BookAlreadyLoaned)
    ));

    return_book(
        &deps,
        ReturnBook {
            user_name: "Alice".to_string(),
            book_name: "X".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(count_loaned_book(&deps).await.unwrap(), 0);

    // 返却後は別の利用者が新しい履歴として借りられる
    loan_book(&deps, loan("Bob")).await.unwrap();
    let histories = get_user_loan_histories(&deps).await.unwrap();
    let alice = histories.iter().find(|h| h.name == "Alice").unwrap();
    let bob = histories.iter().find(|h| h.name == "Bob").unwrap();
    assert_eq!(alice.books.len(), 1);
    assert!(alice.books[0].is_return);
    assert_eq!(bob.books.len(), 1);
    assert!(!bob.books[0].is_return);
}
