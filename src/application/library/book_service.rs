use crate::domain::{self, Book, UserLoanStatus, commands::*};
use crate::ports::{LoanRecordOutcome, ReturnRecordOutcome};

use super::ServiceDependencies;
use super::errors::{LibraryApplicationError, Result};
use super::responses::{BookResponse, BookStatResponse};

/// 書籍を登録する
///
/// # エラー
/// - Validation: 書籍名が空白
pub async fn save_book(deps: &ServiceDependencies, cmd: SaveBook) -> Result<BookResponse> {
    let book = Book::new(cmd.name, cmd.book_type)?;

    deps.book_repository
        .save(&book)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?;

    tracing::info!(book_id = %book.id.value(), book_type = book.book_type.as_str(), "book saved");
    Ok(BookResponse::from(book))
}

/// 全書籍を取得する
pub async fn get_books(deps: &ServiceDependencies) -> Result<Vec<BookResponse>> {
    let books = deps
        .book_repository
        .find_all()
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?;

    Ok(books.into_iter().map(BookResponse::from).collect())
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 利用者が存在すること
/// - 同じ書籍名のLOANED履歴が存在しないこと（1冊につき同時に1件の貸出）
///
/// 書籍と貸出履歴は書籍名で結び付くだけなので、Bookの存在は確認しない。
///
/// # エラー
/// - UserNotFound: 利用者名に一致する利用者がいない
/// - BookAlreadyLoaned: 既に貸出中（新しい履歴は作成されない）
pub async fn loan_book(deps: &ServiceDependencies, cmd: LoanBook) -> Result<()> {
    // 1. 利用者の存在確認
    let user = deps
        .user_repository
        .find_by_name(&cmd.user_name)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?
        .ok_or(LibraryApplicationError::UserNotFound)?;

    // 2. 貸出中かどうか確認
    let already_loaned = deps
        .loan_history_repository
        .exists_by_book_name_and_status(&cmd.book_name, UserLoanStatus::Loaned)
        .await
        .map_err(LibraryApplicationError::LoanHistoryRepositoryError)?;

    if already_loaned {
        tracing::debug!(book_name = %cmd.book_name, "loan rejected: already on loan");
        return Err(LibraryApplicationError::BookAlreadyLoaned);
    }

    // 3. ドメイン層の純粋関数を呼び出し
    let history = domain::loan_history::loan_book(user.id, cmd.book_name)?;

    // 4. 保存（並行した貸出との競合はストレージ側で検出される）
    let outcome = deps
        .loan_history_repository
        .record_loan(&history)
        .await
        .map_err(LibraryApplicationError::LoanHistoryRepositoryError)?;

    match outcome {
        LoanRecordOutcome::Recorded => {
            tracing::info!(
                loan_history_id = %history.id.value(),
                user_id = %user.id.value(),
                book_name = %history.book_name,
                "book loaned"
            );
            Ok(())
        }
        LoanRecordOutcome::BookAlreadyLoaned => {
            tracing::debug!(book_name = %history.book_name, "loan lost race: already on loan");
            Err(LibraryApplicationError::BookAlreadyLoaned)
        }
    }
}

/// 書籍を返却する
///
/// 利用者・書籍名・LOANEDに一致する履歴をRETURNEDに遷移させる。
/// 他の履歴には影響しない。
///
/// # エラー
/// - UserNotFound: 利用者名に一致する利用者がいない
/// - LoanHistoryNotFound: 貸出中の履歴がない（並行した返却に先を越された場合も含む）
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<()> {
    let user = deps
        .user_repository
        .find_by_name(&cmd.user_name)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?
        .ok_or(LibraryApplicationError::UserNotFound)?;

    let history = deps
        .loan_history_repository
        .find_by_user_and_book_name(user.id, &cmd.book_name, UserLoanStatus::Loaned)
        .await
        .map_err(LibraryApplicationError::LoanHistoryRepositoryError)?
        .ok_or(LibraryApplicationError::LoanHistoryNotFound)?;

    let returned = domain::loan_history::return_book(&history)
        .map_err(|e| LibraryApplicationError::InvalidLoanState(e.to_string()))?;

    let outcome = deps
        .loan_history_repository
        .record_return(&returned)
        .await
        .map_err(LibraryApplicationError::LoanHistoryRepositoryError)?;

    match outcome {
        ReturnRecordOutcome::Returned => {
            tracing::info!(loan_history_id = %returned.id.value(), "book returned");
            Ok(())
        }
        ReturnRecordOutcome::NotOnLoan => {
            tracing::debug!(loan_history_id = %returned.id.value(), "return lost race: not on loan");
            Err(LibraryApplicationError::LoanHistoryNotFound)
        }
    }
}

/// 貸出中の書籍数を数える
pub async fn count_loaned_book(deps: &ServiceDependencies) -> Result<i64> {
    deps.loan_history_repository
        .count_by_status(UserLoanStatus::Loaned)
        .await
        .map_err(LibraryApplicationError::LoanHistoryRepositoryError)
}

/// 分野別の蔵書数を取得する
///
/// 0冊の分野は含まれない。
pub async fn get_book_statistics(deps: &ServiceDependencies) -> Result<Vec<BookStatResponse>> {
    let stats = deps
        .book_repository
        .count_by_type()
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?;

    Ok(stats.into_iter().map(BookStatResponse::from).collect())
}
