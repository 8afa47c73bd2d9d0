use crate::domain::{User, commands::*};

use super::ServiceDependencies;
use super::errors::{LibraryApplicationError, Result};
use super::responses::{UserLoanHistoryResponse, UserResponse};

/// 利用者を登録する
///
/// 名前の重複チェックは行わない。
///
/// # エラー
/// - Validation: 名前が空白
pub async fn save_user(deps: &ServiceDependencies, cmd: SaveUser) -> Result<UserResponse> {
    let user = User::new(cmd.name, cmd.age)?;

    deps.user_repository
        .save(&user)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?;

    tracing::info!(user_id = %user.id.value(), "user saved");
    Ok(UserResponse::from(user))
}

/// 全利用者を取得する
pub async fn get_users(deps: &ServiceDependencies) -> Result<Vec<UserResponse>> {
    let users = deps
        .user_repository
        .find_all()
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?;

    Ok(users.into_iter().map(UserResponse::from).collect())
}

/// 利用者名を変更する
///
/// # エラー
/// - UserNotFound: IDに一致する利用者がいない
/// - Validation: 新しい名前が空白
pub async fn update_user_name(deps: &ServiceDependencies, cmd: UpdateUserName) -> Result<()> {
    let mut user = deps
        .user_repository
        .find_by_id(cmd.id)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?
        .ok_or(LibraryApplicationError::UserNotFound)?;

    user.update_name(cmd.name)?;

    deps.user_repository
        .save(&user)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?;

    tracing::info!(user_id = %user.id.value(), "user renamed");
    Ok(())
}

/// 利用者を名前で削除する
///
/// 利用者の貸出履歴も合わせて削除される。
///
/// # エラー
/// - UserNotFound: 名前に一致する利用者がいない（ストアは変更されない）
pub async fn delete_user(deps: &ServiceDependencies, cmd: DeleteUser) -> Result<()> {
    let user = deps
        .user_repository
        .find_by_name(&cmd.name)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?
        .ok_or(LibraryApplicationError::UserNotFound)?;

    deps.user_repository
        .delete(user.id)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?;

    tracing::info!(user_id = %user.id.value(), "user deleted");
    Ok(())
}

/// 全利用者の貸出履歴を取得する
///
/// 貸出履歴のない利用者も`books: []`として含まれる。
pub async fn get_user_loan_histories(
    deps: &ServiceDependencies,
) -> Result<Vec<UserLoanHistoryResponse>> {
    let views = deps
        .user_repository
        .find_all_with_histories()
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?;

    Ok(views
        .into_iter()
        .map(UserLoanHistoryResponse::from)
        .collect())
}
