//! Circulation service: the borrow/return workflow.
//!
//! Preconditions (role, department/course tags, existence) are checked
//! here; the availability flip and history write happen atomically in the
//! repository transaction.

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult, ErrorCode},
    models::{
        borrow::{Borrow, BorrowDetails},
        user::Role,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    config: CirculationConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow a book for the given student
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<Borrow> {
        let user = self.repository.users.get_by_id(user_id).await?;

        if user.role != Role::Student {
            return Err(AppError::rule(
                ErrorCode::RoleMismatch,
                "Only students can borrow books",
            ));
        }

        let book = self.repository.books.get_by_id(book_id).await?;

        if !book.lendable_to(&user) {
            return Err(AppError::rule(
                ErrorCode::DepartmentMismatch,
                "This book is reserved for another department or course",
            ));
        }

        let borrow = self
            .repository
            .borrows
            .borrow(user_id, book_id, self.config.loan_period_days)
            .await?;

        tracing::info!(
            user_id,
            book_id,
            due_date = %borrow.due_date,
            "book borrowed"
        );

        Ok(borrow)
    }

    /// Return a borrowed book, charging any overdue fine
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<Borrow> {
        let user = self.repository.users.get_by_id(user_id).await?;

        if user.role != Role::Student {
            return Err(AppError::rule(
                ErrorCode::RoleMismatch,
                "Only students can return books",
            ));
        }

        let closed = self
            .repository
            .borrows
            .return_book(user_id, book_id, self.config.fine_per_day)
            .await?;

        tracing::info!(user_id, book_id, fine = ?closed.fine, "book returned");

        Ok(closed)
    }

    /// Get a user's borrow history
    pub async fn get_user_borrows(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.borrows.get_user_borrows(user_id).await
    }

    /// Count open borrows
    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.borrows.count_active().await
    }

    /// Count overdue borrows
    pub async fn count_overdue(&self) -> AppResult<i64> {
        self.repository.borrows.count_overdue().await
    }

    /// Current circulation settings
    pub fn settings(&self) -> &CirculationConfig {
        &self.config
    }
}
