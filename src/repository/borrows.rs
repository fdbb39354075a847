//! Borrows repository: the borrow/return workflow transactions.
//!
//! Both operations pair the book-availability change with the history
//! write in a single database transaction, and the availability decrement
//! re-checks the copy count under the transaction so a concurrent borrow
//! of the last copy cannot oversubscribe it.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::borrow::{fine_amount, Borrow, BorrowDetails},
};

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a user's full borrow history, oldest first.
    /// Book columns come from a LEFT JOIN: history survives book deletion.
    pub async fn get_user_borrows(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT br.id, br.book_id, br.borrow_date, br.due_date,
                   br.return_date, br.fine,
                   b.title AS book_title, b.author AS book_author, b.isbn AS book_isbn
            FROM borrows br
            LEFT JOIN books b ON b.id = br.book_id
            WHERE br.user_id = $1
            ORDER BY br.borrow_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();

        let result = rows
            .into_iter()
            .map(|row| {
                let due_date = row.get("due_date");
                let return_date = row.get("return_date");
                BorrowDetails {
                    id: row.get("id"),
                    book_id: row.get("book_id"),
                    book_title: row.get("book_title"),
                    book_author: row.get("book_author"),
                    book_isbn: row.get("book_isbn"),
                    borrow_date: row.get("borrow_date"),
                    due_date,
                    return_date,
                    fine: row.get("fine"),
                    is_overdue: return_date.is_none() && due_date < now,
                }
            })
            .collect();

        Ok(result)
    }

    /// Borrow a book: decrement the available-copy count and append the
    /// history row in one transaction. Availability is revalidated by the
    /// guarded UPDATE; the caller has already checked role and tags.
    pub async fn borrow(
        &self,
        user_id: i32,
        book_id: i32,
        loan_period_days: i64,
    ) -> AppResult<Borrow> {
        let now = Utc::now();
        let due_date = now + Duration::days(loan_period_days);

        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Err(AppError::not_found(
                ErrorCode::NoSuchBook,
                format!("Book with id {} not found", book_id),
            ));
        }

        let already_open: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrows WHERE user_id = $1 AND book_id = $2 AND return_date IS NULL)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_open {
            return Err(AppError::rule(
                ErrorCode::AlreadyBorrowed,
                "You already have this book on loan",
            ));
        }

        // Guarded decrement: zero rows means someone took the last copy
        let updated = sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1, updated_at = NOW() \
             WHERE id = $1 AND available_copies > 0",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::rule(
                ErrorCode::BookNotAvailable,
                "No copies of this book are available",
            ));
        }

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (user_id, book_id, borrow_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(borrow)
    }

    /// Return a book: close the open history row, charge the fine, grow the
    /// student's balance and release the copy, all in one transaction.
    pub async fn return_book(
        &self,
        user_id: i32,
        book_id: i32,
        fine_per_day: Decimal,
    ) -> AppResult<Borrow> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let open = sqlx::query_as::<_, Borrow>(
            r#"
            SELECT * FROM borrows
            WHERE user_id = $1 AND book_id = $2 AND return_date IS NULL
            ORDER BY borrow_date
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::rule(
                ErrorCode::NoOpenBorrow,
                "No open borrow of this book to return",
            )
        })?;

        let fine = fine_amount(open.due_date, now, fine_per_day);

        let closed = sqlx::query_as::<_, Borrow>(
            "UPDATE borrows SET return_date = $2, fine = $3 WHERE id = $1 RETURNING *",
        )
        .bind(open.id)
        .bind(now)
        .bind(fine)
        .fetch_one(&mut *tx)
        .await?;

        if fine > Decimal::ZERO {
            sqlx::query("UPDATE users SET fines = fines + $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(fine)
                .execute(&mut *tx)
                .await?;
        }

        // The book may have been deleted while on loan; releasing the copy
        // is then a no-op.
        sqlx::query(
            "UPDATE books SET available_copies = LEAST(available_copies + 1, total_copies), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(closed)
    }

    /// Count open borrows
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrows WHERE return_date IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count open borrows past their due date
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrows WHERE return_date IS NULL AND due_date < NOW()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
