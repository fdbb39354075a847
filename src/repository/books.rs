//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::not_found(ErrorCode::NoSuchBook, format!("Book with id {} not found", id))
            })
    }

    /// Search books with optional filters and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT *
            FROM books
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR author ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR isbn = $3)
              AND ($4::text IS NULL OR category = $4)
              AND ($5::text IS NULL OR department = $5)
              AND ($6::text IS NULL OR course = $6)
              AND (NOT $7 OR available_copies > 0)
            ORDER BY title
            LIMIT $8 OFFSET $9
            "#,
        )
        .bind(&query.title)
        .bind(&query.author)
        .bind(&query.isbn)
        .bind(&query.category)
        .bind(&query.department)
        .bind(&query.course)
        .bind(query.available.unwrap_or(false))
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM books
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR author ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR isbn = $3)
              AND ($4::text IS NULL OR category = $4)
              AND ($5::text IS NULL OR department = $5)
              AND ($6::text IS NULL OR course = $6)
              AND (NOT $7 OR available_copies > 0)
            "#,
        )
        .bind(&query.title)
        .bind(&query.author)
        .bind(&query.isbn)
        .bind(&query.category)
        .bind(&query.department)
        .bind(&query.course)
        .bind(query.available.unwrap_or(false))
        .fetch_one(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Create a new book; all copies start available
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let copies = book.total_copies.unwrap_or(1);

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, category, department, course,
                               semester, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(&book.department)
        .bind(&book.course)
        .bind(book.semester)
        .bind(copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a book. Raising total_copies grows the available pool by the
    /// same amount; shrinking clamps available_copies so it never exceeds
    /// the new total.
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                isbn = COALESCE($4, isbn),
                category = COALESCE($5, category),
                department = COALESCE($6, department),
                course = COALESCE($7, course),
                semester = COALESCE($8, semester),
                available_copies = LEAST(
                    GREATEST(available_copies + COALESCE($9, total_copies) - total_copies, 0),
                    COALESCE($9, total_copies)
                ),
                total_copies = COALESCE($9, total_copies),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(&book.department)
        .bind(&book.course)
        .bind(book.semester)
        .bind(book.total_copies)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::not_found(ErrorCode::NoSuchBook, format!("Book with id {} not found", id))
        })?;

        Ok(updated)
    }

    /// Delete a book. History rows keep their book_id and go dangling,
    /// matching the lookup-tolerant model.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                ErrorCode::NoSuchBook,
                format!("Book with id {} not found", id),
            ));
        }

        Ok(())
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
