//! Book (catalog entry) model and related types.
//!
//! Availability follows the copy-count model: a book is available while
//! `available_copies > 0`. Borrowing decrements the counter, returning
//! increments it back up to `total_copies`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::user::User;

/// Full book model (DB + API)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    /// Department/course/semester tags restrict who may borrow;
    /// an unset tag matches any student.
    pub department: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i16>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Whether this book's department/course tags admit the given student.
    /// A book with no tag on a dimension is open to everyone on it.
    pub fn lendable_to(&self, user: &User) -> bool {
        let dept_ok = match &self.department {
            Some(dept) => user.department.as_deref() == Some(dept.as_str()),
            None => true,
        };
        let course_ok = match &self.course {
            Some(course) => user.course.as_deref() == Some(course.as_str()),
            None => true,
        };
        dept_ok && course_ok
    }
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub course: Option<String>,
    /// Only list books with at least one available copy
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i16>,
    #[validate(range(min = 1, message = "At least one copy is required"))]
    pub total_copies: Option<i32>,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i16>,
    #[validate(range(min = 1, message = "At least one copy is required"))]
    pub total_copies: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use rust_decimal::Decimal;

    fn student(department: Option<&str>, course: Option<&str>) -> User {
        User {
            id: 1,
            email: "s@campus.edu".to_string(),
            display_name: None,
            password: None,
            role: Role::Student,
            avatar_url: None,
            department: department.map(String::from),
            course: course.map(String::from),
            semester: Some(3),
            fines: Decimal::ZERO,
            created_at: None,
            updated_at: None,
        }
    }

    fn book(department: Option<&str>, course: Option<&str>) -> Book {
        Book {
            id: 1,
            title: "Operating Systems".to_string(),
            author: None,
            isbn: None,
            category: None,
            department: department.map(String::from),
            course: course.map(String::from),
            semester: None,
            total_copies: 2,
            available_copies: 1,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn untagged_book_is_open_to_all() {
        assert!(book(None, None).lendable_to(&student(None, None)));
        assert!(book(None, None).lendable_to(&student(Some("CSE"), Some("BTech"))));
    }

    #[test]
    fn tagged_book_requires_matching_tags() {
        let b = book(Some("CSE"), Some("BTech"));
        assert!(b.lendable_to(&student(Some("CSE"), Some("BTech"))));
        assert!(!b.lendable_to(&student(Some("ECE"), Some("BTech"))));
        assert!(!b.lendable_to(&student(Some("CSE"), Some("MTech"))));
        assert!(!b.lendable_to(&student(None, None)));
    }

    #[test]
    fn partial_tags_only_constrain_their_dimension() {
        let b = book(Some("CSE"), None);
        assert!(b.lendable_to(&student(Some("CSE"), Some("anything"))));
        assert!(!b.lendable_to(&student(Some("ECE"), None)));
    }

    #[test]
    fn availability_follows_copy_count() {
        let mut b = book(None, None);
        assert!(b.is_available());
        b.available_copies = 0;
        assert!(!b.is_available());
    }
}
