//! Borrow (loan cycle) model and fine arithmetic

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One loan cycle for a student: created on borrow, closed on return
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    /// Fine charged at return time; None while the loan is open
    pub fine: Option<Decimal>,
}

impl Borrow {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Borrow with book details for history listings.
/// The book title is optional: a history row may outlive its book.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: Option<String>,
    pub book_author: Option<String>,
    pub book_isbn: Option<String>,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub fine: Option<Decimal>,
    pub is_overdue: bool,
}

/// Whole days overdue at `at`, never negative. A return on the due date
/// itself counts as on time.
pub fn days_overdue(due_date: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    (at.date_naive() - due_date.date_naive()).num_days().max(0)
}

/// Fine owed for a return at `at`: days overdue times the per-day rate
pub fn fine_amount(due_date: DateTime<Utc>, at: DateTime<Utc>, per_day: Decimal) -> Decimal {
    per_day * Decimal::from(days_overdue(due_date, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn on_time_return_has_no_fine() {
        let rate = Decimal::new(10, 0);
        assert_eq!(fine_amount(due(), due(), rate), Decimal::ZERO);
        // Later the same day still counts as on time
        assert_eq!(
            fine_amount(due(), due() + Duration::hours(8), rate),
            Decimal::ZERO
        );
    }

    #[test]
    fn early_return_has_no_fine() {
        let rate = Decimal::new(10, 0);
        assert_eq!(fine_amount(due(), due() - Duration::days(3), rate), Decimal::ZERO);
    }

    #[test]
    fn one_day_late_charges_one_day_rate() {
        let rate = Decimal::new(10, 0);
        assert_eq!(days_overdue(due(), due() + Duration::days(1)), 1);
        assert_eq!(fine_amount(due(), due() + Duration::days(1), rate), rate);
    }

    #[test]
    fn n_days_late_charges_n_times_rate() {
        let rate = Decimal::new(5, 1); // 0.5 per day
        let fine = fine_amount(due(), due() + Duration::days(9), rate);
        assert_eq!(fine, Decimal::new(45, 1)); // 4.5
    }

    #[test]
    fn fractional_days_round_down_to_whole_days() {
        // 23 hours past due but the calendar day has advanced: one day
        let at = due() + Duration::hours(23);
        assert_eq!(days_overdue(due(), at), 1);
        // Same calendar day, hours later: zero days
        let at = due() + Duration::hours(5);
        assert_eq!(days_overdue(due(), at), 0);
    }
}
