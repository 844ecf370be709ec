//! Repository for the `letters` table.
//!
//! Writes take a `&mut MySqlConnection` so the handler can run them inside
//! the transaction that holds the row locks. Status writes are conditional
//! on the status the workflow planned from.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::access::Scope;
use crate::error::{AppError, AppResult};
use crate::model::letter::{Letter, LetterRow, LetterStatus, letter_code};
use crate::workflow::{CreatePlan, LetterContent, Transition};

/// Column list for `letters` queries.
const COLUMNS: &str = "\
    id, code, creator_id, from_date, to_date, days_off, reason, \
    day_off_type_id, off_type_id, replace_person, status_id, approver_id, \
    create_date, approval_date";

/// Letter columns plus display names, for views and exports.
const VIEW_SELECT: &str = "\
    SELECT l.id, l.code, l.creator_id, l.from_date, l.to_date, l.days_off, l.reason, \
           l.day_off_type_id, l.off_type_id, l.replace_person, l.status_id, l.approver_id, \
           l.create_date, l.approval_date, \
           COALESCE(ce.name, '') AS creator_name, \
           COALESCE(ae.name, '') AS approver_name, \
           COALESCE(t.name, '') AS day_off_type_name \
    FROM letters l \
    LEFT JOIN employees ce ON ce.id = l.creator_id \
    LEFT JOIN employees ae ON ae.id = l.approver_id \
    LEFT JOIN day_off_types t ON t.id = l.day_off_type_id";

/// Delegation test used to scope lists for non-managers.
const DELEGATED_TO: &str = "\
    EXISTS (SELECT 1 FROM employee_configs c \
            WHERE c.employee_id = l.creator_id \
              AND ? IN (c.approver1_id, c.approver2_id, c.approver3_id))";

/// Maximum page size for letter listing.
pub const MAX_PER_PAGE: u64 = 100;

/// `(limit, offset)` for a 1-based page. Pages past the end saturate
/// instead of overflowing.
fn page_window(page: u64, per_page: u64) -> (u64, u64) {
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let offset = (page.max(1) - 1).saturating_mul(per_page);
    (per_page, offset)
}

/// A letter joined with the names the client displays.
#[derive(Debug, sqlx::FromRow)]
pub struct LetterViewRow {
    #[sqlx(flatten)]
    pub letter: LetterRow,
    pub creator_name: String,
    pub approver_name: String,
    pub day_off_type_name: String,
}

/// Provides persistence for leave letters.
pub struct LetterRepo;

impl LetterRepo {
    /// Lock a letter row for the rest of the transaction.
    pub async fn find_for_update(conn: &mut MySqlConnection, id: u64) -> AppResult<Option<Letter>> {
        let query = format!("SELECT {COLUMNS} FROM letters WHERE id = ? FOR UPDATE");
        sqlx::query_as::<_, LetterRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(Letter::try_from)
            .transpose()
    }

    /// The creator's letters whose range intersects `[from, to]`,
    /// rejected ones excluded.
    pub async fn find_overlapping(
        conn: &mut MySqlConnection,
        creator_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<Letter>> {
        let query = format!(
            "SELECT {COLUMNS} FROM letters \
             WHERE creator_id = ? AND status_id <> ? AND from_date <= ? AND to_date >= ?"
        );
        sqlx::query_as::<_, LetterRow>(&query)
            .bind(creator_id)
            .bind(LetterStatus::Rejected.id())
            .bind(to)
            .bind(from)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(Letter::try_from)
            .collect()
    }

    /// Insert a planned letter and stamp its code in the same transaction.
    /// Returns `(id, code)`.
    pub async fn insert(conn: &mut MySqlConnection, plan: &CreatePlan) -> AppResult<(u64, String)> {
        let content = &plan.content;
        let result = sqlx::query(
            "INSERT INTO letters \
                (creator_id, from_date, to_date, days_off, reason, day_off_type_id, \
                 off_type_id, replace_person, status_id, approver_id, create_date, approval_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, NULL)",
        )
        .bind(plan.creator_id)
        .bind(content.from_date)
        .bind(content.to_date)
        .bind(content.days_off)
        .bind(&content.reason)
        .bind(content.day_off_type_id)
        .bind(content.off_type.id())
        .bind(&content.replace_person)
        .bind(plan.status.id())
        .bind(plan.create_date)
        .execute(&mut *conn)
        .await?;

        let id = result.last_insert_id();
        let code = letter_code(id);
        sqlx::query("UPDATE letters SET code = ? WHERE id = ?")
            .bind(&code)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok((id, code))
    }

    /// Overwrite a draft's content.
    pub async fn update_content(
        conn: &mut MySqlConnection,
        id: u64,
        content: &LetterContent,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE letters \
             SET from_date = ?, to_date = ?, days_off = ?, reason = ?, day_off_type_id = ?, \
                 off_type_id = ?, replace_person = ? \
             WHERE id = ? AND status_id = ?",
        )
        .bind(content.from_date)
        .bind(content.to_date)
        .bind(content.days_off)
        .bind(&content.reason)
        .bind(content.day_off_type_id)
        .bind(content.off_type.id())
        .bind(&content.replace_person)
        .bind(id)
        .bind(LetterStatus::Draft.id())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidStateTransition(
                "Letter is no longer a draft".into(),
            ));
        }
        Ok(())
    }

    /// Persist a planned transition. Fails if the letter left `t.from`
    /// since it was read.
    pub async fn apply_transition(conn: &mut MySqlConnection, t: &Transition) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE letters SET status_id = ?, approver_id = ?, approval_date = ? \
             WHERE id = ? AND status_id = ?",
        )
        .bind(t.to.id())
        .bind(t.approver_id)
        .bind(t.approval_date)
        .bind(t.letter_id)
        .bind(t.from.id())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidStateTransition(format!(
                "Letter {} is no longer {}",
                t.letter_id, t.from
            )));
        }
        Ok(())
    }

    pub async fn delete_draft(conn: &mut MySqlConnection, id: u64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM letters WHERE id = ? AND status_id = ?")
            .bind(id)
            .bind(LetterStatus::Draft.id())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidStateTransition(
                "Only draft letters can be deleted".into(),
            ));
        }
        Ok(())
    }

    pub async fn find_view(pool: &MySqlPool, id: u64) -> AppResult<Option<LetterViewRow>> {
        let query = format!("{VIEW_SELECT} WHERE l.id = ?");
        Ok(sqlx::query_as::<_, LetterViewRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// One page of letters visible in `scope`, newest first, with the
    /// total count for the same filter.
    pub async fn list(
        pool: &MySqlPool,
        scope: Scope,
        status: Option<LetterStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<LetterViewRow>, i64)> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<u64> = Vec::new();

        if let Scope::OwnAndDelegated(employee_id) = scope {
            where_sql.push_str(&format!(" AND (l.creator_id = ? OR {DELEGATED_TO})"));
            args.push(employee_id);
            args.push(employee_id);
        }

        if let Some(status) = status {
            where_sql.push_str(" AND l.status_id = ?");
            args.push(u64::from(status.id()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM letters l{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = count_q.bind(*arg);
        }
        let total = count_q.fetch_one(pool).await?;

        let data_sql = format!("{VIEW_SELECT}{where_sql} ORDER BY l.id DESC LIMIT ? OFFSET ?");
        let mut data_q = sqlx::query_as::<_, LetterViewRow>(&data_sql);
        for arg in args {
            data_q = data_q.bind(arg);
        }
        let (per_page, offset) = page_window(page, per_page);
        let rows = data_q.bind(per_page).bind(offset).fetch_all(pool).await?;

        Ok((rows, total))
    }

    /// Decided letters lying entirely inside `[first, last]`.
    pub async fn decided_within(
        pool: &MySqlPool,
        first: NaiveDate,
        last: NaiveDate,
    ) -> AppResult<Vec<LetterViewRow>> {
        let query = format!(
            "{VIEW_SELECT} WHERE l.status_id IN (?, ?) AND l.from_date >= ? AND l.to_date <= ? \
             ORDER BY l.from_date, l.id"
        );
        Ok(sqlx::query_as::<_, LetterViewRow>(&query)
            .bind(LetterStatus::Approved.id())
            .bind(LetterStatus::Rejected.id())
            .bind(first)
            .bind(last)
            .fetch_all(pool)
            .await?)
    }

    /// Days of approved, salary-affecting leave starting in `year`.
    pub async fn approved_salary_days_in_year(
        pool: &MySqlPool,
        employee_id: u64,
        year: i32,
    ) -> AppResult<Decimal> {
        let total = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(l.days_off) FROM letters l \
             JOIN day_off_types t ON t.id = l.day_off_type_id \
             WHERE l.creator_id = ? AND l.status_id = ? AND t.tinh_luong = 1 \
               AND YEAR(l.from_date) = ?",
        )
        .bind(employee_id)
        .bind(LetterStatus::Approved.id())
        .bind(year)
        .fetch_one(pool)
        .await?;

        Ok(total.unwrap_or_default())
    }
}
