//! Validation rules shared by letter creation and editing.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::letter::{Letter, LetterStatus, OffType};

/// No letter may start or end on this weekday.
pub const NON_WORKING_DAY: Weekday = Weekday::Sun;

/// Longest inclusive span a single letter may cover; `days_off` is
/// stored as `DECIMAL(4,1)`.
pub const MAX_SPAN_DAYS: i64 = 999;

/// Deployment switches for the letter workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterPolicy {
    /// Letters start as drafts and must be submitted explicitly.
    pub draft_mode: bool,
    pub reason_required: bool,
}

impl Default for LetterPolicy {
    fn default() -> Self {
        Self {
            draft_mode: false,
            reason_required: true,
        }
    }
}

impl From<&Config> for LetterPolicy {
    fn from(config: &Config) -> Self {
        Self {
            draft_mode: config.letter_draft_mode,
            reason_required: config.letter_reason_required,
        }
    }
}

/// Half-day off types always count 0.5, full days count the inclusive span.
pub fn count_days_off(off_type: OffType, from: NaiveDate, to: NaiveDate) -> Decimal {
    if off_type.is_half_day() {
        Decimal::new(5, 1)
    } else {
        Decimal::from((to - from).num_days() + 1)
    }
}

pub fn validate_range(from: NaiveDate, to: NaiveDate) -> AppResult<()> {
    if from > to {
        return Err(AppError::InvalidDate(
            "fromDate cannot be after toDate".into(),
        ));
    }
    if (to - from).num_days() + 1 > MAX_SPAN_DAYS {
        return Err(AppError::InvalidDate(format!(
            "A letter cannot span more than {MAX_SPAN_DAYS} days"
        )));
    }
    for (label, date) in [("fromDate", from), ("toDate", to)] {
        if date.weekday() == NON_WORKING_DAY {
            return Err(AppError::InvalidDate(format!(
                "{label} {date} falls on a Sunday"
            )));
        }
    }
    Ok(())
}

/// Rejects the range if any other non-rejected letter in `others`
/// intersects it. `exclude` skips the letter being edited.
pub fn ensure_no_overlap(
    from: NaiveDate,
    to: NaiveDate,
    others: &[Letter],
    exclude: Option<u64>,
) -> AppResult<()> {
    let clash = others.iter().find(|l| {
        Some(l.id) != exclude && l.status != LetterStatus::Rejected && l.overlaps(from, to)
    });
    match clash {
        Some(existing) => Err(AppError::OverlapConflict(format!(
            "{from}..{to} overlaps letter {} ({}..{})",
            existing.code, existing.from_date, existing.to_date
        ))),
        None => Ok(()),
    }
}

pub fn ensure_balance(days_off: Decimal, vacation_day: Decimal) -> AppResult<()> {
    if days_off > vacation_day {
        return Err(AppError::InsufficientBalance(format!(
            "Requested {days_off} day(s) but only {vacation_day} vacation day(s) remain"
        )));
    }
    Ok(())
}

/// Trimmed reason; empty is refused when the policy requires one.
pub fn normalize_reason(policy: &LetterPolicy, reason: Option<&str>) -> AppResult<String> {
    let reason = reason.map(str::trim).unwrap_or_default();
    if policy.reason_required && reason.is_empty() {
        return Err(AppError::InvalidInput("reason is required".into()));
    }
    Ok(reason.to_string())
}
