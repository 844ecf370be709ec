use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::AppError;

/// Day-off type that draws down the vacation balance.
pub const PAID_VACATION_TYPE_ID: u16 = 1;

/// Prefix of the human-facing letter code.
pub const CODE_PREFIX: &str = "DXN";

/// `DXN` followed by the id zero-padded to six digits.
pub fn letter_code(id: u64) -> String {
    format!("{CODE_PREFIX}{id:06}")
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum LetterStatus {
    Draft = 1,
    Pending = 2,
    Approved = 3,
    Rejected = 4,
}

impl LetterStatus {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Draft),
            2 => Some(Self::Pending),
            3 => Some(Self::Approved),
            4 => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum OffType {
    Morning = 1,
    Afternoon = 2,
    FullDay = 3,
}

impl OffType {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Result<Self, AppError> {
        match id {
            1 => Ok(Self::Morning),
            2 => Ok(Self::Afternoon),
            3 => Ok(Self::FullDay),
            other => Err(AppError::InvalidOffType(other)),
        }
    }

    pub fn is_half_day(self) -> bool {
        matches!(self, Self::Morning | Self::Afternoon)
    }
}

/// Raw `letters` row as stored.
#[derive(Debug, sqlx::FromRow)]
pub struct LetterRow {
    pub id: u64,
    pub code: String,
    pub creator_id: u64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub days_off: Decimal,
    pub reason: Option<String>,
    pub day_off_type_id: u16,
    pub off_type_id: u8,
    pub replace_person: Option<String>,
    pub status_id: u8,
    pub approver_id: u64,
    pub create_date: NaiveDateTime,
    pub approval_date: Option<NaiveDateTime>,
}

/// A leave letter with its status and off type decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Letter {
    pub id: u64,
    pub code: String,
    pub creator_id: u64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub days_off: Decimal,
    pub reason: String,
    pub day_off_type_id: u16,
    pub off_type: OffType,
    pub replace_person: String,
    pub status: LetterStatus,
    /// 0 while undecided.
    pub approver_id: u64,
    pub create_date: NaiveDateTime,
    /// `None` while undecided.
    pub approval_date: Option<NaiveDateTime>,
}

impl Letter {
    pub fn is_paid_vacation(&self) -> bool {
        self.day_off_type_id == PAID_VACATION_TYPE_ID
    }

    /// Id of whoever made the current decision, if any.
    pub fn decided_by(&self) -> Option<u64> {
        (self.approver_id != 0).then_some(self.approver_id)
    }

    /// Inclusive range intersection.
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.from_date <= to && self.to_date >= from
    }
}

impl TryFrom<LetterRow> for Letter {
    type Error = AppError;

    fn try_from(row: LetterRow) -> Result<Self, Self::Error> {
        let status = LetterStatus::from_id(row.status_id).ok_or_else(|| {
            AppError::Internal(format!(
                "letter {} has unknown status_id {}",
                row.id, row.status_id
            ))
        })?;
        let off_type = OffType::from_id(row.off_type_id).map_err(|_| {
            AppError::Internal(format!(
                "letter {} has unknown off_type_id {}",
                row.id, row.off_type_id
            ))
        })?;

        Ok(Letter {
            id: row.id,
            code: row.code,
            creator_id: row.creator_id,
            from_date: row.from_date,
            to_date: row.to_date,
            days_off: row.days_off,
            reason: row.reason.unwrap_or_default(),
            day_off_type_id: row.day_off_type_id,
            off_type,
            replace_person: row.replace_person.unwrap_or_default(),
            status,
            approver_id: row.approver_id,
            create_date: row.create_date,
            approval_date: row.approval_date,
        })
    }
}
