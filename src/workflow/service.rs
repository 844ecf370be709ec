//! Letter workflow: turns a request plus the locked records into a plan
//! the handler persists inside the same transaction.
//!
//! Nothing here touches the database. Each `plan_*` method checks
//! authority, validates, walks the transition table and runs the ledger
//! arithmetic, so a returned plan is already known to be legal.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::access::{self, Caller};
use crate::error::{AppError, AppResult};
use crate::ledger::BalanceAdjustment;
use crate::model::day_off_type::DayOffType;
use crate::model::employee_config::BalanceConfig;
use crate::model::letter::{Letter, LetterStatus, OffType, PAID_VACATION_TYPE_ID};
use crate::workflow::policy::{self, LetterPolicy};
use crate::workflow::transition::{self, LetterAction};

/// Fields a creator supplies on create or edit.
#[derive(Debug, Clone)]
pub struct LetterInput {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub day_off_type_id: u16,
    pub off_type_id: u8,
    pub reason: Option<String>,
    pub replace_person: Option<String>,
    /// Requested initial status; honoured only in draft mode.
    pub status_id: Option<u8>,
}

/// Validated, derived letter content.
#[derive(Debug, Clone, PartialEq)]
pub struct LetterContent {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub days_off: Decimal,
    pub reason: String,
    pub day_off_type_id: u16,
    pub off_type: OffType,
    pub replace_person: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePlan {
    pub creator_id: u64,
    pub content: LetterContent,
    pub status: LetterStatus,
    pub create_date: NaiveDateTime,
    pub adjustment: Option<BalanceAdjustment>,
    /// New `vacation_day` when `adjustment` is set.
    pub balance_after: Option<Decimal>,
}

/// A status change on an existing letter.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub letter_id: u64,
    pub from: LetterStatus,
    pub to: LetterStatus,
    pub approver_id: u64,
    pub approval_date: Option<NaiveDateTime>,
    pub adjustment: Option<BalanceAdjustment>,
    pub balance_after: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LetterWorkflow {
    policy: LetterPolicy,
}

impl LetterWorkflow {
    pub fn new(policy: LetterPolicy) -> Self {
        Self { policy }
    }

    /// Validates a new letter. `others` holds the creator's letters that
    /// intersect the requested range; `config` is the creator's locked
    /// balance row.
    pub fn plan_create(
        &self,
        creator_id: u64,
        input: &LetterInput,
        day_off_type: Option<&DayOffType>,
        config: Option<&BalanceConfig>,
        others: &[Letter],
        now: NaiveDateTime,
    ) -> AppResult<CreatePlan> {
        let status = self.initial_status(input.status_id)?;
        let content = self.validate(creator_id, input, day_off_type, config, others, None)?;

        let (adjustment, balance_after) = apply_effect(
            creator_id,
            transition::balance_effect(
                LetterStatus::Draft,
                status,
                content.days_off,
                content.day_off_type_id == PAID_VACATION_TYPE_ID,
            ),
            config,
        )?;

        Ok(CreatePlan {
            creator_id,
            content,
            status,
            create_date: now,
            adjustment,
            balance_after,
        })
    }

    /// Recomputes a draft's content. The balance is only checked, never
    /// moved, until the draft is submitted.
    pub fn plan_edit(
        &self,
        caller: &Caller,
        letter: &Letter,
        input: &LetterInput,
        day_off_type: Option<&DayOffType>,
        config: Option<&BalanceConfig>,
        others: &[Letter],
    ) -> AppResult<LetterContent> {
        ensure_creator(caller, letter, "edit")?;
        ensure_draft(letter, "edited")?;
        self.validate(
            letter.creator_id,
            input,
            day_off_type,
            config,
            others,
            Some(letter.id),
        )
    }

    pub fn plan_submit(
        &self,
        caller: &Caller,
        letter: &Letter,
        config: Option<&BalanceConfig>,
    ) -> AppResult<Transition> {
        ensure_creator(caller, letter, "submit")?;
        let to = transition::next_status(letter.status, LetterAction::Submit)?;
        if letter.is_paid_vacation() {
            let config = require_config(letter.creator_id, config)?;
            policy::ensure_balance(letter.days_off, config.vacation_day)?;
        }
        let (adjustment, balance_after) = apply_effect(
            letter.creator_id,
            transition::balance_effect(letter.status, to, letter.days_off, letter.is_paid_vacation()),
            config,
        )?;

        Ok(Transition {
            letter_id: letter.id,
            from: letter.status,
            to,
            approver_id: letter.approver_id,
            approval_date: letter.approval_date,
            adjustment,
            balance_after,
        })
    }

    /// Approve or reject, including overrides of an earlier decision.
    ///
    /// Authority is checked before the status so an approver who lost
    /// their right to act gets `Forbidden`; a caller who may act but finds
    /// the letter already in the target state gets
    /// `InvalidStateTransition`. `others` is only consulted when a
    /// rejected letter is revived.
    pub fn plan_decision(
        &self,
        caller: &Caller,
        letter: &Letter,
        config: Option<&BalanceConfig>,
        action: LetterAction,
        others: &[Letter],
        now: NaiveDateTime,
    ) -> AppResult<Transition> {
        if action == LetterAction::Submit {
            return self.plan_submit(caller, letter, config);
        }

        let chain = config.map(BalanceConfig::approver_chain).unwrap_or_default();
        access::require_approval_authority(caller, letter, &chain)?;

        let to = transition::next_status(letter.status, action)?;
        if letter.status == LetterStatus::Rejected {
            // Revived letters must not collide with leave taken since.
            policy::ensure_no_overlap(letter.from_date, letter.to_date, others, Some(letter.id))?;
        }

        let (adjustment, balance_after) = apply_effect(
            letter.creator_id,
            transition::balance_effect(letter.status, to, letter.days_off, letter.is_paid_vacation()),
            config,
        )?;

        Ok(Transition {
            letter_id: letter.id,
            from: letter.status,
            to,
            approver_id: caller.employee_id,
            approval_date: Some(now),
            adjustment,
            balance_after,
        })
    }

    pub fn ensure_deletable(&self, caller: &Caller, letter: &Letter) -> AppResult<()> {
        ensure_creator(caller, letter, "delete")?;
        ensure_draft(letter, "deleted")
    }

    fn initial_status(&self, requested: Option<u8>) -> AppResult<LetterStatus> {
        if !self.policy.draft_mode {
            return Ok(LetterStatus::Pending);
        }
        match requested.map(LetterStatus::from_id) {
            None | Some(Some(LetterStatus::Draft)) => Ok(LetterStatus::Draft),
            Some(Some(LetterStatus::Pending)) => Ok(LetterStatus::Pending),
            _ => Err(AppError::InvalidInput(
                "statusId must be 1 (draft) or 2 (submit now)".into(),
            )),
        }
    }

    fn validate(
        &self,
        creator_id: u64,
        input: &LetterInput,
        day_off_type: Option<&DayOffType>,
        config: Option<&BalanceConfig>,
        others: &[Letter],
        exclude: Option<u64>,
    ) -> AppResult<LetterContent> {
        policy::validate_range(input.from_date, input.to_date)?;
        let off_type = OffType::from_id(input.off_type_id)?;
        match day_off_type {
            Some(t) if !t.deleted => {}
            _ => {
                return Err(AppError::InvalidInput(format!(
                    "Unknown day off type {}",
                    input.day_off_type_id
                )));
            }
        }
        let reason = policy::normalize_reason(&self.policy, input.reason.as_deref())?;
        policy::ensure_no_overlap(input.from_date, input.to_date, others, exclude)?;

        let days_off = policy::count_days_off(off_type, input.from_date, input.to_date);
        if input.day_off_type_id == PAID_VACATION_TYPE_ID {
            let config = require_config(creator_id, config)?;
            policy::ensure_balance(days_off, config.vacation_day)?;
        }

        Ok(LetterContent {
            from_date: input.from_date,
            to_date: input.to_date,
            days_off,
            reason,
            day_off_type_id: input.day_off_type_id,
            off_type,
            replace_person: input
                .replace_person
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

fn ensure_creator(caller: &Caller, letter: &Letter, verb: &str) -> AppResult<()> {
    if caller.employee_id != letter.creator_id {
        return Err(AppError::Forbidden(format!(
            "Only the creator can {verb} letter {}",
            letter.code
        )));
    }
    Ok(())
}

fn ensure_draft(letter: &Letter, participle: &str) -> AppResult<()> {
    if letter.status != LetterStatus::Draft {
        return Err(AppError::InvalidStateTransition(format!(
            "Only draft letters can be {participle}; letter {} is {}",
            letter.code, letter.status
        )));
    }
    Ok(())
}

fn require_config(employee_id: u64, config: Option<&BalanceConfig>) -> AppResult<&BalanceConfig> {
    config.ok_or_else(|| {
        AppError::NotFound(format!("No vacation balance configured for employee {employee_id}"))
    })
}

/// Runs an adjustment through the ledger against the locked balance.
fn apply_effect(
    employee_id: u64,
    adjustment: Option<BalanceAdjustment>,
    config: Option<&BalanceConfig>,
) -> AppResult<(Option<BalanceAdjustment>, Option<Decimal>)> {
    match adjustment {
        None => Ok((None, None)),
        Some(adjustment) => {
            let config = require_config(employee_id, config)?;
            let after = adjustment.apply(employee_id, config.vacation_day)?;
            Ok((Some(adjustment), Some(after)))
        }
    }
}
