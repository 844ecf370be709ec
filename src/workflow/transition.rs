//! Letter status transition table and the balance effect of each move.
//!
//! Valid transitions:
//! - Draft → Pending (submit)
//! - Pending → Approved (approve)
//! - Pending → Rejected (reject)
//! - Rejected → Approved (approve, override)
//! - Approved → Rejected (reject, override)

use rust_decimal::Decimal;
use strum_macros::Display;

use crate::error::{AppError, AppResult};
use crate::ledger::BalanceAdjustment;
use crate::model::letter::LetterStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LetterAction {
    Submit,
    Approve,
    Reject,
}

/// Status reached by applying `action` to a letter in `from`.
pub fn next_status(from: LetterStatus, action: LetterAction) -> AppResult<LetterStatus> {
    use LetterAction::*;
    use LetterStatus::*;

    match (from, action) {
        (Draft, Submit) => Ok(Pending),
        (Pending | Rejected, Approve) => Ok(Approved),
        (Pending | Approved, Reject) => Ok(Rejected),
        _ => Err(AppError::InvalidStateTransition(format!(
            "Cannot {action} a letter that is {from}"
        ))),
    }
}

/// Ledger movement caused by a paid-vacation letter moving `from` → `to`.
///
/// Every debit has exactly one matching credit on the way back, so a
/// letter's adjustments net to zero when it ends rejected and to
/// `-days_off` when it ends approved.
pub fn balance_effect(
    from: LetterStatus,
    to: LetterStatus,
    days_off: Decimal,
    paid_vacation: bool,
) -> Option<BalanceAdjustment> {
    use LetterStatus::*;

    if !paid_vacation {
        return None;
    }
    match (from, to) {
        (Draft, Pending) | (Rejected, Approved) => Some(BalanceAdjustment::Debit(days_off)),
        (Pending | Approved, Rejected) => Some(BalanceAdjustment::Credit(days_off)),
        _ => None,
    }
}
