//! Authorization decisions for letters.
//!
//! Viewing and deciding are separate questions. Anybody in the creator's
//! delegation chain may view a letter, but deciding follows the override
//! ladder: a tier may decide an undecided letter or reverse a decision made
//! by a strictly lower tier, never its own or a higher one. Managers sit
//! outside the ladder and may always decide.

use serde::Serialize;

use crate::error::AppError;
use crate::model::employee_config::{ApproverChain, ApproverTier};
use crate::model::letter::Letter;
use crate::model::role::Role;

/// The authenticated identity the resolver reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub employee_id: u64,
    pub role: Role,
}

impl Caller {
    pub fn is_manager(&self) -> bool {
        is_manager(self.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Authority {
    pub allowed: bool,
}

/// Which letters `GET /letters` may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Own letters plus letters of employees that delegate to this one.
    OwnAndDelegated(u64),
}

pub fn is_manager(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Manager)
}

pub fn visibility_scope(caller: &Caller) -> Scope {
    if caller.is_manager() {
        Scope::All
    } else {
        Scope::OwnAndDelegated(caller.employee_id)
    }
}

/// Whether the caller may see the letter at all.
pub fn can_act_on_letter(caller: &Caller, letter: &Letter, chain: &ApproverChain) -> bool {
    caller.is_manager() || caller.employee_id == letter.creator_id || chain.contains(caller.employee_id)
}

/// Where the letter sits on the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Undecided,
    ByTier(ApproverTier),
    /// Decided by someone outside the chain, i.e. a manager.
    Outside,
}

fn current_decision(letter: &Letter, chain: &ApproverChain) -> Decision {
    match letter.decided_by() {
        None => Decision::Undecided,
        Some(decider) => chain
            .highest_tier_of(decider)
            .map_or(Decision::Outside, Decision::ByTier),
    }
}

/// Any tier the caller occupies that outranks the current decision
/// grants authority.
fn override_ladder(caller_id: u64, chain: &ApproverChain, decision: Decision) -> bool {
    chain.tiers_of(caller_id).into_iter().any(|tier| match decision {
        Decision::Undecided => true,
        Decision::ByTier(decided) => tier > decided,
        Decision::Outside => false,
    })
}

/// Decides whether the caller may approve or reject the letter.
///
/// Re-deciding one's own decision fails with `Forbidden` instead of
/// returning `allowed: false`.
pub fn resolve_approval_authority(
    caller: &Caller,
    letter: &Letter,
    chain: &ApproverChain,
) -> Result<Authority, AppError> {
    if caller.is_manager() {
        return Ok(Authority { allowed: true });
    }

    if letter.decided_by() == Some(caller.employee_id) {
        return Err(AppError::Forbidden(format!(
            "Letter {} was decided by you; it cannot be overridden by the same approver",
            letter.code
        )));
    }

    let allowed = override_ladder(caller.employee_id, chain, current_decision(letter, chain));
    Ok(Authority { allowed })
}

pub fn require_approval_authority(
    caller: &Caller,
    letter: &Letter,
    chain: &ApproverChain,
) -> Result<(), AppError> {
    if resolve_approval_authority(caller, letter, chain)?.allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You are not allowed to decide letter {}",
            letter.code
        )))
    }
}

/// `canApprove` flag for the detail view.
pub fn can_approve(caller: &Caller, letter: &Letter, chain: &ApproverChain) -> bool {
    resolve_approval_authority(caller, letter, chain).is_ok_and(|a| a.allowed)
}
