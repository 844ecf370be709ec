//! Lifecycle scenarios driven through the workflow against an in-memory
//! desk that persists plans the way the handlers do.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::access::Caller;
use crate::error::AppError;
use crate::ledger::BalanceAdjustment;
use crate::model::day_off_type::DayOffType;
use crate::model::employee_config::BalanceConfig;
use crate::model::letter::{Letter, LetterStatus, letter_code};
use crate::model::role::Role;

const CREATOR: u64 = 10;
const A1: u64 = 21;
const A2: u64 = 22;
const A3: u64 = 23;
const BOSS: u64 = 1;
const OTHER_BOSS: u64 = 2;
const SICK_LEAVE: u16 = 2;

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn now() -> NaiveDateTime {
    d(6, 1).and_hms_opt(9, 30, 0).unwrap()
}

fn employee(id: u64) -> Caller {
    Caller {
        employee_id: id,
        role: Role::Employee,
    }
}

fn manager(id: u64) -> Caller {
    Caller {
        employee_id: id,
        role: Role::Manager,
    }
}

fn day_off_type(id: u16) -> DayOffType {
    DayOffType {
        id,
        code: format!("T{id}"),
        name: format!("type {id}"),
        salary_affecting: id == 1,
        deleted: false,
    }
}

fn input(from: NaiveDate, to: NaiveDate, off_type_id: u8) -> LetterInput {
    LetterInput {
        from_date: from,
        to_date: to,
        day_off_type_id: 1,
        off_type_id,
        reason: Some("family trip".into()),
        replace_person: None,
        status_id: None,
    }
}

/// Stands in for the record store: one employee's config and letters,
/// plus every adjustment the ledger applied.
struct Desk {
    workflow: LetterWorkflow,
    config: BalanceConfig,
    letters: Vec<Letter>,
    journal: Vec<(u64, BalanceAdjustment)>,
}

impl Desk {
    fn new(draft_mode: bool, vacation_day: Decimal) -> Self {
        Self {
            workflow: LetterWorkflow::new(LetterPolicy {
                draft_mode,
                reason_required: true,
            }),
            config: BalanceConfig {
                employee_id: CREATOR,
                vacation_day,
                approver1_id: Some(A1),
                approver2_id: Some(A2),
                approver3_id: Some(A3),
            },
            letters: Vec::new(),
            journal: Vec::new(),
        }
    }

    fn balance(&self) -> Decimal {
        self.config.vacation_day
    }

    fn letter(&self, id: u64) -> &Letter {
        self.letters.iter().find(|l| l.id == id).unwrap()
    }

    fn create(&mut self, input: &LetterInput) -> Result<u64, AppError> {
        let kind = day_off_type(input.day_off_type_id);
        let plan = self.workflow.plan_create(
            CREATOR,
            input,
            Some(&kind),
            Some(&self.config),
            &self.letters,
            now(),
        )?;
        let id = self.letters.len() as u64 + 1;
        self.letters.push(Letter {
            id,
            code: letter_code(id),
            creator_id: plan.creator_id,
            from_date: plan.content.from_date,
            to_date: plan.content.to_date,
            days_off: plan.content.days_off,
            reason: plan.content.reason,
            day_off_type_id: plan.content.day_off_type_id,
            off_type: plan.content.off_type,
            replace_person: plan.content.replace_person,
            status: plan.status,
            approver_id: 0,
            create_date: plan.create_date,
            approval_date: None,
        });
        if let (Some(adj), Some(after)) = (plan.adjustment, plan.balance_after) {
            self.journal.push((id, adj));
            self.config.vacation_day = after;
        }
        Ok(id)
    }

    fn persist(&mut self, t: Transition) {
        // Same guard as the conditional UPDATE in the repository.
        let letter = self.letters.iter_mut().find(|l| l.id == t.letter_id).unwrap();
        assert_eq!(letter.status, t.from, "stale transition persisted");
        letter.status = t.to;
        letter.approver_id = t.approver_id;
        letter.approval_date = t.approval_date;
        if let (Some(adj), Some(after)) = (t.adjustment, t.balance_after) {
            self.journal.push((t.letter_id, adj));
            self.config.vacation_day = after;
        }
    }

    fn submit(&mut self, id: u64, caller: Caller) -> Result<(), AppError> {
        let t = self
            .workflow
            .plan_submit(&caller, self.letter(id), Some(&self.config))?;
        self.persist(t);
        Ok(())
    }

    fn decide(&mut self, id: u64, caller: Caller, action: LetterAction) -> Result<(), AppError> {
        let t = self.workflow.plan_decision(
            &caller,
            self.letter(id),
            Some(&self.config),
            action,
            &self.letters,
            now(),
        )?;
        self.persist(t);
        Ok(())
    }

    fn net_for(&self, id: u64) -> Decimal {
        self.journal
            .iter()
            .filter(|(letter_id, _)| *letter_id == id)
            .map(|(_, adj)| adj.signed())
            .sum()
    }
}

#[test]
fn test_submit_then_reject_restores_balance() {
    let mut desk = Desk::new(true, dec!(5.0));
    let id = desk.create(&input(d(6, 3), d(6, 5), 3)).unwrap();
    assert_eq!(desk.letter(id).status, LetterStatus::Draft);
    assert_eq!(desk.letter(id).days_off, dec!(3));
    assert_eq!(desk.balance(), dec!(5.0));

    desk.submit(id, employee(CREATOR)).unwrap();
    assert_eq!(desk.letter(id).status, LetterStatus::Pending);
    assert_eq!(desk.balance(), dec!(2.0));

    desk.decide(id, employee(A1), LetterAction::Reject).unwrap();
    assert_eq!(desk.letter(id).status, LetterStatus::Rejected);
    assert_eq!(desk.letter(id).approver_id, A1);
    assert_eq!(desk.letter(id).approval_date, Some(now()));
    assert_eq!(desk.balance(), dec!(5.0));
    assert_eq!(desk.net_for(id), dec!(0));
}

#[test]
fn test_create_pending_debits_immediately() {
    let mut desk = Desk::new(false, dec!(5.0));
    let id = desk.create(&input(d(6, 3), d(6, 3), 1)).unwrap();
    assert_eq!(desk.letter(id).status, LetterStatus::Pending);
    assert_eq!(desk.letter(id).code, "DXN000001");
    assert_eq!(desk.balance(), dec!(4.5));

    desk.decide(id, manager(BOSS), LetterAction::Approve).unwrap();
    assert_eq!(desk.balance(), dec!(4.5));
    assert_eq!(desk.net_for(id), dec!(-0.5));
}

#[test]
fn test_override_chain_nets_to_one_debit_when_approved() {
    let mut desk = Desk::new(false, dec!(10));
    let id = desk.create(&input(d(6, 3), d(6, 4), 3)).unwrap();

    desk.decide(id, employee(A1), LetterAction::Approve).unwrap();
    desk.decide(id, employee(A2), LetterAction::Reject).unwrap();
    assert_eq!(desk.balance(), dec!(10));
    desk.decide(id, employee(A3), LetterAction::Approve).unwrap();

    assert_eq!(desk.letter(id).status, LetterStatus::Approved);
    assert_eq!(desk.letter(id).approver_id, A3);
    assert_eq!(desk.balance(), dec!(8));
    assert_eq!(desk.net_for(id), -desk.letter(id).days_off);
}

#[test]
fn test_racing_approvals_adjust_once() {
    let mut desk = Desk::new(false, dec!(10));
    let id = desk.create(&input(d(6, 3), d(6, 4), 3)).unwrap();

    desk.decide(id, manager(BOSS), LetterAction::Reject).unwrap();
    // The loser re-reads the letter under the row lock and finds it decided.
    let err = desk
        .decide(id, manager(OTHER_BOSS), LetterAction::Reject)
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition(_)));
    assert_eq!(desk.journal.len(), 2);
    assert_eq!(desk.net_for(id), dec!(0));
}

#[test]
fn test_approver1_cannot_act_after_any_decision() {
    let mut desk = Desk::new(false, dec!(10));
    let id = desk.create(&input(d(6, 3), d(6, 3), 3)).unwrap();
    desk.decide(id, employee(A2), LetterAction::Approve).unwrap();

    let err = desk
        .decide(id, employee(A1), LetterAction::Reject)
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(desk.letter(id).status, LetterStatus::Approved);
}

#[test]
fn test_approver3_cannot_override_manager_or_self() {
    let mut desk = Desk::new(false, dec!(10));
    let managed = desk.create(&input(d(6, 3), d(6, 3), 3)).unwrap();
    desk.decide(managed, manager(BOSS), LetterAction::Approve).unwrap();
    assert!(matches!(
        desk.decide(managed, employee(A3), LetterAction::Reject),
        Err(AppError::Forbidden(_))
    ));

    let own = desk.create(&input(d(6, 10), d(6, 10), 3)).unwrap();
    desk.decide(own, employee(A3), LetterAction::Approve).unwrap();
    assert!(matches!(
        desk.decide(own, employee(A3), LetterAction::Reject),
        Err(AppError::Forbidden(_))
    ));
}

#[test]
fn test_creator_cannot_decide_own_letter() {
    let mut desk = Desk::new(false, dec!(10));
    let id = desk.create(&input(d(6, 3), d(6, 3), 3)).unwrap();
    assert!(matches!(
        desk.decide(id, employee(CREATOR), LetterAction::Approve),
        Err(AppError::Forbidden(_))
    ));
}

#[test]
fn test_overlap_with_existing_approved_letter() {
    let mut desk = Desk::new(false, dec!(12));
    let first = desk.create(&input(d(6, 1), d(6, 5), 3)).unwrap();
    desk.decide(first, manager(BOSS), LetterAction::Approve).unwrap();
    let balance = desk.balance();

    let err = desk.create(&input(d(6, 3), d(6, 4), 3)).unwrap_err();
    assert!(matches!(err, AppError::OverlapConflict(_)));
    assert_eq!(desk.balance(), balance);
    assert_eq!(desk.letters.len(), 1);
}

#[test]
fn test_insufficient_balance_on_submit_leaves_balance() {
    let mut desk = Desk::new(true, dec!(3));
    let id = desk.create(&input(d(6, 3), d(6, 5), 3)).unwrap();
    // Balance drops elsewhere between drafting and submitting.
    desk.config.vacation_day = dec!(2);

    let err = desk.submit(id, employee(CREATOR)).unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance(_)));
    assert_eq!(desk.balance(), dec!(2));
    assert_eq!(desk.letter(id).status, LetterStatus::Draft);
}

#[test]
fn test_insufficient_balance_on_create() {
    let mut desk = Desk::new(false, dec!(1));
    let err = desk.create(&input(d(6, 3), d(6, 4), 3)).unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance(_)));
    assert_eq!(desk.balance(), dec!(1));
}

#[test]
fn test_reviving_rejected_letter_needs_balance() {
    let mut desk = Desk::new(false, dec!(2));
    let id = desk.create(&input(d(6, 3), d(6, 4), 3)).unwrap();
    desk.decide(id, employee(A1), LetterAction::Reject).unwrap();
    assert_eq!(desk.balance(), dec!(2));
    desk.config.vacation_day = dec!(1);

    let err = desk
        .decide(id, employee(A2), LetterAction::Approve)
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance(_)));
    assert_eq!(desk.letter(id).status, LetterStatus::Rejected);
    assert_eq!(desk.balance(), dec!(1));
}

#[test]
fn test_reviving_rejected_letter_checks_overlap() {
    let mut desk = Desk::new(false, dec!(10));
    let rejected = desk.create(&input(d(6, 3), d(6, 4), 3)).unwrap();
    desk.decide(rejected, employee(A1), LetterAction::Reject).unwrap();
    desk.create(&input(d(6, 4), d(6, 4), 3)).unwrap();

    assert!(matches!(
        desk.decide(rejected, employee(A2), LetterAction::Approve),
        Err(AppError::OverlapConflict(_))
    ));
}

#[test]
fn test_unpaid_types_never_touch_balance() {
    let mut desk = Desk::new(true, dec!(0));
    let mut sick = input(d(6, 3), d(6, 7), 3);
    sick.day_off_type_id = SICK_LEAVE;
    let id = desk.create(&sick).unwrap();

    desk.submit(id, employee(CREATOR)).unwrap();
    desk.decide(id, employee(A1), LetterAction::Reject).unwrap();
    desk.decide(id, employee(A3), LetterAction::Approve).unwrap();
    assert!(desk.journal.is_empty());
    assert_eq!(desk.balance(), dec!(0));
}

#[test]
fn test_draft_edit_recomputes_without_touching_balance() {
    let mut desk = Desk::new(true, dec!(5));
    let id = desk.create(&input(d(6, 3), d(6, 5), 3)).unwrap();

    let kind = day_off_type(1);
    let content = desk
        .workflow
        .plan_edit(
            &employee(CREATOR),
            desk.letter(id),
            &input(d(6, 4), d(6, 4), 2),
            Some(&kind),
            Some(&desk.config),
            &desk.letters,
        )
        .unwrap();
    assert_eq!(content.days_off, dec!(0.5));
    assert_eq!(desk.balance(), dec!(5));

    desk.submit(id, employee(CREATOR)).unwrap();
    let err = desk
        .workflow
        .plan_edit(
            &employee(CREATOR),
            desk.letter(id),
            &input(d(6, 4), d(6, 4), 2),
            Some(&kind),
            Some(&desk.config),
            &desk.letters,
        )
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition(_)));
}

#[test]
fn test_only_creator_deletes_only_drafts() {
    let mut desk = Desk::new(true, dec!(5));
    let id = desk.create(&input(d(6, 3), d(6, 3), 3)).unwrap();
    assert!(matches!(
        desk.workflow.ensure_deletable(&manager(BOSS), desk.letter(id)),
        Err(AppError::Forbidden(_))
    ));
    assert!(desk.workflow.ensure_deletable(&employee(CREATOR), desk.letter(id)).is_ok());

    desk.submit(id, employee(CREATOR)).unwrap();
    assert!(matches!(
        desk.workflow.ensure_deletable(&employee(CREATOR), desk.letter(id)),
        Err(AppError::InvalidStateTransition(_))
    ));
}

#[test]
fn test_submit_is_creator_only_and_draft_only() {
    let mut desk = Desk::new(true, dec!(5));
    let id = desk.create(&input(d(6, 3), d(6, 3), 3)).unwrap();
    assert!(matches!(
        desk.submit(id, employee(A1)),
        Err(AppError::Forbidden(_))
    ));
    desk.submit(id, employee(CREATOR)).unwrap();
    assert!(matches!(
        desk.submit(id, employee(CREATOR)),
        Err(AppError::InvalidStateTransition(_))
    ));
    assert_eq!(desk.balance(), dec!(4));
}

#[test]
fn test_draft_mode_status_request() {
    let mut desk = Desk::new(true, dec!(5));
    let mut now_input = input(d(6, 3), d(6, 3), 3);
    now_input.status_id = Some(2);
    let id = desk.create(&now_input).unwrap();
    assert_eq!(desk.letter(id).status, LetterStatus::Pending);
    assert_eq!(desk.balance(), dec!(4));

    let mut bogus = input(d(6, 10), d(6, 10), 3);
    bogus.status_id = Some(3);
    assert!(matches!(desk.create(&bogus), Err(AppError::InvalidInput(_))));
}

#[test]
fn test_status_request_ignored_outside_draft_mode() {
    let mut desk = Desk::new(false, dec!(5));
    let mut draft = input(d(6, 3), d(6, 3), 3);
    draft.status_id = Some(1);
    let id = desk.create(&draft).unwrap();
    assert_eq!(desk.letter(id).status, LetterStatus::Pending);
}

#[test]
fn test_create_validation_errors() {
    let workflow = LetterWorkflow::default();
    let config = Desk::new(false, dec!(5)).config;
    let paid = day_off_type(1);
    let plan = |input: &LetterInput, kind: Option<&DayOffType>| {
        workflow.plan_create(CREATOR, input, kind, Some(&config), &[], now())
    };

    assert!(matches!(
        plan(&input(d(6, 2), d(6, 3), 3), Some(&paid)),
        Err(AppError::InvalidDate(_))
    ));
    assert!(matches!(
        plan(&input(d(6, 3), d(6, 3), 7), Some(&paid)),
        Err(AppError::InvalidOffType(7))
    ));
    assert!(matches!(
        plan(&input(d(6, 3), d(6, 3), 3), None),
        Err(AppError::InvalidInput(_))
    ));

    let mut retired = paid.clone();
    retired.deleted = true;
    assert!(matches!(
        plan(&input(d(6, 3), d(6, 3), 3), Some(&retired)),
        Err(AppError::InvalidInput(_))
    ));

    let mut silent = input(d(6, 3), d(6, 3), 3);
    silent.reason = None;
    assert!(matches!(
        plan(&silent, Some(&paid)),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn test_paid_vacation_requires_config() {
    let workflow = LetterWorkflow::default();
    let paid = day_off_type(1);
    let err = workflow
        .plan_create(CREATOR, &input(d(6, 3), d(6, 3), 3), Some(&paid), None, &[], now())
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

mod props {
    use proptest::prelude::*;

    use super::*;

    fn arb_decider() -> impl Strategy<Value = Caller> {
        prop_oneof![
            Just(employee(A1)),
            Just(employee(A2)),
            Just(employee(A3)),
            Just(manager(BOSS)),
            Just(manager(OTHER_BOSS)),
        ]
    }

    fn arb_action() -> impl Strategy<Value = LetterAction> {
        prop_oneof![Just(LetterAction::Approve), Just(LetterAction::Reject)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Whatever the deciders do, a paid letter's adjustments net to zero
        /// when it ends rejected and to one debit otherwise.
        #[test]
        fn prop_decisions_net_to_final_status(
            draft_mode in any::<bool>(),
            steps in prop::collection::vec((arb_decider(), arb_action()), 0..12),
        ) {
            let mut desk = Desk::new(draft_mode, dec!(10));
            let id = desk.create(&input(d(6, 3), d(6, 4), 3)).unwrap();
            if draft_mode {
                desk.submit(id, employee(CREATOR)).unwrap();
            }
            let days_off = desk.letter(id).days_off;
            prop_assert_eq!(desk.net_for(id), -days_off);

            for (caller, action) in steps {
                let status = desk.letter(id).status;
                let entries = desk.journal.len();
                match desk.decide(id, caller, action) {
                    Ok(()) => {
                        prop_assert_ne!(desk.letter(id).status, status);
                        prop_assert!(desk.journal.len() <= entries + 1);
                    }
                    Err(_) => {
                        prop_assert_eq!(desk.letter(id).status, status);
                        prop_assert_eq!(desk.journal.len(), entries);
                    }
                }
            }

            let expected = match desk.letter(id).status {
                LetterStatus::Rejected => dec!(0),
                _ => -days_off,
            };
            prop_assert_eq!(desk.net_for(id), expected);
            prop_assert_eq!(desk.balance(), dec!(10) + expected);
        }

        /// Repeating the same decision never moves the balance twice.
        #[test]
        fn prop_repeated_decision_adjusts_once(
            caller in arb_decider(),
            action in arb_action(),
            repeats in 1usize..5,
        ) {
            let mut desk = Desk::new(false, dec!(10));
            let id = desk.create(&input(d(6, 3), d(6, 4), 3)).unwrap();
            desk.decide(id, caller, action).unwrap();
            let entries = desk.journal.len();

            for _ in 0..repeats {
                prop_assert!(desk.decide(id, caller, action).is_err());
            }
            prop_assert_eq!(desk.journal.len(), entries);
        }
    }
}
