//! Vacation balance arithmetic and the annual accrual read-model.

use rust_decimal::Decimal;

use crate::error::AppError;

/// Days every employee may take per calendar year on salary-affecting
/// leave types.
pub const DEFAULT_ANNUAL_ALLOTMENT: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// One movement on an employee's `vacation_day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAdjustment {
    Debit(Decimal),
    Credit(Decimal),
}

impl BalanceAdjustment {
    /// Net effect on the balance.
    pub fn signed(self) -> Decimal {
        match self {
            Self::Debit(amount) => -amount,
            Self::Credit(amount) => amount,
        }
    }

    pub fn apply(self, employee_id: u64, balance: Decimal) -> Result<Decimal, AppError> {
        match self {
            Self::Debit(amount) => debit(employee_id, balance, amount),
            Self::Credit(amount) => Ok(credit(balance, amount)),
        }
    }
}

/// Takes `amount` off the balance. Refuses to go below zero even when the
/// caller already checked, so a missed check surfaces as an error instead
/// of a silently negative balance.
pub fn debit(employee_id: u64, balance: Decimal, amount: Decimal) -> Result<Decimal, AppError> {
    let remaining = balance - amount;
    if remaining < Decimal::ZERO {
        tracing::warn!(
            employee_id,
            %balance,
            %amount,
            "Refused vacation debit that would leave a negative balance"
        );
        return Err(AppError::InsufficientBalance(format!(
            "Requested {amount} day(s) but only {balance} vacation day(s) remain"
        )));
    }
    Ok(remaining)
}

pub fn credit(balance: Decimal, amount: Decimal) -> Decimal {
    balance + amount
}

/// Days left of the annual allotment after `approved_days`, never negative.
pub fn annual_remaining(allotment: Decimal, approved_days: Decimal) -> Decimal {
    (allotment - approved_days).max(Decimal::ZERO)
}
