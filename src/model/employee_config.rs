use rust_decimal::Decimal;
use serde::Serialize;

/// An employee's vacation balance and delegated approvers
/// (`employee_configs` row).
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BalanceConfig {
    pub employee_id: u64,
    pub vacation_day: Decimal,
    pub approver1_id: Option<u64>,
    pub approver2_id: Option<u64>,
    pub approver3_id: Option<u64>,
}

impl BalanceConfig {
    pub fn approver_chain(&self) -> ApproverChain {
        ApproverChain::new(self.approver1_id, self.approver2_id, self.approver3_id)
    }
}

/// Config row joined with the employee's and approvers' names.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProfileConfig {
    pub employee_id: u64,
    pub employee_name: Option<String>,
    pub vacation_day: Decimal,
    pub approver1_id: Option<u64>,
    pub approver1_name: Option<String>,
    pub approver2_id: Option<u64>,
    pub approver2_name: Option<String>,
    pub approver3_id: Option<u64>,
    pub approver3_name: Option<String>,
}

/// Override tier, lowest first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub enum ApproverTier {
    First = 1,
    Second = 2,
    Third = 3,
}

/// The three delegated approvers of one employee. Unset tiers and the
/// placeholder id 0 never match anybody.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApproverChain {
    tiers: [Option<u64>; 3],
}

impl ApproverChain {
    pub fn new(first: Option<u64>, second: Option<u64>, third: Option<u64>) -> Self {
        let clean = |id: Option<u64>| id.filter(|id| *id != 0);
        Self {
            tiers: [clean(first), clean(second), clean(third)],
        }
    }

    /// Every tier `employee_id` occupies, lowest first.
    pub fn tiers_of(&self, employee_id: u64) -> Vec<ApproverTier> {
        [ApproverTier::First, ApproverTier::Second, ApproverTier::Third]
            .into_iter()
            .zip(self.tiers)
            .filter(|(_, id)| *id == Some(employee_id))
            .map(|(tier, _)| tier)
            .collect()
    }

    /// Highest tier `employee_id` occupies.
    pub fn highest_tier_of(&self, employee_id: u64) -> Option<ApproverTier> {
        self.tiers_of(employee_id).into_iter().max()
    }

    pub fn contains(&self, employee_id: u64) -> bool {
        self.tiers.contains(&Some(employee_id))
    }
}
