//! Repository for `employee_configs`, the balance ledger's storage.

use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::error::AppResult;
use crate::model::employee_config::BalanceConfig;

const COLUMNS: &str = "employee_id, vacation_day, approver1_id, approver2_id, approver3_id";

pub struct EmployeeConfigRepo;

impl EmployeeConfigRepo {
    pub async fn find(pool: &MySqlPool, employee_id: u64) -> AppResult<Option<BalanceConfig>> {
        let query = format!("SELECT {COLUMNS} FROM employee_configs WHERE employee_id = ?");
        Ok(sqlx::query_as::<_, BalanceConfig>(&query)
            .bind(employee_id)
            .fetch_optional(pool)
            .await?)
    }

    /// Lock the employee's config row for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut MySqlConnection,
        employee_id: u64,
    ) -> AppResult<Option<BalanceConfig>> {
        let query =
            format!("SELECT {COLUMNS} FROM employee_configs WHERE employee_id = ? FOR UPDATE");
        Ok(sqlx::query_as::<_, BalanceConfig>(&query)
            .bind(employee_id)
            .fetch_optional(&mut *conn)
            .await?)
    }

    /// Store a balance computed by the ledger on the locked row.
    pub async fn set_vacation_day(
        conn: &mut MySqlConnection,
        employee_id: u64,
        vacation_day: Decimal,
    ) -> AppResult<()> {
        sqlx::query("UPDATE employee_configs SET vacation_day = ? WHERE employee_id = ?")
            .bind(vacation_day)
            .bind(employee_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
