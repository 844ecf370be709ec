//! Repository for `employees`.

use sqlx::{MySqlConnection, MySqlPool};

use crate::error::AppResult;
use crate::model::employee_config::ProfileConfig;

pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Lock the employee row for the rest of the transaction. Every letter
    /// write of one creator takes this lock, so it holds even when the
    /// employee has no `employee_configs` row. `false` when no such employee.
    pub async fn lock(conn: &mut MySqlConnection, employee_id: u64) -> AppResult<bool> {
        let row = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ? FOR UPDATE")
            .bind(employee_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// Balance configuration with the employee's and approvers' names.
    pub async fn find_profile_config(
        pool: &MySqlPool,
        employee_id: u64,
    ) -> AppResult<Option<ProfileConfig>> {
        Ok(sqlx::query_as::<_, ProfileConfig>(
            r#"
            SELECT e.id AS employee_id, e.name AS employee_name, c.vacation_day,
                   c.approver1_id, a1.name AS approver1_name,
                   c.approver2_id, a2.name AS approver2_name,
                   c.approver3_id, a3.name AS approver3_name
            FROM employees e
            JOIN employee_configs c ON c.employee_id = e.id
            LEFT JOIN employees a1 ON a1.id = c.approver1_id
            LEFT JOIN employees a2 ON a2.id = c.approver2_id
            LEFT JOIN employees a3 ON a3.id = c.approver3_id
            WHERE e.id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(pool)
        .await?)
    }
}
