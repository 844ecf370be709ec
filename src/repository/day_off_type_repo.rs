use sqlx::MySqlPool;

use crate::error::AppResult;
use crate::model::day_off_type::DayOffType;

/// `tinh_luong` is the salary-affecting flag.
pub(crate) const COLUMNS: &str =
    "id, code, name, tinh_luong AS salary_affecting, deleted";

pub struct DayOffTypeRepo;

impl DayOffTypeRepo {
    pub async fn find(pool: &MySqlPool, id: u16) -> AppResult<Option<DayOffType>> {
        let query = format!("SELECT {COLUMNS} FROM day_off_types WHERE id = ?");
        Ok(sqlx::query_as::<_, DayOffType>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// Types that can still be chosen for new letters.
    pub async fn list_active(pool: &MySqlPool) -> AppResult<Vec<DayOffType>> {
        let query = format!("SELECT {COLUMNS} FROM day_off_types WHERE deleted = 0 ORDER BY id");
        Ok(sqlx::query_as::<_, DayOffType>(&query)
            .fetch_all(pool)
            .await?)
    }
}
