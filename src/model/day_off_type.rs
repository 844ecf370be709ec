use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Leave category (`day_off_types` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayOffType {
    #[schema(example = 1)]
    pub id: u16,
    #[schema(example = "NP")]
    pub code: String,
    #[schema(example = "Paid vacation")]
    pub name: String,
    /// Counted against the annual allotment.
    pub salary_affecting: bool,
    #[serde(skip)]
    pub deleted: bool,
}
