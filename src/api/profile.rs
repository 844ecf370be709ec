use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::employee_config::ProfileConfig;
use crate::repository::EmployeeRepo;

/// The caller's leave configuration: balance and delegated approvers.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfigResponse {
    #[schema(example = 42)]
    pub employee_id: u64,
    #[schema(example = "Alice")]
    pub employee_name: String,
    #[schema(example = 5.5, value_type = f64)]
    pub vacation_day: Decimal,
    #[schema(example = 7)]
    pub approver1_id: Option<u64>,
    #[schema(example = "Bob")]
    pub approver1_name: Option<String>,
    pub approver2_id: Option<u64>,
    pub approver2_name: Option<String>,
    pub approver3_id: Option<u64>,
    pub approver3_name: Option<String>,
}

impl From<ProfileConfig> for ProfileConfigResponse {
    fn from(row: ProfileConfig) -> Self {
        // A dangling approver id has no name; report the id alone.
        let approver = |id: Option<u64>, name: Option<String>| match id.filter(|id| *id != 0) {
            Some(id) => (Some(id), name),
            None => (None, None),
        };
        let (approver1_id, approver1_name) = approver(row.approver1_id, row.approver1_name);
        let (approver2_id, approver2_name) = approver(row.approver2_id, row.approver2_name);
        let (approver3_id, approver3_name) = approver(row.approver3_id, row.approver3_name);

        Self {
            employee_id: row.employee_id,
            employee_name: row.employee_name.unwrap_or_default(),
            vacation_day: row.vacation_day,
            approver1_id,
            approver1_name,
            approver2_id,
            approver2_name,
            approver3_id,
            approver3_name,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/profile/config",
    responses(
        (status = 200, description = "Caller's leave configuration", body = ProfileConfigResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No configuration for the caller")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile_config(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<impl Responder> {
    let profile = EmployeeRepo::find_profile_config(pool.get_ref(), auth.employee_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No configuration for employee {}", auth.employee_id))
        })?;

    Ok(HttpResponse::Ok().json(ProfileConfigResponse::from(profile)))
}
