use actix_web::{HttpResponse, Responder, http::header, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::letter::Letter;
use crate::repository::{LetterRepo, LetterViewRow};

const CSV_HEADER: &str = "code,employee_id,employee,from_date,to_date,days_off,off_type,\
day_off_type,reason,replace_person,status,approver_id,approver,approval_date\n";

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    #[schema(example = 2024)]
    pub year: i32,
    /// 1-12
    #[schema(example = 6)]
    pub month: u32,
}

/// First and last day of a calendar month.
fn month_bounds(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || AppError::InvalidDate(format!("Invalid month {year}-{month}"));

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next_month.and_then(|d| d.pred_opt()).ok_or_else(invalid)?;

    Ok((first, last))
}

/// Quote a field if it contains a comma, quote or line break.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(rows: Vec<LetterViewRow>) -> AppResult<String> {
    let mut csv_output = String::from(CSV_HEADER);

    for row in rows {
        let letter = Letter::try_from(row.letter)?;
        csv_output.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            letter.code,
            letter.creator_id,
            csv_escape(&row.creator_name),
            letter.from_date,
            letter.to_date,
            letter.days_off,
            letter.off_type,
            csv_escape(&row.day_off_type_name),
            csv_escape(&letter.reason),
            csv_escape(&letter.replace_person),
            letter.status,
            letter.approver_id,
            csv_escape(&row.approver_name),
            letter
                .approval_date
                .map_or(String::new(), |d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
        ));
    }

    Ok(csv_output)
}

/// Decided letters whose whole range falls inside the month. Managers only.
#[utoipa::path(
    get,
    path = "/api/letters/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid year or month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager only")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn export_letters(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExportQuery>,
) -> AppResult<impl Responder> {
    auth.require_manager()?;

    let (first, last) = month_bounds(query.year, query.month)?;
    let rows = LetterRepo::decided_within(pool.get_ref(), first, last).await?;
    let count = rows.len();
    let body = render_csv(rows)?;

    tracing::info!(
        exported_by = auth.employee_id,
        year = query.year,
        month = query.month,
        count,
        "Letters exported"
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"letters-{}-{:02}.csv\"",
                query.year, query.month
            ),
        ))
        .body(body))
}
