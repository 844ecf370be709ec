use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::access;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::ledger;
use crate::model::employee_config::ApproverChain;
use crate::model::letter::{Letter, LetterStatus};
use crate::repository::letter_repo::MAX_PER_PAGE;
use crate::repository::{EmployeeConfigRepo, EmployeeRepo, LetterRepo, LetterViewRow};
use crate::utils::day_off_type_cache;
use crate::workflow::{LetterAction, LetterInput, LetterWorkflow};

/// Body of create and edit.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LetterRequest {
    #[schema(example = "2024-06-03", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2024-06-05", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = 1)]
    pub day_off_type_id: u16,
    /// 1 morning, 2 afternoon, 3 full day
    #[schema(example = 3)]
    pub off_type_id: u8,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
    #[schema(example = "Bob")]
    pub replace_person: Option<String>,
    /// Draft deployments only: 1 keeps the letter as draft, 2 submits it.
    #[schema(example = 1)]
    pub status_id: Option<u8>,
}

impl From<LetterRequest> for LetterInput {
    fn from(req: LetterRequest) -> Self {
        LetterInput {
            from_date: req.from_date,
            to_date: req.to_date,
            day_off_type_id: req.day_off_type_id,
            off_type_id: req.off_type_id,
            reason: req.reason,
            replace_person: req.replace_person,
            status_id: req.status_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLetter {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "DXN000042")]
    pub code: String,
    #[schema(example = 2)]
    pub status_id: u8,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LetterResponse {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "DXN000042")]
    pub code: String,
    pub creator_id: u64,
    #[schema(example = "Alice")]
    pub creator_name: String,
    #[schema(example = "2024-06-03", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2024-06-05", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = 3.0, value_type = f64)]
    pub days_off: Decimal,
    pub reason: String,
    pub day_off_type_id: u16,
    #[schema(example = "Paid vacation")]
    pub day_off_type_name: String,
    pub off_type_id: u8,
    pub replace_person: String,
    #[schema(example = 2)]
    pub status_id: u8,
    #[schema(example = "pending")]
    pub status: String,
    /// 0 while undecided
    pub approver_id: u64,
    pub approver_name: String,
    #[schema(example = "2024-05-20T09:30:00", format = "date-time", value_type = String)]
    pub create_date: NaiveDateTime,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub approval_date: Option<NaiveDateTime>,
    /// Only on the detail view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_approve: Option<bool>,
}

impl LetterResponse {
    fn from_view(row: LetterViewRow) -> AppResult<(Letter, Self)> {
        let LetterViewRow {
            letter,
            creator_name,
            approver_name,
            day_off_type_name,
        } = row;
        let letter = Letter::try_from(letter)?;

        let response = LetterResponse {
            id: letter.id,
            code: letter.code.clone(),
            creator_id: letter.creator_id,
            creator_name,
            from_date: letter.from_date,
            to_date: letter.to_date,
            days_off: letter.days_off,
            reason: letter.reason.clone(),
            day_off_type_id: letter.day_off_type_id,
            day_off_type_name,
            off_type_id: letter.off_type.id(),
            replace_person: letter.replace_person.clone(),
            status_id: letter.status.id(),
            status: letter.status.to_string(),
            approver_id: letter.approver_id,
            approver_name,
            create_date: letter.create_date,
            approval_date: letter.approval_date,
            can_approve: None,
        };
        Ok((letter, response))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LetterListResponse {
    pub data: Vec<LetterResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LetterFilter {
    /// Filter by status id (1 draft, 2 pending, 3 approved, 4 rejected)
    #[schema(example = 2)]
    pub status: Option<u8>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

impl LetterFilter {
    fn status(&self) -> AppResult<Option<LetterStatus>> {
        self.status
            .map(|id| {
                LetterStatus::from_id(id)
                    .ok_or_else(|| AppError::InvalidInput(format!("Unknown status {id}")))
            })
            .transpose()
    }

    fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(10).clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = 3)]
    pub status_id: u8,
    #[schema(example = "approved")]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    /// Remaining paid vacation days.
    #[schema(example = 5.5, value_type = f64)]
    pub vacation_day: Decimal,
    /// Annual allotment minus approved salary-affecting days this year.
    #[schema(example = 9.0, value_type = f64)]
    pub annual_remaining: Decimal,
    #[schema(example = 2024)]
    pub year: i32,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn letter_not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Letter {id} not found"))
}

/* =========================
Create letter
========================= */
#[utoipa::path(
    post,
    path = "/api/letters",
    request_body(content = LetterRequest, content_type = "application/json"),
    responses(
        (status = 201, description = "Letter created", body = CreatedLetter),
        (status = 400, description = "Invalid dates, off type or day-off type"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Overlaps another letter"),
        (status = 422, description = "Not enough vacation days")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn create_letter(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    workflow: web::Data<LetterWorkflow>,
    payload: web::Json<LetterRequest>,
) -> AppResult<impl Responder> {
    let input = LetterInput::from(payload.into_inner());
    let creator_id = auth.employee_id;
    let day_off_type = day_off_type_cache::get(pool.get_ref(), input.day_off_type_id).await?;

    let mut tx = pool.begin().await?;
    // Serializes every letter write of this creator, balance row or not.
    if !EmployeeRepo::lock(&mut *tx, creator_id).await? {
        return Err(AppError::NotFound(format!("Employee {creator_id} not found")));
    }
    let config = EmployeeConfigRepo::find_for_update(&mut *tx, creator_id).await?;
    let others =
        LetterRepo::find_overlapping(&mut *tx, creator_id, input.from_date, input.to_date).await?;

    let plan = workflow.plan_create(
        creator_id,
        &input,
        day_off_type.as_ref(),
        config.as_ref(),
        &others,
        now(),
    )?;

    let (id, code) = LetterRepo::insert(&mut *tx, &plan).await?;
    if let Some(balance) = plan.balance_after {
        EmployeeConfigRepo::set_vacation_day(&mut *tx, creator_id, balance).await?;
    }
    tx.commit().await?;

    info!(letter_id = id, creator_id, status = %plan.status, days_off = %plan.content.days_off, "Letter created");

    Ok(HttpResponse::Created().json(CreatedLetter {
        id,
        code,
        status_id: plan.status.id(),
    }))
}

/* =========================
List letters
========================= */
#[utoipa::path(
    get,
    path = "/api/letters",
    params(LetterFilter),
    responses(
        (status = 200, description = "Paginated letter list", body = LetterListResponse),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn list_letters(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LetterFilter>,
) -> AppResult<impl Responder> {
    let scope = access::visibility_scope(&auth.caller());
    let (page, per_page) = (query.page(), query.per_page());

    let (rows, total) =
        LetterRepo::list(pool.get_ref(), scope, query.status()?, page, per_page).await?;

    let data = rows
        .into_iter()
        .map(|row| LetterResponse::from_view(row).map(|(_, response)| response))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(HttpResponse::Ok().json(LetterListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/* =========================
Letter detail
========================= */
#[utoipa::path(
    get,
    path = "/api/letters/{id}",
    params(("id" = u64, Path, description = "Letter id")),
    responses(
        (status = 200, description = "Letter found", body = LetterResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the creator, an approver or a manager"),
        (status = 404, description = "Letter not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn get_letter(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    let letter_id = path.into_inner();
    let caller = auth.caller();

    let row = LetterRepo::find_view(pool.get_ref(), letter_id)
        .await?
        .ok_or_else(|| letter_not_found(letter_id))?;
    let (letter, mut response) = LetterResponse::from_view(row)?;

    let chain = EmployeeConfigRepo::find(pool.get_ref(), letter.creator_id)
        .await?
        .map(|c| c.approver_chain())
        .unwrap_or_default();

    if !access::can_act_on_letter(&caller, &letter, &chain) {
        return Err(AppError::Forbidden(format!(
            "You cannot view letter {}",
            letter.code
        )));
    }

    response.can_approve = Some(can_decide(&caller, &letter, &chain));
    Ok(HttpResponse::Ok().json(response))
}

/// Drafts are never decidable, whatever the caller's authority.
fn can_decide(caller: &access::Caller, letter: &Letter, chain: &ApproverChain) -> bool {
    letter.status != LetterStatus::Draft && access::can_approve(caller, letter, chain)
}

/* =========================
Status transitions
========================= */
async fn transition_letter(
    auth: AuthUser,
    pool: &MySqlPool,
    workflow: &LetterWorkflow,
    letter_id: u64,
    action: LetterAction,
) -> AppResult<HttpResponse> {
    let caller = auth.caller();

    let mut tx = pool.begin().await?;
    let letter = LetterRepo::find_for_update(&mut *tx, letter_id)
        .await?
        .ok_or_else(|| letter_not_found(letter_id))?;
    EmployeeRepo::lock(&mut *tx, letter.creator_id).await?;
    let config = EmployeeConfigRepo::find_for_update(&mut *tx, letter.creator_id).await?;
    let others = if letter.status == LetterStatus::Rejected {
        LetterRepo::find_overlapping(&mut *tx, letter.creator_id, letter.from_date, letter.to_date)
            .await?
    } else {
        Vec::new()
    };

    let transition =
        workflow.plan_decision(&caller, &letter, config.as_ref(), action, &others, now())?;

    LetterRepo::apply_transition(&mut *tx, &transition).await?;
    if let Some(balance) = transition.balance_after {
        EmployeeConfigRepo::set_vacation_day(&mut *tx, letter.creator_id, balance).await?;
    }
    tx.commit().await?;

    info!(
        letter_id,
        actor = caller.employee_id,
        from = %transition.from,
        to = %transition.to,
        adjustment = ?transition.adjustment,
        "Letter {action}"
    );

    Ok(HttpResponse::Ok().json(TransitionResponse {
        id: letter_id,
        status_id: transition.to.id(),
        status: transition.to.to_string(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/letters/{id}/submit",
    params(("id" = u64, Path, description = "Letter id")),
    responses(
        (status = 200, description = "Draft submitted", body = TransitionResponse),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Letter not found"),
        (status = 409, description = "Letter is not a draft"),
        (status = 422, description = "Not enough vacation days")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn submit_letter(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    workflow: web::Data<LetterWorkflow>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    transition_letter(auth, &pool, &workflow, path.into_inner(), LetterAction::Submit).await
}

#[utoipa::path(
    put,
    path = "/api/letters/{id}/approve",
    params(("id" = u64, Path, description = "Letter id")),
    responses(
        (status = 200, description = "Letter approved", body = TransitionResponse),
        (status = 403, description = "No authority over this letter"),
        (status = 404, description = "Letter not found"),
        (status = 409, description = "Letter cannot be approved in its current state"),
        (status = 422, description = "Not enough vacation days to revive a rejected letter")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn approve_letter(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    workflow: web::Data<LetterWorkflow>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    transition_letter(auth, &pool, &workflow, path.into_inner(), LetterAction::Approve).await
}

#[utoipa::path(
    put,
    path = "/api/letters/{id}/reject",
    params(("id" = u64, Path, description = "Letter id")),
    responses(
        (status = 200, description = "Letter rejected", body = TransitionResponse),
        (status = 403, description = "No authority over this letter"),
        (status = 404, description = "Letter not found"),
        (status = 409, description = "Letter cannot be rejected in its current state")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn reject_letter(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    workflow: web::Data<LetterWorkflow>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    transition_letter(auth, &pool, &workflow, path.into_inner(), LetterAction::Reject).await
}

/* =========================
Edit / delete drafts
========================= */
#[utoipa::path(
    put,
    path = "/api/letters/{id}/edit",
    params(("id" = u64, Path, description = "Letter id")),
    request_body(content = LetterRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Draft updated", body = TransitionResponse),
        (status = 400, description = "Invalid dates, off type or day-off type"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Letter not found"),
        (status = 409, description = "Not a draft, or overlaps another letter")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn edit_letter(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    workflow: web::Data<LetterWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<LetterRequest>,
) -> AppResult<impl Responder> {
    let letter_id = path.into_inner();
    let caller = auth.caller();
    let input = LetterInput::from(payload.into_inner());
    let day_off_type = day_off_type_cache::get(pool.get_ref(), input.day_off_type_id).await?;

    let mut tx = pool.begin().await?;
    let letter = LetterRepo::find_for_update(&mut *tx, letter_id)
        .await?
        .ok_or_else(|| letter_not_found(letter_id))?;
    EmployeeRepo::lock(&mut *tx, letter.creator_id).await?;
    let config = EmployeeConfigRepo::find_for_update(&mut *tx, letter.creator_id).await?;
    let others =
        LetterRepo::find_overlapping(&mut *tx, letter.creator_id, input.from_date, input.to_date)
            .await?;

    let content = workflow.plan_edit(
        &caller,
        &letter,
        &input,
        day_off_type.as_ref(),
        config.as_ref(),
        &others,
    )?;
    LetterRepo::update_content(&mut *tx, letter_id, &content).await?;
    tx.commit().await?;

    info!(letter_id, days_off = %content.days_off, "Draft letter edited");

    Ok(HttpResponse::Ok().json(TransitionResponse {
        id: letter_id,
        status_id: letter.status.id(),
        status: letter.status.to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/letters/{id}/delete",
    params(("id" = u64, Path, description = "Letter id")),
    responses(
        (status = 204, description = "Draft deleted"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Letter not found"),
        (status = 409, description = "Letter is not a draft")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn delete_letter(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    workflow: web::Data<LetterWorkflow>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    let letter_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let letter = LetterRepo::find_for_update(&mut *tx, letter_id)
        .await?
        .ok_or_else(|| letter_not_found(letter_id))?;
    workflow.ensure_deletable(&auth.caller(), &letter)?;
    LetterRepo::delete_draft(&mut *tx, letter_id).await?;
    tx.commit().await?;

    info!(letter_id, creator_id = letter.creator_id, "Draft letter deleted");

    Ok(HttpResponse::NoContent().finish())
}

/* =========================
Balance and catalogue
========================= */
#[utoipa::path(
    get,
    path = "/api/letters/balance",
    responses(
        (status = 200, description = "Caller's balance", body = BalanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No balance configured")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<impl Responder> {
    let balance = EmployeeConfigRepo::find(pool.get_ref(), auth.employee_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No balance configured for employee {}", auth.employee_id))
        })?;

    let year = Local::now().year();
    let approved =
        LetterRepo::approved_salary_days_in_year(pool.get_ref(), auth.employee_id, year).await?;

    Ok(HttpResponse::Ok().json(BalanceResponse {
        vacation_day: balance.vacation_day,
        annual_remaining: ledger::annual_remaining(config.annual_leave_allotment, approved),
        year,
    }))
}

#[utoipa::path(
    get,
    path = "/api/letters/dayofftypes",
    responses(
        (status = 200, description = "Selectable day-off types", body = [crate::model::day_off_type::DayOffType]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Letters"
)]
pub async fn list_day_off_types(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<impl Responder> {
    let types = day_off_type_cache::list_active(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(types))
}
