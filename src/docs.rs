use crate::api::export::ExportQuery;
use crate::api::letters::{
    BalanceResponse, CreatedLetter, LetterFilter, LetterListResponse, LetterRequest,
    LetterResponse, TransitionResponse,
};
use crate::api::profile::ProfileConfigResponse;
use crate::model::day_off_type::DayOffType;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Letter API",
        version = "1.0.0",
        description = r#"
## Leave letters

Employees file leave letters; approvers from the employee's delegation chain
(or a manager) approve or reject them.

### Key Features
- **Letters**
  - Create, edit and delete drafts, submit, approve, reject, override earlier decisions
- **Balance**
  - Paid vacation is debited when a letter is submitted and credited back when it is rejected
- **Export**
  - Monthly CSV of decided letters for managers

### Security
Every endpoint requires a **JWT Bearer** token carrying the caller's employee id and role.
"#,
    ),
    paths(
        crate::api::letters::create_letter,
        crate::api::letters::list_letters,
        crate::api::letters::get_letter,
        crate::api::letters::submit_letter,
        crate::api::letters::approve_letter,
        crate::api::letters::reject_letter,
        crate::api::letters::edit_letter,
        crate::api::letters::delete_letter,
        crate::api::letters::get_balance,
        crate::api::letters::list_day_off_types,

        crate::api::export::export_letters,
        crate::api::profile::get_profile_config
    ),
    components(
        schemas(
            LetterRequest,
            CreatedLetter,
            LetterResponse,
            LetterListResponse,
            LetterFilter,
            TransitionResponse,
            BalanceResponse,
            DayOffType,
            ExportQuery,
            ProfileConfigResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Letters", description = "Leave letter APIs"),
        (name = "Profile", description = "Caller's leave configuration"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
