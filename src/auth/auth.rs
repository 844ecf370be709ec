use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::access::Caller;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::models::Claims;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub employee_id: u64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> AppResult<Self> {
        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::Unauthenticated("Invalid role".into()))?;

        if claims.employee_id == 0 {
            return Err(AppError::Unauthenticated("No employee profile".into()));
        }

        Ok(AuthUser {
            user_id: claims.user_id,
            employee_id: claims.employee_id,
            username: claims.sub,
            role,
        })
    }

    pub fn caller(&self) -> Caller {
        Caller {
            employee_id: self.employee_id,
            role: self.role,
        }
    }

    pub fn require_manager(&self) -> AppResult<()> {
        if self.caller().is_manager() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Manager only".into()))
        }
    }
}

/// Resolve the caller from the `Authorization: Bearer` header.
pub fn authenticate(req: &HttpRequest) -> AppResult<AuthUser> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal("App config missing".into()))?;

    let header_value = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthenticated("Missing Authorization header".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("Invalid Authorization header encoding".into()))?;

    let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthenticated("Authorization header must start with Bearer".into())
    })?;

    AuthUser::from_claims(verify_token(token, &config.jwt_secret)?)
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }
        ready(authenticate(req))
    }
}
