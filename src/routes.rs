use crate::{
    api::{export, letters, profile},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/letters")
                    // /letters
                    .service(
                        web::resource("")
                            .route(web::get().to(letters::list_letters))
                            .route(web::post().to(letters::create_letter)),
                    )
                    // fixed paths before /{id}
                    .service(web::resource("/balance").route(web::get().to(letters::get_balance)))
                    .service(web::resource("/export").route(web::get().to(export::export_letters)))
                    .service(
                        web::resource("/dayofftypes")
                            .route(web::get().to(letters::list_day_off_types)),
                    )
                    // /letters/{id}
                    .service(web::resource("/{id}").route(web::get().to(letters::get_letter)))
                    .service(
                        web::resource("/{id}/submit").route(web::put().to(letters::submit_letter)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(letters::approve_letter)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(letters::reject_letter)),
                    )
                    .service(
                        web::resource("/{id}/edit").route(web::put().to(letters::edit_letter)),
                    )
                    .service(
                        web::resource("/{id}/delete")
                            .route(web::delete().to(letters::delete_letter)),
                    ),
            )
            .service(
                web::scope("/profile").service(
                    web::resource("/config").route(web::get().to(profile::get_profile_config)),
                ),
            ),
    );
}
