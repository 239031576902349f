use actix_web::{HttpResponse, Responder, get, web};

use crate::error::AppError;
use crate::handlers::{admin, auth, clock, worker};

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Extractor failures answer in the same JSON shape as handler errors.
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    );

    cfg.service(health).service(
        web::scope("/api")
            .route("/clock", web::post().to(clock::clock))
            .route("/logout", web::post().to(auth::logout))
            .configure(configure_worker)
            .configure(configure_admin),
    );
}

fn configure_worker(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/worker")
            .route("/login", web::post().to(auth::worker_login))
            .route("/register", web::post().to(auth::register))
            .route("/me", web::get().to(worker::me))
            .route("/shifts", web::get().to(worker::my_shifts))
            .route("/time-off", web::get().to(worker::my_time_off_requests))
            .route("/time-off", web::post().to(worker::create_time_off_request))
            .route(
                "/time-off/{id}/cancel",
                web::post().to(worker::cancel_time_off_request),
            )
            .route("/notifications", web::get().to(worker::my_notifications))
            .route(
                "/notifications/{id}/read",
                web::post().to(worker::mark_notification_read),
            ),
    );
}

fn configure_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/login", web::post().to(auth::admin_login))
            .route("/locations", web::get().to(admin::get_locations))
            .route("/locations", web::post().to(admin::create_location))
            .route("/locations/{id}", web::get().to(admin::get_location))
            .route("/locations/{id}", web::patch().to(admin::update_location))
            .route("/locations/{id}", web::delete().to(admin::delete_location))
            .route("/employees", web::get().to(admin::get_employees))
            .route("/employees", web::post().to(admin::create_employee))
            .route("/employees/{id}", web::get().to(admin::get_employee))
            .route("/employees/{id}", web::patch().to(admin::update_employee))
            .route("/employees/{id}", web::delete().to(admin::delete_employee))
            .route("/shifts", web::get().to(admin::get_shifts))
            .route("/shifts/{id}", web::get().to(admin::get_shift))
            .route("/shifts/{id}", web::patch().to(admin::update_shift))
            .route("/shifts/{id}", web::delete().to(admin::delete_shift))
            .route("/time-off", web::get().to(admin::get_time_off_requests))
            .route(
                "/time-off/{id}/approve",
                web::post().to(admin::approve_time_off_request),
            )
            .route(
                "/time-off/{id}/deny",
                web::post().to(admin::deny_time_off_request),
            )
            .route("/audit-logs", web::get().to(admin::get_audit_logs)),
    );
}
