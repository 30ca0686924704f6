use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::services::common::get_ist_time;

pub async fn index() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "message": "Welcome to the Indian stock screener API",
        "time": get_ist_time(),
    })))
}

pub async fn health_check() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "message": "Service is healthy",
        "time": get_ist_time(),
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health_check));
}
