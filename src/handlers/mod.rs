pub mod ai;
pub mod health;
pub mod market;
pub mod patterns;
pub mod screener;
pub mod stock;

use actix_web::{error, web, HttpResponse};

use crate::models::ErrorResponse;

/// 请求体/查询参数解析失败时返回 `{"error": ...}`
fn bad_request(message: String) -> error::Error {
    error::InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ErrorResponse::new(message)),
    )
    .into()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| bad_request(err.to_string())))
        .app_data(
            web::QueryConfig::default().error_handler(|err, _req| bad_request(err.to_string())),
        )
        .configure(health::config)
        .service(web::scope("/screener").configure(screener::config))
        .service(web::scope("/stock").configure(stock::config))
        .service(web::scope("/market").configure(market::config))
        .service(web::scope("/ai").configure(ai::config))
        .service(web::scope("/patterns").configure(patterns::config));
}
