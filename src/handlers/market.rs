use actix_web::{web, HttpResponse, Result};

use crate::state::AppState;

/// 主要指数点位
pub async fn get_indices(state: web::Data<AppState>) -> Result<HttpResponse> {
    let quotes = state.stocks.index_quotes().await;
    Ok(HttpResponse::Ok().json(quotes))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/indices", web::get().to(get_indices));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::state;
    use crate::services::testing::FakeMetricsProvider;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_indices() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(FakeMetricsProvider::failing("fake"), None)))
                .service(web::scope("/market").configure(config)),
        )
        .await;

        let req = test::TestRequest::get().uri("/market/indices").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["NIFTY 50"], json!({"symbol": "^NSEI", "price": 100.0}));
        assert_eq!(body["NIFTY IT"]["symbol"], "^CNXIT");
        assert_eq!(body.as_object().unwrap().len(), 4);
    }
}
