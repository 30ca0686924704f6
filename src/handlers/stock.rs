use actix_web::{web, HttpResponse, Result};

use crate::models::{HistoryQuery, HistoryRange, Listing};
use crate::state::AppState;

/// 单只股票指标
pub async fn get_stock(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let listing = Listing::parse(&path.into_inner())?;
    let lookup = state.stocks.lookup(&listing).await;
    Ok(HttpResponse::Ok().json(lookup))
}

/// 历史行情，`range` 取值 5d/1w/1m/6m/1y/5y
pub async fn get_historical(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let listing = Listing::parse(&path.into_inner())?;
    let range = HistoryRange::parse(query.range.as_deref().unwrap_or("1m"));

    let series = state.stocks.history(&listing, range).await?;
    Ok(HttpResponse::Ok().json(series))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // historical 需在 /{symbol} 之前注册
    cfg.route("/historical/{symbol}", web::get().to(get_historical))
        .route("/{symbol}", web::get().to(get_stock));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::state;
    use crate::models::MetricField;
    use crate::services::testing::FakeMetricsProvider;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_get_stock() {
        let provider = FakeMetricsProvider::with_values("fake", &[(MetricField::Roe, 45.5)]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(provider, None)))
                .service(web::scope("/stock").configure(config)),
        )
        .await;

        let req = test::TestRequest::get().uri("/stock/INFY.BO").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["symbol"], "INFY");
        assert_eq!(body["exchange"], "BSE");
        assert_eq!(body["roe"], json!(45.5));
        assert_eq!(body["sector"], "Unknown");
    }

    #[actix_web::test]
    async fn test_get_historical() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(FakeMetricsProvider::failing("fake"), None)))
                .service(web::scope("/stock").configure(config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/stock/historical/TCS?range=6m")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["dates"].as_array().unwrap().len(), 60);
        assert_eq!(body["prices"][0], json!(100.0));
        assert_eq!(body["ma20"][18], Value::Null);
        assert!(body["ma20"][19].is_number());
        assert!(body["ma50"][49].is_number());

        let req = test::TestRequest::get()
            .uri("/stock/historical/MISSING")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("MISSING"));
    }
}
