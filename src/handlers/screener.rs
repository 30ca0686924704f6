use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::models::{FilterRequest, Listing, StockDataRequest, UniverseQuery};
use crate::state::AppState;

/// 按条件筛选股票
pub async fn filter_stocks(
    state: web::Data<AppState>,
    body: web::Json<FilterRequest>,
) -> Result<HttpResponse> {
    let results = state.screener.run(&body).await;
    Ok(HttpResponse::Ok().json(results))
}

/// 查询单只股票指标
pub async fn get_stock_data(
    state: web::Data<AppState>,
    body: web::Json<StockDataRequest>,
) -> Result<HttpResponse> {
    let symbol = body.symbol.as_deref().unwrap_or_default();
    let listing = Listing::parse(symbol)?;
    let lookup = state.stocks.lookup(&listing).await;
    Ok(HttpResponse::Ok().json(lookup))
}

/// 查看股票池
pub async fn get_universe(
    state: web::Data<AppState>,
    query: web::Query<UniverseQuery>,
) -> Result<HttpResponse> {
    let listings = state
        .screener
        .universe()
        .resolve(query.index, query.exchange)
        .await;
    let symbols: Vec<String> = listings.iter().map(Listing::ticker).collect();
    Ok(HttpResponse::Ok().json(json!({
        "count": symbols.len(),
        "symbols": symbols,
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/filter", web::post().to(filter_stocks))
        .route("/get-stock-data", web::post().to(get_stock_data))
        .route("/universe", web::get().to(get_universe));
}
