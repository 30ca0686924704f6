//! 技术形态分析接口
//!
//! 提示词附带最近的日线收盘价；取不到行情时仍然请求大模型

use actix_web::{web, HttpResponse, Result};

use crate::error::ScreenerError;
use crate::handlers::ai::require_llm;
use crate::models::{
    ChartAnalysisResponse, HistoryRange, Listing, PatternRequest, PatternsResponse, PriceBar,
    TrendSummaryResponse,
};
use crate::services::patterns::{self, ANALYST_PROMPT};
use crate::state::AppState;

fn parse_listing(body: &PatternRequest) -> std::result::Result<Listing, ScreenerError> {
    Listing::parse(body.symbol.as_deref().unwrap_or_default())
}

/// 行情获取失败不影响分析
async fn price_context(state: &AppState, listing: &Listing, period: &str) -> Vec<PriceBar> {
    let range = HistoryRange::parse(period);
    match state.stocks.recent_bars(listing, range).await {
        Ok(bars) => bars,
        Err(e) => {
            log::warn!("获取 {} 行情失败，提示词不附带数据: {}", listing, e);
            Vec::new()
        }
    }
}

pub async fn analyze_trends(
    state: web::Data<AppState>,
    body: web::Json<PatternRequest>,
) -> Result<HttpResponse> {
    let listing = parse_listing(&body)?;
    let llm = require_llm(&state)?;

    let bars = price_context(&state, &listing, &body.period).await;
    let prompt = patterns::trend_prompt(&listing.ticker(), &body.period, &bars);
    let trend_summary = llm.complete(ANALYST_PROMPT, &prompt).await?;

    Ok(HttpResponse::Ok().json(TrendSummaryResponse {
        success: true,
        trend_summary,
    }))
}

pub async fn detect_patterns(
    state: web::Data<AppState>,
    body: web::Json<PatternRequest>,
) -> Result<HttpResponse> {
    let listing = parse_listing(&body)?;
    let llm = require_llm(&state)?;

    let bars = price_context(&state, &listing, &body.period).await;
    let prompt = patterns::detect_prompt(&listing.ticker(), &bars);
    let reply = llm.complete(ANALYST_PROMPT, &prompt).await?;

    Ok(HttpResponse::Ok().json(PatternsResponse {
        success: true,
        patterns: patterns::parse_patterns(&reply),
    }))
}

pub async fn analyze_chart(
    state: web::Data<AppState>,
    body: web::Json<PatternRequest>,
) -> Result<HttpResponse> {
    let listing = parse_listing(&body)?;
    let query = body
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ScreenerError::InvalidRequest("Query is required".to_string()))?;
    let llm = require_llm(&state)?;

    let bars = price_context(&state, &listing, &body.period).await;
    let prompt = patterns::chart_prompt(&listing.ticker(), query, &bars);
    let analysis = llm.complete(ANALYST_PROMPT, &prompt).await?;

    Ok(HttpResponse::Ok().json(ChartAnalysisResponse {
        success: true,
        analysis,
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/analyze-trends", web::post().to(analyze_trends))
        .route("/detect-patterns", web::post().to(detect_patterns))
        .route("/analyze-chart", web::post().to(analyze_chart));
}
