use std::sync::Arc;

use actix_web::{web, HttpResponse, Result};

use crate::error::ScreenerError;
use crate::models::{AiQueryRequest, AiQueryResponse};
use crate::services::llm::{ChatModel, ADVISOR_PROMPT};
use crate::state::AppState;

/// 取出大模型客户端，未配置时返回 500
pub fn require_llm(state: &AppState) -> std::result::Result<Arc<dyn ChatModel>, ScreenerError> {
    state
        .llm
        .clone()
        .ok_or_else(|| ScreenerError::NotConfigured("API key not configured".to_string()))
}

/// 金融问答
pub async fn query_ai(
    state: web::Data<AppState>,
    body: web::Json<AiQueryRequest>,
) -> Result<HttpResponse> {
    let query = body
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ScreenerError::InvalidRequest("Query is required".to_string()))?;
    let llm = require_llm(&state)?;

    let answer = llm.complete(ADVISOR_PROMPT, query).await?;
    Ok(HttpResponse::Ok().json(AiQueryResponse { answer }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/query", web::post().to(query_ai));
}
