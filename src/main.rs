//! 印度股票筛选后端服务
//!
//! 提供选股、个股指标、历史行情和 AI 分析的 RESTful API 服务
//! 数据来源：Yahoo Finance、Alpha Vantage、NSE

mod config; // 配置
mod error; // 错误类型
mod handlers; // HTTP 请求处理器
mod middleware; // 中间件
mod models; // 数据模型定义
mod services; // 业务逻辑服务
mod state; // 共享状态

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;

use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;
use crate::state::AppState;

/// 应用程序入口
///
/// 加载配置，组装数据源和缓存，启动 HTTP 服务器
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 配置加载前日志尚未初始化，加载过程的日志会被丢弃
    let config = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    if config.api.api_key.is_empty() {
        log::warn!("未设置 API Key，接口认证已关闭");
    }

    let state = AppState::from_config(&config)?;
    let bind_addr = config.bind_addr();
    log::info!("启动股票筛选服务，监听 {}", bind_addr);

    let api_key = config.api.api_key.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default()) // 请求日志
            .wrap(ApiKeyMiddleware::new(api_key.clone())) // API Key 认证
            .configure(handlers::config) // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_addr)
        .with_context(|| format!("绑定地址 {} 失败", bind_addr))?
        .run()
        .await?;
    Ok(())
}
