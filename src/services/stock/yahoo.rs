//! Yahoo Finance 接口实现
//!
//! 对接 quoteSummary（估值/财务指标）和 chart（历史行情）接口

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use super::{as_percent, cash_flow_multiple, to_crores, ChartProvider, MetricsProvider, PartialMetrics};
use crate::config::ProvidersConfig;
use crate::error::{Result, ScreenerError};
use crate::models::{Listing, MetricField, PriceBar};
use crate::services::common::{check_status, endpoint, json_number, RetryPolicy};

/// quoteSummary 请求的模块
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";

/// Yahoo Finance 客户端
///
/// quoteSummary 需要 Cookie + crumb，crumb 失效（401）时重新获取并重发一次
pub struct YahooClient {
    client: Client,
    summary_url: String,
    chart_url: String,
    /// 返回 404 但会下发 Cookie
    cookie_url: String,
    crumb_url: String,
    retry: RetryPolicy,
    crumb: RwLock<Option<String>>,
}

impl YahooClient {
    pub fn new(client: Client, providers: &ProvidersConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            summary_url: providers.yahoo_base_url.clone(),
            chart_url: providers.yahoo_chart_url.clone(),
            cookie_url: providers.yahoo_cookie_url.clone(),
            crumb_url: providers.yahoo_crumb_url.clone(),
            retry,
            crumb: RwLock::new(None),
        }
    }

    async fn crumb(&self) -> Result<String> {
        if let Some(crumb) = self.crumb.read().await.clone() {
            return Ok(crumb);
        }

        // 仅为写入 Cookie，状态码无关紧要
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            log::debug!("获取 Yahoo Cookie 失败: {}", e);
        }

        let response = check_status(
            self.client.get(&self.crumb_url).send().await?,
            "Yahoo crumb",
        )?;
        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(ScreenerError::UpstreamRejected("Yahoo 未返回有效 crumb".to_string()));
        }

        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    async fn send_summary(&self, url: Url, crumb: &str) -> Result<Response> {
        Ok(self
            .client
            .get(url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb)])
            .send()
            .await?)
    }

    async fn fetch_summary(&self, ticker: &str) -> Result<Value> {
        let url = endpoint(&self.summary_url, ticker)?;
        log::debug!("请求 Yahoo 指标数据 URL: {}", url);

        let crumb = self.crumb().await?;
        let mut response = self.send_summary(url.clone(), &crumb).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            log::info!("Yahoo crumb 已失效，重新获取后重试 {}", ticker);
            *self.crumb.write().await = None;
            let crumb = self.crumb().await?;
            response = self.send_summary(url, &crumb).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                *self.crumb.write().await = None;
            }
        }

        let response = check_status(response, "Yahoo quoteSummary")?;
        Ok(response.json().await?)
    }

    async fn fetch_chart(&self, ticker: &str, interval: &str, period: &str) -> Result<Value> {
        let url = endpoint(&self.chart_url, ticker)?;
        log::debug!("请求 Yahoo 行情数据 URL: {} ({} / {})", url, interval, period);

        let response = self
            .client
            .get(url)
            .query(&[("interval", interval), ("range", period)])
            .send()
            .await?;

        let response = check_status(response, "Yahoo chart")?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MetricsProvider for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_metrics(&self, listing: &Listing) -> Result<PartialMetrics> {
        let ticker = listing.ticker();
        let what = format!("Yahoo 指标 {}", ticker);
        let payload = self.retry.run(&what, || self.fetch_summary(&ticker)).await?;
        parse_quote_summary(&payload, &ticker)
    }
}

#[async_trait]
impl ChartProvider for YahooClient {
    async fn price_history(
        &self,
        ticker: &str,
        interval: &str,
        period: &str,
    ) -> Result<Vec<PriceBar>> {
        let what = format!("Yahoo 行情 {}", ticker);
        let payload = self
            .retry
            .run(&what, || self.fetch_chart(ticker, interval, period))
            .await?;
        let (_, bars) = parse_chart(&payload, ticker)?;
        Ok(bars)
    }

    async fn latest_price(&self, ticker: &str) -> Result<Option<f64>> {
        let what = format!("Yahoo 最新价 {}", ticker);
        let payload = self
            .retry
            .run(&what, || self.fetch_chart(ticker, "1d", "1d"))
            .await?;
        let (meta, _) = parse_chart(&payload, ticker)?;
        Ok(json_number(&meta["regularMarketPrice"]))
    }
}

/// 上游在 JSON 中报告的错误（如代码不存在）
fn upstream_error(node: &Value, ticker: &str) -> Option<ScreenerError> {
    let error = node.get("error").filter(|e| !e.is_null())?;
    let description = error["description"]
        .as_str()
        .or_else(|| error["code"].as_str())
        .unwrap_or("unknown error");
    Some(ScreenerError::SymbolNotFound(format!("{}: {}", ticker, description)))
}

/// 解析 quoteSummary 响应
///
/// 比例类字段（股息率、ROE、盈利增速）换算为百分比，市值换算为亿卢比
fn parse_quote_summary(payload: &Value, ticker: &str) -> Result<PartialMetrics> {
    let summary = &payload["quoteSummary"];
    if let Some(err) = upstream_error(summary, ticker) {
        return Err(err);
    }
    let result = summary["result"]
        .get(0)
        .ok_or_else(|| ScreenerError::UpstreamSchemaMismatch(format!("{}: quoteSummary.result 为空", ticker)))?;

    let price = &result["price"];
    let detail = &result["summaryDetail"];
    let stats = &result["defaultKeyStatistics"];
    let financial = &result["financialData"];

    let mut metrics = PartialMetrics {
        name: price["longName"]
            .as_str()
            .or_else(|| price["shortName"].as_str())
            .map(str::to_string),
        sector: result["assetProfile"]["sector"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        ..Default::default()
    };

    let market_cap = json_number(&price["marketCap"]).or_else(|| json_number(&detail["marketCap"]));

    metrics.set(
        MetricField::Price,
        json_number(&price["regularMarketPrice"]).or_else(|| json_number(&financial["currentPrice"])),
    );
    metrics.set(MetricField::Pe, json_number(&detail["trailingPE"]));
    metrics.set(MetricField::Pb, json_number(&stats["priceToBook"]));
    metrics.set(MetricField::BookValue, json_number(&stats["bookValue"]));
    metrics.set(MetricField::Eps, json_number(&stats["trailingEps"]));
    metrics.set(MetricField::DividendYield, as_percent(json_number(&detail["dividendYield"])));
    metrics.set(MetricField::Roe, as_percent(json_number(&financial["returnOnEquity"])));
    metrics.set(MetricField::Cagr5Y, as_percent(json_number(&financial["earningsGrowth"])));
    metrics.set(MetricField::DebtToEquity, json_number(&financial["debtToEquity"]));
    metrics.set(MetricField::MarketCap, to_crores(market_cap));
    metrics.set(MetricField::Beta, json_number(&detail["beta"]));
    metrics.set(MetricField::AvgVolume, json_number(&detail["averageVolume"]));
    metrics.set(MetricField::CashPerShare, json_number(&financial["totalCashPerShare"]));
    metrics.set(
        MetricField::PriceToCashFlow,
        cash_flow_multiple(market_cap, json_number(&financial["operatingCashflow"])),
    );
    metrics.set(
        MetricField::PriceToFreeCashFlow,
        cash_flow_multiple(market_cap, json_number(&financial["freeCashflow"])),
    );

    Ok(metrics)
}

/// 解析 chart 响应，返回 meta 和收盘价序列
///
/// 日期按交易所时区（meta.gmtoffset）格式化，收盘价为空的K线跳过
fn parse_chart<'a>(payload: &'a Value, ticker: &str) -> Result<(&'a Value, Vec<PriceBar>)> {
    let chart = &payload["chart"];
    if let Some(err) = upstream_error(chart, ticker) {
        return Err(err);
    }
    let result = chart["result"]
        .get(0)
        .ok_or_else(|| ScreenerError::UpstreamSchemaMismatch(format!("{}: chart.result 为空", ticker)))?;

    let meta = &result["meta"];
    let offset = meta["gmtoffset"]
        .as_i64()
        .and_then(|secs| FixedOffset::east_opt(secs as i32))
        .unwrap_or_else(|| Utc.fix());

    let empty = Vec::new();
    let timestamps = result["timestamp"].as_array().unwrap_or(&empty);
    let quote = &result["indicators"]["quote"][0];
    let closes = quote["close"].as_array().unwrap_or(&empty);
    let volumes = quote["volume"].as_array().unwrap_or(&empty);

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(close) = closes.get(i).and_then(json_number) else {
            continue;
        };
        let Some(time) = ts.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)) else {
            continue;
        };
        let volume = volumes.get(i).and_then(json_number).unwrap_or(0.0);

        bars.push(PriceBar {
            date: time.with_timezone(&offset).format("%Y-%m-%d").to_string(),
            close,
            volume: volume.max(0.0) as u64,
        });
    }

    Ok((meta, bars))
}
