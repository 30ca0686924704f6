//! Alpha Vantage 接口实现
//!
//! OVERVIEW 提供基本面指标，EARNINGS 提供年度 EPS 用于计算五年增速

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{as_percent, to_crores, MetricsProvider, PartialMetrics};
use crate::error::{Result, ScreenerError};
use crate::models::{Listing, MetricField};
use crate::services::common::{check_status, json_number, RetryPolicy};

/// 计算 CAGR 所需的年度 EPS 数量
const CAGR_YEARS: usize = 5;

/// Alpha Vantage 客户端，仅在配置了 Key 时启用
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl AlphaVantageClient {
    pub fn new(client: Client, base_url: &str, api_key: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            retry,
        }
    }

    async fn query(&self, function: &str, symbol: &str) -> Result<Value> {
        log::debug!("请求 Alpha Vantage {} {}", function, symbol);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let response = check_status(response, "Alpha Vantage")?;
        let payload: Value = response.json().await?;
        check_payload(&payload, symbol)?;
        Ok(payload)
    }
}

#[async_trait]
impl MetricsProvider for AlphaVantageClient {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_metrics(&self, listing: &Listing) -> Result<PartialMetrics> {
        let symbol = listing.alpha_vantage_symbol();

        let overview = self
            .retry
            .run("Alpha Vantage OVERVIEW", || self.query("OVERVIEW", &symbol))
            .await?;
        let mut metrics = parse_overview(&overview);

        // EARNINGS 失败不影响 OVERVIEW 结果
        match self
            .retry
            .run("Alpha Vantage EARNINGS", || self.query("EARNINGS", &symbol))
            .await
        {
            Ok(earnings) => metrics.set(MetricField::Cagr5Y, earnings_cagr(&earnings)),
            Err(e) => log::warn!("获取 {} 年度盈利失败: {}", symbol, e),
        }

        Ok(metrics)
    }
}

/// 识别 Alpha Vantage 以 200 状态返回的错误
///
/// 空对象表示代码不存在，Note/Information 表示限额用尽
fn check_payload(payload: &Value, symbol: &str) -> Result<()> {
    let Some(map) = payload.as_object() else {
        return Err(ScreenerError::UpstreamSchemaMismatch(format!(
            "Alpha Vantage {} 返回非对象",
            symbol
        )));
    };
    if map.is_empty() {
        return Err(ScreenerError::SymbolNotFound(symbol.to_string()));
    }
    if let Some(message) = map.get("Error Message").and_then(Value::as_str) {
        return Err(ScreenerError::SymbolNotFound(format!("{}: {}", symbol, message)));
    }
    for key in ["Note", "Information"] {
        if let Some(message) = map.get(key).and_then(Value::as_str) {
            return Err(ScreenerError::UpstreamRejected(message.to_string()));
        }
    }
    Ok(())
}

fn text_field(payload: &Value, key: &str) -> Option<String> {
    payload[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "None" && *s != "-")
        .map(str::to_string)
}

/// 解析 OVERVIEW，数值为字符串，"None" 视为缺失
fn parse_overview(payload: &Value) -> PartialMetrics {
    let mut metrics = PartialMetrics {
        name: text_field(payload, "Name"),
        sector: text_field(payload, "Sector"),
        ..Default::default()
    };

    metrics.set(MetricField::Roe, as_percent(json_number(&payload["ReturnOnEquityTTM"])));
    metrics.set(MetricField::DividendYield, as_percent(json_number(&payload["DividendYield"])));
    metrics.set(MetricField::Pe, json_number(&payload["PERatio"]));
    metrics.set(MetricField::Pb, json_number(&payload["PriceToBookRatio"]));
    metrics.set(MetricField::BookValue, json_number(&payload["BookValue"]));
    metrics.set(MetricField::Eps, json_number(&payload["EPS"]));
    metrics.set(MetricField::Beta, json_number(&payload["Beta"]));
    metrics.set(MetricField::MarketCap, to_crores(json_number(&payload["MarketCapitalization"])));
    metrics
}

/// 由年度 EPS 计算五年复合增速（%）
///
/// 需要至少五年数据且最早一年 EPS 为正
fn earnings_cagr(payload: &Value) -> Option<f64> {
    let annual = payload["annualEarnings"].as_array()?;
    if annual.len() < CAGR_YEARS {
        return None;
    }
    let latest = json_number(&annual[0]["reportedEPS"])?;
    let oldest = json_number(&annual[CAGR_YEARS - 1]["reportedEPS"])?;
    if oldest <= 0.0 || latest < 0.0 {
        return None;
    }
    Some(((latest / oldest).powf(1.0 / CAGR_YEARS as f64) - 1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_overview() {
        let payload = json!({
            "Symbol": "TCS.NSE",
            "Name": "Tata Consultancy Services",
            "Sector": "TECHNOLOGY",
            "PERatio": "29.5",
            "PriceToBookRatio": "14.2",
            "ReturnOnEquityTTM": "0.5",
            "DividendYield": "0.015",
            "MarketCapitalization": "14000000000000",
            "Beta": "None",
            "EPS": "-"
        });

        let metrics = parse_overview(&payload);
        assert_eq!(metrics.name.as_deref(), Some("Tata Consultancy Services"));
        assert_eq!(metrics.sector.as_deref(), Some("TECHNOLOGY"));
        assert_eq!(metrics.get(MetricField::Pe), Some(29.5));
        assert_eq!(metrics.get(MetricField::Roe), Some(50.0));
        assert_eq!(metrics.get(MetricField::DividendYield), Some(1.5));
        assert_eq!(metrics.get(MetricField::MarketCap), Some(1_400_000.0));
        assert_eq!(metrics.get(MetricField::Beta), None);
        assert_eq!(metrics.get(MetricField::Eps), None);
    }

    #[test]
    fn test_earnings_cagr() {
        let payload = json!({
            "annualEarnings": [
                {"fiscalDateEnding": "2024-03-31", "reportedEPS": "32"},
                {"fiscalDateEnding": "2023-03-31", "reportedEPS": "20"},
                {"fiscalDateEnding": "2022-03-31", "reportedEPS": "15"},
                {"fiscalDateEnding": "2021-03-31", "reportedEPS": "12"},
                {"fiscalDateEnding": "2020-03-31", "reportedEPS": "1"}
            ]
        });
        let cagr = earnings_cagr(&payload).unwrap();
        assert!((cagr - 100.0).abs() < 1e-9, "cagr = {}", cagr);
    }

    #[test]
    fn test_earnings_cagr_requires_history() {
        let short = json!({"annualEarnings": [{"reportedEPS": "10"}, {"reportedEPS": "5"}]});
        assert_eq!(earnings_cagr(&short), None);

        let negative_base = json!({
            "annualEarnings": [
                {"reportedEPS": "10"}, {"reportedEPS": "5"}, {"reportedEPS": "3"},
                {"reportedEPS": "1"}, {"reportedEPS": "-2"}
            ]
        });
        assert_eq!(earnings_cagr(&negative_base), None);
    }

    #[test]
    fn test_check_payload() {
        assert!(check_payload(&json!({"Symbol": "TCS.NSE"}), "TCS.NSE").is_ok());
        assert!(matches!(
            check_payload(&json!({}), "FOO.NSE"),
            Err(ScreenerError::SymbolNotFound(_))
        ));
        assert!(matches!(
            check_payload(&json!({"Note": "Thank you for using Alpha Vantage!"}), "TCS.NSE"),
            Err(ScreenerError::UpstreamRejected(_))
        ));
        assert!(matches!(
            check_payload(&json!({"Information": "rate limit"}), "TCS.NSE"),
            Err(ScreenerError::UpstreamRejected(_))
        ));
    }
}
