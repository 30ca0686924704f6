//! 技术形态分析
//!
//! 拼装提示词交给大模型，并从回复中解析形态列表

use std::fmt::Write;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{DetectedPattern, PriceBar};

/// 提示词中最多附带的K线数量
const MAX_PROMPT_BARS: usize = 120;

pub const ANALYST_PROMPT: &str =
    "You are a technical analyst for Indian equities. Be concise and specific.";

/// 日期、收盘价、成交量表格（只保留最近的部分）
pub fn format_price_table(bars: &[PriceBar]) -> String {
    let start = bars.len().saturating_sub(MAX_PROMPT_BARS);
    let mut table = String::from("Date        Close       Volume\n");
    for bar in &bars[start..] {
        let _ = writeln!(table, "{}  {:>10.2}  {}", bar.date, bar.close, bar.volume);
    }
    table
}

fn data_section(bars: &[PriceBar]) -> String {
    if bars.is_empty() {
        "No price data is available; rely on general knowledge of the stock.".to_string()
    } else {
        format!("Price data:\n{}", format_price_table(bars))
    }
}

pub fn trend_prompt(symbol: &str, period: &str, bars: &[PriceBar]) -> String {
    format!(
        "Analyze trends for {} over {}.\n\n{}\n\
         Summarize the overall direction, key support and resistance levels, \
         and notable volume changes.",
        symbol,
        period,
        data_section(bars)
    )
}

pub fn detect_prompt(symbol: &str, bars: &[PriceBar]) -> String {
    format!(
        "Analyze the following stock price data for {} and identify any technical patterns.\n\n{}\n\
         Look for patterns like:\n\
         - Head and Shoulders\n\
         - Double Top/Bottom\n\
         - Triple Top/Bottom\n\
         - Cup and Handle\n\
         - Flags and Pennants\n\
         - Triangles (Ascending/Descending/Symmetrical)\n\n\
         For each pattern found, answer with these lines:\n\
         Pattern: <name>\n\
         Dates: <start> to <end>\n\
         Confidence: <0-100>%\n\
         Implications: <one sentence>",
        symbol,
        data_section(bars)
    )
}

pub fn chart_prompt(symbol: &str, query: &str, bars: &[PriceBar]) -> String {
    format!(
        "Given the following stock price data for {}:\n{}\n\
         Please analyze the chart and answer this query: {}\n\n\
         Consider:\n\
         - Technical patterns\n\
         - Support and resistance levels\n\
         - Trend analysis\n\
         - Volume analysis\n\
         - Potential turning points",
        symbol,
        data_section(bars),
        query
    )
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap())
}

fn value_after<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.split_once(label).map(|(_, rest)| rest.trim())
}

/// 按 `Pattern:` 行切分，随后的 Dates/Confidence/Implications 行归属当前形态
pub fn parse_patterns(text: &str) -> Vec<DetectedPattern> {
    let mut patterns = Vec::new();
    let mut current: Option<DetectedPattern> = None;

    for line in text.lines() {
        if let Some(name) = value_after(line, "Pattern:") {
            if let Some(done) = current.take() {
                patterns.push(done);
            }
            current = Some(DetectedPattern {
                name: name.trim_matches('*').trim().to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(pattern) = current.as_mut() else {
            continue;
        };
        if let Some(dates) = value_after(line, "Dates:") {
            pattern.dates = Some(dates.to_string());
        } else if let Some(confidence) = value_after(line, "Confidence:") {
            pattern.confidence = number_pattern()
                .find(confidence)
                .and_then(|m| m.as_str().parse().ok());
        } else if let Some(implications) = value_after(line, "Implications:") {
            pattern.implications = Some(implications.to_string());
        }
    }

    if let Some(done) = current {
        patterns.push(done);
    }
    patterns
}
