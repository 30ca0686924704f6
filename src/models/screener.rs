//! 选股器数据模型
//!
//! 筛选条件、股票池范围和请求参数

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::stock::MetricField;
use crate::error::ScreenerError;

/// 单个指标的阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Value(f64),
    /// 非数值阈值，任何记录都不满足
    Invalid,
}

/// 指标名 -> 阈值
///
/// 未知字段直接忽略；0、空字符串、null、false 视为未设置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    criteria: BTreeMap<MetricField, Threshold>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: MetricField, threshold: f64) -> Self {
        if threshold != 0.0 {
            self.criteria.insert(field, Threshold::Value(threshold));
        }
        self
    }

    /// 从 JSON 对象构建；已存在的指标不会被覆盖
    pub fn extend_from_json(&mut self, map: &Map<String, Value>) {
        for (key, value) in map {
            let Some(field) = MetricField::from_key(key) else {
                continue;
            };
            if self.criteria.contains_key(&field) {
                continue;
            }
            if let Some(threshold) = parse_threshold(value) {
                self.criteria.insert(field, threshold);
            }
        }
    }

    pub fn from_json(map: &Map<String, Value>) -> Self {
        let mut spec = Self::new();
        spec.extend_from_json(map);
        spec
    }

    pub fn criteria(&self) -> impl Iterator<Item = (MetricField, Threshold)> + '_ {
        self.criteria.iter().map(|(f, t)| (*f, *t))
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// None 表示跳过该条件
fn parse_threshold(value: &Value) -> Option<Threshold> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(Threshold::Invalid),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 0.0 => None,
            Some(v) if v.is_finite() => Some(Threshold::Value(v)),
            _ => Some(Threshold::Invalid),
        },
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.parse::<f64>() {
                Ok(v) if v == 0.0 => None,
                Ok(v) if v.is_finite() => Some(Threshold::Value(v)),
                _ => Some(Threshold::Invalid),
            }
        }
        Value::Array(_) | Value::Object(_) => Some(Threshold::Invalid),
    }
}

/// 交易所范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ExchangeScope {
    Nse,
    Bse,
    #[default]
    Both,
}

impl FromStr for ExchangeScope {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "both" => Ok(Self::Both),
            "nse" => Ok(Self::Nse),
            "bse" => Ok(Self::Bse),
            other => Err(ScreenerError::InvalidRequest(format!(
                "Unknown exchange: {} (expected nse, bse or both)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ExchangeScope {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map_err(|e: ScreenerError| e.to_string())
    }
}

/// 股票池（指数）范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum IndexScope {
    #[default]
    All,
    Nifty50,
    NiftyNext50,
    Sensex30,
    Bse100,
}

impl FromStr for IndexScope {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "nifty50" => Ok(Self::Nifty50),
            "niftynext50" => Ok(Self::NiftyNext50),
            "sensex30" => Ok(Self::Sensex30),
            "bse100" => Ok(Self::Bse100),
            other => Err(ScreenerError::InvalidRequest(format!(
                "Unknown index: {} (expected all, nifty50, niftynext50, sensex30 or bse100)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for IndexScope {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map_err(|e: ScreenerError| e.to_string())
    }
}

fn default_sort() -> bool {
    true
}

/// POST /screener/filter 请求体
///
/// 兼容旧版平铺格式：阈值直接放在顶层
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    #[serde(default)]
    pub filters: Map<String, Value>,
    #[serde(default)]
    pub exchange: ExchangeScope,
    #[serde(default)]
    pub index: IndexScope,
    /// 按市值降序排序
    #[serde(default = "default_sort")]
    pub sort_by_market_cap: bool,
    #[serde(flatten)]
    pub legacy: Map<String, Value>,
}

impl FilterRequest {
    /// 合并嵌套与平铺的筛选条件，嵌套优先
    pub fn filter_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::from_json(&self.filters);
        spec.extend_from_json(&self.legacy);
        spec
    }
}

impl Default for FilterRequest {
    fn default() -> Self {
        Self {
            filters: Map::new(),
            exchange: ExchangeScope::default(),
            index: IndexScope::default(),
            sort_by_market_cap: true,
            legacy: Map::new(),
        }
    }
}

/// GET /screener/universe 查询参数
#[derive(Debug, Deserialize)]
pub struct UniverseQuery {
    #[serde(default)]
    pub index: IndexScope,
    #[serde(default)]
    pub exchange: ExchangeScope,
}
