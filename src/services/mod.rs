//! 业务逻辑服务模块
//!
//! 封装数据获取、缓存和筛选逻辑

pub mod cache; // 指标缓存
pub mod common; // 公共工具
pub mod llm; // 大模型接口
pub mod patterns; // 技术形态分析
pub mod screener; // 选股器
pub mod stock; // 指标/行情数据源
pub mod stock_service; // 股票数据服务

#[cfg(test)]
pub mod testing;
