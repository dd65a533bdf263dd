//! 股票数据模型
//!
//! 定义行情序列、统计结果和查询参数

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// 单日行情记录
///
/// 各价格字段独立缺失，统计时按列跳过缺失值
#[derive(Debug, Clone)]
pub struct PriceRecord {
    /// 交易日
    pub date: NaiveDate,
    /// 最高价
    pub high: Option<f64>,
    /// 最低价
    pub low: Option<f64>,
    /// 收盘价
    pub close: Option<f64>,
}

/// 日线行情序列，顺序由数据源决定，不保证按日期排序
pub type PriceSeries = Vec<PriceRecord>;

/// 区间统计结果，所有字段保留两位小数
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResult {
    /// 区间最高价
    pub period_high: f64,
    /// 区间最低价
    pub period_low: f64,
    /// 平均收盘价
    pub average_close_price: f64,
    /// 最后一个交易日的收盘价
    pub last_close_price: f64,
}

/// 统计接口查询参数
#[derive(Debug, Default)]
pub struct StatsQuery {
    /// 股票代码（必填）
    pub ticker: Option<String>,
    /// 开始日期（YYYY-MM-DD）
    pub start: Option<String>,
    /// 结束日期（YYYY-MM-DD）
    pub end: Option<String>,
}

impl StatsQuery {
    /// 解析原始查询字符串，重复的参数取第一次出现的值，未知参数忽略
    pub fn parse(query_string: &str) -> Self {
        let mut query = Self::default();

        for (key, value) in form_urlencoded::parse(query_string.as_bytes()) {
            let slot = match key.as_ref() {
                "ticker" => &mut query.ticker,
                "start" => &mut query.start,
                "end" => &mut query.end,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        query
    }
}
