use anyhow::{bail, Result};
use crate::models::{PriceSeries, StatsResult};

/// 保留两位小数，恰好处于中间值时取偶数
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// 计算区间统计
///
/// 先按日期升序排序；最高价、最低价、平均收盘价按列跳过缺失值，
/// 最后收盘价取日期最晚的一条记录。空序列、某列全部缺失、最后一条记录
/// 缺少收盘价或出现非有限值（数据源返回异常数据）时返回错误。
pub fn compute_stats(mut series: PriceSeries) -> Result<StatsResult> {
    if series.is_empty() {
        bail!("cannot compute statistics over an empty price series");
    }

    series.sort_by_key(|r| r.date);

    let closes: Vec<f64> = series.iter().filter_map(|r| r.close).collect();

    let period_high = series
        .iter()
        .filter_map(|r| r.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let period_low = series
        .iter()
        .filter_map(|r| r.low)
        .fold(f64::INFINITY, f64::min);
    // 全部缺失时为 NaN，由下面的有限值检查拒绝
    let average_close = closes.iter().sum::<f64>() / closes.len() as f64;
    let last_close = series
        .last()
        .and_then(|r| r.close)
        .unwrap_or(f64::NAN);

    for (name, value) in [
        ("period_high", period_high),
        ("period_low", period_low),
        ("average_close_price", average_close),
        ("last_close_price", last_close),
    ] {
        if !value.is_finite() {
            bail!("malformed price data: {} is {}", name, value);
        }
    }

    Ok(StatsResult {
        period_high: round2(period_high),
        period_low: round2(period_low),
        average_close_price: round2(average_close),
        last_close_price: round2(last_close),
    })
}
