//! 区间统计接口
//!
//! GET /api/stats?ticker=<symbol>&start=<YYYY-MM-DD>&end=<YYYY-MM-DD>

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse, Result};
use crate::middleware::CacheMiddleware;
use crate::models::{ErrorBody, StatsQuery};
use crate::services::cache::ResponseCache;
use crate::services::price::PriceFetcher;
use crate::services::stats_service;

const MISSING_TICKER: &str = "Ticker symbol is a required parameter.";
const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

fn no_data_message(ticker: &str) -> String {
    format!(
        "No data found for ticker '{}'. It might be an invalid symbol or delisted.",
        ticker
    )
}

/// 获取股票区间统计
///
/// - 400: 缺少 ticker
/// - 404: 数据源无数据
/// - 500: 拉取或计算失败，details 中附带错误信息
///
/// 查询参数按原始查询字符串解析，重复参数取第一个值
pub async fn get_stats(
    req: HttpRequest,
    fetcher: web::Data<dyn PriceFetcher>,
) -> Result<HttpResponse> {
    let StatsQuery { ticker, start, end } = StatsQuery::parse(req.query_string());
    log::info!("请求统计: ticker={:?}, start={:?}, end={:?}", ticker, start, end);

    let ticker = match ticker.filter(|t| !t.is_empty()) {
        Some(ticker) => ticker,
        None => {
            log::warn!("缺少 ticker 参数");
            return Ok(HttpResponse::BadRequest().json(ErrorBody::new(MISSING_TICKER)));
        }
    };

    let series = match fetcher.fetch(&ticker, start.as_deref(), end.as_deref()).await {
        Ok(series) => series,
        Err(e) => {
            log::error!("获取 {} 行情失败: {:#}", ticker, e);
            return Ok(HttpResponse::InternalServerError()
                .json(ErrorBody::with_details(UNEXPECTED_ERROR, format!("{:#}", e))));
        }
    };

    if series.is_empty() {
        log::info!("{} 无数据", ticker);
        return Ok(HttpResponse::NotFound().json(ErrorBody::new(no_data_message(&ticker))));
    }

    match stats_service::compute_stats(series) {
        Ok(stats) => {
            log::info!("{} 统计成功: {:?}", ticker, stats);
            Ok(HttpResponse::Ok().json(stats))
        }
        Err(e) => {
            log::error!("计算 {} 统计失败: {:#}", ticker, e);
            Ok(HttpResponse::InternalServerError()
                .json(ErrorBody::with_details(UNEXPECTED_ERROR, format!("{:#}", e))))
        }
    }
}

/// 注册统计路由，响应缓存只包裹该资源
pub fn config(cache: Arc<ResponseCache>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::resource("/stats")
                .wrap(CacheMiddleware::new(cache))
                .route(web::get().to(get_stats)),
        );
    }
}
