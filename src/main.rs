//! 股票统计后端服务
//!
//! 提供单个统计接口 GET /api/stats，返回区间最高价、最低价、平均收盘价和最后收盘价
//! 数据来源：Yahoo Finance

mod config;     // 配置
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::cache::ResponseCache;
use crate::services::price::{PriceFetcher, YahooFetcher};

/// 应用程序入口
///
/// 启动 HTTP 服务器，默认监听 127.0.0.1:5000
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 初始化日志系统，默认日志级别为 info
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load();
    if let Ok(json) = serde_json::to_string(&config) {
        log::debug!("当前配置: {}", json);
    }

    let fetcher: Arc<dyn PriceFetcher> = match YahooFetcher::new(&config.upstream) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            log::error!("初始化数据源失败: {:#}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };
    let fetcher = web::Data::from(fetcher);

    // 所有 worker 共享同一个缓存
    let cache = Arc::new(ResponseCache::with_system_clock(config.cache_ttl()));

    log::info!(
        "启动股票统计服务: {}，缓存有效期 {} 秒，数据源 {}",
        config.bind_addr(),
        cache.ttl().as_secs(),
        config.upstream.base_url
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(fetcher.clone())
            .configure(handlers::config(cache.clone()))  // 配置路由
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await
}
