//! 配置模块
//!
//! 不读取配置文件，所有配置取默认值，仅 HOST / PORT 环境变量可覆盖监听地址

use serde::Serialize;
use std::env;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    pub workers: usize,
}

/// 上游数据源配置
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamConfig {
    /// Yahoo Finance 接口地址
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    pub connect_timeout_secs: u64,
}

/// 响应缓存配置
#[derive(Debug, Clone, Serialize)]
pub struct CacheConfig {
    /// 缓存有效期（秒）
    pub ttl_secs: u64,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
}

// 默认值函数
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5000 }
fn default_base_url() -> String { "https://query2.finance.yahoo.com".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_ttl() -> u64 { 300 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: default_ttl() }
    }
}

impl AppConfig {
    /// 加载配置：默认值 + HOST / PORT 环境变量
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_env(env::var("HOST").ok(), env::var("PORT").ok());
        config
    }

    fn apply_env(&mut self, host: Option<String>, port: Option<String>) {
        if let Some(host) = host.filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = port {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("忽略无效的 PORT 环境变量: {}", port),
            }
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
