//! 响应缓存
//!
//! 以原始查询字符串为键的进程内缓存，固定有效期，过期条目在读取时惰性删除

use actix_web::http::{header::HeaderValue, StatusCode};
use actix_web::web::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 时钟抽象，测试中可替换为手动推进的时钟
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// 系统单调时钟
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 缓存的完整响应（状态码 + Content-Type + 响应体）
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

#[derive(Debug)]
struct CacheEntry {
    response: CachedResponse,
    expires_at: Instant,
}

/// 固定 TTL 的并发响应缓存
///
/// 写入后条目不再修改，同一键的再次写入整体替换旧条目
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// 使用系统时钟创建缓存
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 查询缓存，过期条目视为不存在并被移除
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                return Some(entry.response.clone());
            }
        }

        // 读锁已释放，再按过期条件删除，避免误删并发写入的新条目
        self.entries.remove_if(key, |_, entry| now >= entry.expires_at);
        None
    }

    pub fn insert(&self, key: impl Into<String>, response: CachedResponse) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(key.into(), CacheEntry { response, expires_at });
    }

    /// 当前条目数（包含尚未被读取清理的过期条目）
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    fn response(status: StatusCode, body: &'static str) -> CachedResponse {
        CachedResponse {
            status,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn cache_with_clock(ttl_secs: u64) -> (ResponseCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ResponseCache::new(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_hit_before_expiry() {
        let (cache, clock) = cache_with_clock(300);
        cache.insert("ticker=MSFT", response(StatusCode::OK, "{}"));

        clock.advance(Duration::from_secs(299));
        assert_eq!(
            cache.get("ticker=MSFT"),
            Some(response(StatusCode::OK, "{}"))
        );
    }

    #[test]
    fn test_expires_at_ttl() {
        let (cache, clock) = cache_with_clock(300);
        cache.insert("ticker=MSFT", response(StatusCode::OK, "{}"));

        clock.advance(Duration::from_secs(300));
        assert_eq!(cache.get("ticker=MSFT"), None);
        // 过期条目在读取时被清理
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expired_entry_kept_until_read() {
        let (cache, clock) = cache_with_clock(10);
        cache.insert("ticker=A", response(StatusCode::OK, "a"));
        cache.insert("ticker=B", response(StatusCode::OK, "b"));

        clock.advance(Duration::from_secs(11));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("ticker=A"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let (cache, _clock) = cache_with_clock(300);
        cache.insert("ticker=MSFT&start=2023-01-01", response(StatusCode::OK, "jan"));
        cache.insert("ticker=MSFT&start=2023-02-01", response(StatusCode::OK, "feb"));

        assert_eq!(
            cache.get("ticker=MSFT&start=2023-01-01").unwrap().body,
            Bytes::from_static(b"jan")
        );
        assert_eq!(
            cache.get("ticker=MSFT&start=2023-02-01").unwrap().body,
            Bytes::from_static(b"feb")
        );
        assert_eq!(cache.get("ticker=MSFT"), None);
    }

    #[test]
    fn test_reinsert_restarts_ttl() {
        let (cache, clock) = cache_with_clock(60);
        cache.insert("k", response(StatusCode::NOT_FOUND, "old"));

        clock.advance(Duration::from_secs(61));
        assert_eq!(cache.get("k"), None);

        cache.insert("k", response(StatusCode::OK, "new"));
        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.get("k"), Some(response(StatusCode::OK, "new")));
    }

    #[test]
    fn test_concurrent_insert_and_get() {
        let cache = Arc::new(ResponseCache::with_system_clock(Duration::from_secs(300)));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let key = format!("ticker=T{}&n={}", i, j);
                        cache.insert(key.clone(), response(StatusCode::OK, "{}"));
                        assert!(cache.get(&key).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
