//! 响应缓存中间件
//!
//! 以原始查询字符串为键缓存被包裹服务的完整响应（状态码 + 响应体），
//! 命中时直接返回，不再调用内部服务

use actix_web::{
    body::{self, BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error,
    http::header,
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::services::cache::{CachedResponse, ResponseCache};

/// 响应缓存中间件
pub struct CacheMiddleware {
    cache: Arc<ResponseCache>,
}

impl CacheMiddleware {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CacheMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = CacheMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CacheMiddlewareService {
            service: Rc::new(service),
            cache: self.cache.clone(),
        })
    }
}

pub struct CacheMiddlewareService<S> {
    service: Rc<S>,
    cache: Arc<ResponseCache>,
}

impl<S, B> Service<ServiceRequest> for CacheMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let cache = self.cache.clone();

        Box::pin(async move {
            let key = req.query_string().to_string();

            if let Some(cached) = cache.get(&key) {
                log::debug!("缓存命中: {:?}", key);
                return Ok(req.into_response(into_http_response(cached)));
            }
            log::debug!("缓存未命中: {:?}，当前条目数 {}", key, cache.len());

            let res = service.call(req).await?;
            let (req, res) = res.into_parts();
            let status = res.status();
            let content_type = res.headers().get(header::CONTENT_TYPE).cloned();
            let bytes = body::to_bytes(res.into_body()).await.map_err(|e| {
                let e: Box<dyn std::error::Error> = e.into();
                error::ErrorInternalServerError(e.to_string())
            })?;

            let cached = CachedResponse {
                status,
                content_type,
                body: bytes,
            };
            cache.insert(key, cached.clone());

            Ok(ServiceResponse::new(req, into_http_response(cached)))
        })
    }
}

/// 按缓存内容重建响应，Content-Type 与首次响应一致
fn into_http_response(cached: CachedResponse) -> HttpResponse {
    let mut builder = HttpResponse::build(cached.status);
    if let Some(content_type) = cached.content_type {
        builder.insert_header((header::CONTENT_TYPE, content_type));
    }
    builder.body(cached.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[actix_web::test]
    async fn test_cache_middleware_short_circuits() {
        let cache = Arc::new(ResponseCache::with_system_clock(Duration::from_secs(300)));
        let calls = Arc::new(AtomicUsize::new(0));

        let handler_calls = calls.clone();
        let app = test::init_service(
            App::new().service(
                web::resource("/echo")
                    .wrap(CacheMiddleware::new(cache.clone()))
                    .route(web::get().to(move || {
                        let n = handler_calls.fetch_add(1, Ordering::SeqCst);
                        async move {
                            HttpResponse::Accepted().json(serde_json::json!({ "call": n }))
                        }
                    })),
            ),
        )
        .await;

        for _ in 0..3 {
            let req = test::TestRequest::get().uri("/echo?a=1&b=2").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::ACCEPTED);
            assert_eq!(
                resp.headers().get(header::CONTENT_TYPE).unwrap(),
                "application/json"
            );
            assert_eq!(test::read_body(resp).await, web::Bytes::from_static(br#"{"call":0}"#));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // 参数顺序不同视为不同的键
        let req = test::TestRequest::get().uri("/echo?b=2&a=1").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(br#"{"call":1}"#));
        assert_eq!(cache.len(), 2);
    }

    #[actix_web::test]
    async fn test_cache_middleware_keeps_content_type() {
        let cache = Arc::new(ResponseCache::with_system_clock(Duration::from_secs(300)));
        let app = test::init_service(
            App::new().service(
                web::resource("/plain")
                    .wrap(CacheMiddleware::new(cache.clone()))
                    .route(web::get().to(|| async {
                        HttpResponse::BadRequest()
                            .content_type("text/plain; charset=utf-8")
                            .body("bad query")
                    })),
            ),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/plain?x=1").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
            assert_eq!(content_type, "text/plain; charset=utf-8");
            assert_eq!(test::read_body(resp).await, web::Bytes::from_static(b"bad query"));
        }
        assert_eq!(cache.len(), 1);
    }
}
