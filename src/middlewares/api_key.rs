use crate::config::SecurityConfig;
use crate::error::AppError;
use crate::utils::API_KEY_HEADER;
use actix_web::http::Method;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// 受保护的路径前缀及其对应的 key
#[derive(Clone)]
struct GuardedScopes {
    scopes: Vec<(&'static str, String)>,
}

impl GuardedScopes {
    fn new(security: &SecurityConfig) -> Self {
        Self {
            scopes: vec![
                ("/api/v1/admin/", security.admin_api_key.clone()),
                ("/api/v1/delivery/", security.delivery_api_key.clone()),
            ],
        }
    }

    /// 返回路径需要的 key; 玩家接口与文档不需要
    fn required_key(&self, path: &str) -> Option<&str> {
        self.scopes
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix))
            .map(|(_, key)| key.as_str())
    }
}

/// 按路径前缀校验 `X-Api-Key`
pub struct ApiKeyMiddleware {
    scopes: GuardedScopes,
}

impl ApiKeyMiddleware {
    pub fn new(security: &SecurityConfig) -> Self {
        Self {
            scopes: GuardedScopes::new(security),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddlewareService {
            service,
            scopes: self.scopes.clone(),
        }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: S,
    scopes: GuardedScopes,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let Some(expected) = self.scopes.required_key(req.path()) else {
            return Box::pin(self.service.call(req));
        };

        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        // 未配置 key 的作用域一律拒绝
        if !expected.is_empty() && provided == Some(expected) {
            Box::pin(self.service.call(req))
        } else {
            log::warn!("Rejected {} {}: bad api key", req.method(), req.path());
            Box::pin(async move { Err(AppError::Forbidden.into()) })
        }
    }
}
