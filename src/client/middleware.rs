// File: ./src/client/middleware.rs
//! Tower middleware stamping every API request with the harness's headers.
use http::{HeaderValue, Request, header};
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

#[derive(Clone, Debug)]
pub struct DefaultHeadersLayer {
    user_agent: String,
    bearer: Option<String>,
}

impl DefaultHeadersLayer {
    pub fn new(user_agent: String, bearer: Option<String>) -> Self {
        Self {
            user_agent,
            bearer: bearer.filter(|t| !t.trim().is_empty()),
        }
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            user_agent: self.user_agent.clone(),
            bearer: self.bearer.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DefaultHeadersService<S> {
    inner: S,
    user_agent: String,
    bearer: Option<String>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        if let Ok(val) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(header::USER_AGENT, val);
        }
        headers
            .entry(header::ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));
        if let Some(token) = &self.bearer
            && let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", token))
        {
            headers.insert(header::AUTHORIZATION, val);
        }
        self.inner.call(req)
    }
}
