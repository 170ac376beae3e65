//! Request and response interceptor chains.
//!
//! Interceptors are pure side-effecting hooks: request interceptors run in
//! registration order immediately before each send, response interceptors in
//! registration order immediately after each receive and before pipeline
//! resolution. Chains are frozen at processor build time.

use std::sync::Arc;

use traverse_types::{RequestBuilder, Response};

/// Hook run against every outgoing request builder before it is frozen.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, builder: &mut RequestBuilder);
}

/// Hook run against every response before pipeline resolution.
pub trait ResponseInterceptor: Send + Sync {
    fn intercept(&self, response: &Response);
}

/// Frozen, ordered request interceptor chain.
#[derive(Clone, Default)]
pub struct RequestInterceptors {
    chain: Vec<Arc<dyn RequestInterceptor>>,
}

impl RequestInterceptors {
    pub fn new(chain: Vec<Arc<dyn RequestInterceptor>>) -> Self {
        Self { chain }
    }

    /// Runs every interceptor in registration order.
    pub fn intercept(&self, builder: &mut RequestBuilder) {
        for interceptor in &self.chain {
            interceptor.intercept(builder);
        }
    }
}

/// Frozen, ordered response interceptor chain.
#[derive(Clone, Default)]
pub struct ResponseInterceptors {
    chain: Vec<Arc<dyn ResponseInterceptor>>,
}

impl ResponseInterceptors {
    pub fn new(chain: Vec<Arc<dyn ResponseInterceptor>>) -> Self {
        Self { chain }
    }

    /// Runs every interceptor in registration order.
    pub fn intercept(&self, response: &Response) {
        for interceptor in &self.chain {
            interceptor.intercept(response);
        }
    }
}
