use std::sync::Arc;

use super::rate_limit::RateLimiter;
use crate::application::agent::AgentRunner;
use crate::application::catalog::Catalog;
use crate::application::definition::ExecutionOptions;
use crate::config::RateLimitConfig;
use crate::infrastructure::executor::PackageExecutor;
use crate::infrastructure::model::ModelProvider;

/// Shared state of the HTTP server.
pub struct ServerState<P: ModelProvider> {
    runner: AgentRunner<P>,
    catalog: Catalog,
    executor: Arc<dyn PackageExecutor>,
    options: ExecutionOptions,
    rate_limiter: RateLimiter,
}

impl<P: ModelProvider> ServerState<P> {
    pub fn new(
        runner: AgentRunner<P>,
        catalog: Catalog,
        executor: Arc<dyn PackageExecutor>,
        options: ExecutionOptions,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            runner,
            catalog,
            executor,
            options,
            rate_limiter: RateLimiter::new(rate_limit),
        }
    }

    pub fn runner(&self) -> &AgentRunner<P> {
        &self.runner
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn executor(&self) -> Arc<dyn PackageExecutor> {
        Arc::clone(&self.executor)
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}
