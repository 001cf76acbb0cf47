//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Repositories;
use crate::images::ImageResolver;
use crate::services::auth::AuthService;
use crate::services::catalog::CatalogService;
use crate::services::orders::OrderService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and hands out request-scoped
/// services over the shared repositories.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    repos: Repositories,
    images: ImageResolver,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `repos` - Storage backend (`PostgreSQL` or in-memory)
    #[must_use]
    pub fn new(config: ApiConfig, repos: Repositories) -> Self {
        let images = ImageResolver::new(&config.public_url);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                images,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the repositories.
    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    #[must_use]
    pub fn images(&self) -> &ImageResolver {
        &self.inner.images
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            &self.inner.repos,
            self.inner.config.token_ttl,
            self.inner.config.db_timeout,
        )
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(
            &self.inner.repos,
            &self.inner.images,
            self.inner.config.db_timeout,
        )
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(
            &self.inner.repos,
            &self.inner.images,
            self.inner.config.db_timeout,
        )
    }
}
