//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::AnnotationService;
use crate::config::Settings;
use crate::infrastructure::http::UreqApiClient;
use crate::infrastructure::traits::{ApiClient, FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Catalog service API
    pub api: Arc<dyn ApiClient>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// `token` is the already-resolved API token (CLI flag or settings).
    pub fn new(settings: Settings, token: &str) -> Self {
        let api = UreqApiClient::from_settings(&settings, token);
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(api))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>, api: Arc<dyn ApiClient>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, api }
    }

    /// Annotation manager bound to this container's filesystem and API.
    pub fn annotation_service(&self) -> AnnotationService {
        AnnotationService::new(Arc::clone(&self.fs), Arc::clone(&self.api))
    }
}
