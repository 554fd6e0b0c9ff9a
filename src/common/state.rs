use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::plugins::{self, DailySummaryPlugin, PluginContext, PluginHost, PluginRegistry};
use crate::session::Session;
use crate::sync::{RefreshCoordinator, RefreshSettings};
use crate::tempestd::TempestClient;

/// Everything one dashboard session owns.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<TempestClient>,
    pub session: Session,
}

impl AppState {
    /// Build the client and a fresh session seeded from `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` if the HTTP client cannot be constructed.
    pub fn new(config: Config) -> AppResult<Self> {
        let client = TempestClient::new(&config)?;
        let session = Session::new(config.default_units, config.default_time_range());

        Ok(Self {
            config: Arc::new(config),
            client: Arc::new(client),
            session,
        })
    }

    #[must_use]
    pub fn coordinator(&self) -> RefreshCoordinator<TempestClient> {
        RefreshCoordinator::new(
            Arc::clone(&self.client),
            self.session.clone(),
            RefreshSettings::from_config(&self.config),
        )
    }

    /// Plugins shipped with the dashboard, addressable from a manifest.
    #[must_use]
    pub fn plugin_registry(&self) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        let client = Arc::clone(&self.client);
        registry.register(plugins::daily_summary::NAME, move |_url| {
            Box::new(DailySummaryPlugin::new(Arc::clone(&client)))
        });
        registry
    }

    /// Load the configured plugin manifest, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` or `AppError::Manifest` when the manifest exists
    /// but cannot be read.
    pub fn load_plugins(&self) -> AppResult<PluginHost> {
        let Some(path) = self.config.plugins_manifest.as_deref() else {
            return Ok(PluginHost::empty());
        };
        let entries = plugins::load_manifest(path)?;
        if entries.is_empty() {
            return Ok(PluginHost::empty());
        }
        let ctx = PluginContext::new(self.session.clone());
        let host = PluginHost::load(&entries, &self.plugin_registry(), &ctx);
        if host.len() < entries.len() {
            tracing::warn!(
                loaded = host.len(),
                listed = entries.len(),
                "Some plugins failed to load"
            );
        }
        Ok(host)
    }
}
