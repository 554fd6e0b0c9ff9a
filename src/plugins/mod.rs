//! Manifest-driven dashboard plugins.
//!
//! A manifest is a JSON array of `{ "name": ..., "url": ... }` entries. Each
//! name is resolved against a [`PluginRegistry`] of compiled-in factories; the
//! `url` is handed to the factory as the plugin's source location. Every
//! lifecycle call is contained: errors and panics are logged and the plugin is
//! skipped, so a misbehaving plugin never reaches the refresh loop.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::range::TimeRange;
use crate::render::UnitLabels;
use crate::session::Session;
use crate::tempestd::models::UnitSystem;

pub mod daily_summary;

pub use daily_summary::DailySummaryPlugin;

/// Capabilities a plugin may implement. Every method has a no-op default.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Section heading; falls back to the manifest name.
    fn label(&self) -> Option<&str> {
        None
    }

    fn init(&self, _ctx: &PluginContext) -> AppResult<()> {
        Ok(())
    }

    /// Markup for the plugin's collapsible section.
    fn render(&self) -> Option<String> {
        None
    }

    fn create_charts(&self, _ctx: &PluginContext) -> AppResult<()> {
        Ok(())
    }

    fn refresh<'a>(&'a self, _ctx: &'a PluginContext) -> BoxFuture<'a, AppResult<()>> {
        futures::future::ready(Ok(())).boxed()
    }

    fn destroy(&self) {}
}

/// What plugins may see of the dashboard.
#[derive(Clone)]
pub struct PluginContext {
    session: Session,
}

impl PluginContext {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn units(&self) -> UnitSystem {
        self.session.units()
    }

    #[must_use]
    pub fn time_range(&self) -> Option<TimeRange> {
        self.session.time_range()
    }

    #[must_use]
    pub fn unit_labels(&self) -> UnitLabels {
        UnitLabels::for_units(self.units())
    }

    /// `22.5°C`, or `--` when there is no value.
    #[must_use]
    pub fn format_temp(&self, value: Option<f64>, units: Option<UnitSystem>) -> String {
        let labels = UnitLabels::for_units(units.unwrap_or_else(|| self.units()));
        value.map_or_else(|| "--".to_string(), |v| format!("{v:.1}{}", labels.temp))
    }

    #[must_use]
    pub fn format_timestamp(&self, ts: Option<DateTime<Utc>>) -> String {
        ts.map_or_else(
            || "--".to_string(),
            |ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
    }

    /// Backend origin configured for plugin `name` via
    /// `TEMPEST_PLUGIN_<NAME>_SERVER`.
    #[must_use]
    pub fn server_url(&self, name: &str) -> Option<Url> {
        let var = format!(
            "TEMPEST_PLUGIN_{}_SERVER",
            name.to_uppercase().replace('-', "_")
        );
        let raw = std::env::var(var).ok()?;
        let url = Url::parse(raw.trim()).ok()?;
        Url::parse(&url.origin().ascii_serialization()).ok()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Read a plugin manifest. A missing file means no plugins.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be read and
/// `AppError::Manifest` if it is not a JSON array of entries.
pub fn load_manifest(path: &Path) -> AppResult<Vec<ManifestEntry>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No plugin manifest");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&raw)?)
}

type PluginFactory = Box<dyn Fn(&str) -> Box<dyn Plugin> + Send + Sync>;

/// Compiled-in plugins, addressable by manifest name.
#[derive(Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    fn create(&self, name: &str, url: &str) -> Option<Box<dyn Plugin>> {
        self.factories.get(name).map(|factory| factory(url))
    }
}

struct LoadedPlugin {
    name: String,
    label: String,
    plugin: Box<dyn Plugin>,
}

/// A rendered plugin section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSection {
    pub name: String,
    pub label: String,
    pub content: String,
}

pub struct PluginHost {
    plugins: Vec<LoadedPlugin>,
    destroyed: AtomicBool,
}

impl PluginHost {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            plugins: Vec::new(),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Instantiate and initialise every usable manifest entry, in order.
    #[must_use]
    pub fn load(entries: &[ManifestEntry], registry: &PluginRegistry, ctx: &PluginContext) -> Self {
        let mut plugins = Vec::new();

        for entry in entries {
            let (Some(name), Some(url)) = (entry.name.as_deref(), entry.url.as_deref()) else {
                tracing::warn!(?entry, "Skipping plugin entry without name or url");
                continue;
            };
            if name.is_empty() || url.is_empty() {
                tracing::warn!(?entry, "Skipping plugin entry without name or url");
                continue;
            }

            let Some(plugin) = contain(name, "create", || {
                registry
                    .create(name, url)
                    .ok_or_else(|| AppError::Plugin(format!("unknown plugin '{name}'")))
            }) else {
                continue;
            };

            if plugin.name().is_empty() {
                tracing::warn!(plugin = name, "Plugin reports an empty name, skipping");
                continue;
            }

            if contain(name, "init", || plugin.init(ctx)).is_none() {
                continue;
            }

            let label = plugin.label().unwrap_or(name).to_string();
            if contain(name, "render", || Ok(plugin.render())).is_none() {
                continue;
            }

            if contain(name, "create_charts", || plugin.create_charts(ctx)).is_none() {
                continue;
            }

            tracing::info!(plugin = name, url, "Plugin loaded");
            plugins.push(LoadedPlugin {
                name: name.to_string(),
                label,
                plugin,
            });
        }

        Self {
            plugins,
            destroyed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    /// Render every plugin's section as it stands now.
    #[must_use]
    pub fn sections(&self) -> Vec<PluginSection> {
        if self.destroyed.load(Ordering::Acquire) {
            return Vec::new();
        }
        self.plugins
            .iter()
            .filter_map(|p| {
                let content = contain(&p.name, "render", || Ok(p.plugin.render())).flatten()?;
                Some(PluginSection {
                    name: p.name.clone(),
                    label: p.label.clone(),
                    content,
                })
            })
            .collect()
    }

    /// Refresh every plugin in load order; failures are logged and skipped.
    pub async fn refresh_all(&self, ctx: &PluginContext) {
        if self.destroyed.load(Ordering::Acquire) {
            return;
        }
        for loaded in &self.plugins {
            // Building the future can panic as well as polling it
            let Some(refresh) = contain(&loaded.name, "refresh", || Ok(loaded.plugin.refresh(ctx)))
            else {
                continue;
            };
            match AssertUnwindSafe(refresh).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(plugin = %loaded.name, error = %e, "Plugin refresh failed");
                }
                Err(_) => {
                    tracing::error!(plugin = %loaded.name, "Plugin panicked during refresh");
                }
            }
        }
    }

    /// Tear down every plugin once.
    pub fn destroy_all(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        for loaded in &self.plugins {
            let name = loaded.name.as_str();
            contain(name, "destroy", || {
                loaded.plugin.destroy();
                Ok(())
            });
        }
    }
}

/// Run one lifecycle stage, absorbing errors and panics.
fn contain<T>(name: &str, stage: &'static str, f: impl FnOnce() -> AppResult<T>) -> Option<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(plugin = name, stage, error = %e, "Plugin stage failed");
            None
        }
        Err(_) => {
            tracing::error!(plugin = name, stage, "Plugin panicked");
            None
        }
    }
}
