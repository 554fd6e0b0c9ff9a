use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::error::ApiResult;
use crate::plugins::{PluginContext, PluginHost};
use crate::session::{Session, SessionSubscription, StateKey};
use crate::sync::connection::{ConnectionMonitor, ConnectionStatus};
use crate::sync::worker::{self, FetchOutcome, FetchSequence};
use crate::tempestd::models::Health;
use crate::tempestd::TelemetrySource;

#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub poll_interval: Duration,
    /// Age after which a successful fetch no longer counts as connected
    pub freshness_window: chrono::Duration,
    pub disconnect_after_failures: u32,
    /// Fetch the observation series alongside current conditions
    pub fetch_history: bool,
}

impl RefreshSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            freshness_window: config.freshness_window(),
            disconnect_after_failures: config.disconnect_after_failures,
            fetch_history: config.fetch_history,
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            freshness_window: chrono::Duration::seconds(180),
            disconnect_after_failures: 3,
            fetch_history: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Activate,
    Refresh,
    Shutdown,
}

struct Inner<S> {
    source: Arc<S>,
    session: Session,
    settings: RefreshSettings,
    monitor: Mutex<ConnectionMonitor>,
    plugins: OnceLock<Arc<PluginHost>>,
    current_sequence: FetchSequence,
    series_sequence: FetchSequence,
    commands: mpsc::UnboundedSender<Command>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
    subscriptions: Mutex<Vec<SessionSubscription>>,
}

/// Keeps the session fresh: activation fetches on selection changes, a
/// recurring poll, and the connection status machine.
///
/// Fetch results are applied only while the selection they were issued for
/// is still current, and never over a newer response of the same kind.
/// Failures degrade the connection status and are never propagated out of
/// the poll loop.
pub struct RefreshCoordinator<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for RefreshCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TelemetrySource> RefreshCoordinator<S> {
    /// Create a coordinator and subscribe it to selection changes.
    #[must_use]
    pub fn new(source: Arc<S>, session: Session, settings: RefreshSettings) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();

        let subscriptions = [StateKey::StationId, StateKey::Units, StateKey::TimeRange]
            .into_iter()
            .map(|key| {
                let commands = commands.clone();
                session.on(key, move |_, _| {
                    // Closed once the loop has stopped; nothing left to activate.
                    let _ = commands.send(Command::Activate);
                })
            })
            .collect();

        let monitor = ConnectionMonitor::new(
            settings.freshness_window,
            settings.disconnect_after_failures,
        );

        Self {
            inner: Arc::new(Inner {
                source,
                session,
                settings,
                monitor: Mutex::new(monitor),
                plugins: OnceLock::new(),
                current_sequence: FetchSequence::new(),
                series_sequence: FetchSequence::new(),
                commands,
                receiver: Mutex::new(Some(receiver)),
                subscriptions: Mutex::new(subscriptions),
            }),
        }
    }

    /// Refresh `host` on every full refresh. Only the first host is kept.
    pub fn attach_plugins(&self, host: Arc<PluginHost>) {
        if self.inner.plugins.set(host).is_err() {
            tracing::warn!("Plugins already attached to refresh coordinator");
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.monitor().status()
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.monitor().consecutive_failures()
    }

    fn monitor(&self) -> std::sync::MutexGuard<'_, ConnectionMonitor> {
        self.inner
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the running loop for an immediate full refresh.
    pub fn refresh_now(&self) {
        let _ = self.inner.commands.send(Command::Refresh);
    }

    /// Stop the running loop.
    pub fn shutdown(&self) {
        let _ = self.inner.commands.send(Command::Shutdown);
    }

    fn record_success(&self) {
        let status = self.monitor().record_success(Utc::now());
        self.publish_status(status);
    }

    fn record_failure(&self) {
        let status = self.monitor().record_failure();
        self.publish_status(status);
    }

    fn publish_status(&self, status: ConnectionStatus) {
        // Nothing published yet counts as a change
        let previous = self.inner.session.published_connection();
        if previous == Some(status) {
            return;
        }
        match status {
            ConnectionStatus::Connected => {
                tracing::info!(from = ?previous, "Connected to tempestd");
            }
            ConnectionStatus::Stale | ConnectionStatus::Disconnected => {
                tracing::warn!(
                    from = ?previous,
                    to = %status,
                    failures = self.consecutive_failures(),
                    "Connection status degraded"
                );
            }
        }
        self.inner.session.set_connection(status);
    }

    /// Check backend reachability and feed the result to the status machine.
    pub async fn check_health(&self) -> ApiResult<Health> {
        match self.inner.source.fetch_health().await {
            Ok(health) => {
                tracing::debug!(status = %health.status, version = %health.version, "Health check ok");
                self.record_success();
                Ok(health)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Health check failed");
                self.record_failure();
                Err(e)
            }
        }
    }

    /// Load the station list into the session.
    pub async fn load_stations(&self, preferred: Option<u32>) -> ApiResult<Option<u32>> {
        match worker::sync_stations(&*self.inner.source, &self.inner.session, preferred).await {
            Ok(selected) => {
                self.record_success();
                Ok(selected)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load stations");
                self.record_failure();
                Err(e)
            }
        }
    }

    /// Fetch current conditions for the active selection.
    pub async fn refresh_current(&self) -> ApiResult<FetchOutcome> {
        let Some(selection) = self.inner.session.selection() else {
            return Ok(FetchOutcome::Skipped);
        };

        let fetch = worker::fetch_current(
            &*self.inner.source,
            &self.inner.session,
            selection,
            &self.inner.current_sequence,
        );
        match fetch.await {
            Ok(outcome) => {
                self.record_success();
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    station_id = selection.station_id,
                    "Failed to fetch current conditions"
                );
                self.record_failure();
                Err(e)
            }
        }
    }

    /// Fetch the observation series for the active selection as seen at `now`.
    pub async fn refresh_series(&self, now: DateTime<Utc>) -> ApiResult<FetchOutcome> {
        if !self.inner.settings.fetch_history {
            return Ok(FetchOutcome::Skipped);
        }
        let Some(selection) = self.inner.session.selection() else {
            return Ok(FetchOutcome::Skipped);
        };

        worker::fetch_series(
            &*self.inner.source,
            &self.inner.session,
            selection,
            now,
            &self.inner.series_sequence,
        )
        .await
        .inspect_err(|e| {
            tracing::warn!(
                error = %e,
                station_id = selection.station_id,
                "Failed to fetch observation series"
            );
        })
    }

    async fn refresh_plugins(&self) {
        if let Some(host) = self.inner.plugins.get() {
            let ctx = PluginContext::new(self.inner.session.clone());
            host.refresh_all(&ctx).await;
        }
    }

    /// Current conditions, series and plugins, concurrently.
    pub async fn refresh_all(&self) {
        if self.inner.session.station_id().is_none() {
            tracing::debug!("No station selected, skipping refresh");
            return;
        }
        let now = Utc::now();
        let _ = tokio::join!(
            self.refresh_current(),
            self.refresh_series(now),
            self.refresh_plugins(),
        );
        self.inner.session.set_last_updated(Utc::now());
    }

    /// One poll: age the status, then refresh. Custom ranges are fixed, so
    /// only current conditions are re-fetched for them.
    pub async fn tick(&self) {
        let status = self.monitor().evaluate(Utc::now());
        self.publish_status(status);

        let Some(selection) = self.inner.session.selection() else {
            tracing::debug!("No station selected, poll skipped");
            return;
        };

        if selection.range.is_live() {
            self.refresh_all().await;
        } else {
            let _ = self.refresh_current().await;
            self.inner.session.set_last_updated(Utc::now());
        }
    }

    fn spawn_refresh_all(&self) {
        let this = self.clone();
        tokio::spawn(async move { this.refresh_all().await });
    }

    /// Drive the poll loop until [`shutdown`](Self::shutdown) is called.
    ///
    /// Performs an activation refresh immediately. Only one loop may run per
    /// coordinator.
    pub async fn run(&self) {
        let receiver = self
            .inner
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut commands) = receiver else {
            tracing::warn!("Refresh coordinator is already running");
            return;
        };

        let poll_interval = self.inner.settings.poll_interval;
        tracing::info!(
            interval_secs = poll_interval.as_secs(),
            fetch_history = self.inner.settings.fetch_history,
            "Starting refresh coordinator"
        );

        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Selection changes made before the loop started are covered by the
        // initial refresh
        let mut stopping = false;
        while let Ok(command) = commands.try_recv() {
            stopping |= command == Command::Shutdown;
        }

        // Run initial refresh immediately
        ticker.tick().await;
        if !stopping {
            self.spawn_refresh_all();
            self.poll(&mut ticker, &mut commands).await;
        }

        let subscriptions = std::mem::take(
            &mut *self
                .inner
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        tracing::info!("Refresh coordinator stopped");
    }

    async fn poll(
        &self,
        ticker: &mut tokio::time::Interval,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) {
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let this = self.clone();
                    tokio::spawn(async move { this.tick().await });
                }
                command = commands.recv() => {
                    let mut command = command.unwrap_or(Command::Shutdown);
                    // Coalesce a burst of selection changes into one refresh
                    while command != Command::Shutdown {
                        match commands.try_recv() {
                            Ok(next) => command = next,
                            Err(_) => break,
                        }
                    }
                    match command {
                        Command::Activate | Command::Refresh => {
                            tracing::debug!(?command, "Refreshing on demand");
                            ticker.reset();
                            self.spawn_refresh_all();
                        }
                        Command::Shutdown => return,
                    }
                }
            }
        }
    }
}
