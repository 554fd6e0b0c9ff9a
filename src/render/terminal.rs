//! Plain-text renderer driven by session subscriptions.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::plugins::{PluginHost, PluginSection};
use crate::render::charts::{build_charts, latest_values, Chart};
use crate::render::current::{loading_boxes, stat_boxes, StatBox};
use crate::session::{Session, SessionSubscription, StateKey, StateValue};
use crate::sync::connection::ConnectionStatus;

pub const DISCONNECTED_BANNER: &str = "!! Disconnected from tempestd, retrying on next refresh";

type Output = Arc<Mutex<Box<dyn Write + Send>>>;

pub struct TerminalRenderer {
    banner_visible: Arc<AtomicBool>,
    subscriptions: Vec<SessionSubscription>,
}

impl TerminalRenderer {
    /// Subscribe to `session` and render every relevant change to `out`.
    ///
    /// Plugin sections, when a host is given, are redrawn after each refresh.
    pub fn attach(
        session: &Session,
        out: impl Write + Send + 'static,
        plugins: Option<Arc<PluginHost>>,
    ) -> Self {
        let out: Output = Arc::new(Mutex::new(Box::new(out)));
        let banner_visible = Arc::new(AtomicBool::new(false));
        let mut subscriptions = Vec::new();

        {
            let out = Arc::clone(&out);
            subscriptions.push(session.on(StateKey::StationId, move |value, _| {
                if let StateValue::StationId(Some(id)) = value {
                    emit(&out, &format!("Station {id}\n{}", format_conditions(&loading_boxes())));
                }
            }));
        }

        {
            let out = Arc::clone(&out);
            subscriptions.push(session.on(StateKey::CurrentObservation, move |value, _| {
                if let StateValue::CurrentObservation(obs) = value {
                    emit(&out, &format_conditions(&stat_boxes(Some(&**obs))));
                }
            }));
        }

        {
            let out = Arc::clone(&out);
            subscriptions.push(session.on(StateKey::Observations, move |value, _| {
                if let StateValue::Observations(page) = value
                    && !page.observations.is_empty()
                {
                    let charts = build_charts(&page.observations, page.units);
                    emit(&out, &format_charts(&charts, page.resolution.as_str()));
                }
            }));
        }

        {
            let out = Arc::clone(&out);
            let visible = Arc::clone(&banner_visible);
            subscriptions.push(session.on(StateKey::Connection, move |value, _| {
                let StateValue::Connection(status) = value else {
                    return;
                };
                let disconnected = *status == ConnectionStatus::Disconnected;
                let was_visible = visible.swap(disconnected, Ordering::AcqRel);
                if disconnected && !was_visible {
                    emit(&out, DISCONNECTED_BANNER);
                } else if !disconnected && was_visible {
                    emit(&out, "Connection restored");
                }
            }));
        }

        {
            let out = Arc::clone(&out);
            subscriptions.push(session.on(StateKey::LastUpdated, move |value, _| {
                if let StateValue::LastUpdated(ts) = value {
                    if let Some(host) = &plugins {
                        for section in host.sections() {
                            emit(&out, &format_section(&section));
                        }
                    }
                    emit(&out, &format!("Last updated: {}", ts.format("%H:%M:%S UTC")));
                }
            }));
        }

        Self {
            banner_visible,
            subscriptions,
        }
    }

    #[must_use]
    pub fn banner_visible(&self) -> bool {
        self.banner_visible.load(Ordering::Acquire)
    }

    pub fn detach(self) {
        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

fn emit(out: &Output, text: &str) {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
        tracing::warn!(error = %e, "Failed to write dashboard output");
    }
}

#[must_use]
pub fn format_section(section: &PluginSection) -> String {
    format!("== {} ==\n{}", section.label, section.content)
}

#[must_use]
pub fn format_conditions(boxes: &[StatBox]) -> String {
    let mut text = String::new();
    for b in boxes {
        let _ = write!(text, "{:<16} {}", b.label, b.value);
        if !b.unit.is_empty() {
            let _ = write!(text, " {}", b.unit);
        }
        if let Some(secondary) = &b.secondary {
            let _ = write!(text, "  ({secondary})");
        }
        text.push('\n');
    }
    text
}

#[must_use]
pub fn format_charts(charts: &[Chart], resolution: &str) -> String {
    let mut text = format!("History @ {resolution}\n");
    for chart in charts {
        let _ = write!(text, "{:<12} [{}]", chart.panel.title(), chart.y_label);
        for (label, latest) in latest_values(chart) {
            match latest {
                Some(v) => {
                    let _ = write!(text, "  {label}: {v:.1}");
                }
                None => {
                    let _ = write!(text, "  {label}: --");
                }
            }
        }
        text.push('\n');
    }
    text
}
