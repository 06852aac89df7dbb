use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::types::Severity;

pub const DEFAULT_ALERT_LIFETIME: Duration = Duration::from_secs(5);

#[mockall::automock]
pub trait Notifier {
    fn notify(&mut self, message: &str, severity: Severity);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub raised_at: Instant,
}

/// Dismissible alerts that expire on their own after `lifetime`.
#[derive(Debug)]
pub struct AlertBoard {
    alerts: Vec<Alert>,
    next_id: u64,
    lifetime: Duration,
}

impl Default for AlertBoard {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_LIFETIME)
    }
}

impl AlertBoard {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            alerts: Vec::new(),
            next_id: 1,
            lifetime,
        }
    }

    pub fn push_at(&mut self, message: &str, severity: Severity, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.alerts.push(Alert {
            id,
            message: message.to_string(),
            severity,
            raised_at: now,
        });
        id
    }

    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.alerts
            .retain(|alert| now.saturating_duration_since(alert.raised_at) < lifetime);
    }

    pub fn dismiss_latest(&mut self) -> Option<Alert> {
        self.alerts.pop()
    }

    pub fn active(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn latest(&self) -> Option<&Alert> {
        self.alerts.last()
    }
}

impl Notifier for AlertBoard {
    fn notify(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => info!(severity = severity.label(), "{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Danger => error!("{}", message),
        }
        self.push_at(message, severity, Instant::now());
    }
}
