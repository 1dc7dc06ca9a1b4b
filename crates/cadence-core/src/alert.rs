use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Alert / AlertLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Error,
}

/// A persistent, user-visible fault flag. Alerts latch: setting an already
/// active alert keeps its original `since` timestamp, so a fault that is
/// re-reported every tick surfaces as one continuous alert, never a toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub since: DateTime<Utc>,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// AlertRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AlertRegistry {
    alerts: BTreeMap<String, Alert>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an alert. Idempotent while the alert is already active.
    pub fn set(&mut self, key: &str, level: AlertLevel, message: impl Into<String>) {
        match self.alerts.get_mut(key) {
            Some(a) if a.active => {
                a.level = level;
            }
            _ => {
                tracing::warn!(alert = key, "alert raised");
                self.alerts.insert(
                    key.to_string(),
                    Alert {
                        level,
                        message: message.into(),
                        since: Utc::now(),
                        active: true,
                    },
                );
            }
        }
    }

    /// Clear an alert. Idempotent; the entry is kept (inactive) so the
    /// dashboard can show when it last fired.
    pub fn clear(&mut self, key: &str) {
        if let Some(a) = self.alerts.get_mut(key) {
            if a.active {
                tracing::info!(alert = key, "alert cleared");
                a.active = false;
            }
        }
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.alerts.get(key).map(|a| a.active).unwrap_or(false)
    }

    pub fn active(&self) -> impl Iterator<Item = (&str, &Alert)> {
        self.alerts
            .iter()
            .filter(|(_, a)| a.active)
            .map(|(k, a)| (k.as_str(), a))
    }

    pub fn snapshot(&self) -> Vec<(String, Alert)> {
        self.alerts
            .iter()
            .filter(|(_, a)| a.active)
            .map(|(k, a)| (k.clone(), a.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
