//! Alerts Module - Threshold-Based GC Health Alerts
//!
//! Compares each cycle's [`GcSummary`] and current heap/fragmentation
//! readings against configured thresholds and raises an [`Alert`] whenever
//! one is crossed: a pause over `max_pause_ms`, heap usage over 90%,
//! region fragmentation over 50%, or GC throughput under 80%. Alerts are
//! append-only history plus a running count; nothing here stops a GC
//! cycle, this is observability only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// How urgently an alert should be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// One specific threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertKind {
    PauseTimeExceeded { pause_ms: f64, limit_ms: f64 },
    HeapUsageHigh { usage: f64, limit: f64 },
    FragmentationHigh { ratio: f32, limit: f32 },
    ThroughputLow { throughput: f64, limit: f64 },
}

impl AlertKind {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertKind::PauseTimeExceeded { pause_ms, limit_ms } if pause_ms > &(limit_ms * 2.0) => {
                AlertSeverity::Critical
            }
            AlertKind::HeapUsageHigh { usage, .. } if *usage > 0.97 => AlertSeverity::Critical,
            _ => AlertSeverity::Warning,
        }
    }
}

/// A raised alert, timestamped for the history log.
#[derive(Debug, Clone)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub at: Instant,
}

/// Thresholds an [`AlertManager`] checks readings against.
#[derive(Debug, Clone, Copy)]
pub struct AlertThresholds {
    pub max_pause_ms: f64,
    pub heap_usage_limit: f64,
    pub fragmentation_limit: f32,
    pub throughput_limit: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            max_pause_ms: 10.0,
            heap_usage_limit: 0.9,
            fragmentation_limit: 0.5,
            throughput_limit: 0.8,
        }
    }
}

/// A single point-in-time reading fed to [`AlertManager::evaluate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertSnapshot {
    pub last_pause_ms: f64,
    pub heap_usage: f64,
    pub fragmentation: f32,
    pub throughput: f64,
}

/// Evaluates readings against [`AlertThresholds`] and keeps a bounded
/// history of raised alerts.
pub struct AlertManager {
    thresholds: AlertThresholds,
    history: Mutex<Vec<Alert>>,
    raised_count: AtomicU64,
    /// History is trimmed to this many most-recent entries.
    max_history: usize,
}

impl AlertManager {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            history: Mutex::new(Vec::new()),
            raised_count: AtomicU64::new(0),
            max_history: 256,
        }
    }

    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    fn check_pause(&self, pause_ms: f64) -> Option<Alert> {
        if pause_ms > self.thresholds.max_pause_ms {
            let kind = AlertKind::PauseTimeExceeded {
                pause_ms,
                limit_ms: self.thresholds.max_pause_ms,
            };
            return Some(Alert {
                severity: kind.severity(),
                kind,
                at: Instant::now(),
            });
        }
        None
    }

    fn check_heap_usage(&self, usage: f64) -> Option<Alert> {
        if usage > self.thresholds.heap_usage_limit {
            let kind = AlertKind::HeapUsageHigh {
                usage,
                limit: self.thresholds.heap_usage_limit,
            };
            return Some(Alert {
                severity: kind.severity(),
                kind,
                at: Instant::now(),
            });
        }
        None
    }

    fn check_fragmentation(&self, ratio: f32) -> Option<Alert> {
        if ratio > self.thresholds.fragmentation_limit {
            let kind = AlertKind::FragmentationHigh {
                ratio,
                limit: self.thresholds.fragmentation_limit,
            };
            return Some(Alert {
                severity: kind.severity(),
                kind,
                at: Instant::now(),
            });
        }
        None
    }

    fn check_throughput(&self, throughput: f64) -> Option<Alert> {
        if throughput < self.thresholds.throughput_limit {
            let kind = AlertKind::ThroughputLow {
                throughput,
                limit: self.thresholds.throughput_limit,
            };
            return Some(Alert {
                severity: kind.severity(),
                kind,
                at: Instant::now(),
            });
        }
        None
    }

    /// Run every check against `snapshot`, append any raised alerts to
    /// history, and return them.
    pub fn evaluate(&self, snapshot: &AlertSnapshot) -> Vec<Alert> {
        let raised: Vec<Alert> = [
            self.check_pause(snapshot.last_pause_ms),
            self.check_heap_usage(snapshot.heap_usage),
            self.check_fragmentation(snapshot.fragmentation),
            self.check_throughput(snapshot.throughput),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !raised.is_empty() {
            self.raised_count
                .fetch_add(raised.len() as u64, Ordering::Relaxed);
            let mut history = self.history.lock().unwrap();
            history.extend(raised.iter().cloned());
            let len = history.len();
            if len > self.max_history {
                history.drain(0..len - self.max_history);
            }
        }

        raised
    }

    pub fn history(&self) -> Vec<Alert> {
        self.history.lock().unwrap().clone()
    }

    pub fn raised_count(&self) -> u64 {
        self.raised_count.load(Ordering::Relaxed)
    }

    pub fn clear_history(&self) {
        self.history.lock().unwrap().clear();
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_snapshot_raises_nothing() {
        let manager = AlertManager::default();
        let snapshot = AlertSnapshot {
            last_pause_ms: 2.0,
            heap_usage: 0.5,
            fragmentation: 0.1,
            throughput: 0.99,
        };
        assert!(manager.evaluate(&snapshot).is_empty());
        assert_eq!(manager.raised_count(), 0);
    }

    #[test]
    fn pause_over_limit_raises_alert() {
        let manager = AlertManager::default();
        let snapshot = AlertSnapshot {
            last_pause_ms: 50.0,
            heap_usage: 0.1,
            fragmentation: 0.0,
            throughput: 1.0,
        };
        let alerts = manager.evaluate(&snapshot);
        assert_eq!(alerts.len(), 1);
        assert!(matches!(alerts[0].kind, AlertKind::PauseTimeExceeded { .. }));
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn multiple_breaches_all_raise() {
        let manager = AlertManager::default();
        let snapshot = AlertSnapshot {
            last_pause_ms: 1.0,
            heap_usage: 0.95,
            fragmentation: 0.8,
            throughput: 0.5,
        };
        let alerts = manager.evaluate(&snapshot);
        assert_eq!(alerts.len(), 3);
        assert_eq!(manager.history().len(), 3);
    }

    #[test]
    fn history_is_cumulative_across_evaluations() {
        let manager = AlertManager::default();
        let bad = AlertSnapshot {
            last_pause_ms: 50.0,
            ..Default::default()
        };
        manager.evaluate(&bad);
        manager.evaluate(&bad);
        assert_eq!(manager.raised_count(), 2);
        assert_eq!(manager.history().len(), 2);
    }
}
