//! GC Metrics - Export Metrics
//!
//! Module for exporting metrics to monitoring systems
//! (Prometheus, Grafana, etc.)

use crate::error::{FgcError, Result};
use indexmap::IndexMap;
use std::sync::Mutex;

/// GcMetrics - metrics exporter
///
/// Export GC metrics in various formats.
pub struct GcMetrics {
    /// Metrics data
    metrics: Mutex<IndexMap<String, MetricValue>>,
}

impl GcMetrics {
    pub fn new() -> Self {
        Self {
            metrics: Mutex::new(IndexMap::new()),
        }
    }

    /// Add metric
    pub fn add(&self, name: String, value: MetricValue) -> Result<()> {
        self.metrics
            .lock()
            .map_err(|e| FgcError::LockPoisoned(format!("metrics mutex poisoned: {}", e)))?
            .insert(name, value);
        Ok(())
    }

    /// Get metric
    pub fn get(&self, name: &str) -> Result<Option<MetricValue>> {
        Ok(self
            .metrics
            .lock()
            .map_err(|e| FgcError::LockPoisoned(format!("metrics mutex poisoned: {}", e)))?
            .get(name)
            .copied())
    }

    /// Export to Prometheus format
    pub fn to_prometheus(&self) -> Result<String> {
        let metrics = self
            .metrics
            .lock()
            .map_err(|e| FgcError::LockPoisoned(format!("metrics mutex poisoned: {}", e)))?;
        let mut output = String::new();

        for (name, value) in metrics.iter() {
            output.push_str(&format!("{} {}\n", name, value.as_f64()));
        }

        Ok(output)
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        let metrics = self
            .metrics
            .lock()
            .map_err(|e| FgcError::LockPoisoned(format!("metrics mutex poisoned: {}", e)))?;
        let mut pairs = Vec::new();

        for (name, value) in metrics.iter() {
            pairs.push(format!("\"{}\": {}", name, value.as_f64()));
        }

        Ok(format!("{{{}}}", pairs.join(",")))
    }

    /// Export a human-readable table, one metric per line, aligned for
    /// terminal / log output rather than machine parsing.
    pub fn to_human(&self) -> Result<String> {
        let metrics = self
            .metrics
            .lock()
            .map_err(|e| FgcError::LockPoisoned(format!("metrics mutex poisoned: {}", e)))?;

        let width = metrics.keys().map(|k| k.len()).max().unwrap_or(0);
        let mut output = String::new();
        for (name, value) in metrics.iter() {
            output.push_str(&format!("{:width$} = {}\n", name, value.as_f64(), width = width));
        }
        Ok(output)
    }

    /// Dispatch to [`Self::to_prometheus`] or [`Self::to_human`] by name.
    /// Unknown formats fall back to Prometheus, the default used by
    /// `GcRuntime::export_metrics` when no format is specified.
    pub fn export(&self, format: &str) -> Result<String> {
        match format {
            "human" => self.to_human(),
            "json" => self.to_json(),
            _ => self.to_prometheus(),
        }
    }
}

impl Default for GcMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metric value
#[derive(Debug, Clone, Copy)]
pub enum MetricValue {
    Counter(u64),
    Gauge(f64),
    Histogram(u64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Counter(v) => *v as f64,
            MetricValue::Gauge(v) => *v,
            MetricValue::Histogram(v) => *v as f64,
        }
    }
}
