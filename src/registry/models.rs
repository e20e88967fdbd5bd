use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::catalog::{Category, ConnectorDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorStatus {
    Active,
    Inactive,
    Deprecated,
    Maintenance,
}

impl ConnectorStatus {
    pub const ALL: [ConnectorStatus; 4] = [
        ConnectorStatus::Active,
        ConnectorStatus::Inactive,
        ConnectorStatus::Deprecated,
        ConnectorStatus::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectorStatus::Active => "active",
            ConnectorStatus::Inactive => "inactive",
            ConnectorStatus::Deprecated => "deprecated",
            ConnectorStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageStats {
    pub last_used: Option<DateTime<Utc>>,
    pub total_calls: u64,
    /// Approximate fraction of failed calls, always within [0, 1].
    pub error_rate: f64,
}

/// Runtime state of a single connector.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryEntry {
    #[serde(flatten)]
    pub descriptor: ConnectorDescriptor,
    pub status: ConnectorStatus,
    pub usage: UsageStats,
    pub priority: u8,
    pub tags: Vec<String>,
    pub fallback: Option<String>,
}

impl RegistryEntry {
    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn is_active(&self) -> bool {
        self.status == ConnectorStatus::Active
    }
}

/// Flattened, display-oriented projection of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub status: ConnectorStatus,
    pub last_used: String,
    pub total_calls: u64,
    pub error_rate: String,
    pub priority: u8,
    pub tags: String,
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub deactivated: usize,
    pub connectors: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown connector: {0}")]
    UnknownConnector(String),
    #[error("Connector {0} cannot be its own fallback")]
    SelfFallback(String),
}

/// Formats a rate as a percentage with two decimals, e.g. `0.125` -> `12.50%`.
pub fn format_percentage(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}
