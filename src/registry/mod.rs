//! Connector Registry
//!
//! Owns the runtime state of every connector: status, usage statistics,
//! priority, tags and fallback. Usage feedback drives the only automatic
//! status transitions:
//!
//! - `active -> maintenance` when a connector keeps failing
//!   (see [`ConnectorRegistry::record_usage`])
//! - `active -> inactive` when an optimization sweep finds it unused
//!   (see [`ConnectorRegistry::optimize`])
//!
//! Nothing moves an entry back to `active` automatically, and entries are
//! never removed.

mod blocks;
mod models;

pub use blocks::{
    block_names, find_block, CategoryBlock, CATEGORY_BLOCKS, CRITICAL_BLOCKS,
    MIN_ACTIVE_PER_CRITICAL_BLOCK,
};
pub use models::{
    format_percentage, ConnectorStatus, ExportRow, OptimizationReport, RegistryEntry,
    RegistryError, UsageStats, ValidationReport,
};

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, ConnectorDescriptor, DEFAULT_FALLBACKS};

/// Priority assigned to every official connector regardless of category.
pub const OFFICIAL_PRIORITY: u8 = 9;

/// Connectors unused for this many days are deactivated by [`ConnectorRegistry::optimize`].
pub const OPTIMIZE_UNUSED_DAYS: u32 = 60;

/// Above this error rate (and [`MAINTENANCE_MIN_CALLS`]) a connector goes to maintenance.
pub const MAINTENANCE_ERROR_RATE: f64 = 0.5;
pub const MAINTENANCE_MIN_CALLS: u64 = 10;

const VENDOR_TAGS: [&str; 3] = ["google", "microsoft", "aws"];

/// Rules checked by [`ConnectorRegistry::validate_with`].
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    pub critical_blocks: Vec<&'static str>,
    pub min_active_per_block: usize,
    pub max_error_rate: f64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            critical_blocks: CRITICAL_BLOCKS.to_vec(),
            min_active_per_block: MIN_ACTIVE_PER_CRITICAL_BLOCK,
            max_error_rate: 0.3,
        }
    }
}

/// An entry together with its resolved fallback.
#[derive(Debug, Clone, Copy)]
pub struct WithFallback<'a> {
    pub primary: Option<&'a RegistryEntry>,
    pub fallback: Option<&'a RegistryEntry>,
}

#[derive(Debug, Default)]
pub struct ConnectorRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut registry = Self::new();
        registry.initialize(catalog.connectors());
        registry
    }

    /// Creates one active entry per descriptor not yet registered.
    ///
    /// Entries that already exist are left untouched, so calling this again
    /// never duplicates or resets state. Returns the number of new entries.
    pub fn initialize(&mut self, connectors: &[ConnectorDescriptor]) -> usize {
        let mut added = 0;
        for descriptor in connectors {
            if self.index.contains_key(descriptor.id) {
                debug!("Connector {} already registered, skipping", descriptor.id);
                continue;
            }
            self.index
                .insert(descriptor.id.to_string(), self.entries.len());
            self.entries.push(RegistryEntry {
                descriptor: *descriptor,
                status: ConnectorStatus::Active,
                usage: UsageStats::default(),
                priority: priority_for(descriptor),
                tags: tags_for(descriptor),
                fallback: None,
            });
            added += 1;
        }

        for (primary, fallback) in DEFAULT_FALLBACKS {
            if !self.index.contains_key(*fallback) {
                continue;
            }
            if let Some(entry) = self.entry_mut(primary) {
                if entry.fallback.is_none() {
                    entry.fallback = Some(fallback.to_string());
                }
            }
        }

        info!(
            "Connector registry initialized: {} new, {} total",
            added,
            self.entries.len()
        );
        added
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut RegistryEntry> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.entries[i]),
            None => None,
        }
    }

    pub fn get_with_fallback(&self, id: &str) -> WithFallback<'_> {
        let primary = self.get(id);
        let fallback = primary
            .and_then(|p| p.fallback.as_deref())
            .and_then(|f| self.get(f));
        WithFallback { primary, fallback }
    }

    /// Entries whose id matches the block's patterns, highest priority first.
    ///
    /// Ties keep insertion order. Unknown blocks yield an empty list.
    pub fn get_by_block(&self, block_name: &str) -> Vec<&RegistryEntry> {
        let Some(block) = find_block(block_name) else {
            return Vec::new();
        };
        let mut entries: Vec<&RegistryEntry> = self
            .entries
            .iter()
            .filter(|e| block.matches(e.id()))
            .collect();
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        entries
    }

    /// Records the outcome of one invocation. Unknown ids are ignored and
    /// reported through the `false` return value.
    pub fn record_usage(&mut self, id: &str, success: bool) -> bool {
        self.record_usage_at(id, success, Utc::now())
    }

    pub fn record_usage_at(&mut self, id: &str, success: bool, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            debug!("Usage reported for unknown connector {}", id);
            return false;
        };

        let previous_total = entry.usage.total_calls;
        entry.usage.total_calls += 1;
        entry.usage.last_used = Some(now);

        if !success {
            // The error count is rebuilt from the previous rate, rounded up,
            // so the rate is an approximation and not an exact running count.
            let previous_errors = (entry.usage.error_rate * previous_total as f64).ceil() as u64;
            let errors = (previous_errors + 1).min(entry.usage.total_calls);
            entry.usage.error_rate = errors as f64 / entry.usage.total_calls as f64;
        }

        if entry.usage.error_rate > MAINTENANCE_ERROR_RATE
            && entry.usage.total_calls > MAINTENANCE_MIN_CALLS
            && entry.is_active()
        {
            warn!(
                "Connector {} moved to maintenance (error rate {}, {} calls)",
                entry.id(),
                format_percentage(entry.usage.error_rate),
                entry.usage.total_calls
            );
            entry.status = ConnectorStatus::Maintenance;
        }
        true
    }

    /// Active entries never used, or not used within the last `days` days.
    pub fn get_unused(&self, days: u32) -> Vec<&RegistryEntry> {
        self.get_unused_at(days, Utc::now())
    }

    pub fn get_unused_at(&self, days: u32, now: DateTime<Utc>) -> Vec<&RegistryEntry> {
        let cutoff = unused_cutoff(days, now);
        self.entries
            .iter()
            .filter(|e| is_unused(e, cutoff))
            .collect()
    }

    /// Deactivates every connector unused for [`OPTIMIZE_UNUSED_DAYS`] days.
    pub fn optimize(&mut self) -> OptimizationReport {
        self.optimize_at(Utc::now())
    }

    pub fn optimize_at(&mut self, now: DateTime<Utc>) -> OptimizationReport {
        let cutoff = unused_cutoff(OPTIMIZE_UNUSED_DAYS, now);
        let mut connectors = Vec::new();
        for entry in self.entries.iter_mut().filter(|e| is_unused(e, cutoff)) {
            entry.status = ConnectorStatus::Inactive;
            connectors.push(entry.name().to_string());
        }

        if !connectors.is_empty() {
            info!("Optimization deactivated {} connectors", connectors.len());
        }
        OptimizationReport {
            deactivated: connectors.len(),
            connectors,
        }
    }

    pub fn validate(&self) -> ValidationReport {
        self.validate_with(&ValidationPolicy::default())
    }

    pub fn validate_with(&self, policy: &ValidationPolicy) -> ValidationReport {
        let mut errors = Vec::new();

        for block in &policy.critical_blocks {
            let active = self
                .get_by_block(block)
                .into_iter()
                .filter(|e| e.is_active())
                .count();
            if active < policy.min_active_per_block {
                errors.push(format!(
                    "Critical block '{}' has fewer than {} active connectors ({} active)",
                    block, policy.min_active_per_block, active
                ));
            }
        }

        for entry in self.entries.iter().filter(|e| e.is_active()) {
            if entry.usage.error_rate > policy.max_error_rate {
                errors.push(format!(
                    "Connector '{}' has a high error rate: {}",
                    entry.name(),
                    format_percentage(entry.usage.error_rate)
                ));
            }
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn export(&self) -> Vec<ExportRow> {
        self.entries
            .iter()
            .map(|e| ExportRow {
                id: e.id().to_string(),
                name: e.name().to_string(),
                category: e.descriptor.category,
                status: e.status,
                last_used: e
                    .usage
                    .last_used
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
                total_calls: e.usage.total_calls,
                error_rate: format_percentage(e.usage.error_rate),
                priority: e.priority,
                tags: e.tags.join(", "),
                fallback: e.fallback.clone().unwrap_or_else(|| "N/A".to_string()),
            })
            .collect()
    }

    /// Number of entries per status, every status present.
    pub fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts: BTreeMap<&'static str, usize> = ConnectorStatus::ALL
            .into_iter()
            .map(|s| (s.as_str(), 0))
            .collect();
        for entry in &self.entries {
            *counts.entry(entry.status.as_str()).or_default() += 1;
        }
        counts
    }

    /// Administrative status override, exposed through
    /// `POST /v1/dashboard/status`. Any transition is allowed here.
    pub fn set_status(&mut self, id: &str, status: ConnectorStatus) -> Result<(), RegistryError> {
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| RegistryError::UnknownConnector(id.to_string()))?;
        info!("Connector {} status {} -> {}", id, entry.status, status);
        entry.status = status;
        Ok(())
    }

    /// Administrative fallback override, exposed through
    /// `POST /v1/dashboard/fallback`. `None` clears the fallback.
    pub fn set_fallback(&mut self, id: &str, fallback: Option<&str>) -> Result<(), RegistryError> {
        if let Some(fallback) = fallback {
            if fallback == id {
                return Err(RegistryError::SelfFallback(id.to_string()));
            }
            if !self.index.contains_key(fallback) {
                return Err(RegistryError::UnknownConnector(fallback.to_string()));
            }
        }
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| RegistryError::UnknownConnector(id.to_string()))?;
        entry.fallback = fallback.map(str::to_string);
        Ok(())
    }
}

fn priority_for(descriptor: &ConnectorDescriptor) -> u8 {
    if descriptor.official {
        OFFICIAL_PRIORITY
    } else {
        descriptor.category.base_priority()
    }
}

fn tags_for(descriptor: &ConnectorDescriptor) -> Vec<String> {
    let mut tags = vec![descriptor.category.as_str().to_string()];
    if descriptor.official {
        tags.push("official".to_string());
    }
    let name = descriptor.name.to_lowercase();
    for vendor in VENDOR_TAGS {
        if name.contains(vendor) {
            tags.push(vendor.to_string());
        }
    }
    tags
}

fn unused_cutoff(days: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d))
}

fn is_unused(entry: &RegistryEntry, cutoff: Option<DateTime<Utc>>) -> bool {
    if !entry.is_active() {
        return false;
    }
    match (entry.usage.last_used, cutoff) {
        (None, _) => true,
        (Some(last_used), Some(cutoff)) => last_used < cutoff,
        (Some(_), None) => false,
    }
}
