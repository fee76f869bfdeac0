//! Aggregate statistics over a parsed log.
//!
//! These are running totals updated as tags are interpreted, plus a few
//! derived figures used in summaries.

use super::model::EventType;
use crate::parser::tag::Tag;
use crate::utils::config::{ATTR_COMPILE_KIND, ATTR_SIZE, COMPILE_KIND_OSR};
use log::debug;
use serde::{Deserialize, Serialize};

/// Running totals for one parse session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JitStats {
    /// Compiler threads started (including ones with unexpected names)
    pub compiler_threads: u32,

    /// task_queued tags seen
    pub queued: u64,

    /// task tags seen
    pub tasks: u64,

    pub nmethods_tier1: u64,
    pub nmethods_tier2: u64,

    /// Native wrappers generated by the tier-2 compiler
    pub native_wrappers: u64,

    /// On-stack-replacement nmethods (any tier)
    pub osr_compiles: u64,

    /// Sum of task_done nmsize values
    pub native_bytes: u64,

    /// Sum of nmethod size values
    pub total_nmethod_size: u64,

    /// Largest nmethod seen, by size
    pub largest_nmethod: Option<LargestNmethod>,

    /// Recoverable faults reported during the session
    pub errors: u64,
}

/// The nmethod with the biggest `size` attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargestNmethod {
    pub signature: String,
    pub size: u64,
}

impl JitStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_native_bytes(&mut self, bytes: u64) {
        self.native_bytes = self.native_bytes.saturating_add(bytes);
    }

    /// Update counters for a resolved nmethod tag
    pub fn record_nmethod(&mut self, event_type: EventType, tag: &Tag, signature: &str) {
        match event_type {
            EventType::NmethodTier1 => self.nmethods_tier1 += 1,
            EventType::NmethodTier2 => self.nmethods_tier2 += 1,
            EventType::NmethodTier2Native => self.native_wrappers += 1,
            EventType::Queue => return,
        }

        if tag.attribute(ATTR_COMPILE_KIND) == Some(COMPILE_KIND_OSR) {
            self.osr_compiles += 1;
        }

        let Some(size) = tag.attribute(ATTR_SIZE).and_then(|s| s.parse::<u64>().ok()) else {
            return;
        };

        self.total_nmethod_size = self.total_nmethod_size.saturating_add(size);

        let is_larger = self
            .largest_nmethod
            .as_ref()
            .map_or(true, |largest| size > largest.size);

        if is_larger {
            debug!("new largest nmethod: {} ({} bytes)", signature, size);
            self.largest_nmethod = Some(LargestNmethod {
                signature: signature.to_string(),
                size,
            });
        }
    }

    pub fn total_nmethods(&self) -> u64 {
        self.nmethods_tier1 + self.nmethods_tier2 + self.native_wrappers
    }

    /// Mean nmethod size, or 0 when nothing was compiled
    pub fn mean_nmethod_size(&self) -> u64 {
        let count = self.total_nmethods();
        if count == 0 {
            0
        } else {
            self.total_nmethod_size / count
        }
    }

    /// Share of nmethods produced by the tier-2 compiler, as a percentage
    pub fn tier2_percentage(&self) -> f64 {
        let total = self.total_nmethods();
        if total > 0 {
            ((self.nmethods_tier2 + self.native_wrappers) as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Threads: {} | Queued: {} | Tasks: {} | C1: {} | C2: {} | C2N: {} | OSR: {} | Native bytes: {} | Errors: {}",
            self.compiler_threads,
            self.queued,
            self.tasks,
            self.nmethods_tier1,
            self.nmethods_tier2,
            self.native_wrappers,
            self.osr_compiles,
            self.native_bytes,
            self.errors
        )
    }
}
