//! Interpretation of completed tags into a compilation model.
//!
//! This module turns the tag stream into:
//! - Per-member lifecycle state and merged attributes
//! - The global QUEUE/NMETHOD_* event timeline
//! - Aggregate compiler statistics

pub mod lifecycle;
pub mod metrics;
pub mod model;

// Re-export main types
pub use lifecycle::{CompileLifecycleTracker, FatalReport, Session, SessionOutcome, TagKind};
pub use metrics::{JitStats, LargestNmethod};
pub use model::{
    CodeCacheSample, CompilerTier, EventType, JitDataModel, JitEvent, LifecycleStage, Member,
    MemberId,
};
