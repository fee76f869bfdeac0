//! In-memory model of a parsed compilation log.
//!
//! Members are stored in an arena and addressed by `MemberId`. The model
//! interns resolved identities so that resolving the same signature twice
//! always lands on the same member and its attribute bag keeps growing.

use crate::parser::tag::Tag;
use crate::resolver::MemberIdentity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Which JIT compiler produced (or will produce) code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilerTier {
    /// Fast, lightly optimising compiler (C1)
    Tier1,
    /// Slow, heavily optimising compiler (C2)
    Tier2,
    #[default]
    Unknown,
}

impl fmt::Display for CompilerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tier1 => write!(f, "C1"),
            Self::Tier2 => write!(f, "C2"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Kind of timeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Queue,
    NmethodTier1,
    NmethodTier2,
    /// Native wrapper generated by the tier-2 compiler
    NmethodTier2Native,
}

/// One entry on the global timeline, in file-encounter order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitEvent {
    /// Seconds since VM start
    pub stamp: f64,
    pub event_type: EventType,
    pub signature: String,
}

impl JitEvent {
    pub fn new(stamp: f64, event_type: EventType, signature: impl Into<String>) -> Self {
        Self {
            stamp,
            event_type,
            signature: signature.into(),
        }
    }
}

/// Lifecycle stage of the most recent compile attempt of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    #[default]
    Unseen,
    Queued,
    TaskOpen,
    NmethodEmitted,
    DoneWithoutNmethod,
}

/// Index of a member in the model's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub usize);

/// A compiled method or constructor and everything recorded about it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub identity: MemberIdentity,
    pub stage: LifecycleStage,

    /// Union of the attributes of every tag attributed to this member
    pub attributes: BTreeMap<String, String>,

    pub queued_count: u32,
    pub task_count: u32,
    pub nmethod_events: Vec<EventType>,

    /// compile_id values that produced an nmethod
    pub emitted_compile_ids: BTreeSet<String>,

    /// Sticky tier that was current when the last task completed
    pub last_task_tier: CompilerTier,

    /// Tags attributed to this member, in file order
    #[serde(skip)]
    pub journal: Vec<Tag>,
}

impl Member {
    fn new(identity: MemberIdentity) -> Self {
        Self {
            identity,
            stage: LifecycleStage::Unseen,
            attributes: BTreeMap::new(),
            queued_count: 0,
            task_count: 0,
            nmethod_events: Vec::new(),
            emitted_compile_ids: BTreeSet::new(),
            last_task_tier: CompilerTier::Unknown,
            journal: Vec::new(),
        }
    }

    pub fn merge_attributes(&mut self, attributes: &BTreeMap<String, String>) {
        for (key, value) in attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    pub fn signature(&self) -> String {
        self.identity.to_string()
    }
}

/// Per-class counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassStats {
    pub compiled_method_count: u32,
}

/// A code cache snapshot taken when a task completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCacheSample {
    pub stamp: f64,
    pub attributes: BTreeMap<String, String>,
}

/// Everything built from one log
#[derive(Debug, Clone, Default)]
pub struct JitDataModel {
    members: Vec<Member>,
    index: HashMap<MemberIdentity, MemberId>,
    classes: BTreeMap<String, ClassStats>,
    events: Vec<JitEvent>,
    code_cache: Vec<CodeCacheSample>,
    vm_release: Option<String>,
    vm_command: Option<String>,
}

impl JitDataModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the member for `identity`, creating it on first sight
    pub fn intern(&mut self, identity: MemberIdentity) -> MemberId {
        if let Some(id) = self.index.get(&identity) {
            return *id;
        }
        let id = MemberId(self.members.len());
        self.classes.entry(identity.class_name.clone()).or_default();
        self.index.insert(identity.clone(), id);
        self.members.push(Member::new(identity));
        id
    }

    pub fn member_mut(&mut self, id: MemberId) -> Option<&mut Member> {
        self.members.get_mut(id.0)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn increment_compiled_count(&mut self, class_name: &str) {
        self.classes
            .entry(class_name.to_string())
            .or_default()
            .compiled_method_count += 1;
    }

    pub fn class_stats(&self, class_name: &str) -> Option<&ClassStats> {
        self.classes.get(class_name)
    }

    pub fn classes(&self) -> &BTreeMap<String, ClassStats> {
        &self.classes
    }

    pub fn add_event(&mut self, event: JitEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[JitEvent] {
        &self.events
    }

    pub fn add_code_cache_sample(&mut self, sample: CodeCacheSample) {
        self.code_cache.push(sample);
    }

    pub fn code_cache_samples(&self) -> &[CodeCacheSample] {
        &self.code_cache
    }

    /// First release string wins
    pub fn set_vm_release(&mut self, release: String) {
        if self.vm_release.is_none() {
            self.vm_release = Some(release);
        }
    }

    pub fn vm_release(&self) -> Option<&str> {
        self.vm_release.as_deref()
    }

    /// Last command line wins
    pub fn set_vm_command(&mut self, command: String) {
        self.vm_command = Some(command);
    }

    pub fn vm_command(&self) -> Option<&str> {
        self.vm_command.as_deref()
    }

    /// Number of members per lifecycle stage
    pub fn stage_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for member in &self.members {
            let key = serde_json::to_value(member.stage)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| format!("{:?}", member.stage));
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }
}
