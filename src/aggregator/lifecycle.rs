//! Compile lifecycle tracking.
//!
//! Completed tags are interpreted in file order. Each member moves through
//! `Unseen -> Queued -> TaskOpen -> {NmethodEmitted | DoneWithoutNmethod}`
//! once per compile attempt, while every attempt's attributes accumulate in
//! the same member's attribute bag and QUEUE/NMETHOD_* events are appended
//! to the global timeline.
//!
//! Known limitation: the in-flight member is a single slot, not one per
//! compiler thread. If two threads' `<task>` blocks interleave in the log,
//! task-done attributes can land on the wrong member.

use super::metrics::JitStats;
use super::model::{
    CodeCacheSample, CompilerTier, EventType, JitDataModel, JitEvent, LifecycleStage, MemberId,
};
use crate::output::listener::{notify, JitListener};
use crate::parser::tag::Tag;
use crate::resolver::{normalize_signature, MemberResolver};
use crate::utils::config::{
    ATTR_COMPILER, ATTR_COMPILE_ID, ATTR_COMPILE_KIND, ATTR_METHOD, ATTR_NAME, ATTR_NMSIZE,
    ATTR_STAMP, ATTR_TIER, COMPILE_KIND_NATIVE, FATAL_MISSING_CLASSLOADING_BODY, FATAL_MISSING_CLASSLOADING_TITLE,
    TAG_CODE_CACHE, TAG_COMMAND, TAG_NMETHOD, TAG_RELEASE, TAG_START_COMPILE_THREAD, TAG_TASK,
    TAG_TASK_DONE, TAG_TASK_QUEUED, TAG_TWEAK_VM, TAG_VM_ARGUMENTS, TAG_VM_VERSION,
    TIER1_LITERALS, TIER1_THREAD_PREFIXES, TIER2_LITERALS, TIER2_THREAD_PREFIXES,
};
use crate::utils::error::{MarkupError, TagError};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

/// Top-level tags with lifecycle meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    VmVersion,
    VmArguments,
    StartCompileThread,
    TaskQueued,
    Nmethod,
    Task,
}

impl TagKind {
    /// Unknown names map to `None` and are ignored
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            TAG_VM_VERSION => Some(Self::VmVersion),
            TAG_VM_ARGUMENTS => Some(Self::VmArguments),
            TAG_START_COMPILE_THREAD => Some(Self::StartCompileThread),
            TAG_TASK_QUEUED => Some(Self::TaskQueued),
            TAG_NMETHOD => Some(Self::Nmethod),
            TAG_TASK => Some(Self::Task),
            _ => None,
        }
    }
}

/// A session-fatal problem, reported once when the session completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatalReport {
    pub title: String,
    pub body: String,
}

/// Mutable state carried across tags for one parse
#[derive(Debug, Clone, Default)]
pub struct Session {
    compiler_tier: CompilerTier,
    in_flight: Option<MemberId>,
    saw_classloader_trace: bool,
    experimental_vm: bool,
    fatal: Option<FatalReport>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compiler_tier(&self) -> CompilerTier {
        self.compiler_tier
    }

    pub fn in_flight_member(&self) -> Option<MemberId> {
        self.in_flight
    }

    pub fn mark_classloader_trace(&mut self) {
        self.saw_classloader_trace = true;
    }

    pub fn saw_classloader_trace(&self) -> bool {
        self.saw_classloader_trace
    }

    pub fn is_experimental_vm(&self) -> bool {
        self.experimental_vm
    }

    pub fn fatal(&self) -> Option<&FatalReport> {
        self.fatal.as_ref()
    }

    /// Record a fatal problem; the first one raised is kept
    pub fn raise_fatal(&mut self, title: impl Into<String>, body: impl Into<String>) {
        if self.fatal.is_none() {
            self.fatal = Some(FatalReport {
                title: title.into(),
                body: body.into(),
            });
        }
    }
}

/// Everything a finished session produced
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    pub model: JitDataModel,
    pub stats: JitStats,
    pub experimental_vm: bool,
    pub fatal: Option<FatalReport>,
}

/// Drives the per-member state machine from completed tags
pub struct CompileLifecycleTracker<'a> {
    resolver: &'a dyn MemberResolver,
    listener: &'a mut dyn JitListener,
    session: Session,
    model: JitDataModel,
    stats: JitStats,
}

impl<'a> CompileLifecycleTracker<'a> {
    pub fn new(resolver: &'a dyn MemberResolver, listener: &'a mut dyn JitListener) -> Self {
        Self {
            resolver,
            listener,
            session: Session::new(),
            model: JitDataModel::new(),
            stats: JitStats::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn model(&self) -> &JitDataModel {
        &self.model
    }

    pub fn stats(&self) -> &JitStats {
        &self.stats
    }

    /// Interpret one completed top-level tag
    pub fn handle_tag(&mut self, tag: &Tag) {
        let Some(kind) = TagKind::from_name(&tag.name) else {
            return;
        };

        let result = match kind {
            TagKind::VmVersion => {
                self.handle_vm_version(tag);
                Ok(())
            }
            TagKind::VmArguments => {
                self.handle_vm_arguments(tag);
                Ok(())
            }
            TagKind::StartCompileThread => self.handle_start_compile_thread(tag),
            TagKind::TaskQueued => self.handle_task_queued(tag),
            TagKind::Nmethod => self.handle_nmethod(tag),
            TagKind::Task => self.handle_task(tag),
        };

        if let Err(e) = result {
            self.report_tag_error(tag, &e);
        }
    }

    /// Report a structural fault raised while building tags
    pub fn report_markup_fault(&mut self, line: u64, raw: &str, fault: &MarkupError) {
        warn!("{}", fault);
        self.report_error_line(line, raw);
    }

    /// Report a recoverable fault that happened outside tag handling
    pub fn report_error_line(&mut self, line: u64, raw: &str) {
        self.stats.errors += 1;
        notify(self.listener, "error", |l| l.on_error_line(line, raw));
    }

    /// End the session: apply the configuration check and report any fatal problem
    pub fn finish(mut self) -> SessionOutcome {
        if self.session.fatal.is_none() && !self.session.saw_classloader_trace {
            self.session
                .raise_fatal(FATAL_MISSING_CLASSLOADING_TITLE, FATAL_MISSING_CLASSLOADING_BODY);
        }

        if let Some(fatal) = &self.session.fatal {
            error!("{}", fatal.title);
            notify(self.listener, "fatal", |l| {
                l.on_fatal_config(&fatal.title, &fatal.body)
            });
        }

        info!("{}", self.stats.summary());

        SessionOutcome {
            model: self.model,
            stats: self.stats,
            experimental_vm: self.session.experimental_vm,
            fatal: self.session.fatal,
        }
    }

    fn handle_vm_version(&mut self, tag: &Tag) {
        match tag.first_named_child(TAG_RELEASE) {
            Some(release) if !release.text_content().is_empty() => {
                self.model.set_vm_release(release.text_content().to_string());
            }
            _ => warn!("<{}> at line {} has no release", TAG_VM_VERSION, tag.line),
        }

        if tag.first_named_child(TAG_TWEAK_VM).is_some() {
            self.session.experimental_vm = true;
            info!("TweakVM detected!");
        }
    }

    fn handle_vm_arguments(&mut self, tag: &Tag) {
        if let Some(command) = tag.first_named_child(TAG_COMMAND) {
            let command = command.text_content().to_string();
            info!("VM Command: {}", command);
            self.model.set_vm_command(command);
        }
    }

    fn handle_start_compile_thread(&mut self, tag: &Tag) -> Result<(), TagError> {
        let name = tag.attribute(ATTR_NAME).ok_or_else(|| TagError::MissingAttribute {
            tag: tag.name.clone(),
            attribute: ATTR_NAME.to_string(),
            line: tag.line,
        })?;

        self.stats.compiler_threads += 1;

        if TIER1_THREAD_PREFIXES.iter().any(|p| name.starts_with(p)) {
            self.session.compiler_tier = CompilerTier::Tier1;
        } else if TIER2_THREAD_PREFIXES.iter().any(|p| name.starts_with(p)) {
            self.session.compiler_tier = CompilerTier::Tier2;
        } else {
            return Err(TagError::UnknownCompiler {
                name: name.to_string(),
                line: tag.line,
            });
        }

        debug!("compiler thread '{}' -> {}", name, self.session.compiler_tier);
        Ok(())
    }

    fn handle_task_queued(&mut self, tag: &Tag) -> Result<(), TagError> {
        self.stats.queued += 1;

        let Some(id) = self.resolve_tag_member(tag)? else {
            return Ok(());
        };
        let stamp = self.parse_stamp(tag);

        let signature = {
            let Some(member) = self.model.member_mut(id) else {
                return Ok(());
            };
            member.stage = LifecycleStage::Queued;
            member.queued_count += 1;
            member.merge_attributes(&tag.attributes);
            member.journal.push(tag.clone());
            member.signature()
        };

        self.record_event(JitEvent::new(stamp, EventType::Queue, signature));
        Ok(())
    }

    fn handle_nmethod(&mut self, tag: &Tag) -> Result<(), TagError> {
        let event_type = nmethod_event_type(tag)?;

        let Some(id) = self.resolve_tag_member(tag)? else {
            return Ok(());
        };
        let stamp = self.parse_stamp(tag);

        let (signature, class_name) = {
            let Some(member) = self.model.member_mut(id) else {
                return Ok(());
            };
            member.stage = LifecycleStage::NmethodEmitted;
            member.nmethod_events.push(event_type);
            if let Some(compile_id) = tag.attribute(ATTR_COMPILE_ID) {
                member.emitted_compile_ids.insert(compile_id.to_string());
            }
            member.merge_attributes(&tag.attributes);
            member.journal.push(tag.clone());
            (member.signature(), member.identity.class_name.clone())
        };

        self.model.increment_compiled_count(&class_name);
        self.stats.record_nmethod(event_type, tag, &signature);
        self.record_event(JitEvent::new(stamp, event_type, signature));
        Ok(())
    }

    fn handle_task(&mut self, tag: &Tag) -> Result<(), TagError> {
        self.stats.tasks += 1;

        // Children are processed even when the task's own signature fails,
        // so resolution errors are reported after them
        let resolved = self.resolve_tag_member(tag);

        if let Ok(Some(id)) = &resolved {
            let id = *id;
            let compile_id = tag.attribute(ATTR_COMPILE_ID);
            if let Some(member) = self.model.member_mut(id) {
                let already_emitted =
                    compile_id.is_some_and(|c| member.emitted_compile_ids.contains(c));
                member.stage = if already_emitted {
                    LifecycleStage::NmethodEmitted
                } else {
                    LifecycleStage::TaskOpen
                };
                member.task_count += 1;
                member.last_task_tier = tag.compiler_tier;
                member.merge_attributes(&tag.attributes);
                member.journal.push(tag.clone());
            }
            self.session.in_flight = Some(id);
        } else {
            // never let this task's children land on an earlier member
            self.session.in_flight = None;
        }

        // an nmethod printed while the task block was still open nests inside it
        for nmethod in tag.named_children(TAG_NMETHOD) {
            if let Err(e) = self.handle_nmethod(nmethod) {
                self.report_tag_error(nmethod, &e);
            }
        }

        if let Some(code_cache) = tag.first_named_child(TAG_CODE_CACHE) {
            self.handle_code_cache(tag, code_cache);
        }

        if let Some(task_done) = tag.first_named_child(TAG_TASK_DONE) {
            if let Err(e) = self.handle_task_done(task_done) {
                self.report_tag_error(task_done, &e);
            }
        }

        resolved.map(|_| ())
    }

    fn handle_code_cache(&mut self, task: &Tag, code_cache: &Tag) {
        let mut attributes = code_cache.attributes.clone();
        let stamp = task.attribute(ATTR_STAMP).unwrap_or_default();

        // graphing code cache usage needs the parent task's timestamp
        attributes.insert(ATTR_STAMP.to_string(), stamp.to_string());

        let sample = CodeCacheSample {
            stamp: stamp.parse().unwrap_or(0.0),
            attributes,
        };

        notify(self.listener, "code cache", |l| l.on_code_cache(&sample));
        self.model.add_code_cache_sample(sample);
    }

    fn handle_task_done(&mut self, tag: &Tag) -> Result<(), TagError> {
        let in_flight = self.session.in_flight.take();

        if let Some(id) = in_flight {
            if let Some(member) = self.model.member_mut(id) {
                member.merge_attributes(&tag.attributes);
                if member.stage == LifecycleStage::TaskOpen {
                    member.stage = LifecycleStage::DoneWithoutNmethod;
                }
            }
        }

        if let Some(nmsize) = tag.attribute(ATTR_NMSIZE) {
            let bytes = nmsize.parse::<u64>().map_err(|_| TagError::InvalidNumber {
                attribute: ATTR_NMSIZE.to_string(),
                value: nmsize.to_string(),
                line: tag.line,
            })?;
            self.stats.add_native_bytes(bytes);
        }

        Ok(())
    }

    /// Resolve the tag's method attribute to a member
    ///
    /// `Ok(None)` means the tag names no method and is skipped silently.
    fn resolve_tag_member(&mut self, tag: &Tag) -> Result<Option<MemberId>, TagError> {
        let Some(raw) = tag.attribute(ATTR_METHOD) else {
            debug!("<{}> at line {} has no method", tag.name, tag.line);
            return Ok(None);
        };

        let signature = normalize_signature(raw);

        match self.resolver.resolve(&signature) {
            Some(identity) => Ok(Some(self.model.intern(identity))),
            None => Err(TagError::UnresolvedSignature {
                signature: raw.to_string(),
                line: tag.line,
            }),
        }
    }

    fn parse_stamp(&self, tag: &Tag) -> f64 {
        match tag.attribute(ATTR_STAMP) {
            Some(value) => value.parse::<f64>().unwrap_or_else(|_| {
                warn!("invalid stamp '{}' at line {}", value, tag.line);
                0.0
            }),
            None => {
                debug!("<{}> at line {} has no stamp", tag.name, tag.line);
                0.0
            }
        }
    }

    fn record_event(&mut self, event: JitEvent) {
        notify(self.listener, "event", |l| l.on_event(&event));
        self.model.add_event(event);
    }

    fn report_tag_error(&mut self, tag: &Tag, error: &TagError) {
        warn!("{}", error);
        let raw = match error {
            TagError::UnresolvedSignature { signature, .. } => signature.clone(),
            _ => tag.to_string(),
        };
        self.report_error_line(error.line(), &raw);
    }
}

/// Pick the event type for an nmethod tag
///
/// A direct tier attribute wins; without one only the native-wrapper
/// compile kind is accepted.
pub fn nmethod_event_type(tag: &Tag) -> Result<EventType, TagError> {
    let literal = [ATTR_COMPILER, ATTR_TIER]
        .iter()
        .filter_map(|key| tag.attribute(key))
        .find(|value| !value.is_empty());

    if let Some(literal) = literal {
        if TIER1_LITERALS.contains(&literal) {
            return Ok(EventType::NmethodTier1);
        }
        if TIER2_LITERALS.contains(&literal) {
            return Ok(EventType::NmethodTier2);
        }
        return Err(TagError::UnknownCompiler {
            name: literal.to_string(),
            line: tag.line,
        });
    }

    if tag.attribute(ATTR_COMPILE_KIND) == Some(COMPILE_KIND_NATIVE) {
        return Ok(EventType::NmethodTier2Native);
    }

    Err(TagError::MissingAttribute {
        tag: tag.name.clone(),
        attribute: ATTR_COMPILER.to_string(),
        line: tag.line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::listener::CollectingListener;
    use crate::resolver::SignatureResolver;

    fn thread(name: &str) -> Tag {
        Tag::new("start_compile_thread", 1).with_attribute("name", name)
    }

    #[test]
    fn test_tag_kind_mapping() {
        assert_eq!(TagKind::from_name("task"), Some(TagKind::Task));
        assert_eq!(TagKind::from_name("nmethod"), Some(TagKind::Nmethod));
        assert_eq!(TagKind::from_name("task_done"), None);
        assert_eq!(TagKind::from_name("something_new"), None);
    }

    #[test]
    fn test_nmethod_event_type_routing() {
        let tier1 = Tag::new("nmethod", 1).with_attribute("compiler", "C1");
        let tier2 = Tag::new("nmethod", 1).with_attribute("tier", "2");
        let native = Tag::new("nmethod", 1).with_attribute("compile_kind", "c2n");
        let bogus = Tag::new("nmethod", 1).with_attribute("compiler", "JVMCI");
        let missing = Tag::new("nmethod", 1).with_attribute("compile_kind", "osr");
        let blank_native = Tag::new("nmethod", 1)
            .with_attribute("compiler", "")
            .with_attribute("compile_kind", "c2n");

        assert_eq!(nmethod_event_type(&tier1).unwrap(), EventType::NmethodTier1);
        assert_eq!(nmethod_event_type(&tier2).unwrap(), EventType::NmethodTier2);
        assert_eq!(nmethod_event_type(&native).unwrap(), EventType::NmethodTier2Native);
        assert_eq!(
            nmethod_event_type(&blank_native).unwrap(),
            EventType::NmethodTier2Native
        );
        assert!(matches!(
            nmethod_event_type(&bogus),
            Err(TagError::UnknownCompiler { .. })
        ));
        assert!(matches!(
            nmethod_event_type(&missing),
            Err(TagError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_thread_start_sets_sticky_tier() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);

        tracker.handle_tag(&thread("C1 CompilerThread1"));
        assert_eq!(tracker.session().compiler_tier(), CompilerTier::Tier1);

        tracker.handle_tag(&thread("Tier2 CompilerThread0"));
        assert_eq!(tracker.session().compiler_tier(), CompilerTier::Tier2);
        assert_eq!(tracker.stats().compiler_threads, 2);
    }

    #[test]
    fn test_unknown_thread_name_still_counted() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        {
            let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
            tracker.handle_tag(&thread("Sweeper thread"));
            assert_eq!(tracker.stats().compiler_threads, 1);
            assert_eq!(tracker.session().compiler_tier(), CompilerTier::Unknown);
        }
        assert_eq!(listener.errors.len(), 1);
    }

    #[test]
    fn test_missing_thread_name_changes_nothing() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        {
            let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
            tracker.handle_tag(&Tag::new("start_compile_thread", 4));
            assert_eq!(tracker.stats().compiler_threads, 0);
            assert!(tracker.session().fatal().is_none());
        }
        assert_eq!(listener.errors.len(), 1);
        assert_eq!(listener.errors[0].0, 4);
    }

    #[test]
    fn test_full_lifecycle_of_one_member() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        {
            let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
            tracker.handle_tag(&thread("Tier2 CompilerThread0"));
            tracker.handle_tag(
                &Tag::new("task_queued", 2)
                    .with_attribute("method", "a/B.c()V")
                    .with_attribute("stamp", "1.0"),
            );
            tracker.handle_tag(
                &Tag::new("task", 3)
                    .with_attribute("method", "a/B.c()V")
                    .with_attribute("stamp", "1.5")
                    .with_child(
                        Tag::new("nmethod", 4)
                            .with_attribute("method", "a/B.c()V")
                            .with_attribute("tier", "2")
                            .with_attribute("stamp", "2.0"),
                    )
                    .with_child(
                        Tag::new("task_done", 5)
                            .with_attribute("stamp", "2.0")
                            .with_attribute("nmsize", "128"),
                    ),
            );

            assert_eq!(tracker.model().members().len(), 1);
            let member = &tracker.model().members()[0];
            assert_eq!(member.stage, LifecycleStage::NmethodEmitted);
            assert_eq!(member.attributes["tier"], "2");
            assert_eq!(member.attributes["nmsize"], "128");
            assert_eq!(member.attributes["method"], "a/B.c()V");
            assert_eq!(tracker.stats().native_bytes, 128);
            assert!(tracker.session().in_flight_member().is_none());
        }

        let kinds: Vec<(EventType, f64)> = listener
            .events
            .iter()
            .map(|e| (e.event_type, e.stamp))
            .collect();
        assert_eq!(
            kinds,
            vec![(EventType::Queue, 1.0), (EventType::NmethodTier2, 2.0)]
        );
        assert!(listener.errors.is_empty());
    }

    #[test]
    fn test_task_done_clears_in_flight_even_when_next_task_fails() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);

        let good = Tag::new("task", 1)
            .with_attribute("method", "a/B c ()V")
            .with_child(Tag::new("task_done", 2).with_attribute("nmsize", "10"));
        tracker.handle_tag(&good);
        assert!(tracker.session().in_flight_member().is_none());

        // unresolvable task followed by its task_done: nothing is misattributed
        let bad = Tag::new("task", 3)
            .with_attribute("method", "garbage")
            .with_child(Tag::new("task_done", 4).with_attribute("late", "yes"));
        tracker.handle_tag(&bad);

        let member = &tracker.model().members()[0];
        assert!(!member.attributes.contains_key("late"));
        assert_eq!(member.stage, LifecycleStage::DoneWithoutNmethod);
        assert_eq!(tracker.stats().native_bytes, 10);
        assert_eq!(tracker.stats().tasks, 2);
    }

    #[test]
    fn test_code_cache_gets_task_stamp() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        {
            let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
            let task = Tag::new("task", 1)
                .with_attribute("method", "a/B c ()V")
                .with_attribute("stamp", "3.25")
                .with_child(Tag::new("code_cache", 2).with_attribute("free_code_cache", "1000"));
            tracker.handle_tag(&task);

            let samples = tracker.model().code_cache_samples();
            assert_eq!(samples.len(), 1);
            assert_eq!(samples[0].stamp, 3.25);
            assert_eq!(samples[0].attributes["stamp"], "3.25");
        }
        assert_eq!(listener.code_cache.len(), 1);
    }

    #[test]
    fn test_nmethod_before_task_keeps_emitted_stage() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);

        tracker.handle_tag(
            &Tag::new("nmethod", 1)
                .with_attribute("method", "a/B c ()V")
                .with_attribute("compile_id", "5")
                .with_attribute("compiler", "C2"),
        );
        tracker.handle_tag(
            &Tag::new("task", 2)
                .with_attribute("method", "a/B c ()V")
                .with_attribute("compile_id", "5")
                .with_child(Tag::new("task_done", 3).with_attribute("success", "1")),
        );

        let member = &tracker.model().members()[0];
        assert_eq!(member.stage, LifecycleStage::NmethodEmitted);
        assert_eq!(
            tracker.model().class_stats("a.B").unwrap().compiled_method_count,
            1
        );
    }

    #[test]
    fn test_vm_version_and_arguments() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);

        let mut release = Tag::new("release", 2);
        release.content = Some("25.0-b70".to_string());
        let version = Tag::new("vm_version", 1)
            .with_child(release)
            .with_child(Tag::new("tweak_vm", 3));
        tracker.handle_tag(&version);

        let mut command = Tag::new("command", 5);
        command.content = Some("Main --fast".to_string());
        tracker.handle_tag(&Tag::new("vm_arguments", 4).with_child(command));

        assert_eq!(tracker.model().vm_release(), Some("25.0-b70"));
        assert_eq!(tracker.model().vm_command(), Some("Main --fast"));
        assert!(tracker.session().is_experimental_vm());
    }

    #[test]
    fn test_fatal_from_class_load_is_kept_over_missing_trace() {
        let resolver = SignatureResolver;
        let mut listener = CollectingListener::new();
        let outcome = {
            let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
            tracker
                .session_mut()
                .raise_fatal("UnsupportedClassVersionError for class a.B", "too new");
            tracker.finish()
        };

        assert_eq!(listener.fatal.len(), 1);
        assert_eq!(listener.fatal[0].0, "UnsupportedClassVersionError for class a.B");
        assert!(outcome.fatal.is_some());
    }
}
