use jit_trace_studio::aggregator::{
    CompileLifecycleTracker, CompilerTier, EventType, LifecycleStage,
};
use jit_trace_studio::output::CollectingListener;
use jit_trace_studio::parser::{LogLine, Tag, TagBuilder};
use jit_trace_studio::resolver::{MemberIdentity, MemberResolver, SignatureResolver};
use pretty_assertions::assert_eq;

/// Resolves exactly one member
struct SingleMember;

impl MemberResolver for SingleMember {
    fn resolve(&self, signature: &str) -> Option<MemberIdentity> {
        (signature == "a.B.c()V").then(|| MemberIdentity::new("a.B", "c", "()V"))
    }
}

/// Build tags from markup lines the way the compilation pass does
fn build(lines: &[&str]) -> Vec<Tag> {
    let mut builder = TagBuilder::for_compilation();
    let mut tags = Vec::new();
    for (i, text) in lines.iter().enumerate() {
        builder
            .process_line(&LogLine::new(i as u64 + 1, *text), &mut tags)
            .unwrap();
    }
    tags
}

#[test]
fn test_lifecycle_scenario_from_markup() {
    let tags = build(&[
        "<start_compile_thread name='Tier2 CompilerThread0'/>",
        "<task_queued method='a/B.c()V' stamp='1.0'/>",
        "<task method='a/B.c()V' stamp='1.5'>",
        "<task_done stamp='2.0' nmsize='128'/>",
        "</task>",
        "<nmethod method='a/B.c()V' tier='2' stamp='2.0'/>",
    ]);
    assert_eq!(tags.len(), 4);

    let resolver = SingleMember;
    let mut listener = CollectingListener::new();
    let outcome = {
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
        for tag in &tags {
            tracker.handle_tag(tag);
        }
        assert!(tracker.session().in_flight_member().is_none());
        assert_eq!(tracker.session().compiler_tier(), CompilerTier::Tier2);
        tracker.finish()
    };

    let events: Vec<(EventType, f64)> = listener
        .events
        .iter()
        .map(|e| (e.event_type, e.stamp))
        .collect();
    assert_eq!(
        events,
        vec![(EventType::Queue, 1.0), (EventType::NmethodTier2, 2.0)]
    );

    let members = outcome.model.members();
    assert_eq!(members.len(), 1);
    let member = &members[0];
    assert_eq!(member.stage, LifecycleStage::NmethodEmitted);
    assert_eq!(member.journal.len(), 3);

    // union of task, task_done and nmethod attributes, later values win
    let keys: Vec<&str> = member.attributes.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["method", "nmsize", "stamp", "tier"]);
    assert_eq!(member.attributes["stamp"], "2.0");

    assert_eq!(outcome.stats.native_bytes, 128);
    assert!(listener.errors.is_empty());
}

#[test]
fn test_task_tier_is_sticky_tier_at_completion() {
    let mut builder = TagBuilder::for_compilation();
    let resolver = SignatureResolver;
    let mut listener = CollectingListener::new();
    let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);

    let lines = [
        "<start_compile_thread name='C1 CompilerThread3'/>",
        "<task method='a/B c ()V' stamp='1.0'>",
        "<task_done success='1'/>",
        "</task>",
    ];

    let mut tags = Vec::new();
    for (i, text) in lines.iter().enumerate() {
        builder.set_compiler_tier(tracker.session().compiler_tier());
        builder
            .process_line(&LogLine::new(i as u64 + 1, *text), &mut tags)
            .unwrap();
        for tag in tags.drain(..) {
            tracker.handle_tag(&tag);
        }
    }

    let member = &tracker.model().members()[0];
    assert_eq!(member.last_task_tier, CompilerTier::Tier1);
    assert_eq!(member.stage, LifecycleStage::DoneWithoutNmethod);
}

#[test]
fn test_unknown_nmethod_compiler_is_reported() {
    let resolver = SignatureResolver;
    let mut listener = CollectingListener::new();
    {
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
        let tags = build(&["<nmethod method='a/B c ()V' compiler='jvmci' stamp='1.0'/>"]);
        tracker.handle_tag(&tags[0]);
        assert_eq!(tracker.stats().errors, 1);
        assert!(tracker.model().events().is_empty());
    }

    assert_eq!(listener.errors.len(), 1);
    assert_eq!(listener.errors[0].0, 1);
    assert!(listener.errors[0].1.contains("jvmci"));
}

#[test]
fn test_missing_method_is_skipped_silently() {
    let resolver = SignatureResolver;
    let mut listener = CollectingListener::new();
    {
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
        tracker.handle_tag(&Tag::new("task_queued", 1).with_attribute("stamp", "1.0"));
        assert_eq!(tracker.stats().queued, 1);
        assert!(tracker.model().members().is_empty());
    }
    assert!(listener.errors.is_empty());
    assert!(listener.events.is_empty());
}

#[test]
fn test_unknown_tags_are_ignored() {
    let resolver = SignatureResolver;
    let mut listener = CollectingListener::new();
    {
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
        for tag in build(&["<sweeper state='finished' stamp='3.0'/>", "<make_not_entrant compile_id='1'/>"]) {
            tracker.handle_tag(&tag);
        }
        assert!(tracker.model().members().is_empty());
    }
    assert!(listener.errors.is_empty());
}

#[test]
fn test_invalid_stamp_defaults_to_zero() {
    let resolver = SignatureResolver;
    let mut listener = CollectingListener::new();
    {
        let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);
        tracker.handle_tag(
            &Tag::new("task_queued", 1)
                .with_attribute("method", "a/B c ()V")
                .with_attribute("stamp", "soon"),
        );
    }
    assert_eq!(listener.events.len(), 1);
    assert_eq!(listener.events[0].stamp, 0.0);
}

#[test]
fn test_repeated_compiles_accumulate_on_one_member() {
    let resolver = SignatureResolver;
    let mut listener = CollectingListener::new();
    let mut tracker = CompileLifecycleTracker::new(&resolver, &mut listener);

    for (compile_id, compiler) in [("1", "C1"), ("7", "C2")] {
        tracker.handle_tag(
            &Tag::new("task_queued", 1)
                .with_attribute("method", "a/B c ()V")
                .with_attribute("compile_id", compile_id),
        );
        tracker.handle_tag(
            &Tag::new("nmethod", 2)
                .with_attribute("method", "a/B c ()V")
                .with_attribute("compile_id", compile_id)
                .with_attribute("compiler", compiler),
        );
    }

    let member = &tracker.model().members()[0];
    assert_eq!(tracker.model().members().len(), 1);
    assert_eq!(member.queued_count, 2);
    assert_eq!(
        member.nmethod_events,
        vec![EventType::NmethodTier1, EventType::NmethodTier2]
    );
    assert_eq!(member.attributes["compile_id"], "7");
    assert_eq!(
        tracker
            .model()
            .class_stats("a.B")
            .unwrap()
            .compiled_method_count,
        2
    );
}

#[test]
fn test_tag_tree_round_trip() {
    let tags = build(&[
        "<task compile_id='4'>",
        "<phase name='parse'/>",
        "<phase name='optimizer' nodes='12'/>",
        "</task>",
    ]);

    assert_eq!(tags.len(), 1);
    let task = &tags[0];
    assert_eq!(task.attribute("compile_id"), Some("4"));

    let phases: Vec<&str> = task
        .named_children("phase")
        .filter_map(|c| c.attribute("name"))
        .collect();
    assert_eq!(phases, vec!["parse", "optimizer"]);
    assert_eq!(task.children[1].attribute("nodes"), Some("12"));
    assert_eq!(task.children[0].parent.as_deref(), Some("task"));
}
