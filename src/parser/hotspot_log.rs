//! Whole-log parsing.
//!
//! A parse runs in ordered passes over one log file:
//! 1. Classify every line into header/classloader/compilation/assembly buckets
//! 2. Discover the classpath and build the class model from classloader lines
//! 3. Build tags from the header bucket and interpret them
//! 4. Build tags from the compilation bucket and interpret them
//! 5. Hand the assembly bucket to an attached merger
//!
//! Only an I/O failure reading the log aborts a parse. Everything else is
//! reported to the listener and parsing carries on.

use super::classifier::{LineClassifier, LogLine, SplitLog};
use super::classpath::ClasspathDiscovery;
use super::schema::{ErrorLine, JitReport, MemberSummary};
use super::tag::{Tag, TagBuilder};
use crate::aggregator::lifecycle::{CompileLifecycleTracker, SessionOutcome};
use crate::aggregator::model::JitDataModel;
use crate::output::listener::{notify, CollectingListener, JitListener};
use crate::resolver::ClassModel;
use crate::utils::config::{ParserConfig, SCHEMA_VERSION, SKIP_BODY_TAGS, SKIP_HEADER_TAGS};
use crate::utils::error::{ClassLoadError, MarkupError, ParseError};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared stop flag, checked once per input line
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Consumer of disassembly lines, run after the compilation pass
pub trait AssemblyMerger {
    fn handle_line(&mut self, line: &LogLine);

    /// Called once all assembly lines have been handed over
    fn complete(&mut self, model: &JitDataModel);
}

/// Result of one parse
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub session: SessionOutcome,

    /// Classification stopped early; later passes did not run
    pub cancelled: bool,

    /// Physical lines read from the input
    pub lines_read: u64,

    /// Classes registered in the class model
    pub classes_loaded: usize,
}

/// How the classification read loop ended, with the lines read
enum Classified {
    Complete(u64),
    Cancelled(u64),
}

/// A line the classifier could not split, kept until the tracker exists
struct ClassifierFault {
    line: u64,
    raw: String,
    fault: MarkupError,
}

/// Parses one HotSpot LogCompilation log at a time
pub struct HotSpotLogParser {
    config: ParserConfig,
    cancel: CancelToken,
    split: SplitLog,
    assembly_merger: Option<Box<dyn AssemblyMerger>>,
}

impl HotSpotLogParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
            split: SplitLog::new(),
            assembly_merger: None,
        }
    }

    pub fn with_assembly_merger(mut self, merger: Box<dyn AssemblyMerger>) -> Self {
        self.assembly_merger = Some(merger);
        self
    }

    /// Token that stops a running parse from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Stop the parse in progress
    ///
    /// Each call to `process_reader` re-arms the token when it starts, so a
    /// stop issued between parses has no effect on the next one.
    pub fn stop_parsing(&self) {
        info!("Stopping parse");
        self.cancel.cancel();
    }

    /// Buckets built by the most recent parse
    pub fn split_log(&self) -> &SplitLog {
        &self.split
    }

    /// Parse a log file from disk
    pub fn process_file(
        &mut self,
        path: impl AsRef<Path>,
        listener: &mut dyn JitListener,
    ) -> Result<ParseOutcome, ParseError> {
        let path = path.as_ref();
        info!("Parsing log: {}", path.display());

        let file = File::open(path)?;
        self.process_reader(BufReader::new(file), listener)
    }

    /// Parse a log from any buffered reader
    pub fn process_reader<R: BufRead>(
        &mut self,
        reader: R,
        listener: &mut dyn JitListener,
    ) -> Result<ParseOutcome, ParseError> {
        let start_time = Instant::now();

        self.cancel.reset();

        notify(listener, "session start", |l| l.on_session_start());

        self.split.clear();

        let mut faults = Vec::new();

        let lines_read = match self.classify(reader, &mut faults) {
            Ok(Classified::Complete(lines_read)) => lines_read,
            Ok(Classified::Cancelled(lines_read)) => {
                for fault in &faults {
                    notify(listener, "error", |l| l.on_error_line(fault.line, &fault.raw));
                }
                notify(listener, "session complete", |l| l.on_session_complete());
                return Ok(ParseOutcome {
                    cancelled: true,
                    lines_read,
                    ..Default::default()
                });
            }
            Err(e) => {
                notify(listener, "session complete", |l| l.on_session_complete());
                return Err(e);
            }
        };

        self.split.log_stats();

        let outcome = self.interpret(listener, lines_read, &faults);

        notify(listener, "session complete", |l| l.on_session_complete());

        info!(
            "Parse completed in {:.2}s",
            start_time.elapsed().as_secs_f64()
        );

        Ok(outcome)
    }

    /// Read and bucket every line
    fn classify<R: BufRead>(
        &mut self,
        mut reader: R,
        faults: &mut Vec<ClassifierFault>,
    ) -> Result<Classified, ParseError> {
        let mut classifier = LineClassifier::new(self.config.max_split_depth);
        let mut buf = Vec::new();
        let mut number: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                info!("Parse cancelled after {} lines", number);
                return Ok(Classified::Cancelled(number));
            }

            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            number += 1;

            let raw = String::from_utf8_lossy(&buf);
            let raw = raw.trim_end_matches(['\n', '\r']);

            let classification = classifier.classify(raw);

            if let Some(fault) = classification.fault {
                faults.push(ClassifierFault {
                    line: number,
                    raw: raw.to_string(),
                    fault,
                });
            }

            for (bucket, text) in classification.pieces {
                self.split.add(bucket, LogLine::new(number, text));
            }
        }

        debug!("Read {} lines", number);
        Ok(Classified::Complete(number))
    }

    fn interpret(
        &mut self,
        listener: &mut dyn JitListener,
        lines_read: u64,
        classifier_faults: &[ClassifierFault],
    ) -> ParseOutcome {
        let mut discovery = ClasspathDiscovery::new();
        for line in self.split.classloader_lines() {
            discovery.handle_line(line.number, &line.text);
        }

        for entry in &self.config.preferred_classpath {
            let message = format!("Adding configured classpath: {}", entry.display());
            notify(listener, "log", |l| l.on_log_entry(&message));
        }
        for location in discovery.parsed_locations() {
            let message = format!("Adding parsed classpath: {}", location);
            notify(listener, "log", |l| l.on_log_entry(&message));
        }

        let mut class_model = ClassModel::new(discovery.classpath(&self.config.preferred_classpath));
        let mut class_faults: Vec<(u64, ClassLoadError)> = Vec::new();

        for record in discovery.classes() {
            let origin = record.location.as_deref().map(Path::new);
            if let Err(e) = class_model.add_class(&record.class_name, origin) {
                class_faults.push((record.line, e));
            }
        }

        info!(
            "Class model holds {} classes over {} classpath entries",
            class_model.class_count(),
            class_model.classpath().len()
        );

        let classes_loaded = class_model.class_count();
        let mut tracker = CompileLifecycleTracker::new(&class_model, listener);

        if discovery.saw_trace() {
            tracker.session_mut().mark_classloader_trace();
        }

        for fault in classifier_faults {
            tracker.report_markup_fault(fault.line, &fault.raw, &fault.fault);
        }

        for (line, fault) in &class_faults {
            warn!("{}", fault);
            if fault.is_fatal() {
                if let ClassLoadError::UnsupportedVersion { class, .. } = fault {
                    tracker.session_mut().raise_fatal(
                        format!("UnsupportedClassVersionError for class {}", class),
                        fault.to_string(),
                    );
                }
            }
            tracker.report_error_line(*line, &fault.to_string());
        }

        // Header pass
        let mut builder = TagBuilder::for_header();
        run_tag_pass(
            &mut builder,
            self.split.header_lines(),
            SKIP_HEADER_TAGS,
            &mut tracker,
        );

        // Compilation pass
        let mut builder = TagBuilder::for_compilation();
        run_tag_pass(
            &mut builder,
            self.split.compilation_lines(),
            SKIP_BODY_TAGS,
            &mut tracker,
        );

        let session = tracker.finish();

        if let Some(merger) = self.assembly_merger.as_mut() {
            info!("Merging {} assembly lines", self.split.assembly_lines().len());
            for line in self.split.assembly_lines() {
                merger.handle_line(line);
            }
            merger.complete(&session.model);
        }

        ParseOutcome {
            session,
            cancelled: false,
            lines_read,
            classes_loaded,
        }
    }
}

/// Feed one bucket through a tag builder and into the tracker
fn run_tag_pass(
    builder: &mut TagBuilder,
    lines: &[LogLine],
    skip: &[&str],
    tracker: &mut CompileLifecycleTracker<'_>,
) {
    let mut completed: Vec<Tag> = Vec::new();

    for line in lines {
        if skip.iter().any(|prefix| line.text.starts_with(prefix)) {
            continue;
        }

        builder.set_compiler_tier(tracker.session().compiler_tier());

        if let Err(fault) = builder.process_line(line, &mut completed) {
            tracker.report_markup_fault(line.number, &line.text, &fault);
        }

        for tag in completed.drain(..) {
            tracker.handle_tag(&tag);
        }
    }

    if builder.open_depth() > 0 {
        warn!(
            "{} element(s) still open at end of pass: {:?}",
            builder.open_depth(),
            builder.open_elements()
        );
    }
}

/// Convert a finished parse into the JSON report
///
/// **Public** - used by the parse command
pub fn to_report(source: &str, outcome: &ParseOutcome, listener: &CollectingListener) -> JitReport {
    use chrono::Utc;

    let model = &outcome.session.model;

    let members = model
        .members()
        .iter()
        .map(|member| MemberSummary {
            signature: member.signature(),
            stage: member.stage,
            queued_count: member.queued_count,
            task_count: member.task_count,
            nmethod_count: member.nmethod_events.len() as u32,
            attributes: member.attributes.clone(),
        })
        .collect();

    let compiled_per_class = model
        .classes()
        .iter()
        .filter(|(_, stats)| stats.compiled_method_count > 0)
        .map(|(name, stats)| (name.clone(), stats.compiled_method_count))
        .collect();

    let errors = listener
        .errors
        .iter()
        .map(|(line, text)| ErrorLine {
            line: *line,
            text: text.clone(),
        })
        .collect();

    JitReport {
        version: SCHEMA_VERSION.to_string(),
        source: source.to_string(),
        vm_release: model.vm_release().map(str::to_string),
        vm_command: model.vm_command().map(str::to_string),
        experimental_vm: outcome.session.experimental_vm,
        cancelled: outcome.cancelled,
        stats: outcome.session.stats.clone(),
        stage_counts: model.stage_counts(),
        compiled_per_class,
        events: model.events().to_vec(),
        members,
        code_cache: model.code_cache_samples().to_vec(),
        errors,
        fatal: outcome.session.fatal.clone(),
        generated_at: Utc::now().to_rfc3339(),
    }
}
