//! Listener sinks notified while a log is parsed.
//!
//! Every callback runs synchronously on the parsing thread. A callback may
//! fail with `SinkError`; the parser logs the failure and carries on, so a
//! broken sink can never corrupt the parse.

use crate::aggregator::model::{CodeCacheSample, JitEvent};
use crate::utils::error::SinkError;
use log::{error, info, warn};

/// Receives parse progress, timeline events and faults
pub trait JitListener {
    fn on_session_start(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// A QUEUE or NMETHOD_* event, in encounter order
    fn on_event(&mut self, _event: &JitEvent) -> Result<(), SinkError> {
        Ok(())
    }

    /// A recoverable per-line or per-tag fault
    fn on_error_line(&mut self, _line: u64, _raw: &str) -> Result<(), SinkError> {
        Ok(())
    }

    /// Session-fatal configuration problem, reported once at completion
    fn on_fatal_config(&mut self, _title: &str, _body: &str) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_code_cache(&mut self, _sample: &CodeCacheSample) -> Result<(), SinkError> {
        Ok(())
    }

    /// Informational progress message
    fn on_log_entry(&mut self, _message: &str) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_session_complete(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Invoke a listener callback, logging instead of propagating its failure
pub fn notify<F>(listener: &mut dyn JitListener, what: &str, call: F)
where
    F: FnOnce(&mut dyn JitListener) -> Result<(), SinkError>,
{
    if let Err(e) = call(listener) {
        error!("{} listener failed: {}", what, e);
    }
}

/// Keeps everything it is told
#[derive(Debug, Clone, Default)]
pub struct CollectingListener {
    pub events: Vec<JitEvent>,
    pub errors: Vec<(u64, String)>,
    pub fatal: Vec<(String, String)>,
    pub code_cache: Vec<CodeCacheSample>,
    pub log_entries: Vec<String>,
    pub sessions_started: u32,
    pub sessions_completed: u32,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JitListener for CollectingListener {
    fn on_session_start(&mut self) -> Result<(), SinkError> {
        self.sessions_started += 1;
        Ok(())
    }

    fn on_event(&mut self, event: &JitEvent) -> Result<(), SinkError> {
        self.events.push(event.clone());
        Ok(())
    }

    fn on_error_line(&mut self, line: u64, raw: &str) -> Result<(), SinkError> {
        self.errors.push((line, raw.to_string()));
        Ok(())
    }

    fn on_fatal_config(&mut self, title: &str, body: &str) -> Result<(), SinkError> {
        self.fatal.push((title.to_string(), body.to_string()));
        Ok(())
    }

    fn on_code_cache(&mut self, sample: &CodeCacheSample) -> Result<(), SinkError> {
        self.code_cache.push(sample.clone());
        Ok(())
    }

    fn on_log_entry(&mut self, message: &str) -> Result<(), SinkError> {
        self.log_entries.push(message.to_string());
        Ok(())
    }

    fn on_session_complete(&mut self) -> Result<(), SinkError> {
        self.sessions_completed += 1;
        Ok(())
    }
}

/// Forwards notifications to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl JitListener for LoggingListener {
    fn on_error_line(&mut self, line: u64, raw: &str) -> Result<(), SinkError> {
        warn!("line {}: {}", line, raw);
        Ok(())
    }

    fn on_fatal_config(&mut self, title: &str, body: &str) -> Result<(), SinkError> {
        error!("{}: {}", title, body);
        Ok(())
    }

    fn on_log_entry(&mut self, message: &str) -> Result<(), SinkError> {
        info!("{}", message);
        Ok(())
    }
}
