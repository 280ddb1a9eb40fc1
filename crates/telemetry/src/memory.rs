//! In-memory tracer for tests and for inspecting a session after the fact.

use chrono::Utc;
use mediscreen_core::trace::{TraceEvent, TraceRecord, Tracer};
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryTracer {
    records: RwLock<Vec<TraceRecord>>,
}

impl MemoryTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.read().iter().map(|r| r.event.clone()).collect()
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        self.read().clone()
    }

    pub fn error_count(&self) -> usize {
        self.read().iter().filter(|r| r.event.is_error()).count()
    }

    /// System messages, in order.
    pub fn system_messages(&self) -> Vec<String> {
        self.read()
            .iter()
            .filter_map(|r| match &r.event {
                TraceEvent::System { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Export as JSON lines.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for record in self.read().iter() {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<TraceRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl Tracer for MemoryTracer {
    fn record(&self, event: TraceEvent) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(TraceRecord {
                timestamp: Utc::now(),
                event,
            });
    }
}
