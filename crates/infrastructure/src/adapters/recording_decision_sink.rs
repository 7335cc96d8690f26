//! Decision sink that retains events in memory
//!
//! Used by tests and by anything that wants to inspect the recent decision
//! trail; optionally tees every event to another sink.

use std::sync::Arc;

use application::ports::DecisionSinkPort;
use domain::{DecisionEvent, DecisionKind};
use parking_lot::Mutex;

/// In-memory event recorder
#[derive(Debug, Default)]
pub struct RecordingDecisionSink {
    events: Mutex<Vec<DecisionEvent>>,
    forward: Option<Arc<dyn DecisionSinkPort>>,
}

impl RecordingDecisionSink {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record events and also hand each one to `next`
    #[must_use]
    pub fn tee(next: Arc<dyn DecisionSinkPort>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            forward: Some(next),
        }
    }

    /// All recorded events in emission order
    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events.lock().clone()
    }

    /// Recorded events of one kind
    pub fn of_kind(&self, kind: DecisionKind) -> Vec<DecisionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.decision == kind)
            .cloned()
            .collect()
    }

    /// Recorded events for one request id
    pub fn for_request(&self, request_id: &str) -> Vec<DecisionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.request_id.as_deref() == Some(request_id))
            .cloned()
            .collect()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forget all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DecisionSinkPort for RecordingDecisionSink {
    fn emit(&self, event: DecisionEvent) {
        if let Some(next) = &self.forward {
            next.emit(event.clone());
        }
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let sink = RecordingDecisionSink::new();
        sink.emit(DecisionEvent::new(DecisionKind::Route, "routing to backend"));
        sink.emit(DecisionEvent::new(DecisionKind::Admit, "rate limit ok"));

        let reasons: Vec<_> = sink.events().into_iter().map(|e| e.reason).collect();
        assert_eq!(reasons, vec!["routing to backend", "rate limit ok"]);
        assert_eq!(sink.of_kind(DecisionKind::Admit).len(), 1);
    }

    #[test]
    fn filters_by_request_id() {
        let sink = RecordingDecisionSink::new();
        sink.emit(DecisionEvent::new(DecisionKind::Chaos, "disabled").with_request_id("a"));
        sink.emit(DecisionEvent::new(DecisionKind::Chaos, "disabled").with_request_id("b"));

        assert_eq!(sink.for_request("a").len(), 1);
        assert!(sink.for_request("c").is_empty());
    }

    #[test]
    fn tee_forwards_every_event() {
        let inner = Arc::new(RecordingDecisionSink::new());
        let outer = RecordingDecisionSink::tee(inner.clone());

        outer.emit(DecisionEvent::new(DecisionKind::Block, "route not found"));

        assert_eq!(outer.len(), 1);
        assert_eq!(inner.len(), 1);
        outer.clear();
        assert!(outer.is_empty());
        assert_eq!(inner.len(), 1);
    }
}
