use crate::service::{ServiceKind, ServiceState};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pluggable latency hook. One event fires per service state transition,
/// except while pack bytes are being accumulated (the buffer state
/// re-enters itself).
pub trait TransitionObserver: Send + Sync {
    fn on_transition(
        &self,
        service: ServiceKind,
        prev: ServiceState,
        next: ServiceState,
        elapsed: Duration,
    );
}

pub struct NoopObserver;

impl TransitionObserver for NoopObserver {
    fn on_transition(&self, _: ServiceKind, _: ServiceState, _: ServiceState, _: Duration) {}
}

/// Emits transitions as `tracing` debug events.
pub struct TraceObserver;

impl TransitionObserver for TraceObserver {
    fn on_transition(
        &self,
        service: ServiceKind,
        prev: ServiceState,
        next: ServiceState,
        elapsed: Duration,
    ) {
        tracing::debug!(
            service = service.wire_name(),
            from = prev.as_str(),
            to = next.as_str(),
            elapsed_us = elapsed.as_micros() as u64,
            "service transition"
        );
    }
}

pub(crate) struct TransitionClock {
    kind: ServiceKind,
    state: ServiceState,
    since: Instant,
    observer: Arc<dyn TransitionObserver>,
}

impl TransitionClock {
    pub(crate) fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            state: ServiceState::Disco,
            since: Instant::now(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub(crate) fn set_observer(&mut self, observer: Arc<dyn TransitionObserver>) {
        self.observer = observer;
    }

    pub(crate) fn state(&self) -> ServiceState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: ServiceState) {
        if next == self.state {
            return;
        }
        let elapsed = self.since.elapsed();
        self.observer.on_transition(self.kind, self.state, next, elapsed);
        self.state = next;
        self.since = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        events: Mutex<Vec<(ServiceState, ServiceState)>>,
    }

    impl TransitionObserver for Recorder {
        fn on_transition(
            &self,
            _: ServiceKind,
            prev: ServiceState,
            next: ServiceState,
            _: Duration,
        ) {
            self.events.lock().unwrap().push((prev, next));
        }
    }

    #[test]
    fn test_buffer_reentry_is_silent() {
        let recorder = Arc::new(Recorder {
            events: Mutex::new(vec![]),
        });
        let mut clock = TransitionClock::new(ServiceKind::ReceivePack);
        clock.set_observer(recorder.clone());
        clock.advance(ServiceState::Commands);
        clock.advance(ServiceState::Buffer);
        clock.advance(ServiceState::Buffer);
        clock.advance(ServiceState::Buffer);
        clock.advance(ServiceState::Report);
        let events = recorder.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (ServiceState::Disco, ServiceState::Commands),
                (ServiceState::Commands, ServiceState::Buffer),
                (ServiceState::Buffer, ServiceState::Report),
            ]
        );
    }

    #[test]
    fn test_ordinals_are_monotonic() {
        assert!(ServiceState::Disco < ServiceState::Wants);
        assert!(ServiceState::Wants < ServiceState::Haves);
        assert!(ServiceState::Commands < ServiceState::Buffer);
        assert!(ServiceState::Report < ServiceState::Done);
    }
}
