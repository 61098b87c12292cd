//! Deterministic driver: a processor chain plus its deadline queue, advanced
//! by an explicit clock.

use embassy_time::Instant;

use crate::{
    config::{ProcessorInstanceConfig, MAX_PROCESSORS},
    input::{InputEvent, PassThrough},
    processor::{DispatchReport, InputProcessor, ProcessorChain, ProcessorError, TouchpadProcessor},
    sink::EventSink,
    telemetry::ProcessorTelemetry,
    timer::DeadlineQueue,
};

/// Every touchpad instance arms at most one deadline per slot.
pub const TIMER_CAPACITY: usize = MAX_PROCESSORS * 3;

pub type TouchpadPipeline = Pipeline<TouchpadProcessor, MAX_PROCESSORS, TIMER_CAPACITY>;

pub struct Pipeline<S, const P: usize, const T: usize> {
    chain: ProcessorChain<S, P>,
    timers: DeadlineQueue<T>,
    now: Instant,
}

impl<const P: usize, const T: usize> Pipeline<TouchpadProcessor, P, T> {
    pub fn from_configs(configs: &[ProcessorInstanceConfig], now: Instant) -> Self {
        Self::new(ProcessorChain::from_configs(configs, now), now)
    }
}

impl<S: InputProcessor, const P: usize, const T: usize> Pipeline<S, P, T> {
    pub fn new(chain: ProcessorChain<S, P>, now: Instant) -> Self {
        Self {
            chain,
            timers: DeadlineQueue::new(),
            now,
        }
    }

    pub fn chain(&self) -> &ProcessorChain<S, P> {
        &self.chain
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Fires every deadline up to and including `now`, each observing its
    /// own deadline as the current time. Returns the first stage error.
    pub fn advance_to(
        &mut self,
        now: Instant,
        sink: &mut dyn EventSink,
        telemetry: &dyn ProcessorTelemetry,
    ) -> Result<(), ProcessorError> {
        let mut first_error = None;
        while let Some((key, deadline)) = self.timers.pop_due(now) {
            self.now = self.now.max(deadline);
            let fired = self
                .chain
                .on_timer(key, deadline, &mut self.timers, sink, telemetry);
            if let Err(error) = fired {
                first_error.get_or_insert(error);
            }
        }
        self.now = self.now.max(now);
        first_error.map_or(Ok(()), Err)
    }

    /// Runs one event through the chain at `now`, after any timers due
    /// before it.
    pub fn dispatch(
        &mut self,
        now: Instant,
        event: &mut InputEvent,
        params: PassThrough,
        sink: &mut dyn EventSink,
        telemetry: &dyn ProcessorTelemetry,
    ) -> DispatchReport {
        let timer_error = self.advance_to(now, sink, telemetry).err();
        let mut report =
            self.chain
                .handle_event(event, params, self.now, &mut self.timers, sink, telemetry);
        if report.error.is_none() {
            report.error = timer_error;
        }
        report
    }

    /// Drops all in-flight touches, candidates and clicks.
    pub fn reset(
        &mut self,
        now: Instant,
        sink: &mut dyn EventSink,
        telemetry: &dyn ProcessorTelemetry,
    ) {
        self.now = self.now.max(now);
        self.chain.reset(self.now, &mut self.timers, sink, telemetry);
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ProcessorKind, TapConfig, TouchConfig},
        input::Axis,
        processor::ProcessorOutcome,
        sink::{EventBuffer, OutputEvent},
        telemetry::TelemetryCounters,
    };

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn touchpad() -> Pipeline<TouchpadProcessor, 1, 3> {
        Pipeline::from_configs(
            &[ProcessorInstanceConfig {
                label: "trackpad",
                touch: TouchConfig::DEFAULT,
                kind: ProcessorKind::Touchpad(TapConfig::DEFAULT),
            }],
            at(0),
        )
    }

    #[test]
    fn timers_fire_at_their_deadline_before_later_events() {
        let mut pipeline = touchpad();
        let mut sink = EventBuffer::<8>::new();
        let telemetry = TelemetryCounters::new();

        let report = pipeline.dispatch(
            at(0),
            &mut InputEvent::abs(Axis::X, 10),
            PassThrough::default(),
            &mut sink,
            &telemetry,
        );
        assert_eq!(report.outcome, ProcessorOutcome::Continue);
        assert_eq!(pipeline.next_deadline(), Some(at(30)));

        // Touch ends at 30 and the decision at 50 clicks. The touch at 100
        // releases that click early and ends before its own decision.
        let report = pipeline.dispatch(
            at(100),
            &mut InputEvent::abs(Axis::Y, 3),
            PassThrough::default(),
            &mut sink,
            &telemetry,
        );
        assert_eq!(report.error, None);
        pipeline.advance_to(at(400), &mut sink, &telemetry).unwrap();

        assert_eq!(
            sink.events(),
            &[
                OutputEvent::Button {
                    code: 256,
                    pressed: true
                },
                OutputEvent::Button {
                    code: 256,
                    pressed: false
                },
                OutputEvent::Button {
                    code: 256,
                    pressed: true
                },
                OutputEvent::Button {
                    code: 256,
                    pressed: false
                },
            ]
        );
        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.touch_starts, 2);
        assert_eq!(snapshot.touch_ends, 2);
        assert_eq!(pipeline.next_deadline(), None);
        assert_eq!(pipeline.now(), at(400));
    }

    #[test]
    fn reset_clears_pending_deadlines() {
        let mut pipeline = touchpad();
        let mut sink = EventBuffer::<8>::new();
        let telemetry = TelemetryCounters::new();

        pipeline.dispatch(
            at(0),
            &mut InputEvent::abs(Axis::X, 10),
            PassThrough::default(),
            &mut sink,
            &telemetry,
        );
        pipeline.reset(at(10), &mut sink, &telemetry);
        pipeline.advance_to(at(500), &mut sink, &telemetry).unwrap();

        assert_eq!(pipeline.next_deadline(), None);
        assert!(sink.events().is_empty());
        assert!(!pipeline.chain().stages()[0].tracker().is_touching());
    }
}
