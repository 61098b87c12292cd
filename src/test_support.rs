use embassy_time::Instant;

use crate::{
    processor::ProcessorContext,
    sink::{EventBuffer, OutputEvent},
    telemetry::TelemetryCounters,
    timer::{DeadlineQueue, TimerError, TimerFacility, TimerKey, TimerSlot},
};

pub(crate) fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

/// Owns the collaborators a stage needs and hands out contexts at a chosen time.
pub(crate) struct Harness {
    pub(crate) timers: FlakyTimers,
    pub(crate) sink: EventBuffer<32>,
    pub(crate) telemetry: TelemetryCounters,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            timers: FlakyTimers::default(),
            sink: EventBuffer::new(),
            telemetry: TelemetryCounters::new(),
        }
    }

    pub(crate) fn ctx(&mut self, ms: u64) -> ProcessorContext<'_> {
        ProcessorContext {
            now: at(ms),
            instance: 0,
            timers: &mut self.timers,
            sink: &mut self.sink,
            telemetry: &self.telemetry,
        }
    }

    pub(crate) fn deadline(&self, key: TimerKey) -> Option<Instant> {
        self.timers.queue.deadline_of(key)
    }

    pub(crate) fn take_events(&mut self) -> std::vec::Vec<OutputEvent> {
        self.sink.drain().collect()
    }
}

/// Deadline queue whose scheduling can be made to fail on demand.
#[derive(Default)]
pub(crate) struct FlakyTimers {
    pub(crate) queue: DeadlineQueue<8>,
    pub(crate) failing: bool,
    pub(crate) failing_slot: Option<TimerSlot>,
}

impl TimerFacility for FlakyTimers {
    fn reschedule(&mut self, key: TimerKey, deadline: Instant) -> Result<(), TimerError> {
        if self.failing || self.failing_slot == Some(key.slot) {
            return Err(TimerError::QueueFull);
        }
        self.queue.reschedule(key, deadline)
    }

    fn cancel(&mut self, key: TimerKey) {
        self.queue.cancel(key);
    }
}
