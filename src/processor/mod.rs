//! Processor stages and the chain that runs them.

mod chain;
mod touchpad;

pub use chain::{DispatchReport, ProcessorChain};
pub use touchpad::TouchpadProcessor;

use core::fmt;

use embassy_time::{Duration, Instant};

use crate::{
    input::{InputEvent, PassThrough},
    sink::{EventSink, OutputEvent},
    telemetry::{ProcessorTelemetry, TelemetryEvent},
    timer::{TimerError, TimerFacility, TimerKey, TimerSlot},
};

/// What the chain does after a stage handled an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorOutcome {
    Continue,
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorError {
    Timer { slot: TimerSlot, error: TimerError },
}

impl fmt::Display for ProcessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer { slot, error } => write!(f, "failed to schedule {slot:?} timer: {error}"),
        }
    }
}

/// Everything a stage may touch while handling one event or timer expiry.
///
/// `instance` is bound by the chain, so timer keys created here always route
/// back to the stage that armed them.
pub struct ProcessorContext<'a> {
    pub now: Instant,
    pub instance: u8,
    pub timers: &'a mut dyn TimerFacility,
    pub sink: &'a mut dyn EventSink,
    pub telemetry: &'a dyn ProcessorTelemetry,
}

impl ProcessorContext<'_> {
    pub fn key(&self, slot: TimerSlot) -> TimerKey {
        TimerKey::new(self.instance, slot)
    }

    /// Arms `slot` to fire `delay` from now, replacing any pending deadline.
    pub fn schedule(&mut self, slot: TimerSlot, delay: Duration) -> Result<(), ProcessorError> {
        let key = self.key(slot);
        match self.timers.reschedule(key, self.now + delay) {
            Ok(()) => Ok(()),
            Err(error) => {
                let error = ProcessorError::Timer { slot, error };
                self.record(TelemetryEvent::TimerFailed { error });
                Err(error)
            }
        }
    }

    pub fn cancel(&mut self, slot: TimerSlot) {
        let key = self.key(slot);
        self.timers.cancel(key);
    }

    pub fn emit(&mut self, event: OutputEvent) {
        self.sink.emit(event);
    }

    pub fn record(&self, event: TelemetryEvent) {
        self.telemetry.record(self.instance, event);
    }
}

/// One stage of the input pipeline.
///
/// Stages never swallow events they do not own: returning `Stop` is reserved
/// for stages that deliberately end the chain.
pub trait InputProcessor {
    fn handle_event(
        &mut self,
        event: &mut InputEvent,
        params: PassThrough,
        ctx: &mut ProcessorContext<'_>,
    ) -> Result<ProcessorOutcome, ProcessorError>;

    /// Called when a timer armed through `ctx` for this stage expires.
    fn on_timer(
        &mut self,
        slot: TimerSlot,
        ctx: &mut ProcessorContext<'_>,
    ) -> Result<(), ProcessorError>;

    /// Drops all in-flight state and timers without synthesizing a tap.
    fn reset(&mut self, ctx: &mut ProcessorContext<'_>);
}
