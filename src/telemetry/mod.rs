//! Structured observability for processor stages.
//!
//! Stages never log directly; they hand a [`TelemetryEvent`] to the
//! [`ProcessorTelemetry`] injected through the processor context. The sink
//! decides whether that becomes a log line, a counter bump, or nothing.

mod counters;

pub use counters::{TelemetryCounters, TelemetrySnapshot};

use crate::{processor::ProcessorError, timer::TimerSlot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelemetryEvent {
    TouchStarted,
    TouchResumed,
    TouchEnded { lift_off: bool },
    TapArmed,
    TapSuperseded,
    TapClicked { code: u16 },
    TapRejected,
    TapReleased { code: u16 },
    TimerFailed { error: ProcessorError },
    MalformedEvent { event_type: u8, code: u16 },
    /// A tracker saw a touch transition with nobody subscribed to it.
    MissingObserver,
    StaleTimer { slot: TimerSlot },
}

pub trait ProcessorTelemetry {
    fn record(&self, instance: u8, event: TelemetryEvent);
}

/// Drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTelemetry;

impl ProcessorTelemetry for NoTelemetry {
    fn record(&self, _instance: u8, _event: TelemetryEvent) {}
}

/// Forwards events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTelemetry;

impl ProcessorTelemetry for LogTelemetry {
    fn record(&self, instance: u8, event: TelemetryEvent) {
        match event {
            TelemetryEvent::TouchStarted => log::debug!("input[{instance}]: touch started"),
            TelemetryEvent::TouchResumed => {
                log::debug!("input[{instance}]: touch resumed inside report window")
            }
            TelemetryEvent::TouchEnded { lift_off } => {
                log::debug!("input[{instance}]: touch ended lift_off={lift_off}")
            }
            TelemetryEvent::TapArmed => log::trace!("input[{instance}]: tap candidate armed"),
            TelemetryEvent::TapSuperseded => {
                log::trace!("input[{instance}]: tap candidate superseded")
            }
            TelemetryEvent::TapClicked { code } => {
                log::info!("input[{instance}]: tap click code={code}")
            }
            TelemetryEvent::TapRejected => {
                log::debug!("input[{instance}]: tap timeout while touching; not a tap")
            }
            TelemetryEvent::TapReleased { code } => {
                log::debug!("input[{instance}]: tap release code={code}")
            }
            TelemetryEvent::TimerFailed { error } => {
                log::warn!("input[{instance}]: {error}")
            }
            TelemetryEvent::MalformedEvent { event_type, code } => {
                log::trace!("input[{instance}]: ignored event type={event_type:#04x} code={code:#06x}")
            }
            TelemetryEvent::MissingObserver => {
                log::warn!("input[{instance}]: no touch observer configured; touch transitions are not delivered")
            }
            TelemetryEvent::StaleTimer { slot } => {
                log::trace!("input[{instance}]: stale {slot:?} timer ignored")
            }
        }
    }
}

impl<T: ProcessorTelemetry + ?Sized> ProcessorTelemetry for &T {
    fn record(&self, instance: u8, event: TelemetryEvent) {
        (**self).record(instance, event);
    }
}

impl<A: ProcessorTelemetry, B: ProcessorTelemetry> ProcessorTelemetry for (A, B) {
    fn record(&self, instance: u8, event: TelemetryEvent) {
        self.0.record(instance, event);
        self.1.record(instance, event);
    }
}
