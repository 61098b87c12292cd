use embassy_time::Instant;

use crate::{
    config::ProcessorInstanceConfig,
    input::{InputEvent, PassThrough},
    sink::EventSink,
    telemetry::{ProcessorTelemetry, TelemetryEvent},
    timer::{TimerFacility, TimerKey},
};

use super::{InputProcessor, ProcessorContext, ProcessorError, ProcessorOutcome, TouchpadProcessor};

/// Result of running one event through the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcome: ProcessorOutcome,
    /// First stage error seen; later stages still ran.
    pub error: Option<ProcessorError>,
}

/// Ordered processor stages. A stage's position is its instance id, which
/// is what its timer keys carry.
pub struct ProcessorChain<S, const N: usize> {
    stages: heapless::Vec<S, N>,
}

impl<S, const N: usize> Default for ProcessorChain<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ProcessorChain<TouchpadProcessor, N> {
    /// Builds one touchpad stage per entry; entries beyond capacity are
    /// skipped with a warning.
    pub fn from_configs(configs: &[ProcessorInstanceConfig], now: Instant) -> Self {
        let mut chain = Self::new();
        for config in configs {
            if chain.push(TouchpadProcessor::new(config, now)).is_err() {
                log::warn!(
                    "input: chain full ({N} stages); dropping processor {}",
                    config.label
                );
            }
        }
        chain
    }
}

impl<S, const N: usize> ProcessorChain<S, N> {
    pub const fn new() -> Self {
        Self {
            stages: heapless::Vec::new(),
        }
    }

    /// Appends a stage. Instance ids are `u8`, so at most 256 stages fit.
    pub fn push(&mut self, stage: S) -> Result<(), S> {
        if self.stages.len() > usize::from(u8::MAX) {
            return Err(stage);
        }
        self.stages.push(stage)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[S] {
        &self.stages
    }
}

impl<S: InputProcessor, const N: usize> ProcessorChain<S, N> {
    pub fn handle_event(
        &mut self,
        event: &mut InputEvent,
        params: PassThrough,
        now: Instant,
        timers: &mut dyn TimerFacility,
        sink: &mut dyn EventSink,
        telemetry: &dyn ProcessorTelemetry,
    ) -> DispatchReport {
        let mut report = DispatchReport {
            outcome: ProcessorOutcome::Continue,
            error: None,
        };
        for (idx, stage) in self.stages.iter_mut().enumerate() {
            let mut ctx = ProcessorContext {
                now,
                instance: idx as u8,
                timers: &mut *timers,
                sink: &mut *sink,
                telemetry,
            };
            match stage.handle_event(event, params, &mut ctx) {
                Ok(ProcessorOutcome::Continue) => {}
                Ok(ProcessorOutcome::Stop) => {
                    report.outcome = ProcessorOutcome::Stop;
                    break;
                }
                Err(error) => {
                    report.error.get_or_insert(error);
                }
            }
        }
        report
    }

    /// Delivers an expired timer to the stage that armed it.
    pub fn on_timer(
        &mut self,
        key: TimerKey,
        now: Instant,
        timers: &mut dyn TimerFacility,
        sink: &mut dyn EventSink,
        telemetry: &dyn ProcessorTelemetry,
    ) -> Result<(), ProcessorError> {
        let Some(stage) = self.stages.get_mut(usize::from(key.instance)) else {
            telemetry.record(key.instance, TelemetryEvent::StaleTimer { slot: key.slot });
            return Ok(());
        };
        let mut ctx = ProcessorContext {
            now,
            instance: key.instance,
            timers,
            sink,
            telemetry,
        };
        stage.on_timer(key.slot, &mut ctx)
    }

    pub fn reset(
        &mut self,
        now: Instant,
        timers: &mut dyn TimerFacility,
        sink: &mut dyn EventSink,
        telemetry: &dyn ProcessorTelemetry,
    ) {
        for (idx, stage) in self.stages.iter_mut().enumerate() {
            let mut ctx = ProcessorContext {
                now,
                instance: idx as u8,
                timers: &mut *timers,
                sink: &mut *sink,
                telemetry,
            };
            stage.reset(&mut ctx);
        }
    }
}
