use embassy_time::{Duration, Instant};

use crate::{
    config::{EndDetection, RestartPolicy, TouchConfig},
    processor::{ProcessorContext, ProcessorError},
    telemetry::TelemetryEvent,
    timer::TimerSlot,
};

use super::TouchObserver;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchTransition {
    /// First sample after a quiet period.
    Started,
    /// Debounced restart: touching again without a new touch-start.
    Resumed,
    Continuing,
    Ended,
}

/// Frames touches out of a stream of samples.
///
/// Every sample pushes the single touch-end deadline one reporting window
/// into the future. Only that deadline expiring (or a lift-off event when
/// enabled) ends the touch.
pub struct TouchTracker {
    config: TouchConfig,
    touching: bool,
    last_sample: Instant,
    missing_observer_reported: bool,
}

impl TouchTracker {
    pub fn new(config: TouchConfig, now: Instant) -> Self {
        Self {
            config,
            touching: false,
            last_sample: now,
            missing_observer_reported: false,
        }
    }

    pub fn config(&self) -> &TouchConfig {
        &self.config
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    pub fn last_sample(&self) -> Instant {
        self.last_sample
    }

    /// Handles one qualifying sample.
    ///
    /// If the touch-end deadline cannot be rearmed the tracker keeps its
    /// previous state and the error is returned. An observer failure is
    /// returned after the transition took effect.
    pub fn on_sample(
        &mut self,
        ctx: &mut ProcessorContext<'_>,
        observer: Option<&mut dyn TouchObserver>,
    ) -> Result<TouchTransition, ProcessorError> {
        let window = self.config.report_window();
        ctx.schedule(TimerSlot::TouchEnd, window)?;

        let previous = core::mem::replace(&mut self.last_sample, ctx.now);
        if self.touching {
            return Ok(TouchTransition::Continuing);
        }

        self.touching = true;
        if self.config.restart == RestartPolicy::Debounced
            && is_shortly_after(previous, ctx.now, window)
        {
            ctx.record(TelemetryEvent::TouchResumed);
            return Ok(TouchTransition::Resumed);
        }

        ctx.record(TelemetryEvent::TouchStarted);
        match observer {
            Some(observer) => observer.on_touch_start(ctx)?,
            None => self.report_missing_observer(ctx),
        }
        Ok(TouchTransition::Started)
    }

    /// Touch-end deadline expired. Returns `None` when no touch was active.
    pub fn on_touch_end_timeout(
        &mut self,
        ctx: &mut ProcessorContext<'_>,
        observer: Option<&mut dyn TouchObserver>,
    ) -> Option<TouchTransition> {
        if !self.touching {
            ctx.record(TelemetryEvent::StaleTimer {
                slot: TimerSlot::TouchEnd,
            });
            return None;
        }
        self.end_touch(ctx, observer, false);
        Some(TouchTransition::Ended)
    }

    /// Explicit contact release from the sensor. Ignored unless lift-off
    /// detection is enabled.
    pub fn on_lift_off(
        &mut self,
        ctx: &mut ProcessorContext<'_>,
        observer: Option<&mut dyn TouchObserver>,
    ) -> Option<TouchTransition> {
        if self.config.end_detection != EndDetection::SilenceOrLiftOff || !self.touching {
            return None;
        }
        ctx.cancel(TimerSlot::TouchEnd);
        self.end_touch(ctx, observer, true);
        Some(TouchTransition::Ended)
    }

    pub fn reset(&mut self, ctx: &mut ProcessorContext<'_>) {
        ctx.cancel(TimerSlot::TouchEnd);
        self.touching = false;
        self.last_sample = ctx.now;
    }

    fn end_touch(
        &mut self,
        ctx: &mut ProcessorContext<'_>,
        observer: Option<&mut dyn TouchObserver>,
        lift_off: bool,
    ) {
        self.touching = false;
        ctx.record(TelemetryEvent::TouchEnded { lift_off });
        match observer {
            Some(observer) => observer.on_touch_end(ctx),
            None => self.report_missing_observer(ctx),
        }
    }

    fn report_missing_observer(&mut self, ctx: &ProcessorContext<'_>) {
        if !self.missing_observer_reported {
            self.missing_observer_reported = true;
            ctx.record(TelemetryEvent::MissingObserver);
        }
    }
}

fn is_shortly_after(previous: Instant, now: Instant, window: Duration) -> bool {
    previous + window > now
}
