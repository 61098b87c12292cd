use core::sync::atomic::{AtomicU32, Ordering};

use super::{ProcessorTelemetry, TelemetryEvent};

#[derive(Default)]
pub struct TelemetryCounters {
    touch_starts: AtomicU32,
    touch_resumes: AtomicU32,
    touch_ends: AtomicU32,
    lift_offs: AtomicU32,
    taps_armed: AtomicU32,
    taps_superseded: AtomicU32,
    taps_clicked: AtomicU32,
    taps_rejected: AtomicU32,
    taps_released: AtomicU32,
    timer_failures: AtomicU32,
    malformed_events: AtomicU32,
    missing_observer: AtomicU32,
    stale_timers: AtomicU32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub touch_starts: u32,
    pub touch_resumes: u32,
    pub touch_ends: u32,
    pub lift_offs: u32,
    pub taps_armed: u32,
    pub taps_superseded: u32,
    pub taps_clicked: u32,
    pub taps_rejected: u32,
    pub taps_released: u32,
    pub timer_failures: u32,
    pub malformed_events: u32,
    pub missing_observer: u32,
    pub stale_timers: u32,
}

impl TelemetryCounters {
    pub const fn new() -> Self {
        Self {
            touch_starts: AtomicU32::new(0),
            touch_resumes: AtomicU32::new(0),
            touch_ends: AtomicU32::new(0),
            lift_offs: AtomicU32::new(0),
            taps_armed: AtomicU32::new(0),
            taps_superseded: AtomicU32::new(0),
            taps_clicked: AtomicU32::new(0),
            taps_rejected: AtomicU32::new(0),
            taps_released: AtomicU32::new(0),
            timer_failures: AtomicU32::new(0),
            malformed_events: AtomicU32::new(0),
            missing_observer: AtomicU32::new(0),
            stale_timers: AtomicU32::new(0),
        }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            touch_starts: self.touch_starts.load(Ordering::Relaxed),
            touch_resumes: self.touch_resumes.load(Ordering::Relaxed),
            touch_ends: self.touch_ends.load(Ordering::Relaxed),
            lift_offs: self.lift_offs.load(Ordering::Relaxed),
            taps_armed: self.taps_armed.load(Ordering::Relaxed),
            taps_superseded: self.taps_superseded.load(Ordering::Relaxed),
            taps_clicked: self.taps_clicked.load(Ordering::Relaxed),
            taps_rejected: self.taps_rejected.load(Ordering::Relaxed),
            taps_released: self.taps_released.load(Ordering::Relaxed),
            timer_failures: self.timer_failures.load(Ordering::Relaxed),
            malformed_events: self.malformed_events.load(Ordering::Relaxed),
            missing_observer: self.missing_observer.load(Ordering::Relaxed),
            stale_timers: self.stale_timers.load(Ordering::Relaxed),
        }
    }
}

impl ProcessorTelemetry for TelemetryCounters {
    fn record(&self, _instance: u8, event: TelemetryEvent) {
        let counter = match event {
            TelemetryEvent::TouchStarted => &self.touch_starts,
            TelemetryEvent::TouchResumed => &self.touch_resumes,
            TelemetryEvent::TouchEnded { lift_off } => {
                if lift_off {
                    self.lift_offs.fetch_add(1, Ordering::Relaxed);
                }
                &self.touch_ends
            }
            TelemetryEvent::TapArmed => &self.taps_armed,
            TelemetryEvent::TapSuperseded => &self.taps_superseded,
            TelemetryEvent::TapClicked { .. } => &self.taps_clicked,
            TelemetryEvent::TapRejected => &self.taps_rejected,
            TelemetryEvent::TapReleased { .. } => &self.taps_released,
            TelemetryEvent::TimerFailed { .. } => &self.timer_failures,
            TelemetryEvent::MalformedEvent { .. } => &self.malformed_events,
            TelemetryEvent::MissingObserver => &self.missing_observer,
            TelemetryEvent::StaleTimer { .. } => &self.stale_timers,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
