use embassy_time::Instant;

use crate::{
    config::ProcessorInstanceConfig,
    input::{codes::INPUT_BTN_TOUCH, Axis, ClassifiedEvent, InputEvent, PassThrough},
    sink::OutputEvent,
    telemetry::TelemetryEvent,
    timer::TimerSlot,
    touch::{CoordinateTranslator, TapRecognizer, TouchObserver, TouchTracker},
};

use super::{InputProcessor, ProcessorContext, ProcessorError, ProcessorOutcome};

/// One configured touchpad instance: a touch tracker plus the stages
/// subscribed to its edges.
pub struct TouchpadProcessor {
    label: &'static str,
    tracker: TouchTracker,
    translator: Option<CoordinateTranslator>,
    tap: Option<TapRecognizer>,
}

impl TouchpadProcessor {
    pub fn new(config: &ProcessorInstanceConfig, now: Instant) -> Self {
        Self {
            label: config.label,
            tracker: TouchTracker::new(config.touch, now),
            translator: config.kind.translates().then(CoordinateTranslator::new),
            tap: config.kind.tap().map(TapRecognizer::new),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn tracker(&self) -> &TouchTracker {
        &self.tracker
    }

    pub fn translator(&self) -> Option<&CoordinateTranslator> {
        self.translator.as_ref()
    }

    fn on_absolute(
        &mut self,
        axis: Axis,
        value: i32,
        ctx: &mut ProcessorContext<'_>,
    ) -> Result<(), ProcessorError> {
        let mut subscribers = Subscribers {
            translator: self.translator.as_mut(),
            tap: self.tap.as_mut(),
        };
        let observer = subscribers.as_observer();
        let tracked = self.tracker.on_sample(ctx, observer);
        if let Err(
            error @ ProcessorError::Timer {
                slot: TimerSlot::TouchEnd,
                ..
            },
        ) = tracked
        {
            // The tracker dropped the sample, so the translator does too.
            return Err(error);
        }

        if let Some(translator) = self.translator.as_mut() {
            if let Some(delta) = translator.translate(axis, value) {
                ctx.emit(OutputEvent::RelativeMotion { axis, delta });
            }
        }
        tracked.map(|_| ())
    }
}

impl InputProcessor for TouchpadProcessor {
    fn handle_event(
        &mut self,
        event: &mut InputEvent,
        _params: PassThrough,
        ctx: &mut ProcessorContext<'_>,
    ) -> Result<ProcessorOutcome, ProcessorError> {
        match event.classify() {
            Some(ClassifiedEvent::Absolute { axis, value }) => {
                self.on_absolute(axis, value, ctx)?;
            }
            Some(ClassifiedEvent::Button {
                code: INPUT_BTN_TOUCH,
                pressed: false,
            }) => {
                let mut subscribers = Subscribers {
                    translator: self.translator.as_mut(),
                    tap: self.tap.as_mut(),
                };
                self.tracker.on_lift_off(ctx, subscribers.as_observer());
            }
            Some(_) => {}
            None => ctx.record(TelemetryEvent::MalformedEvent {
                event_type: event.event_type,
                code: event.code,
            }),
        }
        Ok(ProcessorOutcome::Continue)
    }

    fn on_timer(
        &mut self,
        slot: TimerSlot,
        ctx: &mut ProcessorContext<'_>,
    ) -> Result<(), ProcessorError> {
        if slot == TimerSlot::TouchEnd {
            let mut subscribers = Subscribers {
                translator: self.translator.as_mut(),
                tap: self.tap.as_mut(),
            };
            self.tracker
                .on_touch_end_timeout(ctx, subscribers.as_observer());
            return Ok(());
        }

        let Some(tap) = self.tap.as_mut() else {
            ctx.record(TelemetryEvent::StaleTimer { slot });
            return Ok(());
        };
        if slot == TimerSlot::TapDecision {
            tap.on_decision_timeout(ctx, self.tracker.is_touching())
        } else {
            tap.on_release_timeout(ctx);
            Ok(())
        }
    }

    fn reset(&mut self, ctx: &mut ProcessorContext<'_>) {
        if let Some(tap) = self.tap.as_mut() {
            tap.reset(ctx);
        }
        self.tracker.reset(ctx);
        if let Some(translator) = self.translator.as_mut() {
            translator.reset();
        }
    }
}

/// Fans touch edges out to the stages configured on this instance.
struct Subscribers<'a> {
    translator: Option<&'a mut CoordinateTranslator>,
    tap: Option<&'a mut TapRecognizer>,
}

impl Subscribers<'_> {
    fn as_observer(&mut self) -> Option<&mut dyn TouchObserver> {
        if self.translator.is_none() && self.tap.is_none() {
            return None;
        }
        Some(self)
    }
}

impl TouchObserver for Subscribers<'_> {
    fn on_touch_start(&mut self, ctx: &mut ProcessorContext<'_>) -> Result<(), ProcessorError> {
        // Every subscriber hears the edge; the first failure is reported.
        let mut result = Ok(());
        if let Some(translator) = self.translator.as_deref_mut() {
            result = translator.on_touch_start(ctx);
        }
        if let Some(tap) = self.tap.as_deref_mut() {
            let tapped = tap.on_touch_start(ctx);
            if result.is_ok() {
                result = tapped;
            }
        }
        result
    }

    fn on_touch_end(&mut self, ctx: &mut ProcessorContext<'_>) {
        if let Some(translator) = self.translator.as_deref_mut() {
            translator.on_touch_end(ctx);
        }
        if let Some(tap) = self.tap.as_deref_mut() {
            tap.on_touch_end(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ProcessorKind, TapConfig, TapPolicy, TouchConfig},
        test_support::{at, Harness},
        timer::TimerKey,
    };

    fn processor(kind: ProcessorKind) -> TouchpadProcessor {
        let config = ProcessorInstanceConfig {
            label: "trackpad",
            touch: TouchConfig::DEFAULT,
            kind,
        };
        TouchpadProcessor::new(&config, at(0))
    }

    fn feed(
        processor: &mut TouchpadProcessor,
        harness: &mut Harness,
        ms: u64,
        mut event: InputEvent,
    ) -> Result<ProcessorOutcome, ProcessorError> {
        processor.handle_event(&mut event, PassThrough::default(), &mut harness.ctx(ms))
    }

    fn motion(axis: Axis, delta: i32) -> OutputEvent {
        OutputEvent::RelativeMotion { axis, delta }
    }

    #[test]
    fn translates_consecutive_samples_per_axis() {
        let mut harness = Harness::new();
        let mut stage = processor(ProcessorKind::AbsoluteToRelative);

        for (ms, event) in [
            (0, InputEvent::abs(Axis::X, 10)),
            (2, InputEvent::abs(Axis::Y, 100)),
            (5, InputEvent::abs(Axis::X, 15)),
            (7, InputEvent::abs(Axis::Y, 90)),
        ] {
            assert_eq!(
                feed(&mut stage, &mut harness, ms, event),
                Ok(ProcessorOutcome::Continue)
            );
        }

        assert_eq!(
            harness.take_events(),
            vec![motion(Axis::X, 5), motion(Axis::Y, -10)]
        );
    }

    #[test]
    fn touch_end_timer_clears_baselines() {
        let mut harness = Harness::new();
        let mut stage = processor(ProcessorKind::AbsoluteToRelative);

        feed(&mut stage, &mut harness, 0, InputEvent::abs(Axis::X, 10)).unwrap();
        stage
            .on_timer(TimerSlot::TouchEnd, &mut harness.ctx(30))
            .unwrap();

        assert!(!stage.tracker().is_touching());
        assert_eq!(stage.translator().and_then(|t| t.baseline(Axis::X)), None);

        feed(&mut stage, &mut harness, 40, InputEvent::abs(Axis::X, 500)).unwrap();
        assert!(harness.take_events().is_empty());
    }

    #[test]
    fn malformed_and_foreign_events_continue() {
        let mut harness = Harness::new();
        let mut stage = processor(ProcessorKind::Touchpad(TapConfig::DEFAULT));
        let odd = InputEvent {
            event_type: 0x7f,
            code: 3,
            value: 1,
        };

        assert_eq!(
            feed(&mut stage, &mut harness, 0, odd),
            Ok(ProcessorOutcome::Continue)
        );
        assert_eq!(
            feed(&mut stage, &mut harness, 1, InputEvent::rel(Axis::X, 4)),
            Ok(ProcessorOutcome::Continue)
        );
        assert!(!stage.tracker().is_touching());
        assert_eq!(harness.telemetry.snapshot().malformed_events, 1);
    }

    #[test]
    fn decision_timer_sees_tracker_state() {
        let mut harness = Harness::new();
        let mut stage = processor(ProcessorKind::Tap(TapConfig::DEFAULT));

        feed(&mut stage, &mut harness, 0, InputEvent::abs(Axis::X, 10)).unwrap();
        stage
            .on_timer(TimerSlot::TouchEnd, &mut harness.ctx(30))
            .unwrap();
        stage
            .on_timer(TimerSlot::TapDecision, &mut harness.ctx(50))
            .unwrap();

        assert_eq!(
            harness.take_events(),
            vec![OutputEvent::Button {
                code: 256,
                pressed: true
            }]
        );
        assert_eq!(
            harness.deadline(TimerKey::new(0, TimerSlot::TapRelease)),
            Some(at(250))
        );
    }

    #[test]
    fn timer_failure_is_reported_but_chain_continues() {
        let mut harness = Harness::new();
        let mut stage = processor(ProcessorKind::AbsoluteToRelative);
        harness.timers.failing = true;

        let result = feed(&mut stage, &mut harness, 0, InputEvent::abs(Axis::X, 10));

        assert!(matches!(
            result,
            Err(ProcessorError::Timer {
                slot: TimerSlot::TouchEnd,
                ..
            })
        ));
        assert!(!stage.tracker().is_touching());
    }

    #[test]
    fn failed_tap_timer_does_not_cost_motion() {
        let mut harness = Harness::new();
        harness.timers.failing_slot = Some(TimerSlot::TapDecision);
        let mut stage = processor(ProcessorKind::Touchpad(TapConfig::DEFAULT));

        let first = feed(&mut stage, &mut harness, 0, InputEvent::abs(Axis::X, 10));
        assert!(matches!(
            first,
            Err(ProcessorError::Timer {
                slot: TimerSlot::TapDecision,
                ..
            })
        ));
        assert!(stage.tracker().is_touching());
        assert_eq!(stage.translator().and_then(|t| t.baseline(Axis::X)), Some(10));

        for (ms, x) in [(5, 15), (10, 22)] {
            assert_eq!(
                feed(&mut stage, &mut harness, ms, InputEvent::abs(Axis::X, x)),
                Ok(ProcessorOutcome::Continue)
            );
        }

        assert_eq!(
            harness.take_events(),
            vec![motion(Axis::X, 5), motion(Axis::X, 7)]
        );
        assert_eq!(harness.deadline(TimerKey::new(0, TimerSlot::TapDecision)), None);
        assert_eq!(harness.telemetry.snapshot().taps_armed, 0);
    }

    #[test]
    fn reset_releases_click_and_clears_touch() {
        let mut harness = Harness::new();
        let mut stage = processor(ProcessorKind::Touchpad(TapConfig {
            policy: TapPolicy::Unconditional,
            ..TapConfig::DEFAULT
        }));

        for ms in [0, 20, 40] {
            feed(&mut stage, &mut harness, ms, InputEvent::abs(Axis::X, 10)).unwrap();
        }
        stage
            .on_timer(TimerSlot::TapDecision, &mut harness.ctx(50))
            .unwrap();
        assert!(stage.tracker().is_touching());

        stage.reset(&mut harness.ctx(55));

        assert!(!stage.tracker().is_touching());
        assert_eq!(
            harness.take_events(),
            vec![
                motion(Axis::X, 0),
                motion(Axis::X, 0),
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
        for slot in [TimerSlot::TouchEnd, TimerSlot::TapRelease] {
            assert_eq!(harness.deadline(TimerKey::new(0, slot)), None);
        }
    }
}
