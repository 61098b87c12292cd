use embassy_time::Duration;
use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::{
    config::{TapConfig, TapPolicy},
    processor::{ProcessorContext, ProcessorError},
    sink::OutputEvent,
    telemetry::TelemetryEvent,
    timer::TimerSlot,
};

use super::TouchObserver;

/// Synthesizes a click for short touches.
///
/// Every touch-start arms a decision deadline `timeout_ms` ahead. When it
/// expires the recognizer asks whether the touch is still active: if it
/// already ended the touch was a tap, so a button press is emitted and its
/// release follows `release_delay_ms` later. Touch-end alone never decides.
pub struct TapRecognizer {
    config: TapConfig,
    machine: statig::blocking::StateMachine<TapHsm>,
}

impl TapRecognizer {
    pub fn new(config: TapConfig) -> Self {
        Self {
            config,
            machine: TapHsm::new(config).state_machine(),
        }
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    pub fn on_decision_timeout(
        &mut self,
        ctx: &mut ProcessorContext<'_>,
        touching: bool,
    ) -> Result<(), ProcessorError> {
        self.dispatch(ctx, TapHsmEvent::DecisionDue { touching })
    }

    pub fn on_release_timeout(&mut self, ctx: &mut ProcessorContext<'_>) {
        // Release never schedules, so there is no error to surface.
        let _ = self.dispatch(ctx, TapHsmEvent::ReleaseDue);
    }

    pub fn reset(&mut self, ctx: &mut ProcessorContext<'_>) {
        let _ = self.dispatch(ctx, TapHsmEvent::Reset);
    }

    fn dispatch(
        &mut self,
        ctx: &mut ProcessorContext<'_>,
        event: TapHsmEvent,
    ) -> Result<(), ProcessorError> {
        let mut dispatch = TapDispatch::default();
        self.machine.handle_with_context(&event, &mut dispatch);

        let mut result = Ok(());
        let mut release_now = false;
        let mut disarm = false;
        for action in dispatch.actions {
            match action {
                TapAction::Schedule(slot, delay) => match ctx.schedule(slot, delay) {
                    Ok(()) if slot == TimerSlot::TapDecision => {
                        ctx.record(TelemetryEvent::TapArmed);
                    }
                    Ok(()) => {}
                    Err(error) => {
                        // A click whose release cannot be timed is released
                        // right away instead of staying stuck.
                        release_now |= slot == TimerSlot::TapRelease;
                        disarm |= slot == TimerSlot::TapDecision;
                        if result.is_ok() {
                            result = Err(error);
                        }
                    }
                },
                TapAction::Cancel(slot) => ctx.cancel(slot),
                TapAction::Emit(event) => ctx.emit(event),
                TapAction::Record(event) => ctx.record(event),
            }
        }

        if release_now {
            self.dispatch(ctx, TapHsmEvent::ReleaseDue)?;
        }
        if disarm {
            // No decision will ever fire for this candidate.
            self.dispatch(ctx, TapHsmEvent::Reset)?;
        }
        result
    }
}

impl TouchObserver for TapRecognizer {
    fn on_touch_start(&mut self, ctx: &mut ProcessorContext<'_>) -> Result<(), ProcessorError> {
        self.dispatch(ctx, TapHsmEvent::TouchStarted)
    }

    fn on_touch_end(&mut self, _ctx: &mut ProcessorContext<'_>) {}
}

#[derive(Clone, Copy, Debug)]
enum TapHsmEvent {
    TouchStarted,
    DecisionDue { touching: bool },
    ReleaseDue,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TapAction {
    Schedule(TimerSlot, Duration),
    Cancel(TimerSlot),
    Emit(OutputEvent),
    Record(TelemetryEvent),
}

/// Side effects requested by one dispatch, applied by the recognizer after
/// the machine settled.
#[derive(Debug, Default)]
struct TapDispatch {
    actions: heapless::Vec<TapAction, 6>,
}

impl TapDispatch {
    fn push(&mut self, action: TapAction) {
        // Longest path (re-arm while clicking) queues four actions.
        let _ = self.actions.push(action);
    }
}

struct TapHsm {
    config: TapConfig,
}

impl TapHsm {
    fn new(config: TapConfig) -> Self {
        Self { config }
    }

    fn arm(&self, context: &mut TapDispatch) {
        context.push(TapAction::Schedule(
            TimerSlot::TapDecision,
            self.config.timeout(),
        ));
    }

    fn press(&self, context: &mut TapDispatch) {
        let code = self.config.button_code;
        context.push(TapAction::Emit(OutputEvent::Button {
            code,
            pressed: true,
        }));
        context.push(TapAction::Record(TelemetryEvent::TapClicked { code }));
        context.push(TapAction::Schedule(
            TimerSlot::TapRelease,
            self.config.release_delay(),
        ));
    }

    fn release(&self, context: &mut TapDispatch) {
        let code = self.config.button_code;
        context.push(TapAction::Emit(OutputEvent::Button {
            code,
            pressed: false,
        }));
        context.push(TapAction::Record(TelemetryEvent::TapReleased { code }));
    }

    fn stale(context: &mut TapDispatch, slot: TimerSlot) {
        context.push(TapAction::Record(TelemetryEvent::StaleTimer { slot }));
    }
}

#[state_machine(initial = "State::idle()")]
impl TapHsm {
    #[state]
    fn idle(&mut self, context: &mut TapDispatch, event: &TapHsmEvent) -> Outcome<State> {
        match event {
            TapHsmEvent::TouchStarted => {
                self.arm(context);
                Transition(State::armed())
            }
            TapHsmEvent::DecisionDue { .. } => {
                Self::stale(context, TimerSlot::TapDecision);
                Handled
            }
            TapHsmEvent::ReleaseDue => {
                Self::stale(context, TimerSlot::TapRelease);
                Handled
            }
            TapHsmEvent::Reset => Handled,
        }
    }

    #[state]
    fn armed(&mut self, context: &mut TapDispatch, event: &TapHsmEvent) -> Outcome<State> {
        match event {
            TapHsmEvent::TouchStarted => {
                // A new touch supersedes the pending candidate.
                context.push(TapAction::Record(TelemetryEvent::TapSuperseded));
                self.arm(context);
                Handled
            }
            TapHsmEvent::DecisionDue { touching } => {
                if *touching && self.config.policy == TapPolicy::RequireTouchEnd {
                    context.push(TapAction::Record(TelemetryEvent::TapRejected));
                    return Transition(State::idle());
                }
                self.press(context);
                Transition(State::clicking())
            }
            TapHsmEvent::ReleaseDue => {
                Self::stale(context, TimerSlot::TapRelease);
                Handled
            }
            TapHsmEvent::Reset => {
                context.push(TapAction::Cancel(TimerSlot::TapDecision));
                Transition(State::idle())
            }
        }
    }

    #[state]
    fn clicking(&mut self, context: &mut TapDispatch, event: &TapHsmEvent) -> Outcome<State> {
        match event {
            TapHsmEvent::TouchStarted => {
                // Finish the held click before the next candidate.
                context.push(TapAction::Cancel(TimerSlot::TapRelease));
                self.release(context);
                self.arm(context);
                Transition(State::armed())
            }
            TapHsmEvent::DecisionDue { .. } => {
                Self::stale(context, TimerSlot::TapDecision);
                Handled
            }
            TapHsmEvent::ReleaseDue => {
                self.release(context);
                Transition(State::idle())
            }
            TapHsmEvent::Reset => {
                context.push(TapAction::Cancel(TimerSlot::TapRelease));
                self.release(context);
                Transition(State::idle())
            }
        }
    }
}
