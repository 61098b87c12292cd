//! Touchpad input processors.
//!
//! Raw absolute samples from a touch sensor enter a chain of processors. Each
//! processor instance owns a touch tracker that infers touch-start from the
//! first sample after inactivity and touch-end from silence, and optionally:
//!
//! - a coordinate translator turning absolute X/Y samples into relative motion,
//! - a tap recognizer that clicks a button for short touch-and-release gestures.
//!
//! Everything runs on one execution context. Event handling and timer expiry
//! are both explicit entry points, so the same code runs under the embassy
//! [`runtime`], the deterministic [`pipeline::Pipeline`] used by tests and
//! the replay tool, or any other scheduler implementing [`timer::TimerFacility`].

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod input;
pub mod pipeline;
pub mod processor;
#[cfg(feature = "embassy-runtime")]
pub mod runtime;
pub mod sink;
pub mod telemetry;
#[cfg(test)]
mod test_support;
pub mod timer;
pub mod touch;

pub use config::{ProcessorInstanceConfig, ProcessorKind, TapConfig, TouchConfig};
pub use input::{Axis, ClassifiedEvent, InputEvent, PassThrough};
pub use pipeline::{Pipeline, TouchpadPipeline};
pub use processor::{
    InputProcessor, ProcessorChain, ProcessorError, ProcessorOutcome, TouchpadProcessor,
};
pub use sink::{EventSink, OutputEvent};
pub use timer::{DeadlineQueue, TimerFacility, TimerKey, TimerSlot};
pub use touch::TouchObserver;
