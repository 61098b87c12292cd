//! Touch detection and the stages that subscribe to it.
//!
//! The sensor never reports lift-off, so a touch is framed purely by timing:
//! the first sample after a quiet period starts it and a full reporting
//! window without samples ends it. [`TouchTracker`] owns that framing and
//! notifies a [`TouchObserver`] on both edges; [`CoordinateTranslator`] and
//! [`TapRecognizer`] are the two observers this crate ships.

mod tap;
mod tracker;
mod translator;

pub use tap::TapRecognizer;
pub use tracker::{TouchTracker, TouchTransition};
pub use translator::CoordinateTranslator;

use crate::processor::{ProcessorContext, ProcessorError};

/// Touch edge hooks.
pub trait TouchObserver {
    fn on_touch_start(&mut self, ctx: &mut ProcessorContext<'_>) -> Result<(), ProcessorError>;

    fn on_touch_end(&mut self, ctx: &mut ProcessorContext<'_>);
}
