pub mod codes;
mod event;

pub use event::{Axis, ClassifiedEvent, InputEvent, PassThrough};
