use crate::{
    input::Axis,
    processor::{ProcessorContext, ProcessorError},
};

use super::TouchObserver;

/// Converts absolute samples into per-axis relative deltas.
///
/// Each axis keeps the last absolute value seen during the current touch.
/// The first sample of an axis after a touch edge only seeds that baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoordinateTranslator {
    baseline: [Option<i32>; 2],
}

impl CoordinateTranslator {
    pub const fn new() -> Self {
        Self {
            baseline: [None, None],
        }
    }

    pub fn baseline(&self, axis: Axis) -> Option<i32> {
        self.baseline[axis.index()]
    }

    /// Returns the displacement from the previous sample of `axis`, or `None`
    /// when `raw` only seeds the baseline. A difference that does not fit an
    /// `i32` saturates at its bounds.
    pub fn translate(&mut self, axis: Axis, raw: i32) -> Option<i32> {
        self.baseline[axis.index()]
            .replace(raw)
            .map(|previous| raw.saturating_sub(previous))
    }

    pub fn reset(&mut self) {
        self.baseline = [None, None];
    }
}

impl TouchObserver for CoordinateTranslator {
    fn on_touch_start(&mut self, _ctx: &mut ProcessorContext<'_>) -> Result<(), ProcessorError> {
        self.reset();
        Ok(())
    }

    fn on_touch_end(&mut self, _ctx: &mut ProcessorContext<'_>) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_seeds_then_consecutive_differences() {
        let mut translator = CoordinateTranslator::new();
        let samples = [10, 15, 12, 12, 40];
        let deltas: std::vec::Vec<_> = samples
            .iter()
            .filter_map(|&raw| translator.translate(Axis::X, raw))
            .collect();

        assert_eq!(deltas, std::vec![5, -3, 0, 28]);
        assert_eq!(deltas.len(), samples.len() - 1);
    }

    #[test]
    fn axes_do_not_share_baselines() {
        let mut translator = CoordinateTranslator::new();
        assert_eq!(translator.translate(Axis::X, 100), None);
        assert_eq!(translator.translate(Axis::Y, 300), None);
        assert_eq!(translator.translate(Axis::X, 90), Some(-10));
        assert_eq!(translator.baseline(Axis::Y), Some(300));
        assert_eq!(translator.translate(Axis::Y, 307), Some(7));
    }

    #[test]
    fn reset_forgets_both_axes() {
        let mut translator = CoordinateTranslator::new();
        translator.translate(Axis::X, 1);
        translator.translate(Axis::Y, 2);
        translator.reset();

        assert_eq!(translator.translate(Axis::X, 50), None);
        assert_eq!(translator.translate(Axis::Y, 60), None);
    }

    #[test]
    fn extreme_values_saturate_instead_of_wrapping() {
        let mut translator = CoordinateTranslator::new();
        translator.translate(Axis::X, i32::MIN);
        assert_eq!(translator.translate(Axis::X, i32::MAX), Some(i32::MAX));
    }
}
