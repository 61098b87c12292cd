use embassy_time::Duration;

use crate::input::codes::INPUT_BTN_0;

pub const DEFAULT_REPORT_WINDOW_MS: u8 = 30;
pub const DEFAULT_TAP_TIMEOUT_MS: u8 = 50;
pub const DEFAULT_RELEASE_DELAY_MS: u16 = 200;
pub const DEFAULT_TAP_BUTTON: u16 = INPUT_BTN_0;
/// Upper bound on processor instances in one chain.
pub const MAX_PROCESSORS: usize = 8;

/// What a sample arriving while not touching is allowed to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Every non-touching state may start a new touch.
    #[default]
    Immediate,
    /// A sample within the reporting window of the previous one resumes the
    /// touch instead of starting a new one.
    Debounced,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndDetection {
    /// Touch ends only after a full reporting window without samples.
    #[default]
    Silence,
    /// A `BTN_TOUCH` release also ends the touch immediately.
    SilenceOrLiftOff,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TapPolicy {
    /// Click only when the touch already ended at the decision deadline.
    #[default]
    RequireTouchEnd,
    /// Click at every decision deadline.
    Unconditional,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchConfig {
    /// `time-between-normal-reports`: silence that ends a touch.
    pub report_window_ms: u8,
    pub restart: RestartPolicy,
    pub end_detection: EndDetection,
}

impl TouchConfig {
    pub const DEFAULT: Self = Self {
        report_window_ms: DEFAULT_REPORT_WINDOW_MS,
        restart: RestartPolicy::Immediate,
        end_detection: EndDetection::Silence,
    };

    pub fn report_window(&self) -> Duration {
        Duration::from_millis(u64::from(self.report_window_ms))
    }
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TapConfig {
    /// Tap decision window measured from touch-start.
    pub timeout_ms: u8,
    /// How long the synthesized click stays pressed.
    pub release_delay_ms: u16,
    pub button_code: u16,
    pub policy: TapPolicy,
}

impl TapConfig {
    pub const DEFAULT: Self = Self {
        timeout_ms: DEFAULT_TAP_TIMEOUT_MS,
        release_delay_ms: DEFAULT_RELEASE_DELAY_MS,
        button_code: DEFAULT_TAP_BUTTON,
        policy: TapPolicy::RequireTouchEnd,
    };

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.release_delay_ms))
    }
}

impl Default for TapConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorKind {
    AbsoluteToRelative,
    Tap(TapConfig),
    /// Translation and tap recognition sharing one touch tracker.
    Touchpad(TapConfig),
}

impl ProcessorKind {
    pub fn translates(&self) -> bool {
        matches!(self, Self::AbsoluteToRelative | Self::Touchpad(_))
    }

    pub fn tap(&self) -> Option<TapConfig> {
        match self {
            Self::AbsoluteToRelative => None,
            Self::Tap(tap) | Self::Touchpad(tap) => Some(*tap),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessorInstanceConfig {
    pub label: &'static str,
    pub touch: TouchConfig,
    pub kind: ProcessorKind,
}

// Generated by build.rs from config/processors.toml.
include!(concat!(env!("OUT_DIR"), "/processor_config.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_driver_bindings() {
        let touch = TouchConfig::default();
        let tap = TapConfig::default();
        assert_eq!(touch.report_window(), Duration::from_millis(30));
        assert_eq!(tap.timeout(), Duration::from_millis(50));
        assert_eq!(tap.release_delay(), Duration::from_millis(200));
        assert_eq!(tap.button_code, 256);
        assert_eq!(tap.policy, TapPolicy::RequireTouchEnd);
    }

    #[test]
    fn compiled_table_is_usable() {
        assert!(!CONFIGURED_PROCESSORS.is_empty());
        assert!(CONFIGURED_PROCESSORS.len() <= MAX_PROCESSORS);
        for instance in CONFIGURED_PROCESSORS {
            assert!(instance.touch.report_window_ms > 0, "{}", instance.label);
            if let Some(tap) = instance.kind.tap() {
                if tap.policy == TapPolicy::RequireTouchEnd {
                    assert!(tap.timeout_ms > instance.touch.report_window_ms);
                }
            }
        }
    }

    #[test]
    fn kind_reports_enabled_stages() {
        assert!(ProcessorKind::AbsoluteToRelative.translates());
        assert!(ProcessorKind::AbsoluteToRelative.tap().is_none());
        assert!(!ProcessorKind::Tap(TapConfig::DEFAULT).translates());
        assert!(ProcessorKind::Touchpad(TapConfig::DEFAULT).translates());
        assert_eq!(
            ProcessorKind::Touchpad(TapConfig::DEFAULT).tap(),
            Some(TapConfig::DEFAULT)
        );
    }
}
