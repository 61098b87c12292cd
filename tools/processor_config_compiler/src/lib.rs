//! Compiles `config/processors.toml` into the `CONFIGURED_PROCESSORS` table
//! included by `touchflow::config`.

use std::{collections::HashSet, fmt, fs, path::Path};

use serde::Deserialize;

pub const DEFAULT_REPORT_WINDOW_MS: u8 = 30;
pub const DEFAULT_TAP_TIMEOUT_MS: u8 = 50;
pub const DEFAULT_RELEASE_DELAY_MS: u16 = 200;
pub const DEFAULT_TAP_BUTTON: u16 = 0x100;
pub const MAX_PROCESSORS: usize = 8;
const INPUT_KEY_MAX: u16 = 0x2ff;

#[derive(Debug)]
pub enum ConfigCompilerError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigCompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigCompilerError {}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProcessorsFile {
    #[serde(rename = "processor")]
    pub processors: Vec<ProcessorEntry>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProcessorEntry {
    pub label: String,
    pub kind: KindSetting,
    #[serde(default = "default_report_window_ms")]
    pub time_between_normal_reports_ms: u8,
    #[serde(default)]
    pub restart: RestartSetting,
    #[serde(default)]
    pub end_detection: EndDetectionSetting,
    pub tap: Option<TapEntry>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KindSetting {
    AbsToRel,
    Tap,
    Touchpad,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RestartSetting {
    #[default]
    Immediate,
    Debounced,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndDetectionSetting {
    #[default]
    Silence,
    SilenceOrLiftOff,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TapPolicySetting {
    #[default]
    RequireTouchEnd,
    Unconditional,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TapEntry {
    #[serde(default = "default_tap_timeout_ms")]
    pub timeout_ms: u8,
    #[serde(default = "default_release_delay_ms")]
    pub release_delay_ms: u16,
    #[serde(default = "default_tap_button")]
    pub button_code: u16,
    #[serde(default)]
    pub policy: TapPolicySetting,
}

impl Default for TapEntry {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TAP_TIMEOUT_MS,
            release_delay_ms: DEFAULT_RELEASE_DELAY_MS,
            button_code: DEFAULT_TAP_BUTTON,
            policy: TapPolicySetting::RequireTouchEnd,
        }
    }
}

fn default_report_window_ms() -> u8 {
    DEFAULT_REPORT_WINDOW_MS
}

fn default_tap_timeout_ms() -> u8 {
    DEFAULT_TAP_TIMEOUT_MS
}

fn default_release_delay_ms() -> u16 {
    DEFAULT_RELEASE_DELAY_MS
}

fn default_tap_button() -> u16 {
    DEFAULT_TAP_BUTTON
}

impl ProcessorEntry {
    /// Tap settings in effect, `None` for kinds without a tap stage.
    pub fn effective_tap(&self) -> Option<TapEntry> {
        match self.kind {
            KindSetting::AbsToRel => None,
            KindSetting::Tap | KindSetting::Touchpad => Some(self.tap.unwrap_or_default()),
        }
    }
}

pub fn parse_processors_str(source: &str) -> Result<ProcessorsFile, ConfigCompilerError> {
    toml::from_str(source).map_err(|err| ConfigCompilerError::Parse(err.to_string()))
}

pub fn parse_processors_file(path: &Path) -> Result<ProcessorsFile, ConfigCompilerError> {
    let source = fs::read_to_string(path)
        .map_err(|err| ConfigCompilerError::Io(format!("{}: {err}", path.display())))?;
    parse_processors_str(&source).map_err(|err| match err {
        ConfigCompilerError::Parse(msg) => {
            ConfigCompilerError::Parse(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

pub fn validate_config(config: &ProcessorsFile) -> Result<(), ConfigCompilerError> {
    let fail = |msg: String| Err(ConfigCompilerError::Validation(msg));

    if config.processors.is_empty() {
        return fail("at least one processor must be configured".into());
    }
    if config.processors.len() > MAX_PROCESSORS {
        return fail(format!(
            "at most {MAX_PROCESSORS} processors are supported, found {}",
            config.processors.len()
        ));
    }

    let mut labels = HashSet::new();
    for entry in &config.processors {
        let label = entry.label.as_str();
        if label.is_empty()
            || !label
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        {
            return fail(format!("label `{label}` must match [a-z0-9_]+"));
        }
        if !labels.insert(label) {
            return fail(format!("duplicate processor label `{label}`"));
        }
        if entry.time_between_normal_reports_ms == 0 {
            return fail(format!(
                "processor `{label}`: time_between_normal_reports_ms must be > 0"
            ));
        }
        if entry.tap.is_some() && entry.kind == KindSetting::AbsToRel {
            return fail(format!(
                "processor `{label}`: tap settings are only valid for kind `tap` or `touchpad`"
            ));
        }

        let Some(tap) = entry.effective_tap() else {
            continue;
        };
        if tap.timeout_ms == 0 {
            return fail(format!("processor `{label}`: tap.timeout_ms must be > 0"));
        }
        // With the touch-end-gated policy a tap needs the touch to end
        // before the decision, which takes at least one reporting window.
        if tap.policy == TapPolicySetting::RequireTouchEnd
            && tap.timeout_ms <= entry.time_between_normal_reports_ms
        {
            return fail(format!(
                "processor `{label}`: tap.timeout_ms must be > time_between_normal_reports_ms"
            ));
        }
        if tap.release_delay_ms == 0 {
            return fail(format!(
                "processor `{label}`: tap.release_delay_ms must be > 0"
            ));
        }
        if tap.button_code > INPUT_KEY_MAX {
            return fail(format!(
                "processor `{label}`: tap.button_code must be <= {INPUT_KEY_MAX:#x}"
            ));
        }
    }
    Ok(())
}

pub fn render_generated_config(config: &ProcessorsFile) -> String {
    let mut out = String::new();
    out.push_str("// @generated by processor_config_compiler. Do not edit.\n\n");
    out.push_str("pub const CONFIGURED_PROCESSORS: &[ProcessorInstanceConfig] = &[\n");
    for entry in &config.processors {
        out.push_str("    ProcessorInstanceConfig {\n");
        out.push_str(&format!("        label: {:?},\n", entry.label));
        out.push_str("        touch: TouchConfig {\n");
        out.push_str(&format!(
            "            report_window_ms: {},\n",
            entry.time_between_normal_reports_ms
        ));
        out.push_str(&format!(
            "            restart: RestartPolicy::{},\n",
            restart_variant(entry.restart)
        ));
        out.push_str(&format!(
            "            end_detection: EndDetection::{},\n",
            end_detection_variant(entry.end_detection)
        ));
        out.push_str("        },\n");
        match (entry.kind, entry.effective_tap()) {
            (KindSetting::AbsToRel, _) | (_, None) => {
                out.push_str("        kind: ProcessorKind::AbsoluteToRelative,\n");
            }
            (kind, Some(tap)) => {
                let variant = if kind == KindSetting::Tap {
                    "Tap"
                } else {
                    "Touchpad"
                };
                out.push_str(&format!("        kind: ProcessorKind::{variant}(TapConfig {{\n"));
                out.push_str(&format!("            timeout_ms: {},\n", tap.timeout_ms));
                out.push_str(&format!(
                    "            release_delay_ms: {},\n",
                    tap.release_delay_ms
                ));
                out.push_str(&format!("            button_code: {},\n", tap.button_code));
                out.push_str(&format!(
                    "            policy: TapPolicy::{},\n",
                    tap_policy_variant(tap.policy)
                ));
                out.push_str("        }),\n");
            }
        }
        out.push_str("    },\n");
    }
    out.push_str("];\n");
    out
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_processors_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}

fn restart_variant(setting: RestartSetting) -> &'static str {
    match setting {
        RestartSetting::Immediate => "Immediate",
        RestartSetting::Debounced => "Debounced",
    }
}

fn end_detection_variant(setting: EndDetectionSetting) -> &'static str {
    match setting {
        EndDetectionSetting::Silence => "Silence",
        EndDetectionSetting::SilenceOrLiftOff => "SilenceOrLiftOff",
    }
}

fn tap_policy_variant(setting: TapPolicySetting) -> &'static str {
    match setting {
        TapPolicySetting::RequireTouchEnd => "RequireTouchEnd",
        TapPolicySetting::Unconditional => "Unconditional",
    }
}
