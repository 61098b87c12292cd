// @generated by processor_config_compiler. Do not edit.

pub const CONFIGURED_PROCESSORS: &[ProcessorInstanceConfig] = &[
    ProcessorInstanceConfig {
        label: "trackpad",
        touch: TouchConfig {
            report_window_ms: 30,
            restart: RestartPolicy::Immediate,
            end_detection: EndDetection::Silence,
        },
        kind: ProcessorKind::Touchpad(TapConfig {
            timeout_ms: 50,
            release_delay_ms: 200,
            button_code: 256,
            policy: TapPolicy::RequireTouchEnd,
        }),
    },
];
