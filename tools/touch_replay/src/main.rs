use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use embassy_time::Instant;
use touchflow::{
    config::CONFIGURED_PROCESSORS,
    input::codes::{
        INPUT_ABS_X, INPUT_ABS_Y, INPUT_BTN_TOUCH, INPUT_EV_ABS, INPUT_EV_KEY, INPUT_EV_REL,
    },
    pipeline::TouchpadPipeline,
    telemetry::{LogTelemetry, TelemetryCounters},
    EventSink, InputEvent, OutputEvent, PassThrough,
};

/// Time past the last sample during which pending timers still fire, enough
/// for a tap decision plus its release.
const FLUSH_TAIL_MS: u64 = 500;

#[derive(Debug, Parser)]
#[command(name = "touch_replay")]
#[command(about = "Replay an input trace through the configured touchpad processors")]
struct Cli {
    /// CSV trace, one `t_ms,abs|rel|key,code,value` event per line.
    trace: PathBuf,
    /// Expected output lines; the replay fails when the outputs differ.
    #[arg(long)]
    expect: Option<PathBuf>,
}

#[derive(Clone, Copy)]
struct TraceEvent {
    ms: u64,
    event: InputEvent,
}

/// Collects output events stamped with the pipeline time they were emitted at.
#[derive(Default)]
struct StampedSink {
    now_ms: u64,
    lines: Vec<String>,
}

impl EventSink for StampedSink {
    fn emit(&mut self, event: OutputEvent) {
        let line = match event {
            OutputEvent::RelativeMotion { axis, delta } => {
                format!("{},rel,{},{}", self.now_ms, axis.label(), delta)
            }
            OutputEvent::Button { code, pressed } => {
                format!("{},btn,{},{}", self.now_ms, code, u8::from(pressed))
            }
        };
        self.lines.push(line);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let trace = load_trace(&cli.trace)?;
    log::info!(
        "replay: {} events through {} processor(s)",
        trace.len(),
        CONFIGURED_PROCESSORS.len()
    );

    let lines = replay(&trace);
    for line in &lines {
        println!("{line}");
    }

    if let Some(expect) = cli.expect {
        let expected = load_expected(&expect)?;
        if lines != expected {
            eprintln!("expected: {}", expected.join(" "));
            eprintln!("actual:   {}", lines.join(" "));
            bail!("output differs from {}", expect.display());
        }
    }
    Ok(())
}

fn replay(trace: &[TraceEvent]) -> Vec<String> {
    let counters = TelemetryCounters::new();
    let telemetry = (LogTelemetry, &counters);
    let mut pipeline =
        TouchpadPipeline::from_configs(CONFIGURED_PROCESSORS, Instant::from_millis(0));
    let mut sink = StampedSink::default();

    for entry in trace {
        fire_timers_until(&mut pipeline, &mut sink, &telemetry, entry.ms);
        sink.now_ms = entry.ms;
        let mut event = entry.event;
        let report = pipeline.dispatch(
            Instant::from_millis(entry.ms),
            &mut event,
            PassThrough::default(),
            &mut sink,
            &telemetry,
        );
        if let Some(err) = report.error {
            log::warn!("replay: t={} {err}", entry.ms);
        }
    }

    if let Some(last) = trace.last() {
        let until = last.ms.saturating_add(FLUSH_TAIL_MS);
        fire_timers_until(&mut pipeline, &mut sink, &telemetry, until);
    }
    log::info!("replay: telemetry {:?}", counters.snapshot());
    sink.lines
}

/// Fires due deadlines one by one so each output is stamped with its own
/// deadline rather than the time of the next sample.
fn fire_timers_until(
    pipeline: &mut TouchpadPipeline,
    sink: &mut StampedSink,
    telemetry: &(LogTelemetry, &TelemetryCounters),
    until_ms: u64,
) {
    let until = Instant::from_millis(until_ms);
    while let Some(deadline) = pipeline.next_deadline().filter(|deadline| *deadline <= until) {
        sink.now_ms = deadline.as_millis();
        if let Err(err) = pipeline.advance_to(deadline, sink, telemetry) {
            log::warn!("replay: t={} {err}", sink.now_ms);
        }
    }
}

/// Non-empty lines that are not `#` comments, numbered from one.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn load_trace(path: &Path) -> Result<Vec<TraceEvent>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut trace: Vec<TraceEvent> = Vec::new();
    for (line_no, line) in content_lines(&text) {
        let entry = parse_trace_line(line)
            .with_context(|| format!("{}:{line_no}: `{line}`", path.display()))?;
        if let Some(prev) = trace.last() {
            ensure!(
                prev.ms <= entry.ms,
                "{}:{line_no}: timestamps must not go backwards",
                path.display()
            );
        }
        trace.push(entry);
    }
    Ok(trace)
}

fn parse_trace_line(line: &str) -> Result<TraceEvent> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [ms, kind, code, value] = fields[..] else {
        bail!("expected t_ms,kind,code,value");
    };

    let event_type = match kind {
        "abs" => INPUT_EV_ABS,
        "rel" => INPUT_EV_REL,
        "key" => INPUT_EV_KEY,
        other => bail!("unknown kind `{other}`, expected abs|rel|key"),
    };
    Ok(TraceEvent {
        ms: ms.parse().context("invalid t_ms")?,
        event: InputEvent {
            event_type,
            code: parse_code(code)?,
            value: value.parse().context("invalid value")?,
        },
    })
}

fn parse_code(raw: &str) -> Result<u16> {
    let code = match raw {
        "x" => INPUT_ABS_X,
        "y" => INPUT_ABS_Y,
        "touch" => INPUT_BTN_TOUCH,
        numeric => match numeric.strip_prefix("0x") {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => numeric.parse(),
        }
        .with_context(|| format!("invalid code `{numeric}`"))?,
    };
    Ok(code)
}

fn load_expected(path: &Path) -> Result<Vec<String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content_lines(&text)
        .map(|(_, line)| line.replace(' ', ""))
        .collect())
}
