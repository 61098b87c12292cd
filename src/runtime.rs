//! Embassy task body: feeds channel inputs and expired deadlines into a
//! [`Pipeline`] on one executor.

use embassy_futures::select::{select, Either};
use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    channel::{Receiver, Sender},
};
use embassy_time::{Instant, Timer};

use crate::{
    input::{InputEvent, PassThrough},
    pipeline::Pipeline,
    processor::InputProcessor,
    sink::{EventSink, OutputEvent},
    telemetry::ProcessorTelemetry,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineInput {
    Event {
        event: InputEvent,
        params: PassThrough,
    },
    Reset,
}

/// Publishes without waiting; a full channel drops the event.
pub struct ChannelSink<'a, M: RawMutex, const N: usize> {
    sender: Sender<'a, M, OutputEvent, N>,
    dropped: u32,
}

impl<'a, M: RawMutex, const N: usize> ChannelSink<'a, M, N> {
    pub fn new(sender: Sender<'a, M, OutputEvent, N>) -> Self {
        Self { sender, dropped: 0 }
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<M: RawMutex, const N: usize> EventSink for ChannelSink<'_, M, N> {
    fn emit(&mut self, event: OutputEvent) {
        if self.sender.try_send(event).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            log::warn!(
                "input: output channel full; dropped={} event={:?}",
                self.dropped,
                event
            );
        }
    }
}

/// Runs the pipeline forever. Inputs are handled in arrival order; while
/// waiting, the earliest pending deadline wakes the loop.
pub async fn run_pipeline<M, S, const P: usize, const T: usize, const IN: usize, const OUT: usize>(
    pipeline: &mut Pipeline<S, P, T>,
    inputs: Receiver<'_, M, PipelineInput, IN>,
    outputs: Sender<'_, M, OutputEvent, OUT>,
    telemetry: &dyn ProcessorTelemetry,
) where
    M: RawMutex,
    S: InputProcessor,
{
    let mut sink = ChannelSink::new(outputs);
    loop {
        let input = match pipeline.next_deadline() {
            Some(deadline) => match select(inputs.receive(), Timer::at(deadline)).await {
                Either::First(input) => Some(input),
                Either::Second(()) => None,
            },
            None => Some(inputs.receive().await),
        };

        let now = Instant::now();
        match input {
            None => {
                if let Err(error) = pipeline.advance_to(now, &mut sink, telemetry) {
                    log::warn!("input: timer expiry failed: {error}");
                }
            }
            Some(PipelineInput::Event { mut event, params }) => {
                let report = pipeline.dispatch(now, &mut event, params, &mut sink, telemetry);
                if let Some(error) = report.error {
                    log::warn!("input: dispatch failed: {error}");
                }
            }
            Some(PipelineInput::Reset) => {
                log::info!("input: pipeline reset");
                pipeline.reset(now, &mut sink, telemetry);
            }
        }
    }
}
