use crate::input::Axis;

/// Events handed to the HID transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    RelativeMotion { axis: Axis, delta: i32 },
    Button { code: u16, pressed: bool },
}

pub trait EventSink {
    fn emit(&mut self, event: OutputEvent);
}

/// Bounded sink that keeps the newest events, dropping the oldest on overflow.
pub struct EventBuffer<const N: usize> {
    events: heapless::Vec<OutputEvent, N>,
    overflow: bool,
}

impl<const N: usize> Default for EventBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventBuffer<N> {
    pub const fn new() -> Self {
        Self {
            events: heapless::Vec::new(),
            overflow: false,
        }
    }

    pub fn events(&self) -> &[OutputEvent] {
        &self.events
    }

    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    pub fn drain(&mut self) -> impl Iterator<Item = OutputEvent> + '_ {
        self.overflow = false;
        let events = core::mem::take(&mut self.events);
        events.into_iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.overflow = false;
    }
}

impl<const N: usize> EventSink for EventBuffer<N> {
    fn emit(&mut self, event: OutputEvent) {
        if self.events.push(event).is_err() {
            self.overflow = true;
            let _ = self.events.remove(0);
            let _ = self.events.push(event);
        }
    }
}
