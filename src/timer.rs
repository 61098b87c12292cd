use core::fmt;

use embassy_time::Instant;

/// Timer slots an instance may arm. Declaration order is the firing order
/// for deadlines that fall on the same instant: a tap decision due together
/// with touch-end sees the touch still active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerSlot {
    TapDecision,
    TapRelease,
    TouchEnd,
}

/// Routes an expired deadline back to the instance that armed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub instance: u8,
    pub slot: TimerSlot,
}

impl TimerKey {
    pub const fn new(instance: u8, slot: TimerSlot) -> Self {
        Self { instance, slot }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerError {
    QueueFull,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("timer queue full"),
        }
    }
}

/// Delayed-callback facility. Rescheduling a key replaces its pending
/// deadline; there is no separate "schedule once".
pub trait TimerFacility {
    fn reschedule(&mut self, key: TimerKey, deadline: Instant) -> Result<(), TimerError>;

    fn cancel(&mut self, key: TimerKey);
}

#[derive(Clone, Copy, Debug)]
struct Deadline {
    key: TimerKey,
    at: Instant,
    seq: u32,
}

/// Fixed-capacity deadline table for a single execution context.
pub struct DeadlineQueue<const N: usize> {
    entries: heapless::Vec<Deadline, N>,
    next_seq: u32,
}

impl<const N: usize> Default for DeadlineQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DeadlineQueue<N> {
    pub const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn deadline_of(&self, key: TimerKey) -> Option<Instant> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.at)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|entry| entry.at).min()
    }

    /// Removes and returns the earliest deadline at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerKey, Instant)> {
        let mut best: Option<usize> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.at > now {
                continue;
            }
            let better = match best {
                None => true,
                Some(current) => {
                    let current = &self.entries[current];
                    (entry.at, entry.key.slot, entry.seq)
                        < (current.at, current.key.slot, current.seq)
                }
            };
            if better {
                best = Some(idx);
            }
        }
        let entry = self.entries.swap_remove(best?);
        Some((entry.key, entry.at))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<const N: usize> TimerFacility for DeadlineQueue<N> {
    fn reschedule(&mut self, key: TimerKey, deadline: Instant) -> Result<(), TimerError> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.at = deadline;
            entry.seq = seq;
            return Ok(());
        }
        self.entries
            .push(Deadline {
                key,
                at: deadline,
                seq,
            })
            .map_err(|_| TimerError::QueueFull)
    }

    fn cancel(&mut self, key: TimerKey) {
        self.entries.retain(|entry| entry.key != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    const END: TimerKey = TimerKey::new(0, TimerSlot::TouchEnd);
    const DECISION: TimerKey = TimerKey::new(0, TimerSlot::TapDecision);

    #[test]
    fn reschedule_replaces_pending_deadline() {
        let mut queue = DeadlineQueue::<4>::new();
        queue.reschedule(END, at(30)).unwrap();
        queue.reschedule(END, at(45)).unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_due(at(40)), None);
        assert_eq!(queue.pop_due(at(45)), Some((END, at(45))));
        assert!(queue.is_empty());
    }

    #[test]
    fn due_entries_pop_in_deadline_order() {
        let mut queue = DeadlineQueue::<4>::new();
        let other = TimerKey::new(1, TimerSlot::TouchEnd);
        queue.reschedule(other, at(20)).unwrap();
        queue.reschedule(END, at(10)).unwrap();

        assert_eq!(queue.next_deadline(), Some(at(10)));
        assert_eq!(queue.pop_due(at(100)), Some((END, at(10))));
        assert_eq!(queue.pop_due(at(100)), Some((other, at(20))));
        assert_eq!(queue.pop_due(at(100)), None);
    }

    #[test]
    fn equal_deadlines_fire_decision_before_touch_end() {
        let mut queue = DeadlineQueue::<4>::new();
        queue.reschedule(END, at(50)).unwrap();
        queue.reschedule(DECISION, at(50)).unwrap();

        assert_eq!(queue.pop_due(at(50)), Some((DECISION, at(50))));
        assert_eq!(queue.pop_due(at(50)), Some((END, at(50))));
    }

    #[test]
    fn full_queue_rejects_new_keys_but_accepts_reschedules() {
        let mut queue = DeadlineQueue::<1>::new();
        queue.reschedule(END, at(10)).unwrap();

        assert_eq!(
            queue.reschedule(DECISION, at(20)),
            Err(TimerError::QueueFull)
        );
        assert_eq!(queue.reschedule(END, at(30)), Ok(()));
        assert_eq!(queue.deadline_of(END), Some(at(30)));
    }

    #[test]
    fn cancel_drops_only_that_key() {
        let mut queue = DeadlineQueue::<4>::new();
        queue.reschedule(END, at(10)).unwrap();
        queue.reschedule(DECISION, at(10)).unwrap();
        queue.cancel(END);

        assert_eq!(queue.deadline_of(END), None);
        assert_eq!(queue.pop_due(at(10)), Some((DECISION, at(10))));
    }
}
