//! Cooperative timer queue
//!
//! The menu engine never blocks. Every delay (hover intent, close intent,
//! continuous scrolling, momentum settle) is a timer in this queue, and the
//! host drives time forward explicitly. Timers carry a task payload that
//! the owner interprets when the timer fires.
//!
//! Timers are popped one at a time with [`TimerQueue::pop_due`], so a
//! handler that clears another timer prevents it from firing later in the
//! same advance.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a scheduled timer
    pub struct TimerId;
}

#[derive(Debug)]
struct Timer<T> {
    due: u64,
    interval: Option<u64>,
    seq: u64,
    task: T,
}

/// Timeout/interval scheduler driven by an external millisecond clock
#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: SlotMap<TimerId, Timer<T>>,
    now: u64,
    seq: u64,
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            now: 0,
            seq: 0,
        }
    }

    /// Current clock value (ms)
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule `task` to fire once after `delay_ms`
    pub fn set_timeout(&mut self, delay_ms: u64, task: T) -> TimerId {
        self.insert(delay_ms, None, task)
    }

    /// Schedule `task` to fire every `period_ms` until cleared
    pub fn set_interval(&mut self, period_ms: u64, task: T) -> TimerId {
        let period = period_ms.max(1);
        self.insert(period, Some(period), task)
    }

    /// Cancel a timer, returning its task if it was still pending
    pub fn clear(&mut self, id: TimerId) -> Option<T> {
        self.timers.remove(id).map(|timer| timer.task)
    }

    /// Cancel the timer stored in `slot`, if any
    pub fn clear_slot(&mut self, slot: &mut Option<TimerId>) {
        if let Some(id) = slot.take() {
            self.clear(id);
        }
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pop the earliest timer due at or before `until`.
    ///
    /// The clock moves to the timer's due time, so timers scheduled by the
    /// handler are relative to the moment the timer fired. Intervals are
    /// re-armed and keep their id; timeouts are removed.
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, T)> {
        let (id, due) = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(_, timer)| (timer.due, timer.seq))
            .map(|(id, timer)| (id, timer.due))?;

        self.now = self.now.max(due);

        let timer = self.timers.get_mut(id)?;
        match timer.interval {
            Some(period) => {
                timer.due = due + period;
                self.seq += 1;
                timer.seq = self.seq;
                Some((id, timer.task.clone()))
            }
            None => self.timers.remove(id).map(|timer| (id, timer.task)),
        }
    }

    /// Move the clock forward once all due timers have been handled
    pub fn advance_clock(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    fn insert(&mut self, delay_ms: u64, interval: Option<u64>, task: T) -> TimerId {
        self.seq += 1;
        self.timers.insert(Timer {
            due: self.now + delay_ms,
            interval,
            seq: self.seq,
            task,
        })
    }
}

impl<T: Clone> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
