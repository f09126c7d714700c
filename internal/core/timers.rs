// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

// cSpell: ignore singleshot

/*!
    Support for single-shot timers.

    Timers are just a bunch of tokens sorted by expiry date. They never run code
    by themselves: the owner polls [`TimerList::take_expired`] from its own event
    loop iteration and reacts to the tokens, which keeps all state changes on the
    thread owning the list.
*/

#![warn(missing_docs)]

use crate::animations::Instant;

/// Handle to a started timer. Stale handles (timer already fired or stopped) are harmless.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerId {
    index: usize,
    generation: u64,
}

struct TimerData<T> {
    token: T,
    generation: u64,
}

#[derive(Clone, Copy)]
struct ActiveTimer {
    index: usize,
    timeout: Instant,
}

/// An ordered list of pending single-shot timers carrying a token of type `T`.
pub struct TimerList<T> {
    timers: slab::Slab<TimerData<T>>,
    active_timers: Vec<ActiveTimer>,
    next_generation: u64,
}

impl<T> Default for TimerList<T> {
    fn default() -> Self {
        Self { timers: slab::Slab::new(), active_timers: Vec::new(), next_generation: 0 }
    }
}

impl<T> TimerList<T> {
    /// Schedule `token` to be returned by [`Self::take_expired`] once `interval` has elapsed after `now`.
    pub fn start(&mut self, token: T, interval: core::time::Duration, now: Instant) -> TimerId {
        self.next_generation += 1;
        let generation = self.next_generation;
        let index = self.timers.insert(TimerData { token, generation });
        self.register_active_timer(ActiveTimer { index, timeout: now + interval });
        TimerId { index, generation }
    }

    /// Stops the previously started timer. Returns the token if the timer was still pending.
    pub fn stop(&mut self, id: TimerId) -> Option<T> {
        if !self.running(id) {
            return None;
        }
        self.deactivate_timer(id.index);
        Some(self.timers.remove(id.index).token)
    }

    /// Stops every pending timer whose token matches `predicate`. Returns how many were stopped.
    pub fn stop_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let matching: Vec<usize> = self
            .timers
            .iter()
            .filter(|(_, data)| predicate(&data.token))
            .map(|(index, _)| index)
            .collect();
        for index in &matching {
            self.deactivate_timer(*index);
            self.timers.remove(*index);
        }
        matching.len()
    }

    /// Returns true if a pending timer's token matches `predicate`.
    pub fn any_pending(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.timers.iter().any(|(_, data)| predicate(&data.token))
    }

    /// Returns true if the timer is still pending.
    pub fn running(&self, id: TimerId) -> bool {
        self.timers.get(id.index).is_some_and(|t| t.generation == id.generation)
    }

    /// Returns the timeout of the timer that should fire the soonest, or None if there
    /// is no timer active.
    pub fn next_timeout(&self) -> Option<Instant> {
        self.active_timers.first().map(|first_active_timer| first_active_timer.timeout)
    }

    /// Removes and returns, in expiry order, the tokens of all timers whose timeout is at or before `now`.
    pub fn take_expired(&mut self, now: Instant) -> Vec<T> {
        let expired = lower_bound(&self.active_timers, |t| t.timeout <= now);
        let fired: Vec<ActiveTimer> = self.active_timers.drain(..expired).collect();
        fired.into_iter().map(|active_timer| self.timers.remove(active_timer.index).token).collect()
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.active_timers.clear();
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.active_timers.len()
    }

    /// Returns true if no timer is pending.
    pub fn is_empty(&self) -> bool {
        self.active_timers.is_empty()
    }

    fn deactivate_timer(&mut self, index: usize) {
        if let Some(i) = self.active_timers.iter().position(|t| t.index == index) {
            self.active_timers.remove(i);
        }
    }

    fn register_active_timer(&mut self, new_active_timer: ActiveTimer) {
        // Timers with the same timeout fire in start order.
        let insertion_index = lower_bound(&self.active_timers, |existing_timer| {
            existing_timer.timeout <= new_active_timer.timeout
        });

        self.active_timers.insert(insertion_index, new_active_timer);
    }
}

fn lower_bound<T>(vec: &[T], mut less_than: impl FnMut(&T) -> bool) -> usize {
    let mut left = 0;
    let mut right = vec.len();

    while left != right {
        let mid = left + (right - left) / 2;
        let value = &vec[mid];
        if less_than(value) {
            left = mid + 1;
        } else {
            right = mid;
        }
    }

    left
}
