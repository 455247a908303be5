//! Bounded overwrite-oldest event queue.
//!
//! Producers (edge handlers, the repeat tick) call [`EventQueue::enqueue`],
//! which never blocks and never fails: on a full queue the oldest unread
//! event is evicted. One consumer task drains it with
//! [`EventQueue::dequeue`].
//!
//! The queue also owns the [`EventMask`] and the last-activity timestamp,
//! so that capture can test the mask and insert inside a single critical
//! section.
//!
//! # Concurrency
//!
//! All state sits behind one `blocking_mutex::Mutex<CriticalSectionRawMutex, _>`:
//! every access is a short, allocation-free critical section, safe from
//! interrupt context. The 64-bit timestamp lives inside the lock rather than
//! in an atomic so the queue also works on cores without 64-bit atomics.
//! A [`Signal`] wakes the consumer after each insert.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Instant};
use heapless::Deque;
use platform::config::EVENT_QUEUE_CAPACITY;
use platform::{Button, Transition};

use crate::event::Event;
use crate::mask::EventMask;

struct QueueState<const N: usize> {
    events: Deque<Event, N>,
    mask: EventMask,
    last_event_us: u64,
    evicted: u32,
}

/// Overwrite-oldest FIFO of [`Event`]s, capacity `N`.
pub struct EventQueue<const N: usize = EVENT_QUEUE_CAPACITY> {
    state: Mutex<CriticalSectionRawMutex, RefCell<QueueState<N>>>,
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl<const N: usize> EventQueue<N> {
    /// Empty queue, nothing masked, last activity at time zero.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(QueueState {
                events: Deque::new(),
                mask: EventMask::NONE,
                last_event_us: 0,
                evicted: 0,
            })),
            ready: Signal::new(),
        }
    }

    /// Capacity.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Insert `event`, evicting the oldest unread event if full.
    ///
    /// Never blocks; safe from interrupt context.
    pub fn enqueue(&self, event: Event) {
        let evicted = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let evicted = if s.events.is_full() {
                s.evicted = s.evicted.saturating_add(1);
                s.events.pop_front()
            } else {
                None
            };
            // Only fails when N == 0, in which case there is nowhere to put it.
            let _ = s.events.push_back(event);
            evicted
        });
        if let Some(old) = evicted {
            debug!("event queue full, evicted oldest {}", old.name());
        }
        self.ready.signal(());
    }

    /// Remove the oldest event without waiting.
    ///
    /// Press and release events refresh the last-activity timestamp.
    pub fn try_dequeue(&self) -> Option<Event> {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let event = s.events.pop_front()?;
            if let Some(ts) = event.timestamp_us() {
                s.last_event_us = ts;
            }
            Some(event)
        })
    }

    /// Remove the oldest event, waiting up to `timeout` for one to arrive.
    ///
    /// A zero `timeout` never waits. Returns [`Event::None`] on timeout.
    pub async fn dequeue(&self, timeout: Duration) -> Event {
        if let Some(event) = self.try_dequeue() {
            return event;
        }
        if timeout == Duration::from_ticks(0) {
            return Event::None;
        }

        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.next().await;
        };
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining == Duration::from_ticks(0) {
                return self.try_dequeue().unwrap_or_default();
            }
            // A stale signal (its event already taken) just loops.
            if with_timeout(remaining, self.ready.wait()).await.is_err() {
                return self.try_dequeue().unwrap_or_default();
            }
            if let Some(event) = self.try_dequeue() {
                return event;
            }
        }
    }

    /// Remove the oldest event, waiting as long as it takes.
    pub async fn next(&self) -> Event {
        loop {
            if let Some(event) = self.try_dequeue() {
                return event;
            }
            self.ready.wait().await;
        }
    }

    /// Drop every queued event.
    pub fn clear(&self) {
        self.state.lock(|s| s.borrow_mut().events.clear());
        self.ready.reset();
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.state.lock(|s| s.borrow().events.len())
    }

    /// `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events lost to eviction since construction.
    pub fn evicted(&self) -> u32 {
        self.state.lock(|s| s.borrow().evicted)
    }

    // ── Mask ────────────────────────────────────────────────────────────────

    /// Add `mask` to the current mask. Already-queued events are unaffected.
    pub fn mask(&self, mask: EventMask) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.mask = s.mask.union(mask);
        });
    }

    /// Remove `mask` from the current mask.
    pub fn unmask(&self, mask: EventMask) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.mask = s.mask.without(mask);
        });
    }

    /// Replace the mask, returning the previous one.
    pub fn set_mask(&self, mask: EventMask) -> EventMask {
        self.state
            .lock(|s| core::mem::replace(&mut s.borrow_mut().mask, mask))
    }

    /// Current mask.
    pub fn current_mask(&self) -> EventMask {
        self.state.lock(|s| s.borrow().mask)
    }

    /// `true` if the (button, transition) pair is masked.
    pub fn is_masked(&self, button: Button, transition: Transition) -> bool {
        self.current_mask().contains(button, transition)
    }

    /// Replace the mask until the returned guard is dropped, then restore
    /// whatever was in place before.
    pub fn scoped_mask(&self, mask: EventMask) -> MaskGuard<'_, N> {
        let previous = self.set_mask(mask);
        MaskGuard {
            queue: self,
            previous,
        }
    }

    // ── Activity ────────────────────────────────────────────────────────────

    /// Timestamp of the last press/release handed to the consumer, or of the
    /// last [`touch`](Self::touch), whichever is later in program order.
    pub fn last_event_timestamp(&self) -> u64 {
        self.state.lock(|s| s.borrow().last_event_us)
    }

    /// Record activity at `now_us` (resets the inactivity timer).
    pub fn touch(&self, now_us: u64) {
        self.state.lock(|s| s.borrow_mut().last_event_us = now_us);
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Restores the previous [`EventMask`] on drop.
///
/// Returned by [`EventQueue::scoped_mask`]. Dropping happens on every exit
/// path, including early returns and a cancelled future.
#[must_use = "the mask is restored as soon as the guard is dropped"]
pub struct MaskGuard<'q, const N: usize> {
    queue: &'q EventQueue<N>,
    previous: EventMask,
}

impl<const N: usize> MaskGuard<'_, N> {
    /// Mask that will be restored.
    pub fn previous(&self) -> EventMask {
        self.previous
    }
}

impl<const N: usize> Drop for MaskGuard<'_, N> {
    fn drop(&mut self) {
        self.queue.set_mask(self.previous);
    }
}
