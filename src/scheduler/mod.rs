//! Future event lists.
//!
//! Each owner (particle or system process) keeps a Particle Event List: a
//! small min-heap of its scheduled events. The sorter maintains the global
//! minimum over PEL heads. Two disciplines implement the same contract: an
//! indexed binary heap keyed by head time, and a calendar queue bucketing
//! owners by head time with amortised O(1) pops. Both must yield identical
//! event sequences for identical inputs; ties break through the `Event`
//! total order and then the owner id.
//!
//! Cancellation is never expressed here: stale events are popped and
//! discarded by the event loop when their freshness tokens mismatch.

mod calendar;
mod heap;

pub use calendar::CalendarSorter;
pub use heap::HeapSorter;

use crate::core::event::Event;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

pub type OwnerId = usize;

/// Expected neighbour count; PEL heaps are preallocated to this so the hot
/// path does not grow them.
const PEL_CAPACITY: usize = 16;

/// Which sorter discipline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SorterKind {
    Heap,
    CalendarQueue,
}

/// One owner's scheduled events, earliest first.
#[derive(Debug, Clone)]
pub struct Pel {
    heap: BinaryHeap<Reverse<Event>>,
}

impl Default for Pel {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::with_capacity(PEL_CAPACITY),
        }
    }
}

impl Pel {
    #[inline]
    pub fn push(&mut self, ev: Event) {
        self.heap.push(Reverse(ev));
    }

    #[inline]
    pub fn head(&self) -> Option<&Event> {
        self.heap.peek().map(|Reverse(e)| e)
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(e)| e)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

/// The FEL contract (spelled out in the module docs): `push` schedules into
/// an owner's PEL, `next` peeks the globally earliest PEL head,
/// `pop_next_pel_event` discards one owner's head, `clear_pel` empties an
/// owner ahead of reprediction, `stream` advances time-rebased
/// implementations, and `rebuild` restores the global structure after bulk
/// insertion.
pub trait EventSorter: std::fmt::Debug {
    fn n_owners(&self) -> usize;

    fn push(&mut self, owner: OwnerId, ev: Event);

    /// Globally earliest `(owner, head event)`, without removing it.
    /// Reported times are always absolute, whatever the internal basis.
    fn next(&mut self) -> Option<(OwnerId, Event)>;

    fn pop_next_pel_event(&mut self, owner: OwnerId);

    fn clear_pel(&mut self, owner: OwnerId);

    /// Advance the internal time base by `dt`. Heap implementations keep
    /// absolute times and treat this as a no-op.
    fn stream(&mut self, dt: f64);

    fn rebuild(&mut self);

    fn is_empty(&self) -> bool;
}

/// Construct the configured sorter for `owners` slots.
pub fn build(kind: SorterKind, owners: usize) -> Box<dyn EventSorter> {
    match kind {
        SorterKind::Heap => Box::new(HeapSorter::new(owners)),
        SorterKind::CalendarQueue => Box::new(CalendarSorter::new(owners)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{CrossDir, EventKind};

    fn pair(t: f64, a: u32, b: u32) -> Event {
        Event::new(
            t,
            EventKind::Pair {
                a,
                b,
                dir: CrossDir::Inward,
                shell: 0,
            },
            0,
            Some(0),
        )
        .unwrap()
    }

    fn drain(sorter: &mut dyn EventSorter) -> Vec<(OwnerId, f64)> {
        let mut out = Vec::new();
        while let Some((owner, ev)) = sorter.next() {
            out.push((owner, ev.time_f64()));
            sorter.pop_next_pel_event(owner);
        }
        out
    }

    fn exercise(sorter: &mut dyn EventSorter) {
        sorter.push(0, pair(3.0, 0, 1));
        sorter.push(1, pair(1.0, 1, 2));
        sorter.push(2, pair(2.0, 2, 0));
        sorter.push(1, pair(0.5, 1, 0));
        sorter.rebuild();

        let (owner, ev) = sorter.next().expect("events scheduled");
        assert_eq!(owner, 1);
        assert!((ev.time_f64() - 0.5).abs() < 1e-15);

        // Peeking twice must not consume.
        let (owner2, _) = sorter.next().unwrap();
        assert_eq!(owner2, 1);

        sorter.pop_next_pel_event(1);
        let (owner, ev) = sorter.next().unwrap();
        assert_eq!((owner, ev.time_f64()), (1, 1.0));

        // Clearing owner 1 exposes owner 2's earlier head.
        sorter.clear_pel(1);
        let (owner, ev) = sorter.next().unwrap();
        assert_eq!((owner, ev.time_f64()), (2, 2.0));

        // A later push that becomes the new global head.
        sorter.push(0, pair(0.25, 0, 2));
        let (owner, ev) = sorter.next().unwrap();
        assert_eq!((owner, ev.time_f64()), (0, 0.25));

        let rest = drain(sorter);
        assert_eq!(rest, vec![(0, 0.25), (2, 2.0), (0, 3.0)]);
        assert!(sorter.is_empty());
    }

    #[test]
    fn heap_satisfies_the_contract() {
        exercise(&mut HeapSorter::new(4));
    }

    #[test]
    fn calendar_satisfies_the_contract() {
        exercise(&mut CalendarSorter::new(4));
    }

    #[test]
    fn disciplines_agree_on_ordering() {
        let mut heap = HeapSorter::new(8);
        let mut cal = CalendarSorter::new(8);
        // Deterministic pseudo-random schedule, including exact ties.
        let mut t = 0.0f64;
        for i in 0..64u32 {
            t = (t * 997.0 + 1.0).rem_euclid(17.0);
            let owner = (i % 8) as OwnerId;
            let ev = pair(t, owner as u32, (i % 7) as u32);
            heap.push(owner, ev);
            cal.push(owner, ev);
            if i % 3 == 0 {
                let tie = pair(t, (i % 5) as u32, 6);
                heap.push((i % 5) as OwnerId, tie);
                cal.push((i % 5) as OwnerId, tie);
            }
        }
        heap.rebuild();
        cal.rebuild();
        assert_eq!(drain(&mut heap), drain(&mut cal));
    }

    #[test]
    fn stream_is_transparent_to_callers() {
        let mut cal = CalendarSorter::new(2);
        cal.push(0, pair(5.0, 0, 1));
        cal.push(1, pair(7.0, 1, 0));
        cal.rebuild();
        let (_, ev) = cal.next().unwrap();
        assert!((ev.time_f64() - 5.0).abs() < 1e-15);
        // After streaming past the first event, reported times stay
        // absolute for both disciplines.
        cal.stream(5.0);
        let (_, ev) = cal.next().unwrap();
        assert!((ev.time_f64() - 5.0).abs() < 1e-15);
        cal.pop_next_pel_event(0);
        let (_, ev) = cal.next().unwrap();
        assert!((ev.time_f64() - 7.0).abs() < 1e-15);

        let mut heap = HeapSorter::new(2);
        heap.push(0, pair(5.0, 0, 1));
        heap.stream(5.0);
        let (_, ev) = heap.next().unwrap();
        assert!((ev.time_f64() - 5.0).abs() < 1e-15);
    }
}
