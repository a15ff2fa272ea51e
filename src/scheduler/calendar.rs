//! Calendar-queue FEL: owners bucketed by PEL head time.
//!
//! Buckets one mean event gap wide make the pop amortised O(1) even with
//! the stale events the token protocol leaves behind: the scan only ever
//! touches the current bucket, and an owner moves buckets only when its
//! head changes. Far-future heads sit in an overflow bucket and are
//! redistributed when the cursor wraps an epoch.
//!
//! Stored event times are absolute; bucket keys are taken relative to the
//! epoch origin, which advances with the cursor and keeps them small. With
//! nothing to rebase, `stream` is a no-op here as in the heap, and every
//! time reported through the contract is absolute.

use super::{EventSorter, OwnerId, Pel};
use crate::core::event::Event;

const UNBUCKETED: usize = usize::MAX;
const MIN_WIDTH: f64 = 1e-12;

#[derive(Debug)]
pub struct CalendarSorter {
    pels: Vec<Pel>,
    /// `n_buckets` time slices plus one overflow slot at the end.
    buckets: Vec<Vec<OwnerId>>,
    slot_of: Vec<usize>,
    n_buckets: usize,
    width: f64,
    /// Absolute time of bucket 0's lower edge for the current epoch.
    origin: f64,
    cursor: usize,
    scheduled: usize,
}

impl CalendarSorter {
    pub fn new(owners: usize) -> Self {
        let n_buckets = owners.next_power_of_two().clamp(16, 1 << 16);
        Self {
            pels: (0..owners).map(|_| Pel::default()).collect(),
            buckets: vec![Vec::new(); n_buckets + 1],
            slot_of: vec![UNBUCKETED; owners],
            n_buckets,
            width: 1.0,
            origin: 0.0,
            cursor: 0,
            scheduled: 0,
        }
    }

    fn bucket_for(&self, t: f64) -> usize {
        let rel = t - self.origin;
        if rel < self.cursor as f64 * self.width {
            // Arrived behind the cursor (roundoff or a just-executed time):
            // the current bucket still yields it before anything later.
            return self.cursor;
        }
        let k = (rel / self.width) as usize;
        k.min(self.n_buckets)
    }

    fn detach(&mut self, owner: OwnerId) {
        let slot = self.slot_of[owner];
        if slot == UNBUCKETED {
            return;
        }
        let bucket = &mut self.buckets[slot];
        if let Some(i) = bucket.iter().position(|&o| o == owner) {
            bucket.swap_remove(i);
        }
        self.slot_of[owner] = UNBUCKETED;
        self.scheduled -= 1;
    }

    fn attach(&mut self, owner: OwnerId) {
        if let Some(head) = self.pels[owner].head() {
            let slot = self.bucket_for(head.time_f64());
            self.buckets[slot].push(owner);
            self.slot_of[owner] = slot;
            self.scheduled += 1;
        }
    }

    fn update(&mut self, owner: OwnerId) {
        self.detach(owner);
        self.attach(owner);
    }

    /// Move to the next epoch once the cursor runs off the end: either the
    /// adjacent window, or straight to the earliest overflow head when the
    /// gap is larger than a whole epoch.
    fn advance_epoch(&mut self) {
        let span = self.n_buckets as f64 * self.width;
        let earliest = self.buckets[self.n_buckets]
            .iter()
            .filter_map(|&o| self.pels[o].head().map(|e| e.time_f64()))
            .fold(f64::INFINITY, f64::min);
        self.origin = if earliest.is_finite() {
            (self.origin + span).max(earliest)
        } else {
            self.origin + span
        };
        self.cursor = 0;

        let overflow = std::mem::take(&mut self.buckets[self.n_buckets]);
        for owner in overflow {
            self.slot_of[owner] = UNBUCKETED;
            self.scheduled -= 1;
            self.attach(owner);
        }
    }

    /// Smallest head in the current bucket by the full event order, then
    /// owner id, matching the heap discipline exactly.
    fn bucket_min(&self, slot: usize) -> Option<OwnerId> {
        self.buckets[slot]
            .iter()
            .copied()
            .filter(|&o| !self.pels[o].is_empty())
            .min_by(|&a, &b| {
                let (ea, eb) = (self.pels[a].head(), self.pels[b].head());
                ea.cmp(&eb).then(a.cmp(&b))
            })
    }
}

impl EventSorter for CalendarSorter {
    fn n_owners(&self) -> usize {
        self.pels.len()
    }

    fn push(&mut self, owner: OwnerId, ev: Event) {
        self.pels[owner].push(ev);
        self.update(owner);
    }

    fn next(&mut self) -> Option<(OwnerId, Event)> {
        loop {
            if self.scheduled == 0 {
                return None;
            }
            if self.cursor >= self.n_buckets {
                self.advance_epoch();
                continue;
            }
            if self.buckets[self.cursor].is_empty() {
                self.cursor += 1;
                continue;
            }
            match self.bucket_min(self.cursor) {
                Some(owner) => return self.pels[owner].head().map(|&ev| (owner, ev)),
                None => self.cursor += 1,
            }
        }
    }

    fn pop_next_pel_event(&mut self, owner: OwnerId) {
        self.pels[owner].pop();
        self.update(owner);
    }

    fn clear_pel(&mut self, owner: OwnerId) {
        self.pels[owner].clear();
        self.detach(owner);
    }

    fn stream(&mut self, _dt: f64) {
        // Times are stored absolute and bucketed against the moving epoch
        // origin; there is nothing to subtract.
    }

    /// Size buckets to the mean head gap and re-bucket everything; called
    /// after the bulk insertion at simulation start.
    fn rebuild(&mut self) {
        let mut t_min = f64::INFINITY;
        let mut t_max = f64::NEG_INFINITY;
        let mut n = 0usize;
        for pel in &self.pels {
            if let Some(head) = pel.head() {
                t_min = t_min.min(head.time_f64());
                t_max = t_max.max(head.time_f64());
                n += 1;
            }
        }
        if n == 0 {
            return;
        }
        self.width = ((t_max - t_min) / n as f64).max(MIN_WIDTH);
        self.origin = t_min;
        self.cursor = 0;
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.slot_of.fill(UNBUCKETED);
        self.scheduled = 0;
        for owner in 0..self.pels.len() {
            self.attach(owner);
        }
    }

    fn is_empty(&self) -> bool {
        self.scheduled == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::EventKind;

    fn halt(t: f64) -> Event {
        Event::new(t, EventKind::Halt, 0, None).unwrap()
    }

    #[test]
    fn pops_in_time_order_across_epochs() {
        let mut s = CalendarSorter::new(4);
        // Spread far beyond one epoch to force overflow handling.
        s.push(0, halt(1.0e6));
        s.push(1, halt(2.0));
        s.push(2, halt(0.5));
        s.push(3, halt(3.0e7));
        s.rebuild();
        let mut seen = Vec::new();
        while let Some((owner, ev)) = s.next() {
            seen.push((owner, ev.time_f64()));
            s.pop_next_pel_event(owner);
        }
        assert_eq!(
            seen,
            vec![(2, 0.5), (1, 2.0), (0, 1.0e6), (3, 3.0e7)]
        );
    }

    #[test]
    fn push_behind_the_cursor_is_not_lost() {
        let mut s = CalendarSorter::new(2);
        s.push(0, halt(10.0));
        s.rebuild();
        assert_eq!(s.next().unwrap().1.time_f64(), 10.0);
        // An event earlier than the bucket the cursor sits in.
        s.push(1, halt(9.5));
        assert_eq!(s.next().unwrap().0, 1);
    }

    #[test]
    fn clear_pel_detaches_the_owner() {
        let mut s = CalendarSorter::new(2);
        s.push(0, halt(1.0));
        s.push(1, halt(2.0));
        s.clear_pel(0);
        assert_eq!(s.next().unwrap().0, 1);
        s.clear_pel(1);
        assert!(s.is_empty());
        assert!(s.next().is_none());
    }

    #[test]
    fn identical_times_resolve_by_owner() {
        let mut s = CalendarSorter::new(3);
        s.push(2, halt(1.0));
        s.push(1, halt(1.0));
        s.rebuild();
        assert_eq!(s.next().unwrap().0, 1);
    }
}
