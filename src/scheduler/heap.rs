//! Binary-heap FEL: owners keyed by PEL head event.
//!
//! A classic indexed heap; the position table makes `update` after a head
//! change O(log n). Owners with empty PELs sink to the bottom, so `next`
//! is a plain root read. Times are stored absolute and `stream` is a no-op.

use super::{EventSorter, OwnerId, Pel};
use crate::core::event::Event;
use std::cmp::Ordering;

#[derive(Debug)]
pub struct HeapSorter {
    pels: Vec<Pel>,
    /// Heap-ordered owner ids.
    heap: Vec<OwnerId>,
    /// Owner id -> slot in `heap`.
    pos: Vec<usize>,
}

impl HeapSorter {
    pub fn new(owners: usize) -> Self {
        Self {
            pels: (0..owners).map(|_| Pel::default()).collect(),
            heap: (0..owners).collect(),
            pos: (0..owners).collect(),
        }
    }

    fn key_cmp(&self, a: OwnerId, b: OwnerId) -> Ordering {
        match (self.pels[a].head(), self.pels[b].head()) {
            (Some(ea), Some(eb)) => ea.cmp(eb).then(a.cmp(&b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(&b),
        }
    }

    fn swap_slots(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.pos[self.heap[i]] = i;
        self.pos[self.heap[j]] = j;
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.key_cmp(self.heap[i], self.heap[parent]) == Ordering::Less {
                self.swap_slots(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.heap.len();
        loop {
            let (l, r) = (2 * i + 1, 2 * i + 2);
            let mut smallest = i;
            if l < n && self.key_cmp(self.heap[l], self.heap[smallest]) == Ordering::Less {
                smallest = l;
            }
            if r < n && self.key_cmp(self.heap[r], self.heap[smallest]) == Ordering::Less {
                smallest = r;
            }
            if smallest == i {
                break;
            }
            self.swap_slots(i, smallest);
            i = smallest;
        }
    }

    fn update(&mut self, owner: OwnerId) {
        let i = self.pos[owner];
        self.sift_up(i);
        self.sift_down(self.pos[owner]);
    }
}

impl EventSorter for HeapSorter {
    fn n_owners(&self) -> usize {
        self.pels.len()
    }

    fn push(&mut self, owner: OwnerId, ev: Event) {
        self.pels[owner].push(ev);
        self.update(owner);
    }

    fn next(&mut self) -> Option<(OwnerId, Event)> {
        let owner = *self.heap.first()?;
        self.pels[owner].head().map(|&ev| (owner, ev))
    }

    fn pop_next_pel_event(&mut self, owner: OwnerId) {
        self.pels[owner].pop();
        self.update(owner);
    }

    fn clear_pel(&mut self, owner: OwnerId) {
        self.pels[owner].clear();
        self.update(owner);
    }

    fn stream(&mut self, _dt: f64) {}

    fn rebuild(&mut self) {
        let n = self.heap.len();
        for i in (0..n / 2).rev() {
            self.sift_down(i);
        }
    }

    fn is_empty(&self) -> bool {
        self.heap
            .first()
            .map_or(true, |&o| self.pels[o].is_empty())
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
    fn root_tracks_head_changes() {
        let mut s = HeapSorter::new(3);
        s.push(0, halt(5.0));
        s.push(1, halt(3.0));
        s.push(2, halt(4.0));
        assert_eq!(s.next().unwrap().0, 1);
        // Owner 1's head is removed; owner 2 takes over.
        s.clear_pel(1);
        assert_eq!(s.next().unwrap().0, 2);
        // A fresh earlier push on owner 1 reclaims the root.
        s.push(1, halt(0.5));
        assert_eq!(s.next().unwrap().0, 1);
    }

    #[test]
    fn empty_owners_sink() {
        let mut s = HeapSorter::new(4);
        assert!(s.is_empty());
        assert!(s.next().is_none());
        s.push(3, halt(1.0));
        assert!(!s.is_empty());
        assert_eq!(s.next().unwrap().0, 3);
        s.pop_next_pel_event(3);
        assert!(s.is_empty());
    }

    #[test]
    fn equal_times_resolve_by_owner() {
        let mut s = HeapSorter::new(3);
        s.push(2, halt(1.0));
        s.push(1, halt(1.0));
        assert_eq!(s.next().unwrap().0, 1);
    }
}
