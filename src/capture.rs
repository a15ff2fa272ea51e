//! Bookkeeping of which pairs sit inside which capture shell.
//!
//! The map stores the region index per captured pair; geometry and map must
//! agree to within a small tolerance at every pair event. Truncation drift
//! is expected and self-correcting: a disagreement triggers a local rebuild
//! from geometry rather than an error.

use std::collections::HashMap;

/// Relative tolerance for capture/geometry agreement checks.
pub const EPS_CAP: f64 = 1e-9;

/// Captured pairs, keyed order-independently.
#[derive(Debug, Clone, Default)]
pub struct CaptureMap {
    map: HashMap<(u32, u32), u32>,
}

#[inline]
fn key(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl CaptureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: u32, b: u32) -> Option<u32> {
        self.map.get(&key(a, b)).copied()
    }

    /// Record the capture state of a pair; `None` removes it.
    pub fn set(&mut self, a: u32, b: u32, state: Option<u32>) {
        match state {
            Some(shell) => {
                self.map.insert(key(a, b), shell);
            }
            None => {
                self.map.remove(&key(a, b));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), u32)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_independent_keys() {
        let mut m = CaptureMap::new();
        m.set(3, 1, Some(2));
        assert_eq!(m.get(1, 3), Some(2));
        assert_eq!(m.get(3, 1), Some(2));
        m.set(1, 3, None);
        assert!(m.is_empty());
    }

    #[test]
    fn clear_empties_the_map() {
        let mut m = CaptureMap::new();
        m.set(0, 1, Some(0));
        m.set(1, 2, Some(1));
        assert_eq!(m.len(), 2);
        m.clear();
        assert!(m.is_empty());
    }
}
