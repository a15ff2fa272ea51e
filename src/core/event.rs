use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;

/// Direction of a shell crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CrossDir {
    Inward,
    Outward,
    /// Inward approach onto an impenetrable core.
    Core,
}

/// Kinds of events the engine schedules.
///
/// Events are immutable once scheduled; cancellation is expressed only by a
/// freshness-token mismatch at pop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Shell crossing between particles `a` (primary, the PEL owner) and
    /// `b`. `shell` is the index of the discontinuity radius being crossed.
    Pair {
        a: u32,
        b: u32,
        dir: CrossDir,
        shell: u32,
    },
    /// Particle `p` reaches cell face `face` (axis * 2, +1 for the max
    /// side).
    CellCross { p: u32, face: u8 },
    /// Andersen thermostat firing (system slot owns it).
    Thermostat,
    /// Re-establish capture state from geometry and repredict everything.
    Rebuild,
    /// Terminate the run at `t_end`.
    Halt,
}

impl EventKind {
    /// Primary participant, where one exists. System events have none;
    /// their FEL slot stands in as the owner.
    #[inline]
    pub fn primary(&self) -> Option<u32> {
        match *self {
            EventKind::Pair { a, .. } => Some(a),
            EventKind::CellCross { p, .. } => Some(p),
            _ => None,
        }
    }

    /// Ordinal used to break ties between event kinds at equal times.
    #[inline]
    fn ordinal(&self) -> u8 {
        match self {
            EventKind::Pair { .. } => 0,
            EventKind::CellCross { .. } => 1,
            EventKind::Thermostat => 2,
            EventKind::Rebuild => 3,
            EventKind::Halt => 4,
        }
    }

    #[inline]
    fn order_key(&self) -> (u8, u32, u32) {
        match *self {
            EventKind::Pair { a, b, .. } => (0, a, b),
            EventKind::CellCross { p, face } => (1, p, face as u32),
            EventKind::Thermostat => (2, 0, 0),
            EventKind::Rebuild => (3, 0, 0),
            EventKind::Halt => (4, 0, 0),
        }
    }
}

/// A scheduled event.
///
/// `token_a`/`token_b` snapshot the participants' freshness counters at
/// prediction time; the event is fresh only while both still match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Absolute occurrence time (finite, non-NaN).
    pub time: NotNan<f64>,
    pub kind: EventKind,
    pub token_a: u64,
    pub token_b: Option<u64>,
}

impl Event {
    pub fn new(time: f64, kind: EventKind, token_a: u64, token_b: Option<u64>) -> Result<Self> {
        if !time.is_finite() {
            return Err(Error::Numerical(format!(
                "event time must be finite, got {time} for {kind:?}"
            )));
        }
        let time = NotNan::new(time)
            .map_err(|_| Error::Numerical("event time cannot be NaN".into()))?;
        Ok(Self {
            time,
            kind,
            token_a,
            token_b,
        })
    }

    #[inline]
    pub fn time_f64(&self) -> f64 {
        self.time.into_inner()
    }

    /// Freshness test against the participants' current tokens.
    #[inline]
    pub fn is_fresh(&self, token_a_now: u64, token_b_now: Option<u64>) -> bool {
        if self.token_a != token_a_now {
            return false;
        }
        match (self.token_b, token_b_now) {
            (Some(snap), Some(now)) => snap == now,
            (None, _) => true,
            (Some(_), None) => false,
        }
    }
}

/// Total order: time first, then kind ordinal and participants, so that
/// simultaneous events execute in a reproducible sequence.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.kind.order_key().cmp(&other.kind.order_key()))
            .then_with(|| {
                (self.token_a, self.token_b.unwrap_or(0))
                    .cmp(&(other.token_a, other.token_b.unwrap_or(0)))
            })
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
