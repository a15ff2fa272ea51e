//! Neighbour structures bounding pairwise prediction work.
//!
//! Two disciplines: an all-pairs sweep for unbounded or small systems, and
//! a cell list whose cells are at least one maximum interaction distance on
//! a side. With cells, any pair that could interact before either particle
//! leaves its cell is in mutually adjacent cells for the whole interval, so
//! predicting against the 27-cell neighbourhood at every crossing never
//! misses an event.

use crate::boundary::Boundary;
use crate::core::particle::Particle;
use crate::error::{Error, Result};
use crate::math::{Vec3, DIM};

/// Strategy for enumerating prediction partners.
#[derive(Debug, Clone)]
pub enum Neighbourhood {
    /// Every other particle is a candidate; no cell-crossing events.
    Global,
    Cells(CellList),
}

impl Neighbourhood {
    /// Pick a strategy for the boundary and interaction range.
    ///
    /// Bounded boxes always get cells: even when the box is under three
    /// cells across (the neighbourhood then wraps onto every cell), the
    /// crossing events are what re-predict pairs whose minimum image
    /// changes, so an all-pairs sweep without them would miss collisions
    /// through the wrap. The all-pairs sweep serves unbounded domains,
    /// where one ballistic prediction stays valid until a token bump.
    pub fn build(
        boundary: &Boundary,
        max_interaction: f64,
        particles: &[Particle],
    ) -> Result<Self> {
        let Some(box_len) = boundary.box_len() else {
            return Ok(Neighbourhood::Global);
        };
        if max_interaction <= 0.0 {
            return Err(Error::Config(
                "cannot build a cell list without a positive interaction range".into(),
            ));
        }
        let counts: [usize; DIM] =
            std::array::from_fn(|k| ((box_len[k] / max_interaction).floor() as usize).max(1));
        let shear_wrap = matches!(boundary, Boundary::LeesEdwards { .. });
        Ok(Neighbourhood::Cells(CellList::new(
            *box_len, counts, shear_wrap, particles,
        )?))
    }

    /// Collect prediction partners for particle `p` into `out`.
    pub fn neighbours_into(&self, p: u32, n_particles: usize, out: &mut Vec<u32>) {
        out.clear();
        match self {
            Neighbourhood::Global => {
                out.extend((0..n_particles as u32).filter(|&j| j != p));
            }
            Neighbourhood::Cells(cells) => cells.neighbours_into(p, out),
        }
    }

    /// Next cell-face crossing for `p`, as `(dt, face)` relative to `now`.
    pub fn crossing(&self, particle: &Particle, now: f64) -> Option<(f64, u8)> {
        match self {
            Neighbourhood::Global => None,
            Neighbourhood::Cells(cells) => cells.crossing(particle, now),
        }
    }

    /// Apply an executed crossing: move `p` across `face`, reporting
    /// whether the move wrapped through the primary-cell boundary.
    pub fn apply_crossing(&mut self, p: u32, face: u8) -> bool {
        match self {
            Neighbourhood::Global => false,
            Neighbourhood::Cells(cells) => cells.apply_crossing(p, face),
        }
    }

    /// Re-derive every cell membership from current positions.
    pub fn rebuild(&mut self, particles: &[Particle]) {
        if let Neighbourhood::Cells(cells) = self {
            cells.rebuild(particles);
        }
    }
}

/// Cubic cell decomposition of the primary box.
#[derive(Debug, Clone)]
pub struct CellList {
    counts: [usize; DIM],
    side: Vec3,
    /// Occupancy list per cell.
    cells: Vec<Vec<u32>>,
    /// Home cell index per particle.
    cell_of: Vec<usize>,
    /// Lees-Edwards: rows wrapping in y must scan the whole x row of the
    /// sheared image, because the shear offset drifts continuously.
    shear_wrap: bool,
}

impl CellList {
    fn new(
        box_len: Vec3,
        counts: [usize; DIM],
        shear_wrap: bool,
        particles: &[Particle],
    ) -> Result<Self> {
        let side = std::array::from_fn(|k| box_len[k] / counts[k] as f64);
        let mut list = Self {
            counts,
            side,
            cells: vec![Vec::new(); counts.iter().product()],
            cell_of: vec![0; particles.len()],
            shear_wrap,
        };
        for p in particles {
            for k in 0..DIM {
                // The fold can round onto the upper face; cell assignment
                // clamps that onto the last cell.
                if p.r[k] < 0.0 || p.r[k] > box_len[k] {
                    return Err(Error::InvalidParam(format!(
                        "particle {} at {:?} lies outside the primary cell",
                        p.id, p.r
                    )));
                }
            }
        }
        list.rebuild(particles);
        Ok(list)
    }

    #[inline]
    fn index(&self, c: [usize; DIM]) -> usize {
        (c[2] * self.counts[1] + c[1]) * self.counts[0] + c[0]
    }

    #[inline]
    fn coords(&self, idx: usize) -> [usize; DIM] {
        let x = idx % self.counts[0];
        let y = (idx / self.counts[0]) % self.counts[1];
        let z = idx / (self.counts[0] * self.counts[1]);
        [x, y, z]
    }

    fn cell_for(&self, r: &Vec3) -> usize {
        let c: [usize; DIM] = std::array::from_fn(|k| {
            ((r[k] / self.side[k]) as usize).min(self.counts[k] - 1)
        });
        self.index(c)
    }

    fn rebuild(&mut self, particles: &[Particle]) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.cell_of.resize(particles.len(), 0);
        for p in particles {
            let idx = self.cell_for(&p.r);
            self.cell_of[p.id as usize] = idx;
            self.cells[idx].push(p.id);
        }
    }

    fn neighbours_into(&self, p: u32, out: &mut Vec<u32>) {
        let home = self.coords(self.cell_of[p as usize]);
        // Under three cells on an axis the +-1 offsets wrap onto the same
        // cell; dedupe below keeps the pair list canonical.
        let duplicates = self.counts.iter().any(|&n| n < 3);
        for dz in -1i64..=1 {
            let z = wrap_coord(home[2], dz, self.counts[2]);
            for dy in -1i64..=1 {
                let y = wrap_coord(home[1], dy, self.counts[1]);
                let y_wraps = (home[1] == 0 && dy == -1)
                    || (home[1] == self.counts[1] - 1 && dy == 1);
                if self.shear_wrap && y_wraps {
                    // Sheared image: the x alignment is time-dependent, so
                    // take the entire row.
                    for x in 0..self.counts[0] {
                        self.push_cell([x, y, z], p, out);
                    }
                } else {
                    for dx in -1i64..=1 {
                        let x = wrap_coord(home[0], dx, self.counts[0]);
                        self.push_cell([x, y, z], p, out);
                    }
                }
            }
        }
        if duplicates {
            out.sort_unstable();
            out.dedup();
        }
    }

    fn push_cell(&self, c: [usize; DIM], p: u32, out: &mut Vec<u32>) {
        for &j in &self.cells[self.index(c)] {
            if j != p {
                out.push(j);
            }
        }
    }

    /// Minimum over the six faces of the positive-approach crossing time.
    fn crossing(&self, particle: &Particle, now: f64) -> Option<(f64, u8)> {
        let home = self.coords(self.cell_of[particle.id as usize]);
        let r = particle.pos_at(now);
        let mut best: Option<(f64, u8)> = None;
        for k in 0..DIM {
            let v = particle.v[k];
            if v == 0.0 {
                continue;
            }
            let (target, face) = if v > 0.0 {
                ((home[k] + 1) as f64 * self.side[k], (2 * k + 1) as u8)
            } else {
                (home[k] as f64 * self.side[k], (2 * k) as u8)
            };
            // Clamp: roundoff can leave the particle marginally past a face.
            let dt = ((target - r[k]) / v).max(0.0);
            if best.map_or(true, |(t, _)| dt < t) {
                best = Some((dt, face));
            }
        }
        best
    }

    fn apply_crossing(&mut self, p: u32, face: u8) -> bool {
        let axis = (face / 2) as usize;
        let step: i64 = if face % 2 == 1 { 1 } else { -1 };
        let old_idx = self.cell_of[p as usize];
        let mut c = self.coords(old_idx);
        let wrapped = (c[axis] == 0 && step == -1) || (c[axis] == self.counts[axis] - 1 && step == 1);
        c[axis] = wrap_coord(c[axis], step, self.counts[axis]);
        let new_idx = self.index(c);

        let cell = &mut self.cells[old_idx];
        if let Some(pos) = cell.iter().position(|&j| j == p) {
            cell.swap_remove(pos);
        }
        self.cells[new_idx].push(p);
        self.cell_of[p as usize] = new_idx;
        wrapped
    }
}

#[inline]
fn wrap_coord(c: usize, d: i64, n: usize) -> usize {
    (c as i64 + d).rem_euclid(n as i64) as usize
}
