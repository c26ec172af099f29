use crate::config::ScenarioParams;
use crate::forces::DIAMETER;
use anyhow::Result;
use palette::{FromColor, Hsv, Srgb};
use rand::prelude::*;
use rand::distr::Uniform;
use rand_distr::Normal;

/// Per-(species, species) interaction parameters plus per-species display
/// colors. Backed by flat row-major buffers indexed `i * size + j`.
///
/// Radii are kept symmetric by construction; the attraction coefficient is
/// drawn independently per ordered pair, so `attraction(i, j)` and
/// `attraction(j, i)` generally differ.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesMatrix {
    size: usize,
    attract: Vec<f32>,
    min_r: Vec<f32>,
    max_r: Vec<f32>,
    colors: Vec<Srgb<u8>>,
}

/// Display color for a species index: hue spread evenly around the wheel,
/// value alternating by index parity so neighboring hues stay telling apart.
fn species_color(index: usize, count: usize) -> Srgb<u8> {
    let hue = 360.0 * index as f32 / count as f32;
    let value = (index % 2) as f32 * 0.5 + 0.5;
    Srgb::from_color(Hsv::new(hue, 1.0, value)).into_format()
}

impl SpeciesMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            attract: vec![0.0; size * size],
            min_r: vec![0.0; size * size],
            max_r: vec![0.0; size * size],
            colors: vec![Srgb::new(0, 0, 0); size],
        }
    }

    /// Number of species.
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.size && j < self.size);
        i * self.size + j
    }

    #[inline(always)]
    pub fn attraction(&self, i: usize, j: usize) -> f32 {
        self.attract[self.idx(i, j)]
    }

    #[inline(always)]
    pub fn min_radius(&self, i: usize, j: usize) -> f32 {
        self.min_r[self.idx(i, j)]
    }

    #[inline(always)]
    pub fn max_radius(&self, i: usize, j: usize) -> f32 {
        self.max_r[self.idx(i, j)]
    }

    pub fn color(&self, i: usize) -> Srgb<u8> {
        self.colors[i]
    }

    pub fn set_attraction(&mut self, i: usize, j: usize, value: f32) {
        let idx = self.idx(i, j);
        self.attract[idx] = value;
    }

    pub fn set_min_radius(&mut self, i: usize, j: usize, value: f32) {
        let idx = self.idx(i, j);
        self.min_r[idx] = value;
    }

    pub fn set_max_radius(&mut self, i: usize, j: usize, value: f32) {
        let idx = self.idx(i, j);
        self.max_r[idx] = value;
    }

    /// Resizes to `size` species, keeping the surviving (i, j) block and
    /// zero-filling everything new. Existing entries are not re-randomized.
    pub fn resize(&mut self, size: usize) {
        if size == self.size {
            return;
        }
        let keep = size.min(self.size);
        let mut attract = vec![0.0; size * size];
        let mut min_r = vec![0.0; size * size];
        let mut max_r = vec![0.0; size * size];
        for i in 0..keep {
            for j in 0..keep {
                let src = i * self.size + j;
                let dst = i * size + j;
                attract[dst] = self.attract[src];
                min_r[dst] = self.min_r[src];
                max_r[dst] = self.max_r[src];
            }
        }
        self.attract = attract;
        self.min_r = min_r;
        self.max_r = max_r;
        self.colors.resize(size, Srgb::new(0, 0, 0));
        self.size = size;
    }

    /// Re-draws every interaction parameter from the scenario distributions
    /// and reassigns display colors.
    ///
    /// Attraction is normal(mean, std dev), with the self term forced
    /// non-positive. Radii are uniform draws clamped so that
    /// `max_radius >= min_radius >= DIAMETER` holds for every pair, with
    /// the self minimum pinned to exactly `DIAMETER`. Fails (leaving the
    /// matrix untouched) only if the scenario distributions themselves are
    /// malformed.
    pub fn randomize<R: Rng>(&mut self, params: &ScenarioParams, rng: &mut R) -> Result<()> {
        let attract_dist = Normal::new(params.attract_mean, params.attract_std)
            .map_err(|e| anyhow::anyhow!(
                "invalid attraction distribution (mean {}, std dev {}): {}",
                params.attract_mean, params.attract_std, e
            ))?;
        let min_r_dist = Uniform::new_inclusive(params.min_r_lower, params.min_r_upper)
            .map_err(|e| anyhow::anyhow!(
                "invalid minimum radius range [{}, {}]: {}",
                params.min_r_lower, params.min_r_upper, e
            ))?;
        let max_r_dist = Uniform::new_inclusive(params.max_r_lower, params.max_r_upper)
            .map_err(|e| anyhow::anyhow!(
                "invalid maximum radius range [{}, {}]: {}",
                params.max_r_lower, params.max_r_upper, e
            ))?;

        for i in 0..self.size {
            self.colors[i] = species_color(i, self.size);
            for j in 0..self.size {
                if i == j {
                    // Self term is forced non-positive and the minimum
                    // radius pinned to the separation diameter.
                    self.set_attraction(i, j, -rng.sample(attract_dist).abs());
                    self.set_min_radius(i, j, DIAMETER);
                } else {
                    self.set_attraction(i, j, rng.sample(attract_dist));
                    self.set_min_radius(i, j, rng.sample(min_r_dist).max(DIAMETER));
                }
                self.set_max_radius(i, j, rng.sample(max_r_dist).max(self.min_radius(i, j)));

                // Mirror the radii; attraction stays an independent draw.
                self.set_min_radius(j, i, self.min_radius(i, j));
                self.set_max_radius(j, i, self.max_radius(i, j));
            }
        }
        Ok(())
    }
}
