use crate::vecmath::Vec2;
use anyhow::Result;
use rand::prelude::*;
use rand::distr::Uniform;
use rand_distr::Normal;

/// A single point particle. Kept as a contiguous array-of-structs for
/// cache locality in the pairwise force pass.
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub species: usize,
}

/// The full particle population. Owned by the `Universe`, which is its
/// sole mutator; everything else reads it through shared references.
#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    pub fn new(count: usize) -> Self {
        Self { particles: vec![Particle::default(); count] }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Grows or shrinks the population to `count`. New particles are
    /// zero-initialized (origin, at rest, species 0); surviving particles
    /// keep their state.
    pub fn resize(&mut self, count: usize) {
        self.particles.resize(count, Particle::default());
    }

    /// Re-draws every particle's species, position, and velocity.
    ///
    /// Species ids are a continuous uniform draw over `[0, count - 1]`
    /// rounded to the nearest integer. Positions land in the central 50%
    /// of the world along each axis. Velocities are standard normal draws
    /// scaled by 0.2.
    pub fn randomize<R: Rng>(
        &mut self,
        species_count: usize,
        width: f32,
        height: f32,
        rng: &mut R,
    ) -> Result<()> {
        if species_count == 0 {
            anyhow::bail!("species count must be at least 1");
        }
        let species_dist = Uniform::new_inclusive(0.0f32, (species_count - 1) as f32)?;
        let unit_dist = Uniform::new(0.0f32, 1.0f32)?;
        let vel_dist = Normal::new(0.0f32, 1.0f32)
            .map_err(|e| anyhow::anyhow!("invalid velocity distribution: {}", e))?;

        for p in &mut self.particles {
            p.species = rng.sample(species_dist).round() as usize;
            // The axis scales are intentionally swapped relative to the
            // world extents (x by height, y by width), matching the
            // reference generator. Whether that is aspect-ratio
            // compensation or an upstream defect is unclear, so the
            // coupling is preserved as-is.
            p.pos.x = (rng.sample(unit_dist) * 0.5 + 0.25) * height;
            p.pos.y = (rng.sample(unit_dist) * 0.5 + 0.25) * width;
            p.vel.x = rng.sample(vel_dist) * 0.2;
            p.vel.y = rng.sample(vel_dist) * 0.2;
        }
        Ok(())
    }
}
