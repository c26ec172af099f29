use crate::config::ScenarioParams;
use crate::forces::{self, DIAMETER, MIN_INTERACTION_DIST_SQ};
use crate::particles::{Particle, ParticleSet};
use crate::species::SpeciesMatrix;
use crate::vecmath::Vec2;
use anyhow::Result;
use log::debug;
use rand::prelude::*;
use rayon::prelude::*;

/// Distance within which `find_nearest` considers a particle pickable,
/// in world units.
pub const PICK_RADIUS: f32 = 5.0;

/// World extent, boundary policy, and the global integration knobs.
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub wrap: bool,
    pub friction: f32,
    pub flat_force: bool,
}

/// The simulation context: sole owner and mutator of the species matrix,
/// the particle population, and the world parameters. External consumers
/// (renderers, controllers) only read through the accessors.
pub struct Universe {
    world: WorldConfig,
    matrix: SpeciesMatrix,
    particles: ParticleSet,
    rng: StdRng,
}

/// Minimally wraps an axis delta into `[-extent/2, extent/2]`.
#[inline(always)]
fn wrap_delta(d: f32, extent: f32) -> f32 {
    if d > extent * 0.5 {
        d - extent
    } else if d < -extent * 0.5 {
        d + extent
    } else {
        d
    }
}

impl Universe {
    /// Creates a universe with an OS-seeded RNG. Species parameters and
    /// particle states start zeroed; call `re_seed` to randomize them.
    pub fn new(species: usize, particles: usize, width: f32, height: f32) -> Result<Self> {
        Self::with_rng(species, particles, width, height, StdRng::from_os_rng())
    }

    /// Creates a universe with a fixed RNG seed, for reproducible runs.
    pub fn with_seed(
        species: usize,
        particles: usize,
        width: f32,
        height: f32,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(species, particles, width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        species: usize,
        particles: usize,
        width: f32,
        height: f32,
        rng: StdRng,
    ) -> Result<Self> {
        if species == 0 {
            anyhow::bail!("species count must be at least 1");
        }
        if width <= 0.0 || height <= 0.0 {
            anyhow::bail!("world extent must be positive, got {}x{}", width, height);
        }
        Ok(Self {
            world: WorldConfig {
                width,
                height,
                wrap: true,
                friction: 0.0,
                flat_force: false,
            },
            matrix: SpeciesMatrix::new(species),
            particles: ParticleSet::new(particles),
            rng,
        })
    }

    /// Resizes the species matrix and particle population, zero-filling
    /// new entries without re-randomizing surviving ones. Rejects an empty
    /// species set and leaves prior state untouched on failure.
    pub fn set_population(&mut self, species: usize, particles: usize) -> Result<()> {
        if species == 0 {
            anyhow::bail!("species count must be at least 1");
        }
        debug!("Resizing population to {} species, {} particles.", species, particles);
        self.matrix.resize(species);
        self.particles.resize(particles);
        // Surviving particles must keep indexing into the matrix.
        for p in self.particles.as_mut_slice() {
            if p.species >= species {
                p.species = species - 1;
            }
        }
        Ok(())
    }

    /// Applies a new scenario: re-randomizes the species matrix and the
    /// particle population, and installs the scenario's friction and force
    /// profile. Fails on malformed parameters, leaving prior state intact.
    pub fn re_seed(&mut self, params: &ScenarioParams) -> Result<()> {
        if !(0.0..1.0).contains(&params.friction) {
            anyhow::bail!("friction must be in [0, 1), got {}", params.friction);
        }
        self.matrix.randomize(params, &mut self.rng)?;
        self.particles
            .randomize(self.matrix.size(), self.world.width, self.world.height, &mut self.rng)?;
        self.world.friction = params.friction;
        self.world.flat_force = params.flat_force;
        debug!(
            "Re-seeded universe: {} species, {} particles, friction {}, {} force profile.",
            self.matrix.size(),
            self.particles.len(),
            params.friction,
            if params.flat_force { "flat" } else { "tent" }
        );
        Ok(())
    }

    /// Re-randomizes particle positions, velocities, and species while
    /// keeping the interaction rules untouched.
    pub fn set_random_particles(&mut self) -> Result<()> {
        self.particles
            .randomize(self.matrix.size(), self.world.width, self.world.height, &mut self.rng)
    }

    /// Flips between toroidal wrap and elastic bounce boundaries.
    pub fn toggle_wrap(&mut self) {
        self.world.wrap = !self.world.wrap;
    }

    /// Advances the simulation by one tick.
    ///
    /// Two passes over the whole population: a read-only force pass that
    /// evaluates every ordered pair against the pre-tick snapshot and
    /// produces per-particle velocity deltas, then a write-only
    /// integration pass that accumulates the delta into the velocity,
    /// advances the position, damps, and applies the boundary policy.
    /// Both passes are data-parallel across particles.
    pub fn step(&mut self) {
        let world = self.world;
        let matrix = &self.matrix;
        let snapshot = self.particles.as_slice();

        let deltas: Vec<Vec2> = snapshot
            .par_iter()
            .map(|p| {
                let mut dv = Vec2::zero();
                for q in snapshot {
                    let mut dx = q.pos.x - p.pos.x;
                    let mut dy = q.pos.y - p.pos.y;
                    if world.wrap {
                        dx = wrap_delta(dx, world.width);
                        dy = wrap_delta(dy, world.height);
                    }

                    // Early out before the square root; this also drops
                    // self-pairs and near-coincident pairs.
                    let r2 = dx * dx + dy * dy;
                    let max_r = matrix.max_radius(p.species, q.species);
                    if r2 > max_r * max_r || r2 < MIN_INTERACTION_DIST_SQ {
                        continue;
                    }

                    let r = r2.sqrt();
                    let f = forces::force_magnitude(
                        r,
                        matrix.attraction(p.species, q.species),
                        matrix.min_radius(p.species, q.species),
                        max_r,
                        world.flat_force,
                    );
                    dv.x += f * dx / r;
                    dv.y += f * dy / r;
                }
                dv
            })
            .collect();

        self.particles
            .as_mut_slice()
            .par_iter_mut()
            .zip(deltas.par_iter())
            .for_each(|(p, dv)| {
                p.vel = p.vel.add(*dv);
                p.pos = p.pos.add(p.vel);
                p.vel = p.vel.scale(1.0 - world.friction);

                if world.wrap {
                    if p.pos.x < 0.0 {
                        p.pos.x += world.width;
                    } else if p.pos.x >= world.width {
                        p.pos.x -= world.width;
                    }
                    if p.pos.y < 0.0 {
                        p.pos.y += world.height;
                    } else if p.pos.y >= world.height {
                        p.pos.y -= world.height;
                    }
                } else {
                    if p.pos.x < DIAMETER {
                        p.vel.x = -p.vel.x;
                        p.pos.x = DIAMETER;
                    } else if p.pos.x >= world.width - DIAMETER {
                        p.vel.x = -p.vel.x;
                        p.pos.x = world.width - DIAMETER;
                    }
                    if p.pos.y < DIAMETER {
                        p.vel.y = -p.vel.y;
                        p.pos.y = DIAMETER;
                    } else if p.pos.y >= world.height - DIAMETER {
                        p.vel.y = -p.vel.y;
                        p.pos.y = world.height - DIAMETER;
                    }
                }
            });
    }

    /// Index of the nearest particle within `PICK_RADIUS` of a world-space
    /// point, if any. Used by click-to-follow style consumers.
    pub fn find_nearest(&self, x: f32, y: f32) -> Option<usize> {
        let target = Vec2::new(x, y);
        let mut best: Option<(usize, f32)> = None;
        for (i, p) in self.particles.as_slice().iter().enumerate() {
            let d2 = p.pos.distance_squared(target);
            if d2 < PICK_RADIUS * PICK_RADIUS && best.is_none_or(|(_, b)| d2 < b) {
                best = Some((i, d2));
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.as_slice()
    }

    pub fn species_count(&self) -> usize {
        self.matrix.size()
    }

    /// Read access to the species-pair parameters and display colors.
    pub fn species(&self) -> &SpeciesMatrix {
        &self.matrix
    }

    pub fn world(&self) -> &WorldConfig {
        &self.world
    }

    /// Logs the interaction matrices row by row, for diagnostics.
    pub fn log_params(&self) {
        let k = self.matrix.size();
        let row = |get: &dyn Fn(usize, usize) -> f32, i: usize| -> String {
            (0..k).map(|j| format!("{:8.3}", get(i, j))).collect::<Vec<_>>().join(" ")
        };
        debug!("Attraction:");
        for i in 0..k {
            debug!("  {}", row(&|i, j| self.matrix.attraction(i, j), i));
        }
        debug!("MinR:");
        for i in 0..k {
            debug!("  {}", row(&|i, j| self.matrix.min_radius(i, j), i));
        }
        debug!("MaxR:");
        for i in 0..k {
            debug!("  {}", row(&|i, j| self.matrix.max_radius(i, j), i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::preset_by_name;

    fn quiet_world(species: usize, particles: usize, width: f32, height: f32) -> Universe {
        // Zeroed matrix: every pair has max_r == 0, so no forces act.
        Universe::with_seed(species, particles, width, height, 1).unwrap()
    }

    #[test]
    fn rejects_empty_species_set() {
        assert!(Universe::new(0, 10, 100.0, 100.0).is_err());
        assert!(Universe::new(3, 10, 0.0, 100.0).is_err());
    }

    #[test]
    fn wrap_carries_particles_across_the_far_edge() {
        let mut universe = quiet_world(1, 1, 100.0, 100.0);
        universe.particles.as_mut_slice()[0] = Particle {
            pos: Vec2::new(99.9, 50.0),
            vel: Vec2::new(0.2, 0.0),
            species: 0,
        };

        universe.step();

        let p = universe.particle(0).unwrap();
        assert!((p.pos.x - 0.1).abs() < 1e-4);
        assert!(p.pos.x >= 0.0 && p.pos.x < 100.0);
    }

    #[test]
    fn wrap_carries_particles_across_the_near_edge() {
        let mut universe = quiet_world(1, 1, 100.0, 80.0);
        universe.particles.as_mut_slice()[0] = Particle {
            pos: Vec2::new(50.0, 0.5),
            vel: Vec2::new(0.0, -2.0),
            species: 0,
        };

        universe.step();

        let p = universe.particle(0).unwrap();
        assert!((p.pos.y - 78.5).abs() < 1e-4);
    }

    #[test]
    fn bounce_clamps_and_reflects_at_the_near_edge() {
        let mut universe = quiet_world(1, 1, 100.0, 100.0);
        universe.toggle_wrap();
        universe.particles.as_mut_slice()[0] = Particle {
            pos: Vec2::new(3.0, 50.0),
            vel: Vec2::new(-2.0, 0.0),
            species: 0,
        };

        universe.step();

        let p = universe.particle(0).unwrap();
        assert_eq!(p.pos.x, DIAMETER);
        assert_eq!(p.vel.x, 2.0);
    }

    #[test]
    fn bounce_clamps_and_reflects_at_the_far_edge() {
        let mut universe = quiet_world(1, 1, 100.0, 100.0);
        universe.toggle_wrap();
        universe.particles.as_mut_slice()[0] = Particle {
            pos: Vec2::new(97.5, 50.0),
            vel: Vec2::new(3.0, 0.0),
            species: 0,
        };

        universe.step();

        let p = universe.particle(0).unwrap();
        assert_eq!(p.pos.x, 100.0 - DIAMETER);
        assert_eq!(p.vel.x, -3.0);
    }

    #[test]
    fn friction_damps_velocity_after_the_move() {
        let mut universe = quiet_world(1, 1, 100.0, 100.0);
        universe.world.friction = 0.5;
        universe.particles.as_mut_slice()[0] = Particle {
            pos: Vec2::new(50.0, 50.0),
            vel: Vec2::new(1.0, 0.0),
            species: 0,
        };

        universe.step();

        let p = universe.particle(0).unwrap();
        // Full velocity applied to the position, then damped.
        assert_eq!(p.pos.x, 51.0);
        assert_eq!(p.vel.x, 0.5);
    }

    #[test]
    fn flat_band_pair_attracts_mutually() {
        let mut universe = quiet_world(2, 2, 100.0, 100.0);
        universe.toggle_wrap();
        universe.world.flat_force = true;
        for (i, j) in [(0, 1), (1, 0)] {
            universe.matrix.set_attraction(i, j, 5.0);
            universe.matrix.set_min_radius(i, j, 2.0);
            universe.matrix.set_max_radius(i, j, 10.0);
        }
        let particles = universe.particles.as_mut_slice();
        particles[0] = Particle { pos: Vec2::new(40.0, 50.0), vel: Vec2::zero(), species: 0 };
        particles[1] = Particle { pos: Vec2::new(45.0, 50.0), vel: Vec2::zero(), species: 1 };

        universe.step();

        // Constant force 5 over unit direction, applied once before the
        // position update, with no damping.
        let p0 = universe.particle(0).unwrap();
        let p1 = universe.particle(1).unwrap();
        assert_eq!(p0.vel.x, 5.0);
        assert_eq!(p1.vel.x, -5.0);
        assert_eq!(p0.pos.x, 45.0);
        assert_eq!(p1.pos.x, 40.0);
        assert_eq!(p0.pos.y, 50.0);
        assert_eq!(p1.pos.y, 50.0);
    }

    #[test]
    fn core_zone_pair_repels() {
        let mut universe = quiet_world(2, 2, 100.0, 100.0);
        universe.toggle_wrap();
        for (i, j) in [(0, 1), (1, 0)] {
            universe.matrix.set_attraction(i, j, 5.0);
            universe.matrix.set_min_radius(i, j, 4.0);
            universe.matrix.set_max_radius(i, j, 10.0);
        }
        let particles = universe.particles.as_mut_slice();
        particles[0] = Particle { pos: Vec2::new(49.0, 50.0), vel: Vec2::zero(), species: 0 };
        particles[1] = Particle { pos: Vec2::new(51.0, 50.0), vel: Vec2::zero(), species: 1 };

        universe.step();

        // Inside the hard core the pair pushes apart regardless of the
        // attraction coefficient.
        assert!(universe.particle(0).unwrap().vel.x < 0.0);
        assert!(universe.particle(1).unwrap().vel.x > 0.0);
    }

    #[test]
    fn forces_reach_across_the_wrap_seam() {
        let mut universe = quiet_world(2, 2, 100.0, 100.0);
        universe.world.flat_force = true;
        for (i, j) in [(0, 1), (1, 0)] {
            universe.matrix.set_attraction(i, j, 5.0);
            universe.matrix.set_min_radius(i, j, 0.5);
            universe.matrix.set_max_radius(i, j, 10.0);
        }
        let particles = universe.particles.as_mut_slice();
        particles[0] = Particle { pos: Vec2::new(1.0, 50.0), vel: Vec2::zero(), species: 0 };
        particles[1] = Particle { pos: Vec2::new(99.0, 50.0), vel: Vec2::zero(), species: 1 };

        universe.step();

        // The minimal wrapped delta points across the seam: particle 0 is
        // pulled toward negative x and wraps to the far side.
        let p0 = universe.particle(0).unwrap();
        assert_eq!(p0.vel.x, -5.0);
        assert_eq!(p0.pos.x, 96.0);
    }

    #[test]
    fn velocity_accumulates_rather_than_overwrites() {
        let mut universe = quiet_world(2, 2, 100.0, 100.0);
        universe.toggle_wrap();
        universe.world.flat_force = true;
        for (i, j) in [(0, 1), (1, 0)] {
            universe.matrix.set_attraction(i, j, 2.0);
            universe.matrix.set_min_radius(i, j, 2.0);
            universe.matrix.set_max_radius(i, j, 10.0);
        }
        let particles = universe.particles.as_mut_slice();
        particles[0] = Particle { pos: Vec2::new(40.0, 50.0), vel: Vec2::new(1.0, 0.0), species: 0 };
        particles[1] = Particle { pos: Vec2::new(45.0, 50.0), vel: Vec2::zero(), species: 1 };

        universe.step();

        assert_eq!(universe.particle(0).unwrap().vel.x, 3.0);
    }

    #[test]
    fn set_random_particles_keeps_the_rules() {
        let mut universe = Universe::with_seed(6, 100, 200.0, 200.0, 3).unwrap();
        let params = preset_by_name("balanced").unwrap().params;
        universe.re_seed(&params).unwrap();

        let rules_before = universe.matrix.clone();
        let positions_before: Vec<Vec2> =
            universe.particles().iter().map(|p| p.pos).collect();

        universe.set_random_particles().unwrap();
        universe.set_random_particles().unwrap();

        assert_eq!(universe.matrix, rules_before);
        assert_eq!(universe.species_count(), 6);
        assert_eq!(universe.particle_count(), 100);
        let positions_after: Vec<Vec2> =
            universe.particles().iter().map(|p| p.pos).collect();
        assert_ne!(positions_before, positions_after);
    }

    #[test]
    fn set_population_rejects_zero_species_untouched() {
        let mut universe = Universe::with_seed(4, 10, 100.0, 100.0, 5).unwrap();
        universe.matrix.set_attraction(2, 3, 0.7);

        assert!(universe.set_population(0, 50).is_err());
        assert_eq!(universe.species_count(), 4);
        assert_eq!(universe.particle_count(), 10);
        assert_eq!(universe.matrix.attraction(2, 3), 0.7);
    }

    #[test]
    fn set_population_zero_fills_without_reseeding() {
        let mut universe = Universe::with_seed(4, 10, 100.0, 100.0, 5).unwrap();
        let params = preset_by_name("balanced").unwrap().params;
        universe.re_seed(&params).unwrap();
        let kept = universe.matrix.attraction(1, 2);

        universe.set_population(6, 20).unwrap();
        assert_eq!(universe.species_count(), 6);
        assert_eq!(universe.particle_count(), 20);
        assert_eq!(universe.matrix.attraction(1, 2), kept);
        assert_eq!(universe.matrix.attraction(5, 5), 0.0);
        assert_eq!(universe.particle(19).unwrap().vel, Vec2::zero());
    }

    #[test]
    fn shrinking_species_keeps_particle_ids_in_range() {
        let mut universe = Universe::with_seed(8, 50, 100.0, 100.0, 9).unwrap();
        universe.set_random_particles().unwrap();

        universe.set_population(3, 50).unwrap();
        assert!(universe.particles().iter().all(|p| p.species < 3));

        // step stays total over the shrunk state
        universe.step();
    }

    #[test]
    fn find_nearest_picks_the_closest_within_radius() {
        let mut universe = quiet_world(1, 3, 100.0, 100.0);
        let particles = universe.particles.as_mut_slice();
        particles[0].pos = Vec2::new(10.0, 10.0);
        particles[1].pos = Vec2::new(12.0, 10.0);
        particles[2].pos = Vec2::new(13.0, 10.0);

        assert_eq!(universe.find_nearest(12.4, 10.0), Some(1));
        assert_eq!(universe.find_nearest(50.0, 50.0), None);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let params = preset_by_name("medium-clusters").unwrap().params;
        let mut a = Universe::with_seed(6, 120, 300.0, 200.0, 42).unwrap();
        let mut b = Universe::with_seed(6, 120, 300.0, 200.0, 42).unwrap();
        a.re_seed(&params).unwrap();
        b.re_seed(&params).unwrap();

        for _ in 0..20 {
            a.step();
            b.step();
        }
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn reseed_rejects_out_of_range_friction() {
        let mut universe = Universe::with_seed(3, 10, 100.0, 100.0, 0).unwrap();
        let mut params = preset_by_name("balanced").unwrap().params;
        params.friction = 1.0;
        assert!(universe.re_seed(&params).is_err());
        params.friction = -0.1;
        assert!(universe.re_seed(&params).is_err());
    }
}
