use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Boundary policy applied after position integration.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    Wrap,
    Bounce,
}

// Configuration for world properties
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UniverseSection {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_boundary")]
    pub boundary: BoundaryMode,
}

impl Default for UniverseSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            boundary: default_boundary(),
        }
    }
}

fn default_width() -> f32 {
    1280.0
}

fn default_height() -> f32 {
    720.0
}

fn default_boundary() -> BoundaryMode {
    BoundaryMode::Wrap
}

// Population sizes, loaded from config.toml. Optional when a preset is
// selected (presets carry their own sizes).
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct PopulationSection {
    pub species: usize,
    pub particles: usize,
}

/// The eight scalar knobs that seed a scenario: the attraction
/// distribution, the two interaction radius ranges, friction, and the
/// force profile flag.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ScenarioParams {
    pub attract_mean: f32,
    pub attract_std: f32,
    pub min_r_lower: f32,
    pub min_r_upper: f32,
    pub max_r_lower: f32,
    pub max_r_upper: f32,
    pub friction: f32,
    #[serde(default)]
    pub flat_force: bool,
}

/// The `[scenario]` table: either a named preset or the full parameter set.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum ScenarioSection {
    Preset { preset: String },
    Params(ScenarioParams),
}

impl Default for ScenarioSection {
    fn default() -> Self {
        ScenarioSection::Preset { preset: "balanced".to_string() }
    }
}

// Settings for the headless driver loop.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunSection {
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: f64,
    /// Optional RNG seed for reproducible runs; seeded from the OS when
    /// absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            status_interval_secs: default_status_interval(),
            seed: None,
        }
    }
}

fn default_steps() -> u32 {
    1000
}

fn default_status_interval() -> f64 {
    5.0
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub universe: UniverseSection,
    #[serde(default)]
    pub population: Option<PopulationSection>,
    #[serde(default)]
    pub scenario: ScenarioSection,
    #[serde(default)]
    pub run: RunSection,
}

/// A scenario resolved down to concrete sizes and parameters.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedScenario {
    pub species: usize,
    pub particles: usize,
    pub params: ScenarioParams,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;

        if config.universe.width <= 0.0 || config.universe.height <= 0.0 {
            anyhow::bail!(
                "world extent must be positive, got {}x{}",
                config.universe.width,
                config.universe.height
            );
        }
        if let Some(pop) = &config.population {
            if pop.species == 0 {
                anyhow::bail!("species count must be at least 1");
            }
        }
        // Surface unknown presets and missing sections at load time.
        config.resolve_scenario()?;

        Ok(config)
    }

    /// Resolves the scenario table to concrete sizes and parameters. A
    /// `[population]` section overrides a preset's bundled sizes.
    pub fn resolve_scenario(&self) -> Result<ResolvedScenario> {
        match &self.scenario {
            ScenarioSection::Preset { preset } => {
                let found = preset_by_name(preset).ok_or_else(|| {
                    anyhow::anyhow!(
                        "unknown preset '{}' (expected one of: {})",
                        preset,
                        PRESETS.map(|p| p.name).join(", ")
                    )
                })?;
                let (species, particles) = match self.population {
                    Some(pop) => (pop.species, pop.particles),
                    None => (found.species, found.particles),
                };
                Ok(ResolvedScenario { species, particles, params: found.params })
            }
            ScenarioSection::Params(params) => {
                let pop = self.population.ok_or_else(|| {
                    anyhow::anyhow!("a [population] section is required with custom scenario parameters")
                })?;
                Ok(ResolvedScenario {
                    species: pop.species,
                    particles: pop.particles,
                    params: *params,
                })
            }
        }
    }
}

/// A named scenario: population sizes plus the parameter tuple.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub species: usize,
    pub particles: usize,
    pub params: ScenarioParams,
}

#[allow(clippy::too_many_arguments)]
const fn preset(
    name: &'static str,
    species: usize,
    particles: usize,
    attract_mean: f32,
    attract_std: f32,
    min_r_lower: f32,
    min_r_upper: f32,
    max_r_lower: f32,
    max_r_upper: f32,
    friction: f32,
    flat_force: bool,
) -> Preset {
    Preset {
        name,
        species,
        particles,
        params: ScenarioParams {
            attract_mean,
            attract_std,
            min_r_lower,
            min_r_upper,
            max_r_lower,
            max_r_upper,
            friction,
            flat_force,
        },
    }
}

/// The named scenario table. Pure configuration data: each entry binds
/// population sizes to the scenario parameters fed to `Universe::re_seed`.
pub const PRESETS: [Preset; 10] = [
    preset("balanced", 9, 400, -0.02, 0.06, 0.0, 20.0, 20.0, 70.0, 0.05, false),
    preset("chaos", 6, 400, 0.02, 0.04, 0.0, 30.0, 30.0, 100.0, 0.01, false),
    preset("diversity", 12, 400, -0.01, 0.04, 0.0, 20.0, 10.0, 60.0, 0.05, true),
    preset("frictionless", 6, 300, 0.01, 0.005, 10.0, 10.0, 10.0, 60.0, 0.0, true),
    preset("gliders", 6, 400, 0.0, 0.06, 0.0, 20.0, 10.0, 50.0, 0.1, true),
    preset("homogeneity", 4, 400, 0.0, 0.04, 10.0, 10.0, 10.0, 80.0, 0.05, true),
    preset("large-clusters", 6, 400, 0.025, 0.02, 0.0, 30.0, 20.0, 50.0, 0.05, false),
    preset("medium-clusters", 6, 400, 0.02, 0.05, 0.0, 20.0, 20.0, 50.0, 0.05, false),
    preset("quiescence", 6, 300, -0.02, 0.1, 10.0, 20.0, 20.0, 60.0, 0.2, false),
    preset("small-clusters", 6, 600, -0.005, 0.01, 10.0, 10.0, 20.0, 50.0, 0.01, false),
];

/// Case-insensitive preset lookup.
pub fn preset_by_name(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
