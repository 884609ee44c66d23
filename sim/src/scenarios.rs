//! Built-in scenario definitions.
//!
//! Each scenario is a numbered initial configuration (geometry, material
//! density, boundary conditions) baked into the executable. All scenarios are
//! deterministic: particle jitter comes from a seeded ChaCha8 stream.

use crate::error::SimError;
use crate::particles::{Particles, SphereCollider};
use launch_core::{Dimension, FractureOptions};
use nalgebra::Vector3;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Axis-aligned block of material sampled on a jittered lattice.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub density: f64,
}

/// A fully configured built-in scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSpec {
    pub name: String,
    pub seed: u64,
    pub dt: f64,       // substep (s)
    pub frame_dt: f64, // output interval (s)
    pub end_frame: u32,
    pub gravity: Vector3<f64>,
    pub floor: Option<f64>,
    pub colliders: Vec<SphereCollider>,
    pub blocks: Vec<Block>,
    /// Lattice spacing used when sampling blocks
    pub dx: f64,
    /// Phase-field defaults; `-p` / `-l0` override them
    pub percentage: f64,
    pub l0_ratio: f64,
    /// Fiber direction for anisotropic materials (unit length, or zero)
    pub fiber: Vector3<f64>,
}

impl SceneSpec {
    fn base(name: &str, seed: u64) -> Self {
        SceneSpec {
            name: name.into(),
            seed,
            dt: 1e-3,
            frame_dt: 1.0 / 24.0,
            end_frame: 24,
            gravity: Vector3::new(0.0, -9.81, 0.0),
            floor: Some(0.0),
            colliders: Vec::new(),
            blocks: Vec::new(),
            dx: 0.05,
            percentage: 0.1,
            l0_ratio: 0.5,
            fiber: Vector3::zeros(),
        }
    }

    /// Scene for a script-driven run. It has no material blocks of its own.
    pub fn scripted() -> Self {
        SceneSpec::base("script", 0)
    }

    /// Sample every block. In 2D only the z = 0 slice is kept.
    pub fn sample(&self, dimension: Dimension) -> Particles {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut particles = Particles::default();
        let jitter = 0.25 * self.dx;
        let cell_volume = self.dx.powi(dimension.axes() as i32);

        for block in &self.blocks {
            let count = |lo: f64, hi: f64| (((hi - lo) / self.dx).floor() as usize).max(1);
            let nx = count(block.min.x, block.max.x);
            let ny = count(block.min.y, block.max.y);
            let nz = match dimension {
                Dimension::TwoD => 1,
                Dimension::ThreeD => count(block.min.z, block.max.z),
            };
            for i in 0..nx {
                for j in 0..ny {
                    for k in 0..nz {
                        let mut x = Vector3::new(
                            block.min.x + (i as f64 + 0.5) * self.dx,
                            block.min.y + (j as f64 + 0.5) * self.dx,
                            block.min.z + (k as f64 + 0.5) * self.dx,
                        );
                        x.x += (rng.gen::<f64>() - 0.5) * jitter;
                        x.y += (rng.gen::<f64>() - 0.5) * jitter;
                        match dimension {
                            Dimension::TwoD => x.z = 0.0,
                            Dimension::ThreeD => x.z += (rng.gen::<f64>() - 0.5) * jitter,
                        }
                        let mut v = block.velocity;
                        if dimension == Dimension::TwoD {
                            v.z = 0.0;
                        }
                        particles.push(x, v, block.density * cell_volume);
                    }
                }
            }
        }
        particles
    }
}

// ---------------------------------------------------------------------------
// Fracture scenarios
// ---------------------------------------------------------------------------

/// Built-in scenarios of the anisotropic fracture executable.
pub struct FractureScenario;

impl FractureScenario {
    pub const NUMBERS: &'static [i32] = &[1, 2, 3, 4, 5];

    /// Build scenario `test_number`. Scenario 4 exists only in 3D.
    pub fn build(
        test_number: i32,
        dimension: Dimension,
        options: &FractureOptions,
    ) -> Result<SceneSpec, SimError> {
        let mut spec = match (test_number, dimension) {
            (1, _) => Self::tension_strip(),
            (2, _) => Self::fiber_tear(options.helper),
            (3, _) => Self::dropped_plate(),
            (4, Dimension::ThreeD) => Self::twisted_rod(),
            (5, _) => Self::meat_tear(),
            _ => {
                return Err(SimError::UnknownScenario {
                    test_number,
                    dimension,
                })
            }
        };
        let a = Vector3::from(options.a);
        if a.norm() > 0.0 {
            spec.fiber = a.normalize();
        }
        Ok(spec)
    }

    fn tension_strip() -> SceneSpec {
        let mut spec = SceneSpec::base("tension_strip", 1);
        spec.gravity = Vector3::zeros();
        spec.floor = None;
        spec.blocks = vec![
            block([0.0, 0.4, 0.0], [0.5, 0.6, 0.1], [-0.2, 0.0, 0.0], 2.0),
            block([0.5, 0.4, 0.0], [1.0, 0.6, 0.1], [0.2, 0.0, 0.0], 2.0),
        ];
        spec.fiber = Vector3::x();
        spec
    }

    /// `helper` selects the fiber angle in 15-degree steps.
    fn fiber_tear(helper: i32) -> SceneSpec {
        let mut spec = SceneSpec::base("fiber_tear", 2);
        spec.blocks = vec![block([0.2, 0.2, 0.2], [0.8, 0.5, 0.5], [0.0, 0.0, 0.0], 2.0)];
        let angle = (helper as f64 * 15.0).to_radians();
        spec.fiber = Vector3::new(angle.cos(), angle.sin(), 0.0);
        spec.percentage = 0.15;
        spec
    }

    fn dropped_plate() -> SceneSpec {
        let mut spec = SceneSpec::base("dropped_plate", 3);
        spec.blocks = vec![block([0.3, 0.6, 0.3], [0.7, 0.7, 0.7], [0.0, -2.0, 0.0], 2.0)];
        spec.end_frame = 48;
        spec
    }

    fn twisted_rod() -> SceneSpec {
        let mut spec = SceneSpec::base("twisted_rod", 4);
        spec.gravity = Vector3::zeros();
        spec.floor = None;
        spec.blocks = vec![block([0.45, 0.1, 0.45], [0.55, 0.9, 0.55], [0.0, 0.0, 0.0], 2.0)];
        spec.fiber = Vector3::y();
        spec.dx = 0.025;
        spec
    }

    fn meat_tear() -> SceneSpec {
        let mut spec = SceneSpec::base("meat_tear", 5);
        spec.gravity = Vector3::zeros();
        spec.floor = None;
        spec.blocks = vec![
            block([0.2, 0.3, 0.3], [0.5, 0.6, 0.6], [-0.3, 0.0, 0.0], 1.5),
            block([0.5, 0.3, 0.3], [0.8, 0.6, 0.6], [0.3, 0.0, 0.0], 1.5),
        ];
        spec.fiber = Vector3::new(1.0, 1.0, 0.0).normalize();
        spec.percentage = 0.2;
        spec.l0_ratio = 0.75;
        spec
    }
}

// ---------------------------------------------------------------------------
// Coupling scenarios
// ---------------------------------------------------------------------------

/// Built-in scenarios of the multi-physics coupling executable.
pub struct CouplingScenario;

impl CouplingScenario {
    pub const NUMBERS: &'static [i32] = &[1, 2, 3];

    pub fn build(test_number: i32, dimension: Dimension) -> Result<SceneSpec, SimError> {
        match test_number {
            1 => Ok(Self::sand_on_ball()),
            2 => Ok(Self::block_on_block()),
            3 => Ok(Self::wall_impact()),
            _ => Err(SimError::UnknownScenario {
                test_number,
                dimension,
            }),
        }
    }

    fn sand_on_ball() -> SceneSpec {
        let mut spec = SceneSpec::base("sand_on_ball", 11);
        spec.blocks = vec![block([0.35, 0.7, 0.35], [0.65, 0.9, 0.65], [0.0, 0.0, 0.0], 1.6)];
        spec.colliders = vec![SphereCollider {
            center: Vector3::new(0.5, 0.35, 0.0),
            radius: 0.15,
        }];
        spec
    }

    fn block_on_block() -> SceneSpec {
        let mut spec = SceneSpec::base("block_on_block", 12);
        spec.blocks = vec![
            block([0.3, 0.0, 0.3], [0.7, 0.2, 0.7], [0.0, 0.0, 0.0], 3.0),
            block([0.4, 0.5, 0.4], [0.6, 0.7, 0.6], [0.0, -1.0, 0.0], 1.0),
        ];
        spec
    }

    fn wall_impact() -> SceneSpec {
        let mut spec = SceneSpec::base("wall_impact", 13);
        spec.gravity = Vector3::zeros();
        spec.floor = None;
        spec.blocks = vec![block([0.1, 0.4, 0.4], [0.3, 0.6, 0.6], [3.0, 0.0, 0.0], 2.0)];
        spec.colliders = vec![SphereCollider {
            center: Vector3::new(1.6, 0.5, 0.0),
            radius: 1.0,
        }];
        spec
    }
}

// ---------------------------------------------------------------------------
// Builder helpers
// ---------------------------------------------------------------------------

fn block(min: [f64; 3], max: [f64; 3], velocity: [f64; 3], density: f64) -> Block {
    Block {
        min: Vector3::from(min),
        max: Vector3::from(max),
        velocity: Vector3::from(velocity),
        density,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fracture_scenario_builds_in_3d() {
        for &n in FractureScenario::NUMBERS {
            let spec = FractureScenario::build(n, Dimension::ThreeD, &FractureOptions::default())
                .unwrap_or_else(|e| panic!("scenario {n}: {e}"));
            assert!(!spec.sample(Dimension::ThreeD).is_empty(), "scenario {n}");
        }
    }

    #[test]
    fn three_d_only_scenario_rejected_in_2d() {
        let err = FractureScenario::build(4, Dimension::TwoD, &FractureOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::UnknownScenario {
                test_number: 4,
                dimension: Dimension::TwoD
            }
        ));
    }

    #[test]
    fn unknown_coupling_scenario() {
        assert!(CouplingScenario::build(42, Dimension::TwoD).is_err());
        for &n in CouplingScenario::NUMBERS {
            assert!(CouplingScenario::build(n, Dimension::TwoD).is_ok());
        }
    }

    #[test]
    fn sampling_is_deterministic() {
        let spec = CouplingScenario::build(2, Dimension::ThreeD).unwrap();
        assert_eq!(spec.sample(Dimension::ThreeD), spec.sample(Dimension::ThreeD));
    }

    #[test]
    fn two_d_sampling_is_planar_and_smaller() {
        let options = FractureOptions::default();
        let spec = FractureScenario::build(3, Dimension::TwoD, &options).unwrap();
        let flat = spec.sample(Dimension::TwoD);
        let full = spec.sample(Dimension::ThreeD);
        assert!(flat.x.iter().all(|x| x.z == 0.0));
        assert!(flat.len() < full.len());
    }

    #[test]
    fn fiber_flag_overrides_scenario_direction() {
        let options = FractureOptions {
            a: [0.0, 2.0, 0.0],
            ..Default::default()
        };
        let spec = FractureScenario::build(1, Dimension::TwoD, &options).unwrap();
        assert_eq!(spec.fiber, Vector3::y());
    }
}
