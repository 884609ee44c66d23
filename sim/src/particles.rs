//! Particle storage and the explicit update used by the run loop.
//!
//! The update is deliberately minimal (gravity, ground plane, sphere
//! colliders); the MPM transfer and constitutive models live elsewhere.

use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Structure-of-arrays particle state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Particles {
    pub x: Vec<Vector3<f64>>,
    pub v: Vec<Vector3<f64>>,
    pub mass: Vec<f64>,
    /// Phase-field damage in [0, 1]
    pub damage: Vec<f64>,
}

impl Particles {
    pub fn push(&mut self, x: Vector3<f64>, v: Vector3<f64>, mass: f64) {
        self.x.push(x);
        self.v.push(v);
        self.mass.push(mass);
        self.damage.push(0.0);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Largest position difference against another state of the same size.
    pub fn max_deviation(&self, other: &Particles) -> f64 {
        self.x
            .par_iter()
            .zip(other.x.par_iter())
            .map(|(a, b)| (a - b).norm())
            .reduce(|| 0.0, f64::max)
    }
}

/// Rigid sphere pushed against by particles (coupling obstacles).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereCollider {
    pub center: Vector3<f64>,
    pub radius: f64,
}

/// Per-substep environment.
#[derive(Clone, Debug, PartialEq)]
pub struct StepParams {
    pub dt: f64,
    pub gravity: Vector3<f64>,
    /// Height of the ground plane, if any
    pub floor: Option<f64>,
    pub colliders: Vec<SphereCollider>,
    /// 2 or 3; the z component is pinned to zero in 2D
    pub axes: usize,
}

/// Advance every particle by one explicit substep, in parallel.
pub fn step(particles: &mut Particles, params: &StepParams) {
    let dt = params.dt;
    particles
        .x
        .par_iter_mut()
        .zip(particles.v.par_iter_mut())
        .for_each(|(x, v)| {
            *v += params.gravity * dt;
            *x += *v * dt;

            if let Some(floor) = params.floor {
                if x.y < floor {
                    x.y = floor;
                    v.y = v.y.max(0.0);
                }
            }
            for sphere in &params.colliders {
                let offset = *x - sphere.center;
                let dist = offset.norm();
                if dist < sphere.radius && dist > 0.0 {
                    let normal = offset / dist;
                    *x = sphere.center + normal * sphere.radius;
                    let vn = v.dot(&normal);
                    if vn < 0.0 {
                        *v -= normal * vn;
                    }
                }
            }
            if params.axes == 2 {
                x.z = 0.0;
                v.z = 0.0;
            }
        });
}
