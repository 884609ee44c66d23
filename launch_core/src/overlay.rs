//! Configuration-only overlays attached to a simulation before it initializes.

/// Differential-test instrumentation. Present only when `--run_diff_test` is given.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffTestOverlay {
    /// Scale applied by the simulation's own perturbation logic.
    pub perturbation_scale: f64,
}

impl DiffTestOverlay {
    pub const DEFAULT_SCALE: f64 = 1.0;

    /// `None` when disabled; the scale is irrelevant in that case.
    pub fn from_flags(enabled: bool, perturbation_scale: f64) -> Option<Self> {
        enabled.then_some(DiffTestOverlay { perturbation_scale })
    }
}

/// Phase-field overrides from `-p` / `-l0`.
///
/// Applied after the scene is built on both the scripted and the built-in
/// path, so a supplied flag overrides whatever the script or scenario set.
/// Unset fields leave the scene's own value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseFieldOverlay {
    pub percentage: Option<f64>,
    pub l0_ratio: Option<f64>,
}

impl PhaseFieldOverlay {
    pub fn is_empty(&self) -> bool {
        self.percentage.is_none() && self.l0_ratio.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_overlay_is_absent() {
        assert_eq!(DiffTestOverlay::from_flags(false, 3.0), None);
        assert_eq!(
            DiffTestOverlay::from_flags(true, 0.25),
            Some(DiffTestOverlay {
                perturbation_scale: 0.25
            })
        );
    }

    #[test]
    fn phase_field_empty_only_without_values() {
        assert!(PhaseFieldOverlay::default().is_empty());
        let overlay = PhaseFieldOverlay {
            l0_ratio: Some(0.5),
            ..Default::default()
        };
        assert!(!overlay.is_empty());
    }
}
