//! Small value types shared by the registry, the dispatcher and the simulation kinds.

use std::fmt;

// ---------------------------------------------------------------------------
// Flavor: which executable is being launched
// ---------------------------------------------------------------------------

/// The executable family. Both share the dispatch logic; the flavor only
/// decides which extra flags are registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Anisotropic fracture: adds fiber/material-model flags.
    Fracture,
    /// Multi-physics coupling: adds `-disablerestart`.
    Coupling,
}

impl Flavor {
    pub fn program_name(self) -> &'static str {
        match self {
            Flavor::Fracture => "anisofracture",
            Flavor::Coupling => "coupling",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program_name())
    }
}

// ---------------------------------------------------------------------------
// Dimension
// ---------------------------------------------------------------------------

/// Spatial dimension of a run, chosen at runtime with `--3d`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dimension {
    #[default]
    TwoD,
    ThreeD,
}

impl Dimension {
    pub fn from_three_d(three_d: bool) -> Self {
        if three_d {
            Dimension::ThreeD
        } else {
            Dimension::TwoD
        }
    }

    /// Number of active spatial axes.
    pub fn axes(self) -> usize {
        match self {
            Dimension::TwoD => 2,
            Dimension::ThreeD => 3,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::TwoD => f.write_str("2D"),
            Dimension::ThreeD => f.write_str("3D"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run mode
// ---------------------------------------------------------------------------

/// Whether the run starts from scratch or resumes a checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    FreshStart,
    Restart { frame: u32 },
}

impl RunMode {
    /// Frame 0 means a fresh start; any other frame resumes from that checkpoint.
    pub fn from_restart_frame(frame: u32) -> Self {
        if frame == 0 {
            RunMode::FreshStart
        } else {
            RunMode::Restart { frame }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frame_is_fresh_start() {
        assert_eq!(RunMode::from_restart_frame(0), RunMode::FreshStart);
        assert_eq!(
            RunMode::from_restart_frame(12),
            RunMode::Restart { frame: 12 }
        );
    }

    #[test]
    fn dimension_from_flag() {
        assert_eq!(Dimension::from_three_d(false), Dimension::TwoD);
        assert_eq!(Dimension::from_three_d(true).axes(), 3);
        assert_eq!(Dimension::ThreeD.to_string(), "3D");
    }
}
