//! Conversion between absolute tolerance bands and target-relative offsets.
//!
//! Definition files describe a position as `lower target upper` (absolute
//! percentages). The trading API stores the same three numbers as a target
//! plus a lower and an upper offset from it.
//!
//! ```
//! use modelsync::{Band, Tolerance};
//!
//! let band = Band::new(5.0, 10.0, 20.0);
//! let tol = band.to_tolerance();
//! assert_eq!(tol, Tolerance { target: 10.0, lower_tolerance: 5.0, upper_tolerance: 10.0 });
//! assert_eq!(tol.to_band(), band);
//! ```

/// Absolute bounds around a target, as written in definition files.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Band {
    pub lower_bound: f64,
    pub target: f64,
    pub upper_bound: f64,
}

/// Offsets from the target, as stored server-side.
///
/// Offsets are not sign-checked: a band whose bounds sit on the wrong side of
/// the target yields negative offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance {
    pub target: f64,
    pub lower_tolerance: f64,
    pub upper_tolerance: f64,
}

impl Band {
    pub fn new(lower_bound: f64, target: f64, upper_bound: f64) -> Self {
        Self {
            lower_bound,
            target,
            upper_bound,
        }
    }

    /// File → server direction.
    pub fn to_tolerance(self) -> Tolerance {
        Tolerance {
            target: self.target,
            lower_tolerance: self.target - self.lower_bound,
            upper_tolerance: self.upper_bound - self.target,
        }
    }
}

impl Tolerance {
    pub fn new(target: f64, lower_tolerance: f64, upper_tolerance: f64) -> Self {
        Self {
            target,
            lower_tolerance,
            upper_tolerance,
        }
    }

    /// Server → file direction, the inverse of [`Band::to_tolerance`].
    pub fn to_band(self) -> Band {
        Band {
            lower_bound: self.target - self.lower_tolerance,
            target: self.target,
            upper_bound: self.target + self.upper_tolerance,
        }
    }
}

impl From<Band> for Tolerance {
    fn from(band: Band) -> Self {
        band.to_tolerance()
    }
}

impl From<Tolerance> for Band {
    fn from(tol: Tolerance) -> Self {
        tol.to_band()
    }
}
