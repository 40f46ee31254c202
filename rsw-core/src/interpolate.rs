//! Piecewise-linear interpolation of column profiles
//!
//! The interpolant passes exactly through every breakpoint and is linear between
//! neighbouring breakpoints. Evaluation outside the sampled depth range is an error
//! rather than an extrapolation.

use crate::errors::{RSWError, RSWResult};
use crate::grid::FloatValue;
use crate::profile::ColumnProfile;

/// Linear interpolant over one column profile
///
/// # Examples
///
/// ```rust
/// use rsw_core::interpolate::LinearInterpolant;
/// use rsw_core::profile::ColumnProfile;
///
/// let profile = ColumnProfile::from_samples(vec![0.0, 1.0, 3.0], vec![0.0, 2.0, 6.0]).unwrap();
/// let interp = LinearInterpolant::new(&profile).unwrap();
///
/// assert_eq!(interp.evaluate(2.0).unwrap(), 4.0);
/// assert!(interp.evaluate(3.5).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolant {
    depths: Vec<FloatValue>,
    values: Vec<FloatValue>,
}

impl LinearInterpolant {
    /// Build an interpolant from a profile with at least 2 strictly increasing depths
    pub fn new(profile: &ColumnProfile) -> RSWResult<Self> {
        Self::from_parts(profile.depths().to_vec(), profile.values().to_vec())
    }

    fn from_parts(depths: Vec<FloatValue>, values: Vec<FloatValue>) -> RSWResult<Self> {
        if depths.len() < 2 {
            return Err(RSWError::ProfileTooShort(depths.len()));
        }
        for (index, pair) in depths.windows(2).enumerate() {
            // Negated so that NaN depths are rejected as well
            if !(pair[1] > pair[0]) {
                return Err(RSWError::NonMonotonicProfile {
                    index: index + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }
        Ok(Self { depths, values })
    }

    /// Lowest and highest depth that may be evaluated
    pub fn domain(&self) -> (FloatValue, FloatValue) {
        (self.depths[0], self.depths[self.depths.len() - 1])
    }

    /// Interpolated value at depth `z`
    ///
    /// Breakpoints are returned exactly. A NaN depth yields NaN; any other depth
    /// outside [`Self::domain`] fails with [`RSWError::ExtrapolationNotAllowed`].
    pub fn evaluate(&self, z: FloatValue) -> RSWResult<FloatValue> {
        if z.is_nan() {
            return Ok(FloatValue::NAN);
        }
        let (lower, upper) = self.domain();
        if z < lower || z > upper {
            return Err(RSWError::ExtrapolationNotAllowed {
                target: z,
                lower,
                upper,
            });
        }

        // Count of breakpoints at or below z, at least 1 after the domain check
        let lo = self.depths.partition_point(|&d| d <= z) - 1;
        if self.depths[lo] == z {
            return Ok(self.values[lo]);
        }
        let hi = lo + 1;

        let (d0, d1) = (self.depths[lo], self.depths[hi]);
        let (v0, v1) = (self.values[lo], self.values[hi]);
        Ok(v0 + (z - d0) / (d1 - d0) * (v1 - v0))
    }
}

impl TryFrom<ColumnProfile> for LinearInterpolant {
    type Error = RSWError;

    fn try_from(profile: ColumnProfile) -> Result<Self, Self::Error> {
        let (depths, values) = profile.into_parts();
        Self::from_parts(depths, values)
    }
}
