//! Sachs-Wolfe line-of-sight integrals
//!
//! For one grid column the integral of the potential time-derivative along the depth
//! axis is
//!
//! $$ I_{ij} = \int_0^{z_{max}} \dot\Phi_{ij}(z)\,dz $$
//!
//! where $\dot\Phi_{ij}$ is the linear interpolant of the column samples and
//! $z_{max}$ the upper bound of the field variant.
//!
//! The depth derivative splits the same integral into per-cell contributions. With
//! $T_k$ the integral from the lower edge of cell $k$ to $z_{max}$, the contribution
//! of cell $k$ is $\Delta T_k = T_k - T_{k+1}$ ($\Delta T_{N-1} = T_{N-1}$) and the
//! radial derivative is $\Delta T_k / (L/N)$.

use crate::config::{DifferenceConvention, IntegrationParameters};
use crate::errors::RSWResult;
use crate::grid::{FieldVariant, FloatValue, GridStore};
use crate::interpolate::LinearInterpolant;
use crate::profile::ColumnProfileBuilder;
use crate::quadrature::SimpsonIntegrator;

/// Partial integrals and radial derivative for every cell of one column
#[derive(Debug, Clone, PartialEq)]
pub struct DepthDerivative {
    /// Stored depth of each cell
    pub depths: Vec<FloatValue>,
    /// `T[k]`: integral from the lower edge of cell `k` to the upper bound
    pub partial_integrals: Vec<FloatValue>,
    /// `ΔT[k]`
    pub differences: Vec<FloatValue>,
    /// `dT/dr[k] = ΔT[k] / (L/N)`
    pub derivatives: Vec<FloatValue>,
}

impl DepthDerivative {
    pub fn len(&self) -> usize {
        self.derivatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.derivatives.is_empty()
    }

    pub fn into_derivatives(self) -> Vec<FloatValue> {
        self.derivatives
    }
}

/// Computes column integrals over a read-only grid
#[derive(Debug, Clone, Copy)]
pub struct SWIntegralComputer<'a> {
    grid: &'a GridStore,
    profiles: ColumnProfileBuilder<'a>,
    simpson: SimpsonIntegrator,
}

impl<'a> SWIntegralComputer<'a> {
    /// Fails with `QuadratureConfiguration` if the step count is odd or zero
    pub fn new(grid: &'a GridStore, integration: &'a IntegrationParameters) -> RSWResult<Self> {
        Ok(Self {
            grid,
            profiles: ColumnProfileBuilder::new(grid, integration),
            simpson: SimpsonIntegrator::new(integration.n_steps)?,
        })
    }

    pub fn grid(&self) -> &'a GridStore {
        self.grid
    }

    pub fn upper_bound(&self, variant: FieldVariant) -> FloatValue {
        self.profiles.upper_bound(variant)
    }

    /// Interpolant of column `(i, j)` for one variant
    pub fn interpolant(&self, i: usize, j: usize, variant: FieldVariant) -> RSWResult<LinearInterpolant> {
        LinearInterpolant::try_from(self.profiles.build(i, j, variant)?)
    }

    /// Integral of column `(i, j)` from 0 to the variant's upper bound
    ///
    /// The result is not scaled by the scale factor.
    pub fn full_integral(&self, i: usize, j: usize, variant: FieldVariant) -> RSWResult<FloatValue> {
        let interp = self.interpolant(i, j, variant)?;
        self.simpson
            .integrate(&interp, 0.0, self.upper_bound(variant))
    }

    /// Per-cell partial integrals and radial derivative of the exact variant
    ///
    /// Stored positions are taken as cell centres, so `T[k]` starts half a cell below
    /// the stored depth. That start is clamped into the profile domain.
    pub fn depth_derivative_profile(
        &self,
        i: usize,
        j: usize,
        difference: DifferenceConvention,
    ) -> RSWResult<DepthDerivative> {
        let variant = FieldVariant::Exact;
        let interp = self.interpolant(i, j, variant)?;
        let (lower, upper) = interp.domain();

        let config = self.grid.config();
        let n = config.n_cells();
        let cell_size = config.cell_size();
        let half_step = config.half_cell_step();

        let mut depths = vec![0.0; n];
        let mut partial_integrals = vec![0.0; n];
        let mut differences = vec![0.0; n];
        let mut derivatives = vec![0.0; n];

        for k in (0..n).rev() {
            let depth = self.grid.cell_at(i, j, k)?.depth();
            let start = clamp_into(depth - half_step, lower, upper);

            depths[k] = depth;
            partial_integrals[k] = self.simpson.integrate(&interp, start, upper)?;
            differences[k] = if k == n - 1 {
                partial_integrals[k]
            } else {
                match difference {
                    DifferenceConvention::Shell => partial_integrals[k] - partial_integrals[k + 1],
                    DifferenceConvention::Forward => {
                        partial_integrals[k + 1] - partial_integrals[k]
                    }
                }
            };
            derivatives[k] = differences[k] / cell_size;
        }

        Ok(DepthDerivative {
            depths,
            partial_integrals,
            differences,
            derivatives,
        })
    }
}

/// Like `f64::clamp`, but lets NaN through instead of panicking on it
fn clamp_into(value: FloatValue, lower: FloatValue, upper: FloatValue) -> FloatValue {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpperBoundPolicy;
    use crate::errors::RSWError;
    use crate::grid::{GridCell, GridConfig};
    use approx::assert_relative_eq;

    /// Grid with cell-centred depths and fields given as functions of depth
    fn grid_with(
        n: usize,
        box_size: FloatValue,
        field: impl Fn(usize, usize, FloatValue) -> FloatValue,
    ) -> GridStore {
        let config = GridConfig::new(n, box_size, 1.0).unwrap();
        let cell_size = config.cell_size();
        let mut cells = Vec::with_capacity(config.total_cells());
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let z = (k as FloatValue + 0.5) * cell_size;
                    let value = field(i, j, z);
                    cells.push(GridCell::new(
                        config.flat_index(i, j, k) as i64,
                        [(i as FloatValue + 0.5) * cell_size, (j as FloatValue + 0.5) * cell_size, z],
                        value,
                        2.0 * value,
                        -value,
                    ));
                }
            }
        }
        GridStore::from_cells(config, cells).unwrap()
    }

    #[test]
    fn constant_column() {
        let grid = grid_with(4, 400.0, |_, _, _| 2.0);
        for n_steps in [2, 10, 10000] {
            let integration = IntegrationParameters {
                n_steps,
                ..Default::default()
            };
            let computer = SWIntegralComputer::new(&grid, &integration).unwrap();
            let result = computer.full_integral(1, 3, FieldVariant::Exact).unwrap();
            assert_relative_eq!(result, 800.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn linear_column() {
        // The clamp pins the end samples to 0 and 400, so value = depth must hold there too
        let grid = grid_with(4, 400.0, |_, _, z| z);
        let config = grid.config().clone();
        let mut cells: Vec<GridCell> = Vec::new();
        for (i, j) in grid.columns() {
            for k in 0..4 {
                let mut cell = grid.cell_at(i, j, k).unwrap().clone();
                if k == 0 {
                    cell.exact = 0.0;
                } else if k == 3 {
                    cell.exact = 400.0;
                } else {
                    cell.exact = cell.depth();
                }
                cells.push(cell);
            }
        }
        let grid = GridStore::from_cells(config, cells).unwrap();
        let integration = IntegrationParameters::default();
        let computer = SWIntegralComputer::new(&grid, &integration).unwrap();
        let result = computer.full_integral(0, 0, FieldVariant::Exact).unwrap();
        assert_relative_eq!(result, 80000.0, max_relative = 1e-10);
    }

    #[test]
    fn variants_use_their_own_field_and_bound() {
        let grid = grid_with(4, 200.0, |_, _, _| 1.0);
        let integration = IntegrationParameters {
            n_steps: 100,
            ..Default::default()
        };
        let computer = SWIntegralComputer::new(&grid, &integration).unwrap();
        assert_eq!(computer.upper_bound(FieldVariant::Exact), 400.0);
        assert_eq!(computer.upper_bound(FieldVariant::Approx1), 200.0);

        let exact = computer.full_integral(0, 0, FieldVariant::Exact).unwrap();
        assert_relative_eq!(exact, 400.0, max_relative = 1e-12);
        let approx1 = computer.full_integral(0, 0, FieldVariant::Approx1).unwrap();
        let approx2 = computer.full_integral(0, 0, FieldVariant::Approx2).unwrap();
        assert_relative_eq!(approx1, 400.0, max_relative = 1e-12);
        assert_relative_eq!(approx2, -200.0, max_relative = 1e-12);
    }

    #[test]
    fn legacy_bound_below_stored_depths_fails() {
        let grid = grid_with(4, 800.0, |_, _, _| 1.0);
        let integration = IntegrationParameters::default();
        let computer = SWIntegralComputer::new(&grid, &integration).unwrap();
        // The stored depth 500 lies beyond the clamped last depth of 400
        assert!(matches!(
            computer.full_integral(0, 0, FieldVariant::Exact),
            Err(RSWError::NonMonotonicProfile { .. })
        ));

        let unified = IntegrationParameters {
            upper_bound: UpperBoundPolicy::BoxSize,
            ..Default::default()
        };
        let computer = SWIntegralComputer::new(&grid, &unified).unwrap();
        let result = computer.full_integral(0, 0, FieldVariant::Exact).unwrap();
        assert_relative_eq!(result, 800.0, max_relative = 1e-12);
    }

    #[test]
    fn odd_steps_rejected_at_construction() {
        let grid = grid_with(2, 1.0, |_, _, _| 0.0);
        let integration = IntegrationParameters {
            n_steps: 7,
            ..Default::default()
        };
        assert!(matches!(
            SWIntegralComputer::new(&grid, &integration),
            Err(RSWError::QuadratureConfiguration(7))
        ));
    }

    #[test]
    fn derivative_telescopes() {
        let grid = grid_with(8, 400.0, |i, j, z| (i + j) as FloatValue + 0.01 * z);
        let integration = IntegrationParameters {
            n_steps: 1000,
            ..Default::default()
        };
        let computer = SWIntegralComputer::new(&grid, &integration).unwrap();
        let derivative = computer
            .depth_derivative_profile(2, 5, DifferenceConvention::Shell)
            .unwrap();

        assert_eq!(derivative.len(), 8);
        let total: FloatValue = derivative.differences.iter().sum();
        assert_relative_eq!(total, derivative.partial_integrals[0], max_relative = 1e-12);
        assert_eq!(
            derivative.differences[7],
            derivative.partial_integrals[7]
        );

        // First cell starts at the lower edge of the column, so T[0] is the full integral
        let full = computer.full_integral(2, 5, FieldVariant::Exact).unwrap();
        assert_relative_eq!(derivative.partial_integrals[0], full, max_relative = 1e-12);

        // Shell contributions of a positive field are positive
        assert!(derivative.differences.iter().all(|&d| d > 0.0));
    }

    #[test]
    fn derivative_scales_by_cell_size() {
        // L / N = 16 is a power of two, so the division round-trips exactly
        let grid = grid_with(4, 64.0, |_, _, z| 1.0 + z * z);
        let integration = IntegrationParameters {
            n_steps: 64,
            upper_bound: UpperBoundPolicy::BoxSize,
            ..Default::default()
        };
        let computer = SWIntegralComputer::new(&grid, &integration).unwrap();
        let derivative = computer
            .depth_derivative_profile(0, 1, DifferenceConvention::Shell)
            .unwrap();
        for k in 0..4 {
            assert_eq!(derivative.derivatives[k] * 16.0, derivative.differences[k]);
        }
        assert_eq!(derivative.depths, vec![8.0, 24.0, 40.0, 56.0]);
    }

    #[test]
    fn forward_convention_flips_interior_differences() {
        let grid = grid_with(4, 400.0, |_, _, _| 3.0);
        let integration = IntegrationParameters {
            n_steps: 100,
            ..Default::default()
        };
        let computer = SWIntegralComputer::new(&grid, &integration).unwrap();
        let shell = computer
            .depth_derivative_profile(1, 1, DifferenceConvention::Shell)
            .unwrap();
        let forward = computer
            .depth_derivative_profile(1, 1, DifferenceConvention::Forward)
            .unwrap();

        assert_eq!(shell.partial_integrals, forward.partial_integrals);
        assert_eq!(shell.differences[3], forward.differences[3]);
        for k in 0..3 {
            assert_eq!(shell.differences[k], -forward.differences[k]);
        }
        // Constant field: each cell contributes 3 * 100 over a 100-unit cell
        for k in 0..4 {
            assert_relative_eq!(shell.derivatives[k], 3.0, max_relative = 1e-10);
        }
    }

    #[test]
    fn out_of_range_column_fails() {
        let grid = grid_with(2, 1.0, |_, _, _| 0.0);
        let integration = IntegrationParameters::default();
        let computer = SWIntegralComputer::new(&grid, &integration).unwrap();
        assert!(matches!(
            computer.full_integral(0, 2, FieldVariant::Approx1),
            Err(RSWError::IndexOutOfRange { .. })
        ));
        assert!(computer
            .depth_derivative_profile(5, 0, DifferenceConvention::Shell)
            .is_err());
    }
}
