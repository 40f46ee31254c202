//! Per-column depth profiles

use crate::config::IntegrationParameters;
use crate::errors::{RSWError, RSWResult};
use crate::grid::{FieldVariant, FloatValue, GridStore};

/// Ordered `(depth, value)` samples of one field along one grid column
///
/// The first depth is clamped to `0` and the last to the variant's upper integration
/// bound, so the interpolation domain always matches the integration range.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    depths: Vec<FloatValue>,
    values: Vec<FloatValue>,
}

impl ColumnProfile {
    /// Build a profile from raw samples without any clamping
    ///
    /// Fails with [`RSWError::ProfileLengthMismatch`] if `depths` and `values` differ in length.
    pub fn from_samples(depths: Vec<FloatValue>, values: Vec<FloatValue>) -> RSWResult<Self> {
        if depths.len() != values.len() {
            return Err(RSWError::ProfileLengthMismatch {
                depths: depths.len(),
                values: values.len(),
            });
        }
        Ok(Self { depths, values })
    }

    pub fn depths(&self) -> &[FloatValue] {
        &self.depths
    }

    pub fn values(&self) -> &[FloatValue] {
        &self.values
    }

    pub fn into_parts(self) -> (Vec<FloatValue>, Vec<FloatValue>) {
        (self.depths, self.values)
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }
}

/// Extracts column profiles from a grid
#[derive(Debug, Clone, Copy)]
pub struct ColumnProfileBuilder<'a> {
    grid: &'a GridStore,
    integration: &'a IntegrationParameters,
}

impl<'a> ColumnProfileBuilder<'a> {
    pub fn new(grid: &'a GridStore, integration: &'a IntegrationParameters) -> Self {
        Self { grid, integration }
    }

    /// Upper end of the depth domain for a variant
    pub fn upper_bound(&self, variant: FieldVariant) -> FloatValue {
        self.integration
            .upper_bound(variant, self.grid.config().box_size())
    }

    /// Collect the samples of column `(i, j)` for one variant
    ///
    /// Cells are read in increasing `k`; the grid layout guarantees this is also
    /// increasing depth. Fails with `IndexOutOfRange` for indices outside the grid.
    pub fn build(&self, i: usize, j: usize, variant: FieldVariant) -> RSWResult<ColumnProfile> {
        let column = self.grid.column(i, j)?;

        let mut depths: Vec<FloatValue> = column.iter().map(|cell| cell.depth()).collect();
        let values = column.iter().map(|cell| cell.field(variant)).collect();

        let last = depths.len() - 1;
        depths[0] = 0.0;
        depths[last] = self.upper_bound(variant);

        Ok(ColumnProfile { depths, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpperBoundPolicy;
    use crate::grid::{GridCell, GridConfig};

    /// Cells sit slightly off their nominal centres so the clamp is observable
    fn jittered_grid(n: usize, box_size: FloatValue) -> GridStore {
        let config = GridConfig::new(n, box_size, 1.0).unwrap();
        let cell_size = config.cell_size();
        let mut cells = Vec::new();
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let z = (k as f64 + 0.5) * cell_size + 0.5;
                    cells.push(GridCell::new(
                        config.flat_index(i, j, k) as i64,
                        [i as f64, j as f64, z],
                        10.0 * k as f64,
                        20.0 * k as f64,
                        30.0 * k as f64,
                    ));
                }
            }
        }
        GridStore::from_cells(config, cells).unwrap()
    }

    #[test]
    fn clamps_first_and_last_depth() {
        let grid = jittered_grid(4, 400.0);
        let integration = IntegrationParameters::default();
        let builder = ColumnProfileBuilder::new(&grid, &integration);

        for variant in FieldVariant::ALL {
            for (i, j) in grid.columns() {
                let profile = builder.build(i, j, variant).unwrap();
                assert_eq!(profile.len(), 4);
                assert_eq!(profile.depths()[0], 0.0);
                assert_eq!(profile.depths()[3], 400.0);
                // Interior samples are the stored positions
                assert_eq!(profile.depths()[1], 150.5);
                assert_eq!(profile.depths()[2], 250.5);
            }
        }
    }

    #[test]
    fn selects_variant_values() {
        let grid = jittered_grid(3, 90.0);
        let integration = IntegrationParameters::default();
        let builder = ColumnProfileBuilder::new(&grid, &integration);

        let exact = builder.build(1, 2, FieldVariant::Exact).unwrap();
        let approx2 = builder.build(1, 2, FieldVariant::Approx2).unwrap();
        assert_eq!(exact.values(), &[0.0, 10.0, 20.0]);
        assert_eq!(approx2.values(), &[0.0, 30.0, 60.0]);
    }

    #[test]
    fn legacy_bound_differs_between_variants() {
        let grid = jittered_grid(3, 600.0);
        let integration = IntegrationParameters::default();
        let builder = ColumnProfileBuilder::new(&grid, &integration);

        let exact = builder.build(0, 0, FieldVariant::Exact).unwrap();
        let approx1 = builder.build(0, 0, FieldVariant::Approx1).unwrap();
        assert_eq!(exact.depths()[2], 400.0);
        assert_eq!(approx1.depths()[2], 600.0);

        let unified = IntegrationParameters {
            upper_bound: UpperBoundPolicy::BoxSize,
            ..Default::default()
        };
        let builder = ColumnProfileBuilder::new(&grid, &unified);
        let exact = builder.build(0, 0, FieldVariant::Exact).unwrap();
        assert_eq!(exact.depths()[2], 600.0);
    }

    #[test]
    fn samples_must_pair_up() {
        let profile = ColumnProfile::from_samples(vec![0.0, 1.0], vec![3.0, 4.0]).unwrap();
        assert_eq!(profile.into_parts(), (vec![0.0, 1.0], vec![3.0, 4.0]));

        assert!(matches!(
            ColumnProfile::from_samples(vec![0.0, 1.0, 2.0], vec![3.0, 4.0]),
            Err(RSWError::ProfileLengthMismatch {
                depths: 3,
                values: 2
            })
        ));
    }

    #[test]
    fn out_of_range_column() {
        let grid = jittered_grid(2, 10.0);
        let integration = IntegrationParameters::default();
        let builder = ColumnProfileBuilder::new(&grid, &integration);
        assert!(builder.build(2, 0, FieldVariant::Exact).is_err());
    }
}
