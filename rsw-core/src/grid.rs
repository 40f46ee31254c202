//! Regular 3D simulation grids
//!
//! A [`GridStore`] owns every [`GridCell`] of an `N × N × N` box together with the
//! run-wide [`GridConfig`]. Cells are laid out row-major over `(i, j, k)` so that
//! the depth axis `k` varies fastest, which makes a column (fixed `i`, `j`) a
//! contiguous run of `N` cells.
//!
//! ```rust
//! use rsw_core::grid::{FieldVariant, GridCell, GridConfig, GridStore};
//!
//! let config = GridConfig::new(2, 10.0, 1.0).unwrap();
//! let cells = (0..8)
//!     .map(|m| GridCell::new(m, [0.0, 0.0, (m % 2) as f64 * 10.0], 1.0, 2.0, 3.0))
//!     .collect();
//! let grid = GridStore::from_cells(config, cells).unwrap();
//!
//! assert_eq!(grid.cell_at(0, 1, 1).unwrap().field(FieldVariant::Approx1), 2.0);
//! assert!(grid.cell_at(0, 2, 0).is_err());
//! ```

use crate::errors::{RSWError, RSWResult};
use ndarray::{s, Array3, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type FloatValue = f64;

/// Axis indices into [`GridCell::position`]
pub const X: usize = 0;
pub const Y: usize = 1;
pub const Z: usize = 2;

/// One of the three potential time-derivative fields carried by every cell
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldVariant {
    /// Exact solution from the simulation
    Exact,
    /// Linear theory, growth rate approximated through `1 / Omega_L0`
    Approx1,
    /// Linear theory, growth rate approximated through `Omega_M(a)`
    Approx2,
}

impl FieldVariant {
    /// Every variant in sweep order
    pub const ALL: [FieldVariant; 3] = [
        FieldVariant::Exact,
        FieldVariant::Approx1,
        FieldVariant::Approx2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldVariant::Exact => "exact",
            FieldVariant::Approx1 => "approx1",
            FieldVariant::Approx2 => "approx2",
        }
    }
}

impl From<FieldVariant> for usize {
    fn from(v: FieldVariant) -> usize {
        v as usize
    }
}

impl fmt::Display for FieldVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FieldVariant {
    type Err = RSWError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(FieldVariant::Exact),
            "approx1" => Ok(FieldVariant::Approx1),
            "approx2" => Ok(FieldVariant::Approx2),
            other => Err(RSWError::Configuration(format!(
                "unknown field variant '{}', expected one of exact, approx1, approx2",
                other
            ))),
        }
    }
}

/// A single grid cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub id: i64,
    /// Cell position `[x, y, z]`
    pub position: [FloatValue; 3],
    pub exact: FloatValue,
    pub approx1: FloatValue,
    pub approx2: FloatValue,
}

impl GridCell {
    pub fn new(
        id: i64,
        position: [FloatValue; 3],
        exact: FloatValue,
        approx1: FloatValue,
        approx2: FloatValue,
    ) -> Self {
        Self {
            id,
            position,
            exact,
            approx1,
            approx2,
        }
    }

    pub fn field(&self, variant: FieldVariant) -> FloatValue {
        match variant {
            FieldVariant::Exact => self.exact,
            FieldVariant::Approx1 => self.approx1,
            FieldVariant::Approx2 => self.approx2,
        }
    }

    /// Position along the integration axis
    pub fn depth(&self) -> FloatValue {
        self.position[Z]
    }
}

/// Geometry and cosmology shared by every column of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Cells per axis
    n_cells: usize,
    /// Box length along each axis
    box_size: FloatValue,
    /// Scale factor `a = 1 / (1 + z)` of the snapshot
    scale_factor: FloatValue,
}

impl GridConfig {
    /// Create a validated grid configuration
    ///
    /// Fails with [`RSWError::Configuration`] if `n_cells < 2`, if `n_cells³` does not
    /// fit in a `usize`, or if `box_size` is not strictly positive.
    pub fn new(n_cells: usize, box_size: FloatValue, scale_factor: FloatValue) -> RSWResult<Self> {
        Self::check_cell_count(n_cells)?;
        // Written so that NaN is rejected too
        if !(box_size > 0.0) {
            return Err(RSWError::Configuration(format!(
                "box size must be positive, got {}",
                box_size
            )));
        }
        Ok(Self {
            n_cells,
            box_size,
            scale_factor,
        })
    }

    /// Total cell count `N³` of a grid with `n_cells` per axis
    ///
    /// Fails with [`RSWError::Configuration`] if `n_cells < 2` or if `n_cells³` does not
    /// fit in a `usize`.
    pub fn check_cell_count(n_cells: usize) -> RSWResult<usize> {
        if n_cells < 2 {
            return Err(RSWError::Configuration(format!(
                "the grid needs at least 2 cells per axis, got {}",
                n_cells
            )));
        }
        n_cells
            .checked_mul(n_cells)
            .and_then(|square| square.checked_mul(n_cells))
            .ok_or_else(|| {
                RSWError::Configuration(format!(
                    "a grid with {} cells per axis has too many cells",
                    n_cells
                ))
            })
    }

    pub fn from_redshift(
        n_cells: usize,
        box_size: FloatValue,
        redshift: FloatValue,
    ) -> RSWResult<Self> {
        Self::new(n_cells, box_size, scale_factor(redshift))
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn box_size(&self) -> FloatValue {
        self.box_size
    }

    pub fn scale_factor(&self) -> FloatValue {
        self.scale_factor
    }

    /// `N³`, which [`GridConfig::new`] guarantees does not overflow
    pub fn total_cells(&self) -> usize {
        self.n_cells * self.n_cells * self.n_cells
    }

    /// Edge length of one cell, `L / N`
    pub fn cell_size(&self) -> FloatValue {
        self.box_size / self.n_cells as FloatValue
    }

    /// Distance from a cell centre to its lower edge
    pub fn half_cell_step(&self) -> FloatValue {
        self.cell_size() / 2.0
    }

    /// Flat row-major index of cell `(i, j, k)`
    pub fn flat_index(&self, i: usize, j: usize, k: usize) -> usize {
        k + self.n_cells * (j + self.n_cells * i)
    }

    /// Flat index of the first cell (`k = 0`) of column `(i, j)`
    pub fn column_index(&self, i: usize, j: usize) -> usize {
        self.flat_index(i, j, 0)
    }
}

/// Scale factor of a snapshot at the given redshift
pub fn scale_factor(redshift: FloatValue) -> FloatValue {
    1.0 / (1.0 + redshift)
}

/// Read-only store of all grid cells
#[derive(Clone, Debug)]
pub struct GridStore {
    config: GridConfig,
    cells: Array3<GridCell>,
}

impl GridStore {
    /// Build a store from cells in row-major `(i, j, k)` order
    pub fn from_cells(config: GridConfig, cells: Vec<GridCell>) -> RSWResult<Self> {
        let n = config.n_cells();
        if cells.len() != config.total_cells() {
            return Err(RSWError::Configuration(format!(
                "expected {} cells for a grid with {} cells per axis, got {}",
                config.total_cells(),
                n,
                cells.len()
            )));
        }
        let cells = Array3::from_shape_vec((n, n, n), cells)
            .map_err(|e| RSWError::Error(e.to_string()))?;
        Ok(Self { config, cells })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn n_cells(&self) -> usize {
        self.config.n_cells()
    }

    /// Bounds-checked access to cell `(i, j, k)`
    pub fn cell_at(&self, i: usize, j: usize, k: usize) -> RSWResult<&GridCell> {
        self.cells
            .get((i, j, k))
            .ok_or_else(|| self.out_of_range(i, j, k))
    }

    /// The `N` cells of column `(i, j)`, ordered by increasing depth index
    pub fn column(&self, i: usize, j: usize) -> RSWResult<ArrayView1<'_, GridCell>> {
        let n = self.n_cells();
        if i >= n || j >= n {
            return Err(self.out_of_range(i, j, 0));
        }
        Ok(self.cells.slice(s![i, j, ..]))
    }

    /// All `(i, j)` column indices in row-major order
    pub fn columns(&self) -> impl Iterator<Item = (usize, usize)> {
        let n = self.n_cells();
        (0..n).flat_map(move |i| (0..n).map(move |j| (i, j)))
    }

    /// Replace the run configuration, keeping the cells
    ///
    /// Used when a grid file header carries its own box size or cosmology.
    pub fn with_config(mut self, config: GridConfig) -> RSWResult<Self> {
        if config.n_cells() != self.n_cells() {
            return Err(RSWError::Configuration(format!(
                "cannot change the grid resolution from {} to {}",
                self.n_cells(),
                config.n_cells()
            )));
        }
        self.config = config;
        Ok(self)
    }

    fn out_of_range(&self, i: usize, j: usize, k: usize) -> RSWError {
        RSWError::IndexOutOfRange {
            i,
            j,
            k,
            n_cells: self.n_cells(),
        }
    }
}
