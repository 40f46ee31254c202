//! Sweeps over every column of a grid
//!
//! Columns are visited in row-major `(i, j)` order and each column is integrated
//! independently, so the emitted rows are reproducible run to run.

use crate::config::{DifferenceConvention, IntegrationParameters};
use crate::errors::RSWResult;
use crate::grid::{FieldVariant, FloatValue, GridStore, X, Y};
use crate::integral::SWIntegralComputer;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Scaled line-of-sight integral of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegralRow {
    /// Flat index of the column's first cell
    pub column_index: usize,
    pub i: usize,
    pub j: usize,
    pub x: FloatValue,
    pub y: FloatValue,
    /// Integral multiplied by the scale factor
    pub value: FloatValue,
}

/// Radial derivative of the integral at one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivativeRow {
    /// Flat index of the cell
    pub cell_index: usize,
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub depth: FloatValue,
    pub dt_dr: FloatValue,
}

/// Consumer of sweep output rows
pub trait RowSink<R> {
    fn accept(&mut self, row: &R) -> RSWResult<()>;

    /// Called once after the last row of a sweep
    fn finish(&mut self) -> RSWResult<()> {
        Ok(())
    }
}

impl<R: Clone> RowSink<R> for Vec<R> {
    fn accept(&mut self, row: &R) -> RSWResult<()> {
        self.push(row.clone());
        Ok(())
    }
}

impl<R, S: RowSink<R> + ?Sized> RowSink<R> for &mut S {
    fn accept(&mut self, row: &R) -> RSWResult<()> {
        (**self).accept(row)
    }

    fn finish(&mut self) -> RSWResult<()> {
        (**self).finish()
    }
}

/// Drives [`SWIntegralComputer`] over all columns of a grid
#[derive(Debug, Clone, Copy)]
pub struct ColumnSweepDriver<'a> {
    computer: SWIntegralComputer<'a>,
}

impl<'a> ColumnSweepDriver<'a> {
    pub fn new(grid: &'a GridStore, integration: &'a IntegrationParameters) -> RSWResult<Self> {
        Ok(Self {
            computer: SWIntegralComputer::new(grid, integration)?,
        })
    }

    pub fn computer(&self) -> &SWIntegralComputer<'a> {
        &self.computer
    }

    /// Integrate every column for one variant, returning the number of rows emitted
    ///
    /// Stops at the first failing column.
    pub fn sweep_variant<S: RowSink<IntegralRow>>(
        &self,
        variant: FieldVariant,
        sink: &mut S,
    ) -> RSWResult<usize> {
        let grid = self.computer.grid();
        let config = grid.config();
        let n = config.n_cells();
        let scale_factor = config.scale_factor();

        info!(
            "Sweeping {} columns of the {} field up to depth {}",
            n * n,
            variant,
            self.computer.upper_bound(variant)
        );

        let mut rows = 0;
        for (i, j) in grid.columns() {
            let integral = self.computer.full_integral(i, j, variant)?;
            let first_cell = grid.cell_at(i, j, 0)?;
            sink.accept(&IntegralRow {
                column_index: config.column_index(i, j),
                i,
                j,
                x: first_cell.position[X],
                y: first_cell.position[Y],
                value: scale_factor * integral,
            })?;
            rows += 1;

            if j == n - 1 {
                debug!("{} field: finished column row {}/{}", variant, i + 1, n);
            }
        }
        sink.finish()?;

        info!("Finished the {} field ({} columns)", variant, rows);
        Ok(rows)
    }

    /// Sweep several variants, each into its own sink
    pub fn sweep_variants<S, F>(&self, variants: &[FieldVariant], mut open_sink: F) -> RSWResult<()>
    where
        S: RowSink<IntegralRow>,
        F: FnMut(FieldVariant) -> RSWResult<S>,
    {
        for &variant in variants {
            let mut sink = open_sink(variant)?;
            self.sweep_variant(variant, &mut sink)?;
        }
        Ok(())
    }

    /// Radial derivative of the exact integral for every cell of every column
    ///
    /// Rows are emitted column by column in row-major order, cells by increasing `k`.
    pub fn sweep_derivatives<S: RowSink<DerivativeRow>>(
        &self,
        difference: DifferenceConvention,
        sink: &mut S,
    ) -> RSWResult<usize> {
        let grid = self.computer.grid();
        let config = grid.config();
        let n = config.n_cells();

        info!("Computing radial derivatives for {} cells", config.total_cells());

        let mut rows = 0;
        for (i, j) in grid.columns() {
            let derivative = self.computer.depth_derivative_profile(i, j, difference)?;
            for (k, (&depth, &dt_dr)) in derivative
                .depths
                .iter()
                .zip(&derivative.derivatives)
                .enumerate()
            {
                sink.accept(&DerivativeRow {
                    cell_index: config.flat_index(i, j, k),
                    i,
                    j,
                    k,
                    depth,
                    dt_dr,
                })?;
                rows += 1;
            }

            if j == n - 1 {
                debug!("derivatives: finished column row {}/{}", i + 1, n);
            }
        }
        sink.finish()?;

        info!("Finished radial derivatives ({} rows)", rows);
        Ok(rows)
    }
}
