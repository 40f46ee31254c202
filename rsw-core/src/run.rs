//! A complete run: load a grid, sweep it and write the result tables

use crate::config::RunConfig;
use crate::errors::RSWResult;
use crate::grid::{FieldVariant, GridStore};
use crate::io::load_grid;
use crate::io::table::{create_derivative_table, create_integral_table};
use crate::sweep::ColumnSweepDriver;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// What a run wrote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub columns: usize,
    /// Integral tables in sweep order
    pub integral_tables: Vec<(FieldVariant, PathBuf)>,
    pub derivative_table: Option<PathBuf>,
}

/// Load the configured grid and write every requested table
pub fn run(config: &RunConfig) -> RSWResult<RunSummary> {
    config.validate()?;
    let grid = load_grid(config)?;
    run_on_grid(config, &grid)
}

/// Sweep an already loaded grid and write the tables into `config.output.directory`
pub fn run_on_grid(config: &RunConfig, grid: &GridStore) -> RSWResult<RunSummary> {
    config.warn_on_bound_mismatch(grid.config().box_size());

    let directory = &config.output.directory;
    fs::create_dir_all(directory)?;

    let driver = ColumnSweepDriver::new(grid, &config.integration)?;
    let n = grid.n_cells();

    let mut integral_tables = Vec::with_capacity(config.output.variants.len());
    driver.sweep_variants(&config.output.variants, |variant| {
        let (path, table) = create_integral_table(directory, variant)?;
        info!("Writing the {} integrals to {}", variant, path.display());
        integral_tables.push((variant, path));
        Ok(table)
    })?;

    let derivative_table = if config.derivative.enabled {
        let (path, mut table) = create_derivative_table(directory)?;
        info!("Writing radial derivatives to {}", path.display());
        driver.sweep_derivatives(config.derivative.difference, &mut table)?;
        Some(path)
    } else {
        None
    };

    info!("Run complete");
    Ok(RunSummary {
        columns: n * n,
        integral_tables,
        derivative_table,
    })
}
