//! Reading grid files and writing result tables

pub mod ascii;
pub mod binary;
pub mod table;

use crate::config::{InputFormat, RunConfig};
use crate::errors::{RSWError, RSWResult};
use crate::grid::GridStore;
use log::info;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

pub use ascii::read_ascii;
pub use binary::{read_binary, BinaryHeader};
pub use table::{DerivativeTableWriter, IntegralTableWriter};

/// Load the grid file named by the run configuration
///
/// Binary files carry their own box size and redshift, which take precedence over
/// the `[grid]` and `[cosmology]` sections.
pub fn load_grid(config: &RunConfig) -> RSWResult<GridStore> {
    let path = &config.input.path;
    let n_cells = config.grid.n_cells;
    info!(
        "Reading {} cells per axis from {} ({:?})",
        n_cells,
        path.display(),
        config.input.format
    );

    let reader = BufReader::new(File::open(path)?);
    let grid = match config.input.format {
        InputFormat::Ascii => read_ascii(reader, config.grid_config()?)?,
        InputFormat::Binary => {
            check_binary_size(path, n_cells)?;
            let (grid, header) = read_binary(reader, n_cells)?;
            if header.box_size != config.grid.box_size {
                info!(
                    "Using the box size {} from the file header instead of {}",
                    header.box_size, config.grid.box_size
                );
            }
            grid
        }
    };

    info!(
        "Read {} cells (box size {}, scale factor {})",
        grid.config().total_cells(),
        grid.config().box_size(),
        grid.config().scale_factor()
    );
    Ok(grid)
}

/// Fail before reading if a binary file is too short to hold `n_cells³` records
fn check_binary_size(path: &Path, n_cells: usize) -> RSWResult<()> {
    let expected = binary::file_size(n_cells).ok_or_else(|| {
        RSWError::Configuration(format!(
            "a grid with {} cells per axis has too many cells",
            n_cells
        ))
    })?;
    let actual = fs::metadata(path)?.len();
    if actual < expected {
        let header = binary::HEADER_SIZE as u64;
        let complete = actual.saturating_sub(header) / binary::RECORD_SIZE as u64;
        return Err(RSWError::GridFormat {
            record: complete as usize,
            details: format!(
                "file holds {} bytes, {} cells per axis need {}",
                actual, n_cells, expected
            ),
        });
    }
    Ok(())
}
