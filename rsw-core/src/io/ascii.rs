//! Text grid files
//!
//! One header line, then one cell per line with 12 whitespace-separated columns:
//!
//! ```text
//! id x y z c4 c5 c6 c7 c8 exact approx1 approx2
//! ```
//!
//! Columns `c4` to `c8` carry density and momentum data that the integrals do not use.

use crate::errors::{RSWError, RSWResult};
use crate::grid::{FloatValue, GridCell, GridConfig, GridStore};
use log::{debug, warn};
use std::io::BufRead;

const COLUMNS: usize = 12;
const PROGRESS_INTERVAL: usize = 10_000_000;

/// Read `N³` cells in row-major order
pub fn read_ascii<R: BufRead>(reader: R, config: GridConfig) -> RSWResult<GridStore> {
    let expected = config.total_cells();
    let mut cells = Vec::new();
    let mut lines = reader.lines().enumerate();

    match lines.next() {
        Some((_, header)) => {
            header?;
        }
        None => {
            return Err(RSWError::GridFormat {
                record: 0,
                details: "file is empty".to_string(),
            })
        }
    }

    let mut trailing = 0;
    for (line_index, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if cells.len() == expected {
            trailing += 1;
            continue;
        }

        let record = cells.len();
        let cell = parse_record(&line, record, line_index + 1)?;
        if record % PROGRESS_INTERVAL == 0 {
            debug!(
                "record {}: id={} position=({}, {}, {})",
                record, cell.id, cell.position[0], cell.position[1], cell.position[2]
            );
        }
        cells.push(cell);
    }

    if cells.len() < expected {
        return Err(RSWError::GridFormat {
            record: cells.len(),
            details: format!("expected {} cells, found {}", expected, cells.len()),
        });
    }
    if trailing > 0 {
        warn!("ignoring {} records beyond the expected {} cells", trailing, expected);
    }

    GridStore::from_cells(config, cells)
}

fn parse_record(line: &str, record: usize, line_number: usize) -> RSWResult<GridCell> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < COLUMNS {
        return Err(RSWError::GridFormat {
            record,
            details: format!(
                "line {} has {} columns, expected {}",
                line_number,
                fields.len(),
                COLUMNS
            ),
        });
    }

    let float = |column: usize| -> RSWResult<FloatValue> {
        fields[column].parse().map_err(|_| RSWError::GridFormat {
            record,
            details: format!(
                "line {}: column {} ('{}') is not a number",
                line_number,
                column + 1,
                fields[column]
            ),
        })
    };

    let id = fields[0].parse().map_err(|_| RSWError::GridFormat {
        record,
        details: format!("line {}: cell id '{}' is not an integer", line_number, fields[0]),
    })?;

    Ok(GridCell::new(
        id,
        [float(1)?, float(2)?, float(3)?],
        float(9)?,
        float(10)?,
        float(11)?,
    ))
}
