//! Little-endian binary grid files
//!
//! A 40 byte header of five `f64` (box size, Ω_M0, Ω_Λ0, redshift, H0) is followed by
//! `N³` records of 60 bytes each:
//!
//! | offset | type  | content                    |
//! |--------|-------|----------------------------|
//! | 0      | `i32` | cell id                    |
//! | 4      | `f64` | x                          |
//! | 12     | `f64` | y                          |
//! | 20     | `f64` | z                          |
//! | 28     | `f64` | unused                     |
//! | 36     | `f64` | potential (unused)         |
//! | 44     | `f64` | first approximation        |
//! | 52     | `f64` | second approximation       |
//!
//! The layout has no exact field, so exact values are read as NaN.

use crate::config::CosmologyParameters;
use crate::errors::{RSWError, RSWResult};
use crate::grid::{FloatValue, GridCell, GridConfig, GridStore};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, ErrorKind, Read};

pub const HEADER_SIZE: usize = 40;
pub const RECORD_SIZE: usize = 60;
const PROGRESS_INTERVAL: usize = 100_000;

/// Run parameters stored at the start of a binary grid file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryHeader {
    pub box_size: FloatValue,
    pub omega_m0: FloatValue,
    pub omega_l0: FloatValue,
    pub redshift: FloatValue,
    pub hubble: FloatValue,
}

impl BinaryHeader {
    fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            box_size: f64_at(bytes, 0),
            omega_m0: f64_at(bytes, 8),
            omega_l0: f64_at(bytes, 16),
            redshift: f64_at(bytes, 24),
            hubble: f64_at(bytes, 32),
        }
    }

    /// Grid geometry described by the header
    pub fn grid_config(&self, n_cells: usize) -> RSWResult<GridConfig> {
        GridConfig::from_redshift(n_cells, self.box_size, self.redshift)
    }

    pub fn cosmology(&self) -> CosmologyParameters {
        CosmologyParameters {
            omega_m0: self.omega_m0,
            omega_l0: self.omega_l0,
            redshift: self.redshift,
            hubble: self.hubble,
        }
    }
}

/// Size in bytes of a file holding `n_cells³` records, `None` if it overflows
pub fn file_size(n_cells: usize) -> Option<u64> {
    let n = n_cells as u64;
    n.checked_mul(n)?
        .checked_mul(n)?
        .checked_mul(RECORD_SIZE as u64)?
        .checked_add(HEADER_SIZE as u64)
}

/// Read a binary grid of `n_cells³` cells
///
/// The box size and redshift of the returned grid come from the file header.
pub fn read_binary<R: Read>(mut reader: R, n_cells: usize) -> RSWResult<(GridStore, BinaryHeader)> {
    let mut header = [0u8; HEADER_SIZE];
    fill(&mut reader, &mut header, 0, "header")?;
    let header = BinaryHeader::from_bytes(&header);
    info!(
        "Binary header: box size {}, Omega_M0 {}, Omega_L0 {}, redshift {}, H0 {}",
        header.box_size, header.omega_m0, header.omega_l0, header.redshift, header.hubble
    );

    let config = header.grid_config(n_cells)?;
    let expected = config.total_cells();
    let mut cells = Vec::new();
    let mut buffer = [0u8; RECORD_SIZE];
    for record in 0..expected {
        fill(&mut reader, &mut buffer, record, "record")?;
        let cell = parse_record(&buffer);
        if record % PROGRESS_INTERVAL == 0 {
            debug!("record {}: id={} depth={}", record, cell.id, cell.depth());
        }
        cells.push(cell);
    }

    let trailing = io::copy(&mut reader, &mut io::sink())?;
    if trailing > 0 {
        warn!("ignoring {} bytes after the last grid record", trailing);
    }
    warn!("binary grids carry no exact field; exact integrals will be NaN");

    Ok((GridStore::from_cells(config, cells)?, header))
}

fn parse_record(buffer: &[u8; RECORD_SIZE]) -> GridCell {
    let mut id = [0u8; 4];
    id.copy_from_slice(&buffer[0..4]);

    GridCell::new(
        i32::from_le_bytes(id) as i64,
        [f64_at(buffer, 4), f64_at(buffer, 12), f64_at(buffer, 20)],
        FloatValue::NAN,
        f64_at(buffer, 44),
        f64_at(buffer, 52),
    )
}

fn f64_at(buffer: &[u8], offset: usize) -> FloatValue {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buffer[offset..offset + 8]);
    f64::from_le_bytes(bytes)
}

fn fill<R: Read>(reader: &mut R, buffer: &mut [u8], record: usize, what: &str) -> RSWResult<()> {
    reader.read_exact(buffer).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => RSWError::GridFormat {
            record,
            details: format!("file ends inside the {}", what),
        },
        _ => RSWError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FieldVariant;
    use std::io::Cursor;

    fn encode(header: [f64; 5], n: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for value in header {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for m in 0..n * n * n {
            bytes.extend_from_slice(&(m as i32).to_le_bytes());
            for value in [0.5, 1.5, (m % n) as f64, -1.0, -2.0, m as f64, 10.0 * m as f64] {
                bytes.extend_from_slice(&f64::to_le_bytes(value));
            }
        }
        bytes
    }

    #[test]
    fn reads_header_and_records() {
        let bytes = encode([64.0, 0.3, 0.7, 1.0, 0.7], 2);
        assert_eq!(bytes.len(), HEADER_SIZE + 8 * RECORD_SIZE);

        let (grid, header) = read_binary(Cursor::new(bytes), 2).unwrap();
        assert_eq!(header.box_size, 64.0);
        assert_eq!(header.cosmology().omega_l0, 0.7);
        assert_eq!(grid.config().box_size(), 64.0);
        assert_eq!(grid.config().scale_factor(), 0.5);

        let cell = grid.cell_at(1, 1, 0).unwrap();
        assert_eq!(cell.id, 6);
        assert_eq!(cell.position, [0.5, 1.5, 0.0]);
        assert_eq!(cell.field(FieldVariant::Approx1), 6.0);
        assert_eq!(cell.field(FieldVariant::Approx2), 60.0);
        assert!(cell.field(FieldVariant::Exact).is_nan());
    }

    #[test]
    fn truncated_files() {
        let bytes = encode([64.0, 0.3, 0.7, 0.0, 0.7], 2);

        let short_header = bytes[..HEADER_SIZE - 1].to_vec();
        assert!(matches!(
            read_binary(Cursor::new(short_header), 2),
            Err(RSWError::GridFormat { record: 0, .. })
        ));

        let short_record = bytes[..HEADER_SIZE + 3 * RECORD_SIZE + 10].to_vec();
        assert!(matches!(
            read_binary(Cursor::new(short_record), 2),
            Err(RSWError::GridFormat { record: 3, .. })
        ));
    }

    #[test]
    fn oversized_grid_fails_on_missing_records() {
        let bytes = encode([64.0, 0.3, 0.7, 0.0, 0.7], 2);
        assert!(matches!(
            read_binary(Cursor::new(bytes), 100_000),
            Err(RSWError::GridFormat { record: 8, .. })
        ));
    }

    #[test]
    fn expected_file_size() {
        assert_eq!(file_size(2), Some(40 + 8 * 60));
        assert_eq!(file_size(usize::MAX), None);
    }

    #[test]
    fn header_geometry_is_validated() {
        let bytes = encode([0.0, 0.3, 0.7, 0.0, 0.7], 2);
        assert!(matches!(
            read_binary(Cursor::new(bytes), 2),
            Err(RSWError::Configuration(_))
        ));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = encode([8.0, 0.3, 0.7, 0.0, 0.7], 2);
        bytes.extend_from_slice(&[0u8; 17]);
        let (grid, _) = read_binary(Cursor::new(bytes), 2).unwrap();
        assert_eq!(grid.cell_at(1, 1, 1).unwrap().id, 7);
    }
}
