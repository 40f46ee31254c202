//! Fixed-width text tables of sweep results

use crate::errors::RSWResult;
use crate::grid::FieldVariant;
use crate::sweep::{DerivativeRow, IntegralRow, RowSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const INTEGRAL_HEADER: &str = "#n\ti\tj\tx\ty\tSW_Integral";
pub const DERIVATIVE_HEADER: &str = "#n\ti\tj\tk\tz\tdT_dr";
pub const DERIVATIVE_FILE_NAME: &str = "SW_dT_dr_Exact.dat";

/// Output file name of the integral table for a variant
pub fn integral_file_name(variant: FieldVariant) -> &'static str {
    match variant {
        FieldVariant::Exact => "SW_Integral_Exact_sln.dat",
        FieldVariant::Approx1 => "SWIntegral_LApp1.dat",
        FieldVariant::Approx2 => "SWIntegral_LApp2.dat",
    }
}

/// Writes one integral row per line below [`INTEGRAL_HEADER`]
#[derive(Debug)]
pub struct IntegralTableWriter<W: Write> {
    writer: W,
}

impl<W: Write> IntegralTableWriter<W> {
    pub fn new(mut writer: W) -> RSWResult<Self> {
        writeln!(writer, "{}", INTEGRAL_HEADER)?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink<IntegralRow> for IntegralTableWriter<W> {
    fn accept(&mut self, row: &IntegralRow) -> RSWResult<()> {
        writeln!(
            self.writer,
            "{:12} {:12} {:12} {:16.8} {:16.8} {:16.8}",
            row.column_index, row.i, row.j, row.x, row.y, row.value
        )?;
        Ok(())
    }

    fn finish(&mut self) -> RSWResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes one derivative row per line below [`DERIVATIVE_HEADER`]
#[derive(Debug)]
pub struct DerivativeTableWriter<W: Write> {
    writer: W,
}

impl<W: Write> DerivativeTableWriter<W> {
    pub fn new(mut writer: W) -> RSWResult<Self> {
        writeln!(writer, "{}", DERIVATIVE_HEADER)?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink<DerivativeRow> for DerivativeTableWriter<W> {
    fn accept(&mut self, row: &DerivativeRow) -> RSWResult<()> {
        writeln!(
            self.writer,
            "{:12} {:12} {:12} {:12} {:16.8} {:16.8}",
            row.cell_index, row.i, row.j, row.k, row.depth, row.dt_dr
        )?;
        Ok(())
    }

    fn finish(&mut self) -> RSWResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Create the integral table of `variant` inside `directory`
pub fn create_integral_table(
    directory: &Path,
    variant: FieldVariant,
) -> RSWResult<(PathBuf, IntegralTableWriter<BufWriter<File>>)> {
    let path = directory.join(integral_file_name(variant));
    let writer = IntegralTableWriter::new(BufWriter::new(File::create(&path)?))?;
    Ok((path, writer))
}

/// Create the derivative table inside `directory`
pub fn create_derivative_table(
    directory: &Path,
) -> RSWResult<(PathBuf, DerivativeTableWriter<BufWriter<File>>)> {
    let path = directory.join(DERIVATIVE_FILE_NAME);
    let writer = DerivativeTableWriter::new(BufWriter::new(File::create(&path)?))?;
    Ok((path, writer))
}
