//! Run configuration
//!
//! A run is described by a TOML file. Every section has defaults, so a minimal file
//! only needs the grid resolution and the input path:
//!
//! ```toml
//! [grid]
//! n_cells = 256
//! box_size = 400.0
//!
//! [input]
//! path = "grid.dat"
//! format = "ascii"
//!
//! [cosmology]
//! redshift = 0.0
//! ```

use crate::errors::{RSWError, RSWResult};
use crate::grid::{FieldVariant, FloatValue, GridConfig};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of Simpson subintervals used by the legacy tool
pub const DEFAULT_N_STEPS: usize = 10000;

/// Upper integration bound of the exact variant in the legacy tool
pub const LEGACY_EXACT_BOUND: FloatValue = 400.0;

/// Grid resolution and extent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridParameters {
    /// Number of cells along each axis.
    ///
    /// Default: 256
    pub n_cells: usize,

    /// Length of the simulation box along each axis.
    ///
    /// Ignored for binary input, which stores the box size in its header.
    ///
    /// Default: 400.0
    pub box_size: FloatValue,
}

impl Default for GridParameters {
    fn default() -> Self {
        Self {
            n_cells: 256,
            box_size: 400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Whitespace separated text, one header line then one cell per line
    #[default]
    Ascii,
    /// Little-endian records preceded by a cosmology header
    Binary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct InputParameters {
    /// Path of the grid file
    pub path: PathBuf,
    pub format: InputFormat,
}

/// Cosmological parameters of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CosmologyParameters {
    /// Matter density parameter today.
    ///
    /// Default: 0.258
    pub omega_m0: FloatValue,

    /// Cosmological constant density parameter today.
    ///
    /// Default: 0.742
    pub omega_l0: FloatValue,

    /// Redshift of the snapshot.
    ///
    /// Default: 0.0
    pub redshift: FloatValue,

    /// Hubble constant in internal units.
    ///
    /// Default: 1.0
    pub hubble: FloatValue,
}

impl Default for CosmologyParameters {
    fn default() -> Self {
        Self {
            omega_m0: 0.258,
            omega_l0: 0.742,
            redshift: 0.0,
            hubble: 1.0,
        }
    }
}

/// How the upper integration bound of each variant is chosen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpperBoundPolicy {
    /// Exact variant integrates to `legacy_exact_bound`, the approximations to the box size
    #[default]
    Legacy,
    /// Every variant integrates to the box size
    BoxSize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntegrationParameters {
    /// Number of Simpson subintervals per integral. Must be even and at least 2.
    ///
    /// Default: 10000
    pub n_steps: usize,

    /// Default: legacy
    pub upper_bound: UpperBoundPolicy,

    /// Upper bound of the exact variant under [`UpperBoundPolicy::Legacy`].
    ///
    /// Default: 400.0
    pub legacy_exact_bound: FloatValue,
}

impl Default for IntegrationParameters {
    fn default() -> Self {
        Self {
            n_steps: DEFAULT_N_STEPS,
            upper_bound: UpperBoundPolicy::Legacy,
            legacy_exact_bound: LEGACY_EXACT_BOUND,
        }
    }
}

impl IntegrationParameters {
    /// Upper integration bound for a variant on a grid with the given box size
    pub fn upper_bound(&self, variant: FieldVariant, box_size: FloatValue) -> FloatValue {
        match (self.upper_bound, variant) {
            (UpperBoundPolicy::Legacy, FieldVariant::Exact) => self.legacy_exact_bound,
            _ => box_size,
        }
    }
}

/// Sign convention of the per-cell temperature difference
///
/// Derivative tables of the legacy tool match [`DifferenceConvention::Forward`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceConvention {
    /// `ΔT[k] = T[k] - T[k+1]`, the contribution of cell `k`
    #[default]
    Shell,
    /// `ΔT[k] = T[k+1] - T[k]`, as written by the legacy tool
    Forward,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DerivativeParameters {
    /// Also compute the radial derivative of the exact integral for every cell
    pub enabled: bool,
    pub difference: DifferenceConvention,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputParameters {
    /// Directory receiving the output tables.
    ///
    /// Default: "."
    pub directory: PathBuf,

    /// Variants to sweep, in output order.
    ///
    /// Default: all three
    pub variants: Vec<FieldVariant>,
}

impl Default for OutputParameters {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            variants: FieldVariant::ALL.to_vec(),
        }
    }
}

/// Full description of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RunConfig {
    pub grid: GridParameters,
    pub input: InputParameters,
    pub cosmology: CosmologyParameters,
    pub integration: IntegrationParameters,
    pub derivative: DerivativeParameters,
    pub output: OutputParameters,
}

impl RunConfig {
    pub fn from_toml_str(contents: &str) -> RSWResult<Self> {
        let config: RunConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> RSWResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check the parameters before any computation starts
    pub fn validate(&self) -> RSWResult<()> {
        match self.input.format {
            InputFormat::Ascii => {
                self.grid_config()?;
            }
            // The header supplies the box size
            InputFormat::Binary => {
                GridConfig::check_cell_count(self.grid.n_cells)?;
            }
        }

        let n_steps = self.integration.n_steps;
        if n_steps < 2 || n_steps % 2 != 0 {
            return Err(RSWError::QuadratureConfiguration(n_steps));
        }
        if self.integration.upper_bound == UpperBoundPolicy::Legacy
            && !(self.integration.legacy_exact_bound > 0.0)
        {
            return Err(RSWError::Configuration(format!(
                "legacy exact bound must be positive, got {}",
                self.integration.legacy_exact_bound
            )));
        }
        if !self.cosmology.redshift.is_finite() || self.cosmology.redshift <= -1.0 {
            return Err(RSWError::Configuration(format!(
                "redshift must be a finite number above -1, got {}",
                self.cosmology.redshift
            )));
        }
        if self.output.variants.is_empty() {
            return Err(RSWError::Configuration(
                "at least one field variant must be selected".to_string(),
            ));
        }
        Ok(())
    }

    pub fn grid_config(&self) -> RSWResult<GridConfig> {
        GridConfig::from_redshift(
            self.grid.n_cells,
            self.grid.box_size,
            self.cosmology.redshift,
        )
    }

    /// Log a warning when the exact and approximate variants integrate over different ranges
    pub fn warn_on_bound_mismatch(&self, box_size: FloatValue) {
        let integration = &self.integration;
        if integration.upper_bound == UpperBoundPolicy::Legacy
            && integration.legacy_exact_bound != box_size
        {
            warn!(
                "exact variant integrates to {} while the approximations integrate to the box size {}",
                integration.legacy_exact_bound, box_size
            );
        }
    }
}
