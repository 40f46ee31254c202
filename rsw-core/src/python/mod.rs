//! Python bindings for the `rsw._lib.core` module
//!
//! Grids can be read from disk with a config dict or built directly from numpy arrays.
//! Variants are passed as strings (`"exact"`, `"approx1"`, `"approx2"`).

use crate::config::{DifferenceConvention, IntegrationParameters, RunConfig};
use crate::errors::{RSWError, RSWResult};
use crate::grid::{FieldVariant, FloatValue, GridCell, GridConfig, GridStore};
use crate::interpolate::LinearInterpolant;
use crate::io::load_grid;
use crate::profile::ColumnProfile;
use crate::quadrature::{Integrand, SimpsonIntegrator};
use crate::run::run_on_grid;
use crate::sweep::{ColumnSweepDriver, IntegralRow};
use numpy::ndarray::Array2;
use numpy::{PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

impl From<RSWError> for PyErr {
    fn from(err: RSWError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn parse_variant(variant: &str) -> PyResult<FieldVariant> {
    Ok(variant.parse::<FieldVariant>()?)
}

fn integration_from(parameters: Option<Bound<'_, PyAny>>) -> PyResult<IntegrationParameters> {
    match parameters {
        Some(parameters) => pythonize::depythonize::<IntegrationParameters>(&parameters)
            .map_err(|e| PyValueError::new_err(format!("{}", e))),
        None => Ok(IntegrationParameters::default()),
    }
}

/// A grid of cells together with the integration settings used on it
///
/// Example:
///     grid = GridStore.from_arrays(positions, exact, approx1, approx2, box_size=400.0)
///     value = column_integral(grid, 0, 0, "exact")
#[pyclass]
#[pyo3(name = "GridStore")]
#[derive(Debug, Clone)]
pub struct PyGridStore {
    grid: GridStore,
    integration: IntegrationParameters,
}

#[pymethods]
impl PyGridStore {
    /// Build a grid from flat arrays in row-major `(i, j, k)` order
    ///
    /// `positions` has shape `(N³, 3)`; the field arrays have length `N³`.
    #[staticmethod]
    #[pyo3(signature = (positions, exact, approx1, approx2, box_size, redshift=0.0, integration=None))]
    fn from_arrays(
        positions: PyReadonlyArray2<'_, FloatValue>,
        exact: PyReadonlyArray1<'_, FloatValue>,
        approx1: PyReadonlyArray1<'_, FloatValue>,
        approx2: PyReadonlyArray1<'_, FloatValue>,
        box_size: FloatValue,
        redshift: FloatValue,
        integration: Option<Bound<'_, PyAny>>,
    ) -> PyResult<Self> {
        let positions = positions.as_array();
        let exact = exact.as_array();
        let approx1 = approx1.as_array();
        let approx2 = approx2.as_array();

        let count = exact.len();
        if positions.shape() != [count, 3] || approx1.len() != count || approx2.len() != count {
            return Err(PyValueError::new_err(format!(
                "expected positions of shape ({}, 3) and fields of length {}",
                count, count
            )));
        }
        let n_cells = cube_root(count).ok_or_else(|| {
            PyValueError::new_err(format!("{} cells do not form a cubic grid", count))
        })?;

        let cells = (0..count)
            .map(|m| {
                GridCell::new(
                    m as i64,
                    [positions[[m, 0]], positions[[m, 1]], positions[[m, 2]]],
                    exact[m],
                    approx1[m],
                    approx2[m],
                )
            })
            .collect();
        let config = GridConfig::from_redshift(n_cells, box_size, redshift)?;
        Ok(Self {
            grid: GridStore::from_cells(config, cells)?,
            integration: integration_from(integration)?,
        })
    }

    /// Read the grid file described by a run configuration dict
    #[staticmethod]
    fn read(config: Bound<'_, PyAny>) -> PyResult<Self> {
        let config = pythonize::depythonize::<RunConfig>(&config)
            .map_err(|e| PyValueError::new_err(format!("{}", e)))?;
        config.validate()?;
        Ok(Self {
            grid: load_grid(&config)?,
            integration: config.integration,
        })
    }

    #[getter]
    fn n_cells(&self) -> usize {
        self.grid.n_cells()
    }

    #[getter]
    fn box_size(&self) -> FloatValue {
        self.grid.config().box_size()
    }

    #[getter]
    fn scale_factor(&self) -> FloatValue {
        self.grid.config().scale_factor()
    }

    /// Field value of one cell
    fn field(&self, i: usize, j: usize, k: usize, variant: &str) -> PyResult<FloatValue> {
        Ok(self.grid.cell_at(i, j, k)?.field(parse_variant(variant)?))
    }

    /// Position `(x, y, z)` of one cell
    fn position(&self, i: usize, j: usize, k: usize) -> PyResult<[FloatValue; 3]> {
        Ok(self.grid.cell_at(i, j, k)?.position)
    }
}

fn cube_root(count: usize) -> Option<usize> {
    let n = (count as f64).cbrt().round() as usize;
    (n * n * n == count).then_some(n)
}

/// Unscaled integral of column `(i, j)` from 0 to the variant's upper bound
#[pyfunction]
fn column_integral(grid: &PyGridStore, i: usize, j: usize, variant: &str) -> PyResult<FloatValue> {
    let driver = ColumnSweepDriver::new(&grid.grid, &grid.integration)?;
    Ok(driver
        .computer()
        .full_integral(i, j, parse_variant(variant)?)?)
}

/// Scaled integrals of every column as an `(N², 6)` array of `n, i, j, x, y, value`
#[pyfunction]
fn sweep<'py>(
    py: Python<'py>,
    grid: &PyGridStore,
    variant: &str,
) -> PyResult<Bound<'py, PyArray2<FloatValue>>> {
    let driver = ColumnSweepDriver::new(&grid.grid, &grid.integration)?;
    let mut rows: Vec<IntegralRow> = Vec::new();
    driver.sweep_variant(parse_variant(variant)?, &mut rows)?;

    let data = rows
        .iter()
        .flat_map(|r| {
            [
                r.column_index as FloatValue,
                r.i as FloatValue,
                r.j as FloatValue,
                r.x,
                r.y,
                r.value,
            ]
        })
        .collect();
    let table = Array2::from_shape_vec((rows.len(), 6), data)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(PyArray2::from_owned_array(py, table))
}

/// Per-cell `depth, T, ΔT, dT/dr` of the exact variant as an `(N, 4)` array
#[pyfunction]
#[pyo3(signature = (grid, i, j, difference="shell"))]
fn depth_derivative<'py>(
    py: Python<'py>,
    grid: &PyGridStore,
    i: usize,
    j: usize,
    difference: &str,
) -> PyResult<Bound<'py, PyArray2<FloatValue>>> {
    let difference = match difference {
        "shell" => DifferenceConvention::Shell,
        "forward" => DifferenceConvention::Forward,
        other => {
            return Err(PyValueError::new_err(format!(
                "unknown difference convention '{}', expected shell or forward",
                other
            )))
        }
    };
    let driver = ColumnSweepDriver::new(&grid.grid, &grid.integration)?;
    let profile = driver
        .computer()
        .depth_derivative_profile(i, j, difference)?;

    let mut table = Array2::zeros((profile.len(), 4));
    for k in 0..profile.len() {
        table[[k, 0]] = profile.depths[k];
        table[[k, 1]] = profile.partial_integrals[k];
        table[[k, 2]] = profile.differences[k];
        table[[k, 3]] = profile.derivatives[k];
    }
    Ok(PyArray2::from_owned_array(py, table))
}

/// Run a configuration dict end to end, returning a summary dict
#[pyfunction]
fn run<'py>(py: Python<'py>, config: Bound<'py, PyAny>) -> PyResult<Bound<'py, PyAny>> {
    let config = pythonize::depythonize::<RunConfig>(&config)
        .map_err(|e| PyValueError::new_err(format!("{}", e)))?;
    config.validate()?;
    let grid = load_grid(&config)?;
    let summary = run_on_grid(&config, &grid)?;
    Ok(pythonize::pythonize(py, &summary)?)
}

/// Python wrapper for LinearInterpolant
#[pyclass]
#[pyo3(name = "LinearInterpolant")]
#[derive(Debug, Clone)]
pub struct PyLinearInterpolant(pub LinearInterpolant);

#[pymethods]
impl PyLinearInterpolant {
    #[new]
    fn new(depths: Vec<FloatValue>, values: Vec<FloatValue>) -> PyResult<Self> {
        let profile = ColumnProfile::from_samples(depths, values)?;
        Ok(Self(LinearInterpolant::try_from(profile)?))
    }

    fn __call__(&self, z: FloatValue) -> PyResult<FloatValue> {
        Ok(self.0.evaluate(z)?)
    }

    #[getter]
    fn domain(&self) -> (FloatValue, FloatValue) {
        self.0.domain()
    }

    /// Simpson integral over `[a, b]`
    #[pyo3(signature = (a, b, n_steps=10000))]
    fn integrate(&self, a: FloatValue, b: FloatValue, n_steps: usize) -> PyResult<FloatValue> {
        Ok(SimpsonIntegrator::new(n_steps)?.integrate(&self.0, a, b)?)
    }
}

struct PyCallable<'a, 'py>(&'a Bound<'py, PyAny>);

impl Integrand<FloatValue> for PyCallable<'_, '_> {
    fn evaluate(&self, x: FloatValue) -> RSWResult<FloatValue> {
        self.0
            .call1((x,))
            .and_then(|value| value.extract::<FloatValue>())
            .map_err(|e| RSWError::Error(e.to_string()))
    }
}

/// Simpson integral of a Python callable over `[a, b]`
#[pyfunction]
#[pyo3(signature = (f, a, b, n_steps=10000))]
fn simpson(f: Bound<'_, PyAny>, a: FloatValue, b: FloatValue, n_steps: usize) -> PyResult<FloatValue> {
    Ok(SimpsonIntegrator::new(n_steps)?.integrate(&PyCallable(&f), a, b)?)
}

#[pymodule]
pub fn core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyGridStore>()?;
    m.add_class::<PyLinearInterpolant>()?;
    m.add_function(wrap_pyfunction!(column_integral, m)?)?;
    m.add_function(wrap_pyfunction!(sweep, m)?)?;
    m.add_function(wrap_pyfunction!(depth_derivative, m)?)?;
    m.add_function(wrap_pyfunction!(simpson, m)?)?;
    m.add_function(wrap_pyfunction!(run, m)?)?;
    Ok(())
}
