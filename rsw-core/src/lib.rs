//! Sachs-Wolfe line-of-sight integrals over the columns of a regular 3D grid
//!
//! Every column `(i, j)` of an `N × N × N` [`grid::GridStore`] is turned into a depth
//! profile ([`profile`]), interpolated linearly ([`interpolate`]) and integrated with
//! composite Simpson quadrature ([`quadrature`]). [`integral`] combines these into the
//! full column integral and its per-cell radial derivative, and [`sweep`] runs them
//! over the whole grid.

pub mod config;
pub mod errors;
pub mod grid;
pub mod integral;
pub mod interpolate;
pub mod io;
pub mod profile;
pub mod quadrature;
pub mod run;
pub mod sweep;

#[cfg(feature = "python")]
pub mod python;
