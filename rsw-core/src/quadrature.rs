//! Fixed-step composite Simpson quadrature.

use crate::errors::{RSWError, RSWResult};
use crate::grid::FloatValue;
use crate::interpolate::LinearInterpolant;
use num::{Float, NumCast};

/// A real function that can be sampled on an interval
///
/// Evaluation is fallible so that interpolants can refuse points outside their domain.
pub trait Integrand<T: Float> {
    fn evaluate(&self, x: T) -> RSWResult<T>;
}

impl<T, F> Integrand<T> for F
where
    T: Float,
    F: Fn(T) -> T,
{
    fn evaluate(&self, x: T) -> RSWResult<T> {
        Ok(self(x))
    }
}

impl Integrand<FloatValue> for LinearInterpolant {
    fn evaluate(&self, x: FloatValue) -> RSWResult<FloatValue> {
        LinearInterpolant::evaluate(self, x)
    }
}

/// Composite Simpson 1/3 rule with a fixed number of subintervals
///
/// $$ \int_a^b f(x)\,dx \approx \frac{h}{3}\left(f_0 + 2\sum f_{even} + 4\sum f_{odd} + f_n\right),
/// \quad h = \frac{b - a}{n} $$
///
/// The rule is exact for polynomials up to degree 3.
///
/// ```rust
/// use rsw_core::quadrature::SimpsonIntegrator;
///
/// let simpson = SimpsonIntegrator::new(4).unwrap();
/// let area = simpson.integrate(&|x: f64| x * x, 0.0, 3.0).unwrap();
/// assert!((area - 9.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpsonIntegrator {
    n_steps: usize,
}

impl SimpsonIntegrator {
    /// Create an integrator using `n_steps` subintervals
    ///
    /// `n_steps` must be even and at least 2, otherwise
    /// [`RSWError::QuadratureConfiguration`] is returned.
    pub fn new(n_steps: usize) -> RSWResult<Self> {
        if n_steps < 2 || n_steps % 2 != 0 {
            return Err(RSWError::QuadratureConfiguration(n_steps));
        }
        Ok(Self { n_steps })
    }

    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Integrate `f` over `[a, b]`
    ///
    /// Nodes are placed at `a + i * h`; the last node is `b` itself so the integrand
    /// is never sampled past the upper bound.
    pub fn integrate<T, I>(&self, f: &I, a: T, b: T) -> RSWResult<T>
    where
        T: Float,
        I: Integrand<T> + ?Sized,
    {
        let n = self.n_steps;
        let h = (b - a) / cast::<T>(n)?;
        let node = |i: usize| -> RSWResult<T> { Ok(a + cast::<T>(i)? * h) };

        let f0 = f.evaluate(a)?;
        let fn_ = f.evaluate(b)?;

        let mut even = T::zero();
        for i in (2..n).step_by(2) {
            even = even + f.evaluate(node(i)?)?;
        }

        let mut odd = T::zero();
        for i in (1..n).step_by(2) {
            odd = odd + f.evaluate(node(i)?)?;
        }

        let two = cast::<T>(2)?;
        let three = cast::<T>(3)?;
        let four = cast::<T>(4)?;
        Ok(h / three * (f0 + two * even + four * odd + fn_))
    }
}

fn cast<T: Float>(value: usize) -> RSWResult<T> {
    <T as NumCast>::from(value)
        .ok_or_else(|| RSWError::Error(format!("{} is not representable", value)))
}
