//! Approximate comparison of floating point and vector values.

use crate::types::{P2, V2};
use cgmath::InnerSpace;

/// Tolerance to use when performing approximate comparisons.
///
/// Values compare as close when they are within the absolute tolerance
/// *or* within the relative tolerance of the larger magnitude.
#[derive(Debug, Clone, Copy)]
pub struct Tol {
    atol: f64,
    rtol: f64,
}

impl Tol {
    /// Create a purely absolute tolerance.
    pub fn abs(atol: f64) -> Tol {
        Tol {
            atol: atol.abs(),
            rtol: 0.0,
        }
    }

    /// Create a tolerance with absolute and relative components.
    pub fn absrel(atol: f64, rtol: f64) -> Tol {
        Tol {
            atol: atol.abs(),
            rtol: rtol.abs(),
        }
    }

    /// A reasonable default tolerance for f64 geometry.
    pub fn default() -> Tol {
        Tol::absrel(1e-9, 1e-7)
    }

    /// Scale both tolerance components by a factor.
    pub fn scale(&self, factor: f64) -> Tol {
        Tol {
            atol: self.atol * factor,
            rtol: self.rtol * factor,
        }
    }
}

/// Trait for types that have a "close" comparison.
pub trait CloseCmp {
    /// Closeness test under the supplied tolerance.
    fn close(tol: Tol, a: &Self, b: &Self) -> bool;
}

impl CloseCmp for f64 {
    fn close(tol: Tol, a: &f64, b: &f64) -> bool {
        let delta = (a - b).abs();
        delta <= tol.atol || delta <= tol.rtol * a.abs().max(b.abs())
    }
}

impl CloseCmp for V2 {
    fn close(tol: Tol, a: &V2, b: &V2) -> bool {
        CloseCmp::close(tol, &(a - b).magnitude(), &0.0)
    }
}

impl CloseCmp for P2 {
    fn close(tol: Tol, a: &P2, b: &P2) -> bool {
        CloseCmp::close(tol, &(a - b).magnitude(), &0.0)
    }
}

/// Closeness test.
///
/// # Parameters
///
/// - `tol`: Tolerance to use.
/// - `a`: One value to compare.
/// - `b`: The other value to compare.
pub fn close<T: CloseCmp>(tol: Tol, a: &T, b: &T) -> bool {
    CloseCmp::close(tol, a, b)
}

#[macro_export]
macro_rules! assert_close {
    ($tol:expr, $a: expr, $b: expr) => {
        if (!$crate::compare::close($tol, &$a, &$b)) {
            panic!(
                "assertion failed: `(left ≈ right)`
  left:  `{:?}`
  right: `{:?}`
  tol:   `{:?}`",
                $a, $b, $tol
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_tolerance() {
        assert!(close(Tol::abs(0.1), &1.0, &1.05));
        assert!(!close(Tol::abs(0.01), &1.0, &1.05));
    }

    #[test]
    fn test_rel_tolerance() {
        assert!(close(Tol::absrel(0.0, 1e-3), &1000.0, &1000.5));
        assert!(!close(Tol::absrel(0.0, 1e-6), &1000.0, &1000.5));
    }

    #[test]
    fn test_vector_close_uses_magnitude() {
        let a = V2::new(1.0, 1.0);
        let b = V2::new(1.0, 1.0 + 1e-12);
        assert!(close(Tol::default(), &a, &b));
    }
}
