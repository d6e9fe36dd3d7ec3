use std::f64;
use conv::ValueInto;

/// Shorthand for casting numbers.  Panics if out of range.
pub fn cast<T: ValueInto<U>, U>(x: T) -> U {
    x.value_into().expect("integer conversion failure")
}

/// Swap the pair if `cond` holds.
#[inline]
pub fn swap_if<T>(cond: bool, (x, y): (T, T)) -> (T, T) {
    if cond { (y, x) } else { (x, y) }
}

/// Absolute and relative error tolerances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Toler {
    pub relerr: f64,
    pub abserr: f64,
}

impl Toler {
    /// Whether `x` and `y` agree within the combined tolerance
    /// `abserr + relerr * max(|x|, |y|)`.
    pub fn is_eq(&self, x: f64, y: f64) -> bool {
        (x - y).abs() <= self.abserr + self.relerr * f64::max(x.abs(), y.abs())
    }
}

/// `n!` as a float.  Exact up to `n = 22`.
pub fn factorial(n: i32) -> f64 {
    (2 ..= n).fold(1.0, |acc, k| acc * k as f64)
}

/// Binomial coefficient `C(n, k)` as a float; zero when `k` is out of
/// `0 ..= n`.
pub fn binomial(n: i32, k: i32) -> f64 {
    if k < 0 || n < 0 || k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0 .. k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}
