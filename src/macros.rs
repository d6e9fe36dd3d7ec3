/// Check whether two `f64` numbers are equal within the given
/// [`Toler`](utils/struct.Toler.html).
///
/// ```
/// #[macro_use]
/// extern crate acm;
///
/// use acm::utils::Toler;
///
/// fn main() {
///     toler_assert_eq!(Toler { abserr: 1e-2, relerr: 1e-3 }, -2.5, -2.502);
/// }
/// ```
#[macro_export]
macro_rules! toler_assert_eq {
    ($toler:expr, $left:expr, $right:expr) => {
        let toler = &$toler;
        let left = $left;
        let right = $right;
        assert!(toler.is_eq(left, right),
                "{} does not equal to {} within {:?}",
                left, right, toler)
    }
}

/// Check that every entry of a matrix is within tolerance of zero.
#[macro_export]
macro_rules! toler_assert_zero_mat {
    ($toler:expr, $mat:expr) => {
        let toler = &$toler;
        let mat = &$mat;
        for i in 0 .. mat.num_rows() {
            for j in 0 .. mat.num_cols() {
                assert!(toler.is_eq(mat[(i, j)], 0.0),
                        "entry ({}, {}) = {} is not zero within {:?}",
                        i, j, mat[(i, j)], toler);
            }
        }
    }
}

/// Declare a regular expression (`Regex`) cached via `lazy_static!`.
/// This macro is mainly for internal use.
///
/// ```
/// #[macro_use]
/// extern crate lazy_static;
/// #[macro_use]
/// extern crate acm;
/// extern crate regex;
///
/// use regex::Regex;
///
/// fn main() {
///     let r: &Regex = re!(r"^SpHarm_(\d)(\d)(\d+)$");
///     assert!(r.is_match("SpHarm_310"));
/// }
/// ```
#[macro_export]
macro_rules! re {
    ($e:expr) => {
        {
            lazy_static! {
                static ref REGEX: Regex = Regex::new($e).unwrap();
            }
            &REGEX
        }
    }
}
