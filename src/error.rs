//! Error kinds raised by the engine.
use std::{io, result};
use std::path::PathBuf;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// A range argument is inverted or an index is out of bounds.
        Range(msg: String) {
            display("range error: {}", msg)
        }
        /// Division by zero or Γ at a non-positive integer.
        Singular(msg: String) {
            display("singular operator: {}", msg)
        }
        NonPositiveLambda(lambda: f64) {
            display("lambda must be positive, got {}", lambda)
        }
        UndefinedOperator(symbol: String) {
            display("undefined operator: {}", symbol)
        }
        /// Reference state or transition lies outside the truncated space.
        MissingReference(msg: String) {
            display("missing reference: {}", msg)
        }
        OptimisationFailure(msg: String) {
            display("optimisation failure: {}", msg)
        }
        /// Matrix square root of a matrix that is not positive
        /// semidefinite.
        NegativeEigenvalue(value: f64) {
            display("negative eigenvalue {} in matrix square root", value)
        }
        CgFile(path: PathBuf, err: io::Error) {
            display("No CG file for these parameters: {}: {}",
                    path.display(), err)
            source(err)
        }
        Lapack(info: i32) {
            display("LAPACK routine failed with info = {}", info)
        }
        Io(err: io::Error) {
            from()
            display("{}", err)
            source(err)
        }
        Yaml(err: serde_yaml::Error) {
            from()
            display("invalid configuration: {}", err)
            source(err)
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Raise `Error::Range` unless `lo <= hi`.
pub fn check_range<T: PartialOrd + ::std::fmt::Display>(
    what: &str,
    lo: T,
    hi: T,
) -> Result<()> {
    if lo <= hi {
        Ok(())
    } else {
        Err(Error::Range(format!("{} range {} .. {} is inverted", what, lo, hi)))
    }
}
