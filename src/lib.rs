//! Algebraic collective model: matrix representations of Bohr model
//! Hamiltonians on a truncated SU(1,1)×SO(5) basis, their spectra, and
//! transition matrix elements between eigenstates.
extern crate cblas;
extern crate conv;
extern crate flate2;
extern crate fnv;
extern crate lapacke;
#[macro_use]
extern crate lazy_static;
extern crate libm;
#[cfg(test)]
extern crate netlib_src;
extern crate num;
#[macro_use]
extern crate quick_error;
#[cfg(test)]
extern crate rand;
#[cfg(test)]
extern crate rand_distr;
#[cfg(test)]
extern crate rand_xorshift;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_yaml;
extern crate wigner_symbols;
extern crate xz2;

#[macro_use]
mod macros;

pub mod ang_mom;
pub mod cg;
pub mod context;
pub mod driver;
pub mod eigen;
pub mod error;
pub mod hamiltonian;
pub mod io;
pub mod labels;
pub mod linalg;
pub mod mat;
pub mod op;
pub mod radial;
pub mod radial_prod;
pub mod spherical;
pub mod utils;
pub mod xspace;

pub use context::{AcmContext, LambdaFun, Xparams};
pub use driver::{acm_adapt, acm_scale, AcmResults};
pub use error::{Error, Result};
pub use op::OpSum;
