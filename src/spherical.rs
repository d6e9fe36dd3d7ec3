//! SO(5) spherical harmonics on the SO(5)⊃SO(3) basis.
//!
//! Matrices here are "4π-scaled": an entry of `Y_{vαL}` is `4π` times the
//! alternative SO(3)-reduced matrix element, i.e. the reduced element
//! divided by `√(2L_f + 1)`.
use std::{fmt, str};
use std::rc::Rc;
use fnv::FnvHashMap;
use libm;
use regex::Regex;
use super::cg::CgStore;
use super::error::{check_range, Error, Result};
use super::labels::{dim_so5r3, lbs_so5r3_rng_v_var_l, Vlabel};
use super::linalg::matmul;
use super::mat::Mat;

/// Largest seniority among the tabulated harmonics.
pub const HARM_V_MAX: i32 = 6;

/// SO(5) spherical harmonic `Y_{vαL}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Harm {
    pub v: i32,
    pub alpha: i32,
    pub l: i32,
}

impl Harm {
    /// Fails unless `(v, α, L)` labels a tabulated harmonic.
    pub fn new(v: i32, alpha: i32, l: i32) -> Result<Self> {
        if v < 0 || v > HARM_V_MAX || l < 0 || alpha < 1 || alpha > dim_so5r3(v, l) {
            return Err(Error::UndefinedOperator(format!("SpHarm_{}{}{}", v, alpha, l)));
        }
        Ok(Harm { v, alpha, l })
    }
}

impl fmt::Display for Harm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SpHarm_{}{}{}", self.v, self.alpha, self.l)
    }
}

/// Spherical operator symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SphOp {
    Harm(Harm),
    /// `(−1)^L √(2L + 1)` on the diagonal.
    SqLdim,
    /// `(−1)^L / √(2L + 1)` on the diagonal.
    SqLdiv,
}

impl fmt::Display for SphOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SphOp::Harm(y) => y.fmt(f),
            SphOp::SqLdim => f.write_str("SpDiag_sqLdim"),
            SphOp::SqLdiv => f.write_str("SpDiag_sqLdiv"),
        }
    }
}

impl str::FromStr for SphOp {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SpDiag_sqLdim" => return Ok(SphOp::SqLdim),
            "SpDiag_sqLdiv" => return Ok(SphOp::SqLdiv),
            _ => {}
        }
        let caps = re!(r"^SpHarm_(\d)(\d)(\d+)$").captures(s)
            .ok_or_else(|| Error::UndefinedOperator(s.to_owned()))?;
        let num = |i: usize| -> Result<i32> {
            caps[i].parse().map_err(|_| Error::UndefinedOperator(s.to_owned()))
        };
        Ok(SphOp::Harm(Harm::new(num(1)?, num(2)?, num(3)?)?))
    }
}

/// Number of harmonic factors in a product.
pub fn num_so5r3_prod(ys: &[SphOp]) -> i32 {
    ys.iter()
        .filter(|y| match **y {
            SphOp::Harm(_) => true,
            _ => false,
        })
        .count() as i32
}

fn ln_factorial(n: i32) -> f64 {
    libm::lgamma_r(n as f64 + 1.0).0
}

/// Doubly reduced SO(5) matrix element `⟨u ‖ Y^w ‖ v⟩` (4π-scaled).
pub fn me_so5red(u: i32, w: i32, v: i32) -> f64 {
    let sigma = u + v + w;
    if u < 0 || v < 0 || w < 0 || (u - w).abs() > v || v > u + w || sigma % 2 != 0 {
        return 0.0;
    }
    let h = sigma / 2;
    let ln_front = ln_factorial(h + 1)
        - ln_factorial(h - u) - ln_factorial(h - v) - ln_factorial(h - w);
    let ln_fact = ln_factorial(sigma - 2 * u + 1) + ln_factorial(sigma - 2 * w + 1)
        + ln_factorial(sigma - 2 * v + 1) - ln_factorial(sigma + 3);
    let rational = ((2 * v + 3) * (2 * w + 3) * (sigma + 4)) as f64
        / ((u + 2) * (u + 1)) as f64;
    (ln_front + 0.5 * ln_fact).exp() * rational.sqrt()
}

/// Truncation of the SO(5)⊃SO(3) space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SphTrunc {
    pub v_min: i32,
    pub v_max: i32,
    pub l_min: i32,
    pub l_max: i32,
}

impl SphTrunc {
    pub fn check(&self) -> Result<()> {
        check_range("v", 0, self.v_min)?;
        check_range("v", self.v_min, self.v_max)?;
        check_range("L", 0, self.l_min)?;
        check_range("L", self.l_min, self.l_max)
    }

    pub fn labels(&self) -> Vec<Vlabel> {
        lbs_so5r3_rng_v_var_l(self.v_min, self.v_max, self.l_min, self.l_max)
    }
}

/// Matrix of `Y_{vαL}` on the truncated space.
pub fn rep_so5_y(cg: &CgStore, y: Harm, trunc: SphTrunc) -> Result<Mat<f64>> {
    trunc.check()?;
    let labels = trunc.labels();
    let n = labels.len();
    let mut m = Mat::zero(n, n);
    for (i, f) in labels.iter().enumerate() {
        for (j, s) in labels.iter().enumerate() {
            let red = me_so5red(f.v, y.v, s.v);
            if red == 0.0 {
                continue;
            }
            m[(i, j)] = red * cg.cg_so5r3(s.v, s.alpha, s.l, y.v, y.alpha, y.l,
                                          f.v, f.alpha, f.l)?;
        }
    }
    Ok(m)
}

fn rep_sp_diag(op: SphOp, trunc: SphTrunc) -> Mat<f64> {
    let diag: Vec<f64> = trunc.labels().iter()
        .map(|s| {
            let sign = if s.l % 2 == 0 { 1.0 } else { -1.0 };
            let w = ((2 * s.l + 1) as f64).sqrt();
            match op {
                SphOp::SqLdim => sign * w,
                _ => sign / w,
            }
        })
        .collect();
    Mat::from_diag(&diag)
}

/// Memoising spherical engine.
#[derive(Debug)]
pub struct SphericalEngine<'a> {
    cg: &'a CgStore,
    ys: FnvHashMap<(Harm, SphTrunc), Rc<Mat<f64>>>,
    prods: FnvHashMap<(Vec<SphOp>, SphTrunc), Rc<Mat<f64>>>,
}

impl<'a> SphericalEngine<'a> {
    pub fn new(cg: &'a CgStore) -> Self {
        Self {
            cg,
            ys: Default::default(),
            prods: Default::default(),
        }
    }

    pub fn cg(&self) -> &'a CgStore {
        self.cg
    }

    pub fn cache_len(&self) -> usize {
        self.ys.len() + self.prods.len()
    }

    pub fn clear(&mut self) {
        self.ys.clear();
        self.prods.clear();
    }

    pub fn rep_so5_y_rem(&mut self, y: Harm, trunc: SphTrunc) -> Result<Rc<Mat<f64>>> {
        if let Some(m) = self.ys.get(&(y, trunc)) {
            return Ok(m.clone());
        }
        let m = Rc::new(rep_so5_y(self.cg, y, trunc)?);
        self.ys.insert((y, trunc), m.clone());
        Ok(m)
    }

    /// Product of the factors in `ys`, leftmost factor outermost.
    pub fn rep_so5r3_prod_rem(&mut self, ys: &[SphOp], trunc: SphTrunc)
                              -> Result<Rc<Mat<f64>>> {
        let key = (ys.to_vec(), trunc);
        if let Some(m) = self.prods.get(&key) {
            return Ok(m.clone());
        }
        trunc.check()?;
        let n = trunc.labels().len();
        let mut m = Mat::identity(n);
        for &y in ys.iter().rev() {
            let f = match y {
                SphOp::Harm(h) => (*self.rep_so5_y_rem(h, trunc)?).clone(),
                op => rep_sp_diag(op, trunc),
            };
            m = matmul(&f, &m);
        }
        let m = Rc::new(m);
        self.prods.insert(key, m.clone());
        Ok(m)
    }

    pub fn rep_so5r3_prod(&mut self, ys: &[SphOp], trunc: SphTrunc) -> Result<Mat<f64>> {
        let r = self.rep_so5r3_prod_rem(ys, trunc).map(|m| (*m).clone());
        self.clear();
        r
    }
}
