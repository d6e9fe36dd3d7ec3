//! Matrices of products of radial operators across λ bases.
//!
//! A product is split into SU(1,1) atoms and `β^K (d/dβ)^T` atoms.  The
//! total λ shift is shared among the atoms, and each `β^K (d/dβ)^T` atom is
//! assembled from unit factors that shift λ by −1, 0 or +1.  Unit factors
//! with no closed form are taken from matrix square roots.
use std::{fmt, str};
use std::rc::Rc;
use fnv::FnvHashMap;
use super::error::{check_range, Error, Result};
use super::linalg::{matmul, matrix_sqrt, matrix_sqrt_inv};
use super::mat::Mat;
use super::radial::{rep_radial, RadialMe};

/// Radial operator symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RadialOp {
    S0,
    Sp,
    Sm,
    B,
    Bm,
    B2,
    Bm2,
    Db,
    D2b,
    BDb,
}

impl RadialOp {
    pub const ALL: [RadialOp; 10] = [
        RadialOp::S0, RadialOp::Sp, RadialOp::Sm,
        RadialOp::B, RadialOp::Bm, RadialOp::B2, RadialOp::Bm2,
        RadialOp::Db, RadialOp::D2b, RadialOp::BDb,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            RadialOp::S0 => "Radial_S0",
            RadialOp::Sp => "Radial_Sp",
            RadialOp::Sm => "Radial_Sm",
            RadialOp::B => "Radial_b",
            RadialOp::Bm => "Radial_bm",
            RadialOp::B2 => "Radial_b2",
            RadialOp::Bm2 => "Radial_bm2",
            RadialOp::Db => "Radial_Db",
            RadialOp::D2b => "Radial_D2b",
            RadialOp::BDb => "Radial_bDb",
        }
    }

    /// Powers `(K, T)` of `β` and `d/dβ`.  SU(1,1) generators have none.
    pub fn kt(self) -> Option<(i32, i32)> {
        match self {
            RadialOp::S0 | RadialOp::Sp | RadialOp::Sm => None,
            RadialOp::B => Some((1, 0)),
            RadialOp::Bm => Some((-1, 0)),
            RadialOp::B2 => Some((2, 0)),
            RadialOp::Bm2 => Some((-2, 0)),
            RadialOp::Db => Some((0, 1)),
            RadialOp::D2b => Some((0, 2)),
            RadialOp::BDb => Some((1, 1)),
        }
    }
}

impl fmt::Display for RadialOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl str::FromStr for RadialOp {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        RadialOp::ALL.iter()
            .cloned()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| Error::UndefinedOperator(s.to_owned()))
    }
}

/// Factor of a parsed product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RadialAtom {
    /// `S−`, `S0` or `S+` for −1, 0, +1.
    Su11(i32),
    /// `β^k (d/dβ)^t`
    Kt { k: i32, t: i32 },
}

impl RadialAtom {
    /// Number of unit factors, i.e. the largest shift with an analytic
    /// factorisation.
    pub fn capacity(self) -> i32 {
        match self {
            RadialAtom::Su11(_) => 0,
            RadialAtom::Kt { k, t } => k.abs() + t,
        }
    }
}

/// Split a product, written left to right, into atoms (also left to
/// right).  Merging runs from the right: `β` factors add to `K`; a
/// derivative adds to `T` only while no `β` sits to its right.
pub fn parse_radial_product(ops: &[RadialOp]) -> Vec<RadialAtom> {
    let mut atoms = Vec::new();
    let mut acc: Option<(i32, i32)> = None;
    for &op in ops.iter().rev() {
        match (op, op.kt()) {
            (RadialOp::BDb, _) | (_, None) => {
                if let Some((k, t)) = acc.take() {
                    atoms.push(RadialAtom::Kt { k, t });
                }
                atoms.push(match op {
                    RadialOp::Sp => RadialAtom::Su11(1),
                    RadialOp::Sm => RadialAtom::Su11(-1),
                    RadialOp::S0 => RadialAtom::Su11(0),
                    _ => RadialAtom::Kt { k: 1, t: 1 },
                });
            }
            (_, Some((dk, 0))) => {
                let (k, t) = acc.unwrap_or((0, 0));
                acc = Some((k + dk, t));
            }
            (_, Some((_, dt))) => {
                acc = match acc {
                    Some((0, t)) => Some((0, t + dt)),
                    Some((k, t)) => {
                        atoms.push(RadialAtom::Kt { k, t });
                        Some((0, dt))
                    }
                    None => Some((0, dt)),
                };
            }
        }
    }
    if let Some((k, t)) = acc {
        atoms.push(RadialAtom::Kt { k, t });
    }
    atoms.reverse();
    atoms
}

/// Share the total shift among the atoms.  Returns `(atom, shift)` pairs
/// left to right; an extra identity atom `Kt { k: 0, t: 0 }` is prepended
/// (positive shift) or appended (negative shift) when the atoms cannot
/// absorb the whole shift.
pub fn lambda_radial_op_list(atoms: &[RadialAtom], shift: i32)
                             -> Vec<(RadialAtom, i32)> {
    let mut list: Vec<(RadialAtom, i32)> = atoms.iter().map(|&a| (a, 0)).collect();
    let kts: Vec<usize> = list.iter()
        .enumerate()
        .filter(|&(_, &(a, _))| match a {
            RadialAtom::Kt { .. } => true,
            _ => false,
        })
        .map(|(i, _)| i)
        .collect();

    // odd capacities carry ±1, steering towards the target
    let mut sum = 0;
    for &i in &kts {
        if list[i].0.capacity() % 2 != 0 {
            let s = if sum < shift || (sum == shift && shift >= 0) { 1 } else { -1 };
            list[i].1 = s;
            sum += s;
        }
    }

    let mut rest = shift - sum;
    let mut last = kts.first().cloned();
    for &i in &kts {
        let cap = list[i].0.capacity();
        while rest >= 2 && list[i].1 + 2 <= cap {
            list[i].1 += 2;
            rest -= 2;
            last = Some(i);
        }
        while rest <= -2 && list[i].1 - 2 >= -cap {
            list[i].1 -= 2;
            rest += 2;
            last = Some(i);
        }
    }
    if rest == 0 {
        return list;
    }
    if rest.abs() == 1 {
        if let Some(&i) = kts.first() {
            list[i].1 += rest;
            return list;
        }
    }
    if rest % 2 != 0 {
        if let Some(i) = last {
            list[i].1 += rest.signum();
            rest -= rest.signum();
        }
    }
    let extra = (RadialAtom::Kt { k: 0, t: 0 }, rest);
    if shift > 0 {
        list.insert(0, extra);
    } else {
        list.push(extra);
    }
    list
}

/// Unit shifts of one `β^K (d/dβ)^T` atom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Splits {
    /// One entry per `β` (or `1/β`) unit.
    pub beta: Vec<i32>,
    /// One entry per `d/dβ` unit.
    pub d: Vec<i32>,
    /// Even shift of a trailing identity, applied last.
    pub id_shift: i32,
    /// The atom is an identity with an odd shift, built as
    /// `β · Id(R ∓ 1) · (1/β)`.
    pub odd_identity: bool,
}

impl Splits {
    /// All shifts, identity first.
    pub fn shifts(&self) -> Vec<i32> {
        let mut v = Vec::new();
        if self.id_shift != 0 || (self.beta.is_empty() && self.d.is_empty()) {
            v.push(self.id_shift);
        }
        v.extend(&self.beta);
        v.extend(&self.d);
        v
    }

    pub fn total(&self) -> i32 {
        self.id_shift + self.beta.iter().sum::<i32>() + self.d.iter().sum::<i32>()
    }
}

/// Assign each unit of `β^K (d/dβ)^T` a shift in {−1, 0, +1} summing to
/// `r`, leaving zeros in pairs wherever possible.
pub fn lambda_splits(k: i32, t: i32, r: i32) -> Splits {
    let nb = k.abs();
    let nd = t.max(0);
    let n = nb + nd;
    if n == 0 {
        return Splits {
            id_shift: r,
            odd_identity: r % 2 != 0,
            .. Default::default()
        };
    }
    let s = r.signum();
    if r.abs() >= n {
        let mut beta = vec![s; nb as usize];
        let mut d = vec![s; nd as usize];
        let mut left = r.abs() - n;
        if left % 2 != 0 {
            if nb > 0 {
                beta[0] = 0;
            } else {
                d[0] = 0;
            }
            left += 1;
        }
        return Splits { beta, d, id_shift: s * left, odd_identity: false };
    }
    let p = r.abs();
    let x_max = nb.min(p);
    let x = (0 ..= x_max).rev()
        .filter(|&x| p - x <= nd)
        .find(|&x| (nb - x) % 2 == 0 && (nd - (p - x)) % 2 == 0)
        .unwrap_or(x_max);
    let y = p - x;
    let mut beta: Vec<i32> = (0 .. nb).map(|i| if i < x { s } else { 0 }).collect();
    let mut d: Vec<i32> = (0 .. nd).map(|i| if i < y { s } else { 0 }).collect();
    if (nb - x) % 2 != 0 && (nd - y) % 2 != 0 {
        // a lone β zero and a lone d zero become a cancelling pair, raising
        // first since the derivatives act first
        if let Some(b) = beta.iter_mut().rev().find(|b| **b == 0) {
            *b = -1;
        }
        if let Some(e) = d.iter_mut().rev().find(|e| **e == 0) {
            *e = 1;
        }
    }
    Splits { beta, d, id_shift: 0, odd_identity: false }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Unit {
    Beta,
    BetaInv,
    D,
}

type RepKey = (RadialMe, u64, i32, i32);
type KtKey = (i32, i32, i32, u64, i32, i32);
type ProdKey = (Vec<RadialOp>, u64, u64, i32, i32, i32);
type LcKey = (Vec<(u64, Vec<RadialOp>)>, u64, u64, i32, i32, i32);

/// Linear combination of radial products.
pub type RadialLc = [(f64, Vec<RadialOp>)];

/// Memoising radial engine.  The `_rem` methods keep their results until
/// `clear` is called; the others clear every table before returning.
#[derive(Debug, Default)]
pub struct RadialEngine {
    nu_lap: i32,
    reps: FnvHashMap<RepKey, Rc<Mat<f64>>>,
    sqrts: FnvHashMap<RepKey, Rc<Mat<f64>>>,
    sqrt_invs: FnvHashMap<RepKey, Rc<Mat<f64>>>,
    kts: FnvHashMap<KtKey, Rc<Mat<f64>>>,
    prods: FnvHashMap<ProdKey, Rc<Mat<f64>>>,
    lcs: FnvHashMap<LcKey, Rc<Mat<f64>>>,
}

impl RadialEngine {
    pub fn new(nu_lap: i32) -> Self {
        Self { nu_lap: nu_lap.max(0), .. Default::default() }
    }

    pub fn nu_lap(&self) -> i32 {
        self.nu_lap
    }

    /// Total number of memoised entries.
    pub fn cache_len(&self) -> usize {
        self.reps.len() + self.sqrts.len() + self.sqrt_invs.len()
            + self.kts.len() + self.prods.len() + self.lcs.len()
    }

    pub fn clear(&mut self) {
        self.reps.clear();
        self.sqrts.clear();
        self.sqrt_invs.clear();
        self.kts.clear();
        self.prods.clear();
        self.lcs.clear();
    }

    pub fn rep(&mut self, op: RadialMe, lambda: f64, nu_min: i32, nu_max: i32)
               -> Result<Rc<Mat<f64>>> {
        let key = (op, lambda.to_bits(), nu_min, nu_max);
        if let Some(m) = self.reps.get(&key) {
            return Ok(m.clone());
        }
        let m = Rc::new(rep_radial(op, lambda, nu_min, nu_max)?);
        self.reps.insert(key, m.clone());
        Ok(m)
    }

    pub fn sqrt(&mut self, op: RadialMe, lambda: f64, nu_min: i32, nu_max: i32)
                -> Result<Rc<Mat<f64>>> {
        let key = (op, lambda.to_bits(), nu_min, nu_max);
        if let Some(m) = self.sqrts.get(&key) {
            return Ok(m.clone());
        }
        let a = self.rep(op, lambda, nu_min, nu_max)?;
        let m = Rc::new(matrix_sqrt(&a)?);
        self.sqrts.insert(key, m.clone());
        Ok(m)
    }

    pub fn sqrt_inv(&mut self, op: RadialMe, lambda: f64, nu_min: i32, nu_max: i32)
                    -> Result<Rc<Mat<f64>>> {
        let key = (op, lambda.to_bits(), nu_min, nu_max);
        if let Some(m) = self.sqrt_invs.get(&key) {
            return Ok(m.clone());
        }
        let a = self.rep(op, lambda, nu_min, nu_max)?;
        let m = Rc::new(matrix_sqrt_inv(&a)?);
        self.sqrt_invs.insert(key, m.clone());
        Ok(m)
    }

    /// Apply the units of one kind, raising units first.
    fn apply_units(&mut self, unit: Unit, shifts: &[i32], m: &mut Mat<f64>,
                   lambda: &mut f64, lo: i32, hi: i32) -> Result<()> {
        let ups = shifts.iter().filter(|&&s| s > 0).count();
        let downs = shifts.iter().filter(|&&s| s < 0).count();
        let zeros = shifts.len() - ups - downs;
        let (up, down, pair) = match unit {
            Unit::Beta => (RadialMe::BUp, RadialMe::BDown, RadialMe::B2),
            Unit::BetaInv => (RadialMe::BmUp, RadialMe::BmDown, RadialMe::Bm2),
            Unit::D => (RadialMe::DbUp, RadialMe::DbDown, RadialMe::D2b),
        };
        for _ in 0 .. ups {
            *m = matmul(&*self.rep(up, *lambda, lo, hi)?, m);
            *lambda += 1.0;
        }
        for _ in 0 .. zeros / 2 {
            *m = matmul(&*self.rep(pair, *lambda, lo, hi)?, m);
        }
        if zeros % 2 != 0 {
            let f = match unit {
                Unit::Beta => (*self.sqrt(RadialMe::B2, *lambda, lo, hi)?).clone(),
                Unit::BetaInv => (*self.sqrt_inv(RadialMe::B2, *lambda, lo, hi)?).clone(),
                Unit::D => {
                    let bdb = self.rep(RadialMe::BDb, *lambda, lo, hi)?;
                    matmul(&*self.sqrt(RadialMe::Bm2, *lambda, lo, hi)?, &bdb)
                }
            };
            *m = matmul(&f, m);
        }
        for _ in 0 .. downs {
            *m = matmul(&*self.rep(down, *lambda, lo, hi)?, m);
            *lambda -= 1.0;
        }
        Ok(())
    }

    /// Matrix of `β^k (d/dβ)^t` from `λ` into `λ + r` at unit scale.
    pub fn rep_kt(&mut self, k: i32, t: i32, r: i32, lambda: f64,
                  lo: i32, hi: i32) -> Result<Rc<Mat<f64>>> {
        let key = (k, t, r, lambda.to_bits(), lo, hi);
        if let Some(m) = self.kts.get(&key) {
            return Ok(m.clone());
        }
        let splits = lambda_splits(k, t, r);
        let mut lam = lambda;
        let mut m;
        if splits.odd_identity {
            let s = r.signum();
            m = (*self.sqrt_inv(RadialMe::B2, lam, lo, hi)?).clone();
            m = matmul(&*self.rep(RadialMe::Id((r - s) / 2), lam, lo, hi)?, &m);
            lam += (r - s) as f64;
            let b = if s > 0 { RadialMe::BUp } else { RadialMe::BDown };
            m = matmul(&*self.rep(b, lam, lo, hi)?, &m);
        } else {
            m = Mat::identity((hi - lo + 1) as usize);
            self.apply_units(Unit::D, &splits.d, &mut m, &mut lam, lo, hi)?;
            let unit = if k >= 0 { Unit::Beta } else { Unit::BetaInv };
            self.apply_units(unit, &splits.beta, &mut m, &mut lam, lo, hi)?;
            if splits.id_shift != 0 {
                let id = self.rep(RadialMe::Id(splits.id_shift / 2), lam, lo, hi)?;
                m = matmul(&id, &m);
            }
        }
        let m = Rc::new(m);
        self.kts.insert(key, m.clone());
        Ok(m)
    }

    /// Memoised matrix of the product `ops` from `λ` into `λ + shift`.
    pub fn rep_radial_prod_rem(&mut self, ops: &[RadialOp], anorm: f64,
                               lambda: f64, shift: i32,
                               nu_min: i32, nu_max: i32) -> Result<Rc<Mat<f64>>> {
        let key = (ops.to_vec(), anorm.to_bits(), lambda.to_bits(),
                   shift, nu_min, nu_max);
        if let Some(m) = self.prods.get(&key) {
            return Ok(m.clone());
        }
        check_range("nu", nu_min, nu_max)?;
        check_range("nu", 0, nu_min)?;
        if !(anorm > 0.0) {
            return Err(Error::Range(format!("anorm must be positive, got {}", anorm)));
        }
        if !(lambda > 0.0) {
            return Err(Error::NonPositiveLambda(lambda));
        }
        let lo = nu_min - self.nu_lap.min(nu_min);
        let hi = nu_max + self.nu_lap;
        let atoms = parse_radial_product(ops);
        let mut m = Mat::identity((hi - lo + 1) as usize);
        let mut lam = lambda;
        let mut power = 0;
        for &(atom, r) in lambda_radial_op_list(&atoms, shift).iter().rev() {
            let f = match atom {
                RadialAtom::Su11(s) => {
                    let op = match s {
                        1 => RadialMe::Sp,
                        -1 => RadialMe::Sm,
                        _ => RadialMe::S0,
                    };
                    self.rep(op, lam, lo, hi)?
                }
                RadialAtom::Kt { k, t } => {
                    power += t - k;
                    self.rep_kt(k, t, r, lam, lo, hi)?
                }
            };
            m = matmul(&f, &m);
            lam += r as f64;
        }
        let n = (nu_max - nu_min + 1) as usize;
        let off = (nu_min - lo) as usize;
        let mut m = m.submat(off .. off + n, off .. off + n);
        if power != 0 {
            m.scale(anorm.powi(power));
        }
        let m = Rc::new(m);
        self.prods.insert(key, m.clone());
        Ok(m)
    }

    /// Matrix of the product `ops`; every table is cleared on return.
    pub fn rep_radial_prod(&mut self, ops: &[RadialOp], anorm: f64, lambda: f64,
                           shift: i32, nu_min: i32, nu_max: i32) -> Result<Mat<f64>> {
        let r = self.rep_radial_prod_rem(ops, anorm, lambda, shift, nu_min, nu_max)
            .map(|m| (*m).clone());
        self.clear();
        r
    }

    /// Memoised `Σ c · rep(P)`.
    pub fn rep_radial_lc_rem(&mut self, lc: &RadialLc, anorm: f64, lambda: f64,
                             shift: i32, nu_min: i32, nu_max: i32)
                             -> Result<Rc<Mat<f64>>> {
        let key = (lc.iter().map(|&(c, ref p)| (c.to_bits(), p.clone())).collect(),
                   anorm.to_bits(), lambda.to_bits(), shift, nu_min, nu_max);
        if let Some(m) = self.lcs.get(&key) {
            return Ok(m.clone());
        }
        check_range("nu", nu_min, nu_max)?;
        let n = (nu_max - nu_min + 1) as usize;
        let mut total = Mat::zero(n, n);
        for &(c, ref p) in lc {
            if c == 0.0 {
                continue;
            }
            let m = self.rep_radial_prod_rem(p, anorm, lambda, shift, nu_min, nu_max)?;
            total.add_scaled(c, &m);
        }
        let total = Rc::new(total);
        self.lcs.insert(key, total.clone());
        Ok(total)
    }

    pub fn rep_radial_lc(&mut self, lc: &RadialLc, anorm: f64, lambda: f64,
                         shift: i32, nu_min: i32, nu_max: i32) -> Result<Mat<f64>> {
        let r = self.rep_radial_lc_rem(lc, anorm, lambda, shift, nu_min, nu_max)
            .map(|m| (*m).clone());
        self.clear();
        r
    }
}

/// Matrix of the product `ops` from `λ` into `λ + shift` at scale `anorm`,
/// computed on a range widened by `nu_lap` and cropped back.
pub fn rep_radial_prod(ops: &[RadialOp], anorm: f64, lambda: f64, shift: i32,
                       nu_min: i32, nu_max: i32, nu_lap: i32) -> Result<Mat<f64>> {
    RadialEngine::new(nu_lap).rep_radial_prod(ops, anorm, lambda, shift, nu_min, nu_max)
}

pub fn rep_radial_lc(lc: &RadialLc, anorm: f64, lambda: f64, shift: i32,
                     nu_min: i32, nu_max: i32, nu_lap: i32) -> Result<Mat<f64>> {
    RadialEngine::new(nu_lap).rep_radial_lc(lc, anorm, lambda, shift, nu_min, nu_max)
}

/// Residual of `[S+, S−] + 2 S0`, which vanishes identically.
pub fn comm_su11_op(lambda: f64, nu_min: i32, nu_max: i32) -> Result<Mat<f64>> {
    let lc = [
        (1.0, vec![RadialOp::Sp, RadialOp::Sm]),
        (-1.0, vec![RadialOp::Sm, RadialOp::Sp]),
        (2.0, vec![RadialOp::S0]),
    ];
    rep_radial_lc(&lc, 1.0, lambda, 0, nu_min, nu_max, 2)
}

/// Residual of `(d/dβ) β − β (d/dβ) − 1`, which vanishes identically.
pub fn comm_bdb_op(lambda: f64, nu_min: i32, nu_max: i32) -> Result<Mat<f64>> {
    let lc = [
        (1.0, vec![RadialOp::Db, RadialOp::B]),
        (-1.0, vec![RadialOp::B, RadialOp::Db]),
        (-1.0, vec![]),
    ];
    rep_radial_lc(&lc, 1.0, lambda, 0, nu_min, nu_max, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::utils::Toler;

    const TOLER: Toler = Toler { relerr: 1e-10, abserr: 1e-10 };

    fn assert_mat_eq(a: &Mat<f64>, b: &Mat<f64>) {
        assert_eq!(a.dims(), b.dims());
        for i in 0 .. a.num_rows() {
            for j in 0 .. a.num_cols() {
                toler_assert_eq!(TOLER, a[(i, j)], b[(i, j)]);
            }
        }
    }

    #[test]
    fn test_parse() {
        use self::RadialOp::*;
        assert_eq!("Radial_bDb".parse::<RadialOp>().unwrap(), BDb);
        match "Radial_q".parse::<RadialOp>() {
            Err(Error::UndefinedOperator(s)) => assert_eq!(s, "Radial_q"),
            r => panic!("unexpected: {:?}", r),
        }
        assert_eq!(parse_radial_product(&[B, B2, Db]),
                   vec![RadialAtom::Kt { k: 3, t: 1 }]);
        assert_eq!(parse_radial_product(&[Db, Db, B]),
                   vec![RadialAtom::Kt { k: 0, t: 2 }, RadialAtom::Kt { k: 1, t: 0 }]);
        assert_eq!(parse_radial_product(&[Sp, Bm, BDb, S0]),
                   vec![RadialAtom::Su11(1), RadialAtom::Kt { k: -1, t: 0 },
                        RadialAtom::Kt { k: 1, t: 1 }, RadialAtom::Su11(0)]);
        assert_eq!(parse_radial_product(&[B, Bm]), vec![RadialAtom::Kt { k: 0, t: 0 }]);
        assert_eq!(parse_radial_product(&[]), vec![]);
    }

    #[test]
    fn test_partition() {
        let b = RadialAtom::Kt { k: 1, t: 0 };
        let id = RadialAtom::Kt { k: 0, t: 0 };
        assert_eq!(lambda_radial_op_list(&[b], 1), vec![(b, 1)]);
        assert_eq!(lambda_radial_op_list(&[b], 3), vec![(id, 2), (b, 1)]);
        assert_eq!(lambda_radial_op_list(&[b], -4), vec![(b, -2), (id, -2)]);
        assert_eq!(lambda_radial_op_list(&[b, b], 0), vec![(b, 1), (b, -1)]);
        let kt = RadialAtom::Kt { k: 2, t: 1 };
        assert_eq!(lambda_radial_op_list(&[kt], -4), vec![(kt, -4)]);
        let s = RadialAtom::Su11(1);
        assert_eq!(lambda_radial_op_list(&[s], 0), vec![(s, 0)]);
        assert_eq!(lambda_radial_op_list(&[s], -3), vec![(s, 0), (id, -3)]);
        for &shift in &[-5, -2, 0, 1, 4, 7] {
            let list = lambda_radial_op_list(&[kt, s, b], shift);
            assert_eq!(list.iter().map(|&(_, r)| r).sum::<i32>(), shift);
        }
    }

    #[test]
    fn test_splits() {
        let odd = lambda_splits(0, 0, 3);
        assert_eq!(odd.shifts(), vec![3]);
        assert!(odd.odd_identity);
        assert!(!lambda_splits(0, 0, 2).odd_identity);
        assert_eq!(lambda_splits(2, 0, 0).beta, vec![0, 0]);
        let s = lambda_splits(1, 1, 0);
        assert_eq!((s.beta.clone(), s.d.clone()), (vec![-1], vec![1]));
        assert_eq!(lambda_splits(1, 0, 0).beta, vec![0]);
        let s = lambda_splits(3, 2, 1);
        assert_eq!((s.beta.clone(), s.d.clone()), (vec![1, 0, 0], vec![0, 0]));
        let s = lambda_splits(2, 1, -4);
        assert_eq!(s.total(), -4);
        assert_eq!(s.id_shift % 2, 0);
        for k in -3 ..= 3 {
            for t in 0 ..= 3 {
                for r in -6 ..= 6 {
                    assert_eq!(lambda_splits(k, t, r).total(), r);
                }
            }
        }
    }

    #[test]
    fn test_scaling() {
        let anorm = 1.7;
        let bb = rep_radial_prod(&[RadialOp::B, RadialOp::B], anorm, 2.5, 0, 0, 6, 0)
            .unwrap();
        let mut b2 = rep_radial(RadialMe::B2, 2.5, 0, 6).unwrap();
        b2.scale(anorm.powi(-2));
        assert_mat_eq(&bb, &b2);

        let d2 = rep_radial_prod(&[RadialOp::D2b], anorm, 3.0, 0, 1, 5, 2).unwrap();
        let mut d2b = rep_radial(RadialMe::D2b, 3.0, 1, 5).unwrap();
        d2b.scale(anorm * anorm);
        assert_mat_eq(&d2, &d2b);
    }

    #[test]
    fn test_shifted_products() {
        let b = rep_radial_prod(&[RadialOp::B], 1.0, 2.5, -1, 0, 5, 0).unwrap();
        assert_mat_eq(&b, &rep_radial(RadialMe::BDown, 2.5, 0, 5).unwrap());
        let id = rep_radial_prod(&[], 1.0, 2.5, 4, 0, 5, 0).unwrap();
        assert_mat_eq(&id, &rep_radial(RadialMe::Id(2), 2.5, 0, 5).unwrap());
        match rep_radial_prod(&[RadialOp::Bm], 1.0, 0.8, -1, 0, 3, 0) {
            Err(Error::NonPositiveLambda(_)) => {}
            r => panic!("unexpected: {:?}", r),
        }
        // an odd identity shift goes through β · (1/β)₀
        let odd = rep_radial_prod(&[], 1.0, 2.5, 1, 0, 5, 0).unwrap();
        assert_eq!(odd.dims(), (6, 6));
    }

    #[test]
    fn test_commutators() {
        for &lambda in &[1.5, 2.5, 4.25] {
            toler_assert_zero_mat!(TOLER, comm_su11_op(lambda, 0, 6).unwrap());
            toler_assert_zero_mat!(TOLER, comm_su11_op(lambda, 2, 6).unwrap());
            toler_assert_zero_mat!(TOLER, comm_bdb_op(lambda, 0, 6).unwrap());
            toler_assert_zero_mat!(TOLER, comm_bdb_op(lambda, 3, 7).unwrap());
        }
    }

    #[test]
    fn test_caches() {
        let mut engine = RadialEngine::new(1);
        let ops = [RadialOp::B, RadialOp::Sp];
        let m1 = engine.rep_radial_prod_rem(&ops, 1.0, 2.5, 0, 0, 4).unwrap();
        assert!(engine.cache_len() > 0);
        let m2 = engine.rep_radial_prod_rem(&ops, 1.0, 2.5, 0, 0, 4).unwrap();
        assert!(Rc::ptr_eq(&m1, &m2));
        let m3 = engine.rep_radial_prod(&ops, 1.0, 2.5, 0, 0, 4).unwrap();
        assert_eq!(*m1, m3);
        assert_eq!(engine.cache_len(), 0);
    }
}
