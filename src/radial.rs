//! Single matrix elements of the radial primitives.
//!
//! The radial basis at unit scale is
//!
//! ```text
//! ψ_{λν}(β) = (−1)^ν √(2 ν! / Γ(λ + ν)) β^(λ − 1/2) L_ν^(λ−1)(β²) e^(−β²/2)
//! ```
//!
//! and `ME(λ, μf, μi) = ⟨λ', μf| Op |λ, μi⟩` where `λ' − λ` is the shift
//! of the primitive.
use libm;
use super::error::{check_range, Error, Result};
use super::mat::Mat;
use super::utils::binomial;

/// `ln |Γ(x)|` and the sign of `Γ(x)`.
pub fn ln_gamma(x: f64) -> Result<(f64, f64)> {
    if x <= 0.0 && x == x.floor() {
        return Err(Error::Singular(format!("Gamma({})", x)));
    }
    let (y, sign) = libm::lgamma_r(x);
    Ok((y, if sign < 0 { -1.0 } else { 1.0 }))
}

/// `ln n!`
fn ln_factorial(n: i32) -> f64 {
    libm::lgamma_r(n as f64 + 1.0).0
}

/// `√(Π Γ(num) / Π Γ(den))` from log-gammas; every argument must give a
/// positive Γ.
fn sqrt_gamma_ratio(num: &[f64], den: &[f64]) -> Result<f64> {
    let mut s = 0.0;
    for &x in num {
        let (y, sign) = ln_gamma(x)?;
        if sign < 0.0 {
            return Err(Error::Singular(format!("sqrt of Gamma({}) < 0", x)));
        }
        s += y;
    }
    for &x in den {
        let (y, sign) = ln_gamma(x)?;
        if sign < 0.0 {
            return Err(Error::Singular(format!("sqrt of Gamma({}) < 0", x)));
        }
        s -= y;
    }
    Ok((0.5 * s).exp())
}

#[inline]
fn alt(n: i32) -> f64 {
    if n % 2 == 0 { 1.0 } else { -1.0 }
}

/// Radial primitive with a closed-form matrix element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RadialMe {
    S0,
    Sp,
    Sm,
    /// `β²`
    B2,
    /// `1/β²`
    Bm2,
    /// `d²/dβ²`
    D2b,
    /// `β d/dβ`
    BDb,
    /// `β` into `λ + 1`
    BUp,
    /// `β` into `λ − 1`
    BDown,
    /// `1/β` into `λ + 1`
    BmUp,
    /// `1/β` into `λ − 1`
    BmDown,
    /// `d/dβ` into `λ + 1`
    DbUp,
    /// `d/dβ` into `λ − 1`
    DbDown,
    /// Identity into `λ + 2r`.
    Id(i32),
}

impl RadialMe {
    /// `λ' − λ`
    pub fn shift(self) -> i32 {
        match self {
            RadialMe::BUp | RadialMe::BmUp | RadialMe::DbUp => 1,
            RadialMe::BDown | RadialMe::BmDown | RadialMe::DbDown => -1,
            RadialMe::Id(r) => 2 * r,
            _ => 0,
        }
    }

    /// `⟨λ + shift, μf| Op |λ, μi⟩`; zero for negative `μ`.
    pub fn me(self, lambda: f64, mf: i32, mi: i32) -> Result<f64> {
        let target = lambda + self.shift() as f64;
        if !(lambda > 0.0) {
            return Err(Error::NonPositiveLambda(lambda));
        }
        if !(target > 0.0) {
            return Err(Error::NonPositiveLambda(target));
        }
        if mf < 0 || mi < 0 {
            return Ok(0.0);
        }
        match self {
            RadialMe::S0 => Ok(me_s0(lambda, mf, mi)),
            RadialMe::Sp => Ok(me_sp(lambda, mf, mi)),
            RadialMe::Sm => Ok(me_sm(lambda, mf, mi)),
            RadialMe::B2 => Ok(me_b2(lambda, mf, mi)),
            RadialMe::Bm2 => me_bm2(lambda, mf, mi),
            RadialMe::D2b => me_d2b(lambda, mf, mi),
            RadialMe::BDb => Ok(me_bdb(lambda, mf, mi)),
            RadialMe::BUp => Ok(me_b_up(lambda, mf, mi)),
            RadialMe::BDown => Ok(me_b_down(lambda, mf, mi)),
            RadialMe::BmUp => me_bm_up(lambda, mf, mi),
            RadialMe::BmDown => me_bm_down(lambda, mf, mi),
            RadialMe::DbUp => me_db_up(lambda, mf, mi),
            RadialMe::DbDown => me_db_down(lambda, mf, mi),
            RadialMe::Id(r) => me_id(lambda, mf, mi, r),
        }
    }
}

pub fn me_s0(lambda: f64, mf: i32, mi: i32) -> f64 {
    if mf == mi { lambda / 2.0 + mi as f64 } else { 0.0 }
}

pub fn me_sp(lambda: f64, mf: i32, mi: i32) -> f64 {
    if mf == mi + 1 {
        ((lambda + mi as f64) * (mi + 1) as f64).sqrt()
    } else {
        0.0
    }
}

pub fn me_sm(lambda: f64, mf: i32, mi: i32) -> f64 {
    if mf == mi - 1 {
        ((lambda + mi as f64 - 1.0) * mi as f64).sqrt()
    } else {
        0.0
    }
}

/// `β² = 2 S0 + S+ + S−`
pub fn me_b2(lambda: f64, mf: i32, mi: i32) -> f64 {
    2.0 * me_s0(lambda, mf, mi) + me_sp(lambda, mf, mi) + me_sm(lambda, mf, mi)
}

pub fn me_bm2(lambda: f64, mf: i32, mi: i32) -> Result<f64> {
    if lambda == 1.0 {
        return Err(Error::Singular("1/beta^2 at lambda = 1".to_owned()));
    }
    let (m1, m2) = if mf >= mi { (mf, mi) } else { (mi, mf) };
    let r = (ln_factorial(m1) - ln_factorial(m2)).exp().sqrt()
        * sqrt_gamma_ratio(&[lambda + m2 as f64], &[lambda + m1 as f64])?;
    Ok(alt(m1 - m2) * r / (lambda - 1.0))
}

/// `d²/dβ² = S+ + S− − 2 S0 + (λ − 3/2)(λ − 1/2)/β²`
pub fn me_d2b(lambda: f64, mf: i32, mi: i32) -> Result<f64> {
    let tail = (lambda - 1.5) * (lambda - 0.5);
    let bm2 = if tail == 0.0 { 0.0 } else { me_bm2(lambda, mf, mi)? };
    Ok(me_sp(lambda, mf, mi) + me_sm(lambda, mf, mi)
       - 2.0 * me_s0(lambda, mf, mi) + tail * bm2)
}

/// `β d/dβ = S− − S+ − 1/2`
pub fn me_bdb(lambda: f64, mf: i32, mi: i32) -> f64 {
    let diag = if mf == mi { -0.5 } else { 0.0 };
    me_sm(lambda, mf, mi) - me_sp(lambda, mf, mi) + diag
}

pub fn me_b_up(lambda: f64, mf: i32, mi: i32) -> f64 {
    if mf == mi {
        (lambda + mi as f64).sqrt()
    } else if mf == mi - 1 {
        (mi as f64).sqrt()
    } else {
        0.0
    }
}

pub fn me_b_down(lambda: f64, mf: i32, mi: i32) -> f64 {
    if mf == mi {
        (lambda + mi as f64 - 1.0).sqrt()
    } else if mf == mi + 1 {
        (mf as f64).sqrt()
    } else {
        0.0
    }
}

pub fn me_bm_up(lambda: f64, mf: i32, mi: i32) -> Result<f64> {
    if mi > mf {
        return Ok(0.0);
    }
    let f = (ln_factorial(mf) - ln_factorial(mi)).exp().sqrt();
    Ok(alt(mf - mi) * f * sqrt_gamma_ratio(&[lambda + mi as f64],
                                           &[lambda + 1.0 + mf as f64])?)
}

pub fn me_bm_down(lambda: f64, mf: i32, mi: i32) -> Result<f64> {
    if mf > mi {
        return Ok(0.0);
    }
    let f = (ln_factorial(mi) - ln_factorial(mf)).exp().sqrt();
    Ok(alt(mi - mf) * f * sqrt_gamma_ratio(&[lambda - 1.0 + mf as f64],
                                           &[lambda + mi as f64])?)
}

pub fn me_db_up(lambda: f64, mf: i32, mi: i32) -> Result<f64> {
    let near = if mf == mi {
        -(lambda + mi as f64).sqrt()
    } else if mf == mi - 1 {
        (mi as f64).sqrt()
    } else {
        0.0
    };
    Ok((lambda - 0.5) * me_bm_up(lambda, mf, mi)? + near)
}

pub fn me_db_down(lambda: f64, mf: i32, mi: i32) -> Result<f64> {
    let near = if mf == mi {
        (lambda - 1.0 + mi as f64).sqrt()
    } else if mf == mi + 1 {
        -((mi + 1) as f64).sqrt()
    } else {
        0.0
    };
    Ok((1.5 - lambda) * me_bm_down(lambda, mf, mi)? + near)
}

/// Coefficients (constant term first) of the polynomial `P(λ)` in the
/// overlap `⟨λ + 2r, μf | λ, μi⟩` for `r > 0`:
///
/// ```text
/// P(λ) = Σ_m C(r + μf − m − 1, μf − m) (−1)^(μi − m) C(r, μi − m) (λ + r)_m / m!
/// ```
pub fn id_poly(mf: i32, mi: i32, r: i32) -> Vec<f64> {
    let mut total = vec![0.0];
    if r <= 0 || mf < 0 || mi < 0 {
        return total;
    }
    for m in (mi - r).max(0) ..= mf.min(mi) {
        let c = binomial(r + mf - m - 1, mf - m)
            * alt(mi - m) * binomial(r, mi - m);
        if c == 0.0 {
            continue;
        }
        // (λ + r)_m / m!
        let mut term = vec![c];
        for k in 0 .. m {
            let a = (r + k) as f64 / (k + 1) as f64;
            let b = 1.0 / (k + 1) as f64;
            let mut next = vec![0.0; term.len() + 1];
            for (i, t) in term.iter().enumerate() {
                next[i] += a * t;
                next[i + 1] += b * t;
            }
            term = next;
        }
        if total.len() < term.len() {
            total.resize(term.len(), 0.0);
        }
        for (x, t) in total.iter_mut().zip(&term) {
            *x += t;
        }
    }
    total
}

fn eval_poly(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// `⟨λ + 2r, μf | λ, μi⟩`
pub fn me_id(lambda: f64, mf: i32, mi: i32, r: i32) -> Result<f64> {
    if r == 0 {
        return Ok(if mf == mi { 1.0 } else { 0.0 });
    }
    if r < 0 {
        // the overlap is symmetric, so read it from the lower basis
        return me_id(lambda + 2.0 * r as f64, mi, mf, -r);
    }
    let p = eval_poly(&id_poly(mf, mi, r), lambda);
    if p == 0.0 {
        return Ok(0.0);
    }
    let (lg, sign) = ln_gamma(lambda + r as f64)?;
    let norm = sqrt_gamma_ratio(&[], &[lambda + (2 * r + mf) as f64,
                                        lambda + mi as f64])?;
    let f = (0.5 * (ln_factorial(mf) + ln_factorial(mi)) + lg).exp();
    Ok(alt(mf + mi) * sign * f * norm * p)
}

/// Matrix of `op` on `ν_min ..= ν_max`, rows indexed by `μf`.
pub fn rep_radial(op: RadialMe, lambda: f64, nu_min: i32, nu_max: i32)
                  -> Result<Mat<f64>> {
    check_range("nu", nu_min, nu_max)?;
    check_range("nu", 0, nu_min)?;
    let n = (nu_max - nu_min + 1) as usize;
    let mut m = Mat::zero(n, n);
    for i in 0 .. n {
        for j in 0 .. n {
            m[(i, j)] = op.me(lambda, nu_min + i as i32, nu_min + j as i32)?;
        }
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::linalg::{matmul, matrix_sqrt};
    use super::super::utils::Toler;

    const TOLER: Toler = Toler { relerr: 1e-12, abserr: 1e-12 };

    fn assert_mat_eq(a: &Mat<f64>, b: &Mat<f64>) {
        assert_eq!(a.dims(), b.dims());
        for i in 0 .. a.num_rows() {
            for j in 0 .. a.num_cols() {
                toler_assert_eq!(TOLER, a[(i, j)], b[(i, j)]);
            }
        }
    }

    #[test]
    fn test_single_elements() {
        toler_assert_eq!(TOLER, RadialMe::B2.me(2.5, 0, 1).unwrap(), 2.5f64.sqrt());
        toler_assert_eq!(TOLER, RadialMe::B2.me(2.5, 1, 1).unwrap(), 4.5);
        let d2b = 2.5f64.sqrt() - 2.0 / (1.5 * 2.5f64.sqrt());
        toler_assert_eq!(TOLER, RadialMe::D2b.me(2.5, 0, 1).unwrap(), d2b);
        toler_assert_eq!(TOLER, RadialMe::Bm2.me(2.5, 0, 0).unwrap(), 1.0 / 1.5);
        toler_assert_eq!(TOLER, RadialMe::BDb.me(2.5, 0, 0).unwrap(), -0.5);
        // ∫ ψ_{λ+1,0} ψ'_{λ,0} = −1/(2√λ)
        toler_assert_eq!(TOLER, RadialMe::DbUp.me(2.5, 0, 0).unwrap(),
                         -0.5 / 2.5f64.sqrt());
        assert_eq!(RadialMe::Sp.me(2.5, 3, 1).unwrap(), 0.0);
        assert_eq!(RadialMe::B2.me(2.5, -1, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_errors() {
        match RadialMe::Bm2.me(1.0, 0, 0) {
            Err(Error::Singular(_)) => {}
            r => panic!("unexpected: {:?}", r),
        }
        match RadialMe::BDown.me(0.5, 0, 0) {
            Err(Error::NonPositiveLambda(x)) => toler_assert_eq!(TOLER, x, -0.5),
            r => panic!("unexpected: {:?}", r),
        }
        assert!(ln_gamma(-2.0).is_err());
        assert!(rep_radial(RadialMe::S0, 2.5, 3, 2).is_err());
    }

    #[test]
    fn test_b2_positive_definite() {
        for &lambda in &[1.5, 2.5, 7.25] {
            let b2 = rep_radial(RadialMe::B2, lambda, 0, 8).unwrap();
            assert_mat_eq(&b2, &b2.transpose());
            let s = matrix_sqrt(&b2).unwrap();
            assert_mat_eq(&matmul(&s, &s), &b2);
        }
    }

    #[test]
    fn test_bm2_inverts_b2() {
        let n = 10;
        let lambda = 3.5;
        let b2 = rep_radial(RadialMe::B2, lambda, 0, n).unwrap();
        let bm2 = rep_radial(RadialMe::Bm2, lambda, 0, n).unwrap();
        let p = matmul(&bm2, &b2);
        for i in 0 .. n as usize {
            for j in 0 .. n as usize {
                toler_assert_eq!(TOLER, p[(i, j)], if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_single_shifts_compose() {
        let lambda = 2.5;
        let b_up = rep_radial(RadialMe::BUp, lambda, 0, 6).unwrap();
        let b_down = rep_radial(RadialMe::BDown, lambda + 1.0, 0, 6).unwrap();
        let b2 = rep_radial(RadialMe::B2, lambda, 0, 6).unwrap();
        assert_mat_eq(&matmul(&b_down, &b_up), &b2);

        let bm_up = rep_radial(RadialMe::BmUp, lambda + 1.0, 0, 6).unwrap();
        let id2 = rep_radial(RadialMe::Id(1), lambda, 0, 6).unwrap();
        assert_mat_eq(&matmul(&bm_up, &b_up), &id2);

        let bm_down = rep_radial(RadialMe::BmDown, lambda + 1.0, 0, 6).unwrap();
        let id0 = matmul(&bm_down, &b_up);
        assert_mat_eq(&id0, &Mat::identity(7));
    }

    #[test]
    fn test_id_shift() {
        let lambda = 4.5;
        let up = rep_radial(RadialMe::Id(2), lambda, 0, 5).unwrap();
        let down = rep_radial(RadialMe::Id(-2), lambda + 4.0, 0, 5).unwrap();
        assert_mat_eq(&up.transpose(), &down);
        // ⟨λ+2, 0|λ, 0⟩ = Γ(λ+1)/√(Γ(λ)Γ(λ+2))
        toler_assert_eq!(TOLER, me_id(lambda, 0, 0, 1).unwrap(),
                         (lambda / (lambda + 1.0)).sqrt());
        assert_eq!(id_poly(0, 0, 1), vec![1.0]);
        // m = 0: C(r, μi) (−1)^μi, m = 1: (λ + r)
        assert_eq!(id_poly(1, 1, 1), vec![-1.0 + 1.0, 1.0]);
    }
}
