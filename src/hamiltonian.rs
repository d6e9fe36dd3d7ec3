//! Builders for Hamiltonians and transition operators.
use std::f64::consts::PI;
use super::error::{Error, Result};
use super::op::{Coef, Intrinsic, OpSum, Param, Primitive};
use super::radial_prod::RadialOp;
use super::spherical::{Harm, SphOp};
use super::utils::binomial;

/// `q = convert_112()·β·Y_{112}`.
pub fn convert_112() -> f64 {
    4.0 * PI / 15f64.sqrt()
}

/// `cos 3γ = convert_310()·Y_{310}`.
pub fn convert_310() -> f64 {
    4.0 * PI / 3.0
}

/// `cos² 3γ = 1/3 + convert_610()·Y_{610}`.
pub fn convert_610() -> f64 {
    8.0 * PI / (3.0 * 15f64.sqrt())
}

fn radial(ops: &[RadialOp]) -> Vec<Primitive> {
    ops.iter().map(|&op| Primitive::Radial(op)).collect()
}

fn harm(v: i32, l: i32) -> Primitive {
    Primitive::Sph(SphOp::Harm(Harm { v, alpha: 1, l }))
}

fn with_harm(mut prod: Vec<Primitive>, y: Primitive) -> Vec<Primitive> {
    prod.push(y);
    prod
}

/// `∇² = d²/dβ² − (2 + v(v+3))/β²`.
pub fn laplacian() -> OpSum {
    let v = Coef::param(Param::Seniority);
    let casimir = &Coef::constant(2.0) + &(&v * &(&v + &Coef::constant(3.0)));
    OpSum::new()
        .with(1.0, radial(&[RadialOp::D2b]))
        .with(-casimir, radial(&[RadialOp::Bm2]))
}

/// The quadrupole operator `q = Convert_112·β·Y_{112}`.
pub fn quad_op() -> OpSum {
    OpSum::new().with(convert_112(), vec![Primitive::Radial(RadialOp::B), harm(1, 2)])
}

/// Coefficients of the rational Hamiltonian family.
///
/// | coefficient | operator |
/// |---|---|
/// | `c11` | `∇²` |
/// | `c20`, `c21`, `c22`, `c23` | `1`, `β²`, `β⁴`, `β⁻²` |
/// | `c30`, `c31`, `c32`, `c33` | `β`, `β³`, `β⁵`, `β⁻¹` times `cos 3γ` |
/// | `c40`, `c41`, `c42`, `c43` | `1`, `β²`, `β⁴`, `β⁻²` times `cos² 3γ` |
/// | `c50` | `[π×q×π]_{v=3,L=0}` |
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HamCoefs {
    pub c11: f64,
    pub c20: f64,
    pub c21: f64,
    pub c22: f64,
    pub c23: f64,
    pub c30: f64,
    pub c31: f64,
    pub c32: f64,
    pub c33: f64,
    pub c40: f64,
    pub c41: f64,
    pub c42: f64,
    pub c43: f64,
    pub c50: f64,
}

impl HamCoefs {
    /// Rowe–Welsh–Caprio Hamiltonian
    /// `−∇²/(2B) + (B/2)(c1β² + c2β⁴) − χβcos3γ + κβ²cos²3γ`.
    pub fn rwc(b: f64, c1: f64, c2: f64, chi: f64, kappa: f64) -> Self {
        Self {
            c11: -1.0 / (2.0 * b),
            c21: b * c1 / 2.0,
            c22: b * c2 / 2.0,
            c30: -chi,
            c41: kappa,
            ..Default::default()
        }
    }
}

pub fn acm_hamiltonian(c: &HamCoefs) -> OpSum {
    use self::RadialOp::{B, B2, Bm, Bm2};
    let mut h = OpSum::new();
    h.add_scaled(c.c11, &laplacian());

    let powers: [(&[RadialOp], f64, f64, f64); 4] = [
        (&[], c.c20, c.c30, c.c40),
        (&[B2], c.c21, c.c31, c.c41),
        (&[B2, B2], c.c22, c.c32, c.c42),
        (&[Bm2], c.c23, c.c33, c.c43),
    ];
    // β-powers multiplying cos 3γ are one higher except for β⁻¹
    let cos_powers: [&[RadialOp]; 4] = [&[B], &[B2, B], &[B2, B2, B], &[Bm]];
    for (&(rad, c2, c3, c4), cos_rad) in powers.iter().zip(&cos_powers) {
        h.push(c2, radial(rad));
        h.push(c3 * convert_310(), with_harm(radial(cos_rad), harm(3, 0)));
        h.push(c4 / 3.0, radial(rad));
        h.push(c4 * convert_610(), with_harm(radial(rad), harm(6, 0)));
    }
    h.push(c.c50, vec![Primitive::X(Intrinsic::PiqPi)]);
    h
}

/// `ACM_HamRWC`
pub fn ham_rwc(b: f64, c1: f64, c2: f64, chi: f64, kappa: f64) -> OpSum {
    acm_hamiltonian(&HamCoefs::rwc(b, c1, c2, chi, kappa))
}

/// Which harmonics carry the powers of `cos 3γ` in a rigid-β
/// Hamiltonian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigidBetaBasis {
    /// `cosⁿ 3γ = (Convert_310·Y_{310})ⁿ`.
    Y310,
    /// Even powers through `3cos²3γ − 1 = 3·Convert_610·Y_{610}`.
    Y610,
}

/// Coefficients `d_{2i+j}` of `(3cos²3γ − 1)^i cos^j 3γ` equal to
/// `Σₙ cₙ cosⁿ 3γ`.
pub fn rigid_beta_coefs(cs: &[f64]) -> Vec<f64> {
    let mut ds = vec![0.0; cs.len()];
    for (n, &c) in cs.iter().enumerate() {
        let (k, j) = (n / 2, n % 2);
        let scale = 3f64.powi(k as i32);
        for i in 0 ..= k {
            ds[2 * i + j] += binomial(k as i32, i as i32) / scale * c;
        }
    }
    ds
}

/// `cas·v(v+3) + Σₙ cₙ cosⁿ 3γ` for `cs = [c₀, c₁, …]`.
pub fn ham_rigid_beta(cas: f64, cs: &[f64], basis: RigidBetaBasis) -> OpSum {
    let v = Coef::param(Param::Seniority);
    let mut h = OpSum::new();
    h.push(&Coef::constant(cas) * &(&v * &(&v + &Coef::constant(3.0))), vec![]);
    match basis {
        RigidBetaBasis::Y310 => {
            for (n, &c) in cs.iter().enumerate() {
                h.push(c * convert_310().powi(n as i32), vec![harm(3, 0); n]);
            }
        }
        RigidBetaBasis::Y610 => {
            for (n, &d) in rigid_beta_coefs(cs).iter().enumerate() {
                let (i, j) = (n / 2, n % 2);
                let mut prod = vec![harm(6, 0); i];
                prod.extend(vec![harm(3, 0); j]);
                let scale = (3.0 * convert_610()).powi(i as i32)
                    * convert_310().powi(j as i32);
                h.push(d * scale, prod);
            }
        }
    }
    h
}

const MAX_BRACKET: usize = 64;
const MAX_BISECT: usize = 200;

/// Smallest `lo + 2ⁿ·step` at which `f` turns positive.
fn bracket<F: Fn(f64) -> f64>(f: F, lo: f64, step: f64) -> Option<f64> {
    let mut step = step;
    for _ in 0 .. MAX_BRACKET {
        if f(lo + step) > 0.0 {
            return Some(lo + step);
        }
        step *= 2.0;
    }
    None
}

/// Root of `f` between `lo` and `hi`, given `f(lo) <= 0 < f(hi)`.
fn bisect<F: Fn(f64) -> f64>(f: F, mut lo: f64, mut hi: f64) -> f64 {
    for _ in 0 .. MAX_BISECT {
        let mid = 0.5 * (lo + hi);
        if mid == lo || mid == hi {
            break;
        }
        if f(mid) > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Basis parameters `(a, λ₀)` adapted to the potential
/// `V = (B/2)(c1β² + c2β⁴)`.
///
/// The zero-point energy `E = V(β₀) + ω/2` of the harmonic approximation
/// around the minimum `β₀` fixes the classical turning points
/// `V(β±) = E`.  The basis width follows from their spacing: `a = 1/β₊`
/// with `λ₀ = 5/2` for a spherical minimum, otherwise `a = 2/(β₊ − β₋)`
/// with `λ₀ = 1/2 + a²β₀²`.  A well that does not hold `E` has no
/// turning points and is reported as `OptimisationFailure`.
pub fn rwc_alam(b: f64, c1: f64, c2: f64) -> Result<(f64, f64)> {
    if !(b > 0.0) {
        return Err(Error::OptimisationFailure(format!("inertia B = {} is not positive", b)));
    }
    let v = |x: f64| 0.5 * b * (c1 * x * x + c2 * x * x * x * x);
    let dv = |x: f64| b * (c1 * x + 2.0 * c2 * x * x * x);
    let beta0 = if c1 >= 0.0 {
        0.0
    } else {
        let hi = bracket(&dv, 0.0, 1.0).ok_or_else(|| Error::OptimisationFailure(format!(
            "no minimum of the potential with c1 = {}, c2 = {}", c1, c2)))?;
        bisect(&dv, 0.0, hi)
    };
    let k = b * (c1 + 6.0 * c2 * beta0 * beta0);
    if !(k > 0.0) {
        return Err(Error::OptimisationFailure(format!(
            "potential is flat at its minimum β = {}", beta0)));
    }
    let energy = v(beta0) + 0.5 * (k / b).sqrt();
    let g = |x: f64| v(x) - energy;

    let hi = bracket(&g, beta0, 1.0).ok_or_else(|| Error::OptimisationFailure(format!(
        "V(β) = {} has no turning point beyond β = {}", energy, beta0)))?;
    let outer = bisect(&g, beta0, hi);
    if beta0 == 0.0 {
        return Ok((1.0 / outer, 2.5));
    }
    if !(g(0.0) > 0.0) {
        return Err(Error::OptimisationFailure(format!(
            "well at β = {} is too shallow to hold V = {}", beta0, energy)));
    }
    let inner = bisect(|x| -g(x), 0.0, beta0);
    let a = 2.0 / (outer - inner);
    Ok((a, 0.5 + a * a * beta0 * beta0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::labels::Xlabel;
    use super::super::utils::Toler;

    const TOLER: Toler = Toler { relerr: 1e-12, abserr: 1e-12 };

    fn coef_of(h: &OpSum, prod: &[Primitive]) -> f64 {
        h.terms().iter()
            .filter(|t| t.prod == prod)
            .map(|t| t.coef.as_const().unwrap())
            .sum()
    }

    #[test]
    fn test_parity() {
        let c = HamCoefs {
            c11: 1.0, c20: 1.0, c21: 1.0, c22: 1.0, c23: 1.0,
            c30: 1.0, c31: 1.0, c32: 1.0, c33: 1.0,
            c40: 1.0, c41: 1.0, c42: 1.0, c43: 1.0, c50: 1.0,
        };
        let h = acm_hamiltonian(&c);
        assert_eq!(h.parity(), 0);
        assert_eq!(h.am(), 0);
        assert!(h.is_tame());
        assert_eq!(ham_rwc(10.0, -1.0, 1.0, 0.5, 0.2).parity(), 0);
        assert_eq!(quad_op().am(), 2);
    }

    #[test]
    fn test_laplacian_only() {
        let h = acm_hamiltonian(&HamCoefs { c11: 2.0, ..Default::default() });
        assert_eq!(h.len(), 2);
        assert_eq!(h.terms()[0].coef.as_const(), Some(2.0));
        assert_eq!(h.terms()[0].prod, vec![Primitive::Radial(RadialOp::D2b)]);
        assert_eq!(h.terms()[1].prod, vec![Primitive::Radial(RadialOp::Bm2)]);
    }

    #[test]
    fn test_cos2() {
        let h = acm_hamiltonian(&HamCoefs { c41: 3.0, ..Default::default() });
        let b2 = [Primitive::Radial(RadialOp::B2)];
        toler_assert_eq!(TOLER, coef_of(&h, &b2), 1.0);
        let b2y = [Primitive::Radial(RadialOp::B2), harm(6, 0)];
        toler_assert_eq!(TOLER, coef_of(&h, &b2y), 3.0 * convert_610());
    }

    #[test]
    fn test_rwc() {
        let c = HamCoefs::rwc(4.0, -2.0, 3.0, 0.5, 0.25);
        assert_eq!(c.c11, -0.125);
        assert_eq!(c.c21, -4.0);
        assert_eq!(c.c22, 6.0);
        assert_eq!(c.c30, -0.5);
        assert_eq!(c.c41, 0.25);
        assert_eq!(c.c20, 0.0);
    }

    #[test]
    fn test_rigid_beta_coefs() {
        // cos² 3γ = (1 + (3cos²3γ − 1))/3
        assert_eq!(rigid_beta_coefs(&[0.0, 0.0, 1.0]), vec![1.0 / 3.0, 0.0, 1.0 / 3.0]);
        let ds = rigid_beta_coefs(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        toler_assert_eq!(TOLER, ds[0], 1.0 / 81.0);
        toler_assert_eq!(TOLER, ds[2], 4.0 / 81.0);
        let ds = rigid_beta_coefs(&[0.0, 0.0, 0.0, 1.0]);
        toler_assert_eq!(TOLER, ds[1], 1.0 / 3.0);
        toler_assert_eq!(TOLER, ds[3], 1.0 / 3.0);
    }

    #[test]
    fn test_rigid_beta() {
        let h = ham_rigid_beta(0.5, &[1.0, 0.0, 1.0], RigidBetaBasis::Y610);
        toler_assert_eq!(TOLER, coef_of(&h, &[harm(6, 0)]), convert_610());
        let x = Xlabel { nu: 0, v: 3, alpha: 1, l: 0 };
        let id: f64 = h.terms().iter()
            .filter(|t| t.prod.is_empty())
            .map(|t| t.coef.eval(&x))
            .sum();
        toler_assert_eq!(TOLER, id, 9.0 + 1.0 + 1.0 / 3.0);

        let h = ham_rigid_beta(0.0, &[0.0, 2.0], RigidBetaBasis::Y310);
        assert_eq!(h.len(), 1);
        toler_assert_eq!(TOLER, coef_of(&h, &[harm(3, 0)]), 2.0 * convert_310());
        assert_eq!(h.parity(), 1);
    }

    #[test]
    fn test_rwc_alam() {
        // harmonic wells: the turning points sit at 1/a
        let (a, lambda0) = rwc_alam(1.0, 16.0, 0.0).unwrap();
        toler_assert_eq!(TOLER, a, 2.0);
        assert_eq!(lambda0, 2.5);
        let (a, lambda0) = rwc_alam(4.0, 4.0, 0.0).unwrap();
        toler_assert_eq!(TOLER, a, 8f64.sqrt());
        assert_eq!(lambda0, 2.5);

        // V = β⁴/2 − 2β², minimum at β² = 2 with V'' = 8, so
        // E = √2 − 2 and the turning points are β±² = 2 ± 2^{3/4}
        let (a, lambda0) = rwc_alam(1.0, -4.0, 1.0).unwrap();
        let outer = (2.0 + 2f64.powf(0.75)).sqrt();
        let inner = (2.0 - 2f64.powf(0.75)).sqrt();
        let toler = Toler { relerr: 1e-10, abserr: 1e-10 };
        toler_assert_eq!(toler, a, 2.0 / (outer - inner));
        toler_assert_eq!(toler, lambda0, 0.5 + 2.0 * a * a);
        assert!(a < 8f64.powf(0.25));

        match rwc_alam(1.0, -1.0, -1.0) {
            Err(Error::OptimisationFailure(_)) => {}
            r => panic!("{:?}", r),
        }
        assert!(rwc_alam(1.0, 0.0, 1.0).is_err());
        assert!(rwc_alam(0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_rwc_alam_no_turning_point() {
        // the barrier at β² = 1/2 peaks at 1/8, below E = 1/2
        match rwc_alam(1.0, 1.0, -1.0) {
            Err(Error::OptimisationFailure(_)) => {}
            r => panic!("{:?}", r),
        }
        // a deformed well at β² = 1/200, 1/80000 deep, whose zero-point
        // energy clears the origin
        match rwc_alam(1.0, -0.01, 1.0) {
            Err(Error::OptimisationFailure(_)) => {}
            r => panic!("{:?}", r),
        }
    }
}
