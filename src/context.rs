//! Calculation context: basis type, scales, reference data and the
//! transition operator.
use std::fs::File;
use std::path::{Path, PathBuf};
use serde_yaml;
use super::error::{check_range, Error, Result};
use super::labels::{dim_so5r3_rng_v, dim_xspace, lbs_xspace, Xlabel};
use super::op::OpSum;
use super::spherical::SphTrunc;

/// Integer offset `φ(v)` of the radial `λ` for seniority `v`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LambdaFun {
    /// `φ(v) = 0`
    Fix,
    /// `φ(v) = v`
    Sho,
    /// `φ(v) = v mod 2`
    Parity,
    /// Nearest integer with the parity of `v` to
    /// `√((v + 3/2)² + C) − √(9/4 + C)`.
    Davidson(f64),
}

impl Default for LambdaFun {
    fn default() -> Self {
        LambdaFun::Sho
    }
}

impl LambdaFun {
    pub fn phi(self, v: i32) -> i32 {
        match self {
            LambdaFun::Fix => 0,
            LambdaFun::Sho => v,
            LambdaFun::Parity => v.rem_euclid(2),
            LambdaFun::Davidson(c) => {
                let x = ((v as f64 + 1.5).powi(2) + c).sqrt() - (2.25 + c).sqrt();
                let p = v.rem_euclid(2);
                2 * ((x - p as f64) / 2.0).round() as i32 + p
            }
        }
    }
}

/// Reference state: the `idx`-th (from 1) lowest state of angular
/// momentum `l`, whose energy above the ground state is to be `fit`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EigRef {
    pub l: i32,
    pub idx: usize,
    pub fit: f64,
}

/// Reference transition from state `(li, idx_i)` to `(lf, idx_f)` whose
/// rate is to be `fit`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatRef {
    pub li: i32,
    pub idx_i: usize,
    pub lf: i32,
    pub idx_f: usize,
    pub fit: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcmContext {
    /// Base directory of the SO(5)⊃SO(3) CG tables.
    pub cg_dir: PathBuf,
    pub lambda_fun: LambdaFun,
    /// Radial overshoot used by products of radial operators.
    pub nu_lap: i32,
    /// Energy divisor.
    pub eig_sft: f64,
    /// Energy zero; the lowest eigenvalue if absent.
    pub eig_base: Option<f64>,
    /// Rate divisor.
    pub rat_sft: f64,
    pub eig_ref: Option<EigRef>,
    pub rat_ref: Option<RatRef>,
    pub transition: Option<OpSum>,
}

impl Default for AcmContext {
    fn default() -> Self {
        Self {
            cg_dir: PathBuf::from("so5cg-data"),
            lambda_fun: Default::default(),
            nu_lap: 0,
            eig_sft: 1.0,
            eig_base: None,
            rat_sft: 1.0,
            eig_ref: None,
            rat_ref: None,
            transition: None,
        }
    }
}

impl AcmContext {
    /// Read a context from a YAML file.  Missing fields take their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let ctx: Self = serde_yaml::from_reader(File::open(path)?)?;
        ctx.check()?;
        Ok(ctx)
    }

    pub fn check(&self) -> Result<()> {
        check_range("nu_lap", 0, self.nu_lap)?;
        if !(self.eig_sft != 0.0 && self.eig_sft.is_finite()) {
            return Err(Error::Range(format!("energy divisor {} is unusable", self.eig_sft)));
        }
        if !(self.rat_sft > 0.0 && self.rat_sft.is_finite()) {
            return Err(Error::Range(format!("rate divisor {} is not positive", self.rat_sft)));
        }
        Ok(())
    }

    pub fn with_cg_dir<P: Into<PathBuf>>(self, cg_dir: P) -> Self {
        Self { cg_dir: cg_dir.into(), ..self }
    }

    pub fn with_lambda_fun(self, lambda_fun: LambdaFun) -> Self {
        Self { lambda_fun, ..self }
    }

    pub fn with_nu_lap(self, nu_lap: i32) -> Self {
        Self { nu_lap, ..self }
    }

    pub fn with_eig_sft(self, eig_sft: f64) -> Self {
        Self { eig_sft, ..self }
    }

    pub fn with_eig_base(self, eig_base: Option<f64>) -> Self {
        Self { eig_base, ..self }
    }

    pub fn with_rat_sft(self, rat_sft: f64) -> Self {
        Self { rat_sft, ..self }
    }

    pub fn with_eig_ref(self, eig_ref: Option<EigRef>) -> Self {
        Self { eig_ref, ..self }
    }

    pub fn with_rat_ref(self, rat_ref: Option<RatRef>) -> Self {
        Self { rat_ref, ..self }
    }

    pub fn with_transition(self, transition: Option<OpSum>) -> Self {
        Self { transition, ..self }
    }
}

/// Basis parameters and truncation of the X-space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Xparams {
    pub anorm: f64,
    pub lambda0: f64,
    pub nu_min: i32,
    pub nu_max: i32,
    pub v_min: i32,
    pub v_max: i32,
    pub l_min: i32,
    pub l_max: i32,
}

impl Default for Xparams {
    fn default() -> Self {
        Self {
            anorm: 1.0,
            lambda0: 2.5,
            nu_min: 0,
            nu_max: 0,
            v_min: 0,
            v_max: 0,
            l_min: 0,
            l_max: 0,
        }
    }
}

impl Xparams {
    /// Fails on inverted ranges, a non-positive `a`, or a state whose
    /// `λ₀ + φ(v)` is not positive.
    pub fn check(&self, lambda_fun: LambdaFun) -> Result<()> {
        if !(self.anorm > 0.0) {
            return Err(Error::Range(format!("anorm {} is not positive", self.anorm)));
        }
        check_range("nu", 0, self.nu_min)?;
        check_range("nu", self.nu_min, self.nu_max)?;
        self.sph_trunc().check()?;
        for v in self.v_min ..= self.v_max {
            let lambda = self.lambda(lambda_fun, v);
            if !(lambda > 0.0) {
                return Err(Error::NonPositiveLambda(lambda));
            }
        }
        Ok(())
    }

    pub fn lambda(&self, lambda_fun: LambdaFun, v: i32) -> f64 {
        self.lambda0 + lambda_fun.phi(v) as f64
    }

    pub fn sph_trunc(&self) -> SphTrunc {
        SphTrunc {
            v_min: self.v_min,
            v_max: self.v_max,
            l_min: self.l_min,
            l_max: self.l_max,
        }
    }

    /// The same truncation restricted to a single `L`.
    pub fn with_l(&self, l: i32) -> Self {
        Self { l_min: l, l_max: l, ..*self }
    }

    pub fn rad_dim(&self) -> usize {
        (self.nu_max - self.nu_min + 1) as usize
    }

    pub fn dim(&self) -> usize {
        dim_xspace(self.nu_min, self.nu_max, self.v_min, self.v_max,
                   self.l_min, self.l_max) as usize
    }

    /// Dimension of the block of angular momentum `l`.
    pub fn dim_l(&self, l: i32) -> usize {
        self.rad_dim() * dim_so5r3_rng_v(self.v_min, self.v_max, l) as usize
    }

    /// Angular momenta in range with a non-empty block.
    pub fn lvals(&self) -> Vec<i32> {
        (self.l_min ..= self.l_max)
            .filter(|&l| self.dim_l(l) != 0)
            .collect()
    }

    pub fn labels(&self) -> Vec<Xlabel> {
        lbs_xspace(self.nu_min, self.nu_max, self.v_min, self.v_max,
                   self.l_min, self.l_max)
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs};
    use super::*;

    #[test]
    fn test_phi() {
        for v in 0 .. 10 {
            assert_eq!(LambdaFun::Fix.phi(v), 0);
            assert_eq!(LambdaFun::Sho.phi(v), v);
            assert_eq!(LambdaFun::Parity.phi(v), v % 2);
        }
        // with C = 0 the Davidson offset is exactly v
        for v in 0 .. 10 {
            assert_eq!(LambdaFun::Davidson(0.0).phi(v), v);
        }
        let f = LambdaFun::Davidson(100.0);
        assert_eq!(f.phi(0), 0);
        for v in 0 .. 20 {
            assert_eq!((f.phi(v) - v).rem_euclid(2), 0);
            assert!(f.phi(v) <= v);
        }
    }

    #[test]
    fn test_xparams() {
        let x = Xparams { nu_max: 1, v_max: 1, l_max: 1, ..Default::default() };
        x.check(LambdaFun::Sho).unwrap();
        assert_eq!(x.dim(), 2);
        assert_eq!(x.lvals(), vec![0]);
        assert_eq!(x.dim_l(1), 0);
        assert_eq!(x.labels().len(), x.dim());

        let x = Xparams { nu_max: 2, v_max: 3, l_max: 4, ..Default::default() };
        let total: usize = x.lvals().iter().map(|&l| x.dim_l(l)).sum();
        assert_eq!(total, x.dim());
        assert_eq!(x.lvals(), vec![0, 2, 3, 4]);

        match (Xparams { lambda0: -0.5, ..Default::default() }).check(LambdaFun::Fix) {
            Err(Error::NonPositiveLambda(_)) => {}
            r => panic!("{:?}", r),
        }
        (Xparams { lambda0: -0.5, v_min: 1, v_max: 2, ..Default::default() })
            .check(LambdaFun::Sho).unwrap();
        match (Xparams { nu_min: 2, nu_max: 1, ..Default::default() }).check(LambdaFun::Fix) {
            Err(Error::Range(_)) => {}
            r => panic!("{:?}", r),
        }
        assert!((Xparams { anorm: 0.0, ..Default::default() }).check(LambdaFun::Fix).is_err());
    }

    #[test]
    fn test_builder() {
        let ctx = AcmContext::default()
            .with_nu_lap(2)
            .with_lambda_fun(LambdaFun::Davidson(1.5))
            .with_eig_ref(Some(EigRef { l: 2, idx: 1, fit: 6.0 }));
        assert_eq!(ctx.nu_lap, 2);
        assert_eq!(ctx.lambda_fun, LambdaFun::Davidson(1.5));
        assert_eq!(ctx.eig_ref.map(|r| r.fit), Some(6.0));
        assert!(ctx.clone().with_rat_sft(-1.0).check().is_err());
        ctx.check().unwrap();
    }

    #[test]
    fn test_load() {
        let path = env::temp_dir()
            .join(format!("acm-context-test-{}.yml", ::std::process::id()));
        fs::write(&path, "\
cg_dir: /data/so5cg
lambda_fun:
  Davidson: 2.0
nu_lap: 1
eig_ref:
  l: 2
  idx: 1
  fit: 6.0
transition: 1.5*Radial_b*SpHarm_112
").unwrap();
        let ctx = AcmContext::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(ctx.cg_dir, PathBuf::from("/data/so5cg"));
        assert_eq!(ctx.lambda_fun, LambdaFun::Davidson(2.0));
        assert_eq!(ctx.nu_lap, 1);
        assert_eq!(ctx.eig_sft, 1.0);
        assert_eq!(ctx.eig_ref, Some(EigRef { l: 2, idx: 1, fit: 6.0 }));
        assert_eq!(ctx.transition,
                   Some(OpSum::parse("1.5*Radial_b*SpHarm_112").unwrap()));

        let text = serde_yaml::to_string(&ctx).unwrap();
        let again: AcmContext = serde_yaml::from_str(&text).unwrap();
        assert_eq!(again, ctx);
    }
}
