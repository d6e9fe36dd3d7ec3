//! Matrices on the X-space, the product of the radial and the
//! SO(5)⊃SO(3) spherical spaces.
//!
//! Basis states are ordered with the spherical label outermost, so the
//! matrix is made of `rad_dim × rad_dim` radial blocks indexed by pairs of
//! spherical labels.
use std::f64::consts::PI;
use std::rc::Rc;
use fnv::FnvHashMap;
use super::ang_mom::{phase, triangle, Wigner6jCtx};
use super::cg::CgStore;
use super::context::{AcmContext, LambdaFun, Xparams};
use super::error::Result;
use super::labels::{lbs_so5r3_rng_l, Vlabel};
use super::linalg::matmul;
use super::mat::Mat;
use super::op::{Intrinsic, OpSum, Primitive};
use super::radial_prod::{RadialEngine, RadialOp};
use super::spherical::{me_so5red, num_so5r3_prod, SphOp, SphericalEngine};

type XparamsKey = ([u64; 2], [i32; 6]);

fn xparams_key(x: &Xparams) -> XparamsKey {
    ([x.anorm.to_bits(), x.lambda0.to_bits()],
     [x.nu_min, x.nu_max, x.v_min, x.v_max, x.l_min, x.l_max])
}

/// `e` in the single step `d/dβ + e/β` of `∇` that takes seniority `v` to
/// `v + s`.
fn step_coef(s: i32, v: i32) -> f64 {
    if s > 0 {
        -(v + 2) as f64
    } else {
        (v + 1) as f64
    }
}

fn add_block(out: &mut Mat<f64>, i2: usize, j2: usize, c: f64, block: &Mat<f64>) {
    let n = block.num_rows();
    for i1 in 0 .. n {
        for j1 in 0 .. n {
            out[(i2 * n + i1, j2 * n + j1)] += c * block[(i1, j1)];
        }
    }
}

/// Every state of the SO(5) irrep `v`.
fn irrep_labels(v: i32) -> Vec<Vlabel> {
    lbs_so5r3_rng_l(v, 0, 2 * v)
}

/// Engine for X-space matrices.  Every table it owns is cleared at the
/// end of `rep_xspace`.
#[derive(Debug)]
pub struct XspaceEngine<'a> {
    cg: &'a CgStore,
    lambda_fun: LambdaFun,
    radial: RadialEngine,
    spherical: SphericalEngine<'a>,
    w6j: Wigner6jCtx,
    amps: FnvHashMap<(Vlabel, Vlabel), f64>,
    intrinsics: FnvHashMap<(Intrinsic, XparamsKey), Rc<Mat<f64>>>,
}

impl<'a> XspaceEngine<'a> {
    pub fn new(cg: &'a CgStore, ctx: &AcmContext) -> Self {
        Self {
            cg,
            lambda_fun: ctx.lambda_fun,
            radial: RadialEngine::new(ctx.nu_lap),
            spherical: SphericalEngine::new(cg),
            w6j: Default::default(),
            amps: Default::default(),
            intrinsics: Default::default(),
        }
    }

    pub fn lambda_fun(&self) -> LambdaFun {
        self.lambda_fun
    }

    pub fn cache_len(&self) -> usize {
        self.radial.cache_len() + self.spherical.cache_len() + self.w6j.len()
            + self.amps.len() + self.intrinsics.len()
    }

    pub fn clear(&mut self) {
        self.radial.clear();
        self.spherical.clear();
        self.w6j.clear();
        self.amps.clear();
        self.intrinsics.clear();
    }

    /// Matrix of `op` on the truncated X-space.  Coefficients that depend
    /// on the state are evaluated on the initial state.
    pub fn rep_xspace(&mut self, op: &OpSum, x: &Xparams) -> Result<Mat<f64>> {
        let r = self.rep_xspace_rem(op, x);
        self.clear();
        r
    }

    fn rep_xspace_rem(&mut self, op: &OpSum, x: &Xparams) -> Result<Mat<f64>> {
        x.check(self.lambda_fun)?;
        let n = x.dim();
        let mut out = Mat::zero(n, n);
        let mut diag = None;
        for term in op.terms() {
            let mut m = self.rep_xspace_prod(&term.prod, x)?;
            match term.coef.as_const() {
                Some(c) => out.add_scaled(c, &m),
                None => {
                    let labels = diag.get_or_insert_with(|| x.labels());
                    for (j, label) in labels.iter().enumerate() {
                        let c = term.coef.eval(label);
                        for i in 0 .. n {
                            m[(i, j)] *= c;
                        }
                    }
                    out.add_scaled(1.0, &m);
                }
            }
        }
        Ok(out)
    }

    /// Matrix of a product.  Runs of radial and spherical symbols are
    /// gathered into twins; intrinsics are multiplied in as they come.
    pub fn rep_xspace_prod(&mut self, prod: &[Primitive], x: &Xparams)
                           -> Result<Mat<f64>> {
        let mut m = Mat::identity(x.dim());
        let mut r_ops = Vec::new();
        let mut s_ops = Vec::new();
        let mut pending = false;
        for &p in prod {
            match p {
                Primitive::Radial(op) => {
                    r_ops.push(op);
                    pending = true;
                }
                Primitive::Sph(op) => {
                    s_ops.push(op);
                    pending = true;
                }
                Primitive::X(op) => {
                    if pending {
                        m = matmul(&m, &self.rep_xspace_twin(&r_ops, &s_ops, x)?);
                        r_ops.clear();
                        s_ops.clear();
                        pending = false;
                    }
                    m = matmul(&m, &*self.rep_intrinsic(op, x)?);
                }
            }
        }
        if pending {
            m = matmul(&m, &self.rep_xspace_twin(&r_ops, &s_ops, x)?);
        }
        Ok(m)
    }

    /// Matrix of the radial product `r_ops` times the spherical product
    /// `s_ops`.
    pub fn rep_xspace_twin(&mut self, r_ops: &[RadialOp], s_ops: &[SphOp],
                           x: &Xparams) -> Result<Mat<f64>> {
        let trunc = x.sph_trunc();
        let sph_labels = trunc.labels();
        let s = self.spherical.rep_so5r3_prod_rem(s_ops, trunc)?;
        let scale = (4.0 * PI).powi(-num_so5r3_prod(s_ops));
        let rd = x.rad_dim();
        let mut out = Mat::zero(sph_labels.len() * rd, sph_labels.len() * rd);
        for (i2, f) in sph_labels.iter().enumerate() {
            for (j2, i) in sph_labels.iter().enumerate() {
                let sij = s[(i2, j2)];
                if sij == 0.0 {
                    continue;
                }
                let lambda = x.lambda(self.lambda_fun, i.v);
                let shift = self.lambda_fun.phi(f.v) - self.lambda_fun.phi(i.v);
                let r = self.radial.rep_radial_prod_rem(
                    r_ops, x.anorm, lambda, shift, x.nu_min, x.nu_max)?;
                add_block(&mut out, i2, j2, sij * scale, &r);
            }
        }
        Ok(out)
    }

    /// Alternative reduced matrix element of `q/β` between spherical
    /// states.
    pub fn amp(&mut self, f: Vlabel, i: Vlabel) -> Result<f64> {
        if (f.v - i.v).abs() != 1 || !triangle(i.l, 2, f.l) {
            return Ok(0.0);
        }
        if let Some(&a) = self.amps.get(&(f, i)) {
            return Ok(a);
        }
        let cg = self.cg.cg_so5r3(i.v, i.alpha, i.l, 1, 1, 2, f.v, f.alpha, f.l)?;
        let a = cg * me_so5red(f.v, 1, i.v) / 15f64.sqrt();
        self.amps.insert((f, i), a);
        Ok(a)
    }

    /// Radial matrix of `lc` between the seniorities `vi` and `vf`.
    fn radial_block(&mut self, lc: &[(f64, Vec<RadialOp>)], vf: i32, vi: i32,
                    x: &Xparams) -> Result<Rc<Mat<f64>>> {
        let lambda = x.lambda(self.lambda_fun, vi);
        let shift = self.lambda_fun.phi(vf) - self.lambda_fun.phi(vi);
        self.radial.rep_radial_lc_rem(lc, x.anorm, lambda, shift, x.nu_min, x.nu_max)
    }

    pub fn rep_intrinsic(&mut self, op: Intrinsic, x: &Xparams) -> Result<Rc<Mat<f64>>> {
        let key = (op, xparams_key(x));
        if let Some(m) = self.intrinsics.get(&key) {
            return Ok(m.clone());
        }
        let m = match op {
            Intrinsic::Pi => self.rep_grad(x)?,
            Intrinsic::PiPi2 => {
                let mut m = self.rep_grad_grad(2, x)?;
                m.scale(-1.0);
                m
            }
            Intrinsic::PiPi4 => self.rep_grad_grad(4, x)?,
            Intrinsic::PiqPi => self.rep_grad_q_grad(x)?,
        };
        let m = Rc::new(m);
        self.intrinsics.insert(key, m.clone());
        Ok(m)
    }

    /// `∇`, the real form of `π`.
    pub fn rep_grad(&mut self, x: &Xparams) -> Result<Mat<f64>> {
        let sph_labels = x.sph_trunc().labels();
        let rd = x.rad_dim();
        let mut out = Mat::zero(sph_labels.len() * rd, sph_labels.len() * rd);
        for (i2, &f) in sph_labels.iter().enumerate() {
            for (j2, &i) in sph_labels.iter().enumerate() {
                let a = self.amp(f, i)?;
                if a == 0.0 {
                    continue;
                }
                let e = step_coef(f.v - i.v, i.v);
                let lc = [
                    (1.0, vec![RadialOp::Db]),
                    (e, vec![RadialOp::Bm]),
                ];
                let r = self.radial_block(&lc, f.v, i.v, x)?;
                add_block(&mut out, i2, j2, a, &r);
            }
        }
        Ok(out)
    }

    /// Spherical factor of `[∇×∇]_k` along the path `i → (v_i + s1) → f`.
    fn grad_grad_sph(&mut self, k: i32, s1: i32, f: Vlabel, i: Vlabel) -> Result<f64> {
        let mut sum = 0.0;
        for n in irrep_labels(i.v + s1) {
            if !triangle(i.l, 2, n.l) || !triangle(n.l, 2, f.l) {
                continue;
            }
            let w = self.w6j.w6j(2, 2, k, i.l, f.l, n.l);
            if w == 0.0 {
                continue;
            }
            let a = self.amp(f, n)? * self.amp(n, i)?;
            sum += ((2 * n.l + 1) as f64).sqrt() * w * a;
        }
        Ok(phase(k + f.l + i.l) * ((2 * k + 1) as f64).sqrt() * sum)
    }

    /// `[∇×∇]_k`.
    pub fn rep_grad_grad(&mut self, k: i32, x: &Xparams) -> Result<Mat<f64>> {
        let sph_labels = x.sph_trunc().labels();
        let rd = x.rad_dim();
        let mut out = Mat::zero(sph_labels.len() * rd, sph_labels.len() * rd);
        for (i2, &f) in sph_labels.iter().enumerate() {
            for (j2, &i) in sph_labels.iter().enumerate() {
                if !triangle(i.l, k, f.l) {
                    continue;
                }
                for &(s1, s2) in &[(1, 1), (1, -1), (-1, 1), (-1, -1)] {
                    if i.v + s1 + s2 != f.v || i.v + s1 < 0 {
                        continue;
                    }
                    let s = self.grad_grad_sph(k, s1, f, i)?;
                    if s == 0.0 {
                        continue;
                    }
                    let e1 = step_coef(s1, i.v);
                    let e2 = step_coef(s2, i.v + s1);
                    let lc = [
                        (1.0, vec![RadialOp::D2b]),
                        (e1 + e2, vec![RadialOp::Bm, RadialOp::Db]),
                        (e1 * e2 - e1, vec![RadialOp::Bm2]),
                    ];
                    let r = self.radial_block(&lc, f.v, i.v, x)?;
                    add_block(&mut out, i2, j2, s, &r);
                }
            }
        }
        Ok(out)
    }

    /// Spherical factor of `[[∇×q]_2×∇]_0` along
    /// `i → (v_i + s1) → (v_i + s1 + s2) → f`.
    fn grad_q_grad_sph(&mut self, s1: i32, s2: i32, f: Vlabel, i: Vlabel) -> Result<f64> {
        let mut sum = 0.0;
        for n1 in irrep_labels(i.v + s1) {
            if !triangle(i.l, 2, n1.l) || !triangle(n1.l, 2, f.l) {
                continue;
            }
            let w_out = phase(f.l + i.l) * ((2 * n1.l + 1) as f64).sqrt()
                * self.w6j.w6j(2, 2, 0, i.l, f.l, n1.l);
            if w_out == 0.0 {
                continue;
            }
            let a1 = self.amp(n1, i)?;
            if a1 == 0.0 {
                continue;
            }
            for n2 in irrep_labels(i.v + s1 + s2) {
                if !triangle(n1.l, 2, n2.l) || !triangle(n2.l, 2, f.l) {
                    continue;
                }
                let w_in = phase(2 + f.l + n1.l) * 5f64.sqrt()
                    * ((2 * n2.l + 1) as f64).sqrt()
                    * self.w6j.w6j(2, 2, 2, n1.l, f.l, n2.l);
                if w_in == 0.0 {
                    continue;
                }
                sum += w_out * w_in * self.amp(f, n2)? * self.amp(n2, n1)? * a1;
            }
        }
        Ok(sum)
    }

    /// `[[∇×q]_2×∇]_0`.
    pub fn rep_grad_q_grad(&mut self, x: &Xparams) -> Result<Mat<f64>> {
        let sph_labels = x.sph_trunc().labels();
        let rd = x.rad_dim();
        let mut out = Mat::zero(sph_labels.len() * rd, sph_labels.len() * rd);
        let steps = [1, -1];
        for (i2, &f) in sph_labels.iter().enumerate() {
            for (j2, &i) in sph_labels.iter().enumerate() {
                if f.l != i.l || (f.v - i.v).abs() % 2 != 1 {
                    continue;
                }
                for &s1 in &steps {
                    for &s2 in &steps {
                        let s3 = f.v - i.v - s1 - s2;
                        if s3.abs() != 1 || i.v + s1 < 0 || i.v + s1 + s2 < 0 {
                            continue;
                        }
                        let s = self.grad_q_grad_sph(s1, s2, f, i)?;
                        if s == 0.0 {
                            continue;
                        }
                        let e1 = step_coef(s1, i.v);
                        let e3 = step_coef(s3, i.v + s1 + s2);
                        let lc = [
                            (1.0, vec![RadialOp::B, RadialOp::D2b]),
                            (1.0 + e1 + e3, vec![RadialOp::Db]),
                            (e1 * e3, vec![RadialOp::Bm]),
                        ];
                        let r = self.radial_block(&lc, f.v, i.v, x)?;
                        add_block(&mut out, i2, j2, s, &r);
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Matrix of `op` on the truncated X-space.
pub fn rep_xspace(cg: &CgStore, ctx: &AcmContext, op: &OpSum, x: &Xparams)
                  -> Result<Mat<f64>> {
    XspaceEngine::new(cg, ctx).rep_xspace(op, x)
}
