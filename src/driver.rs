//! Top-level calculations: diagonalise a Hamiltonian, optionally compute
//! transition matrix elements, and calibrate the energy and rate scales.
use super::cg::CgStore;
use super::context::{AcmContext, EigRef, RatRef, Xparams};
use super::eigen::{amp_xspeig, dig_xspace, XspaceEig};
use super::error::{Error, Result};
use super::mat::Mat;
use super::op::OpSum;
use super::xspace::XspaceEngine;

/// Outcome of `acm_scale` or `acm_adapt`.
#[derive(Clone, Debug)]
pub struct AcmResults {
    /// Ascending eigenvalues per angular momentum.
    pub eigen_vals: Vec<Vec<f64>>,
    /// Transition matrix elements between eigenstates, present when the
    /// context carries a transition operator.  Block `[i][j]` maps states
    /// of `lvals[j]` to states of `lvals[i]`.
    pub melements: Option<Vec<Vec<Mat<f64>>>>,
    pub lvals: Vec<i32>,
}

impl AcmResults {
    fn l_index(&self, l: i32) -> Result<usize> {
        self.lvals.iter().position(|&x| x == l).ok_or_else(|| {
            Error::Range(format!("no states with L = {}", l))
        })
    }

    /// Eigenvalue of the `idx`-th (from 1) state of angular momentum `l`.
    pub fn energy(&self, l: i32, idx: usize) -> Result<f64> {
        let vals = &self.eigen_vals[self.l_index(l)?];
        if idx == 0 || idx > vals.len() {
            return Err(Error::Range(format!(
                "state {} of L = {} is outside 1 ..= {}", idx, l, vals.len())));
        }
        Ok(vals[idx - 1])
    }

    /// Energy zero: `eig_base` if set, the lowest eigenvalue otherwise.
    pub fn energy_base(&self, ctx: &AcmContext) -> f64 {
        ctx.eig_base.unwrap_or_else(|| {
            self.eigen_vals.iter()
                .filter_map(|vals| vals.first().cloned())
                .fold(::std::f64::INFINITY, f64::min)
        })
    }

    /// Eigenvalues relative to the energy zero and divided by `eig_sft`.
    pub fn relative_energies(&self, ctx: &AcmContext) -> Vec<Vec<f64>> {
        let base = self.energy_base(ctx);
        self.eigen_vals.iter()
            .map(|vals| vals.iter().map(|e| (e - base) / ctx.eig_sft).collect())
            .collect()
    }

    /// Alternative reduced matrix element from state `(li, ni)` to
    /// `(lf, nf)`; the state indices start from 1.
    pub fn amplitude(&self, li: i32, ni: usize, lf: i32, nf: usize) -> Result<f64> {
        let melements = self.melements.as_ref().ok_or_else(|| {
            Error::MissingReference("no transition operator was given".to_owned())
        })?;
        let block = &melements[self.l_index(lf)?][self.l_index(li)?];
        if ni == 0 || nf == 0 || nf > block.num_rows() || ni > block.num_cols() {
            return Err(Error::Range(format!(
                "transition ({}, {}) -> ({}, {}) is outside the truncated space",
                li, ni, lf, nf)));
        }
        Ok(block[(nf - 1, ni - 1)])
    }

    /// Reduced transition rate `(2Lf + 1)/(2Li + 1) · A²`.
    pub fn transition_rate(&self, li: i32, ni: usize, lf: i32, nf: usize)
                           -> Result<f64> {
        let a = self.amplitude(li, ni, lf, nf)?;
        Ok((2 * lf + 1) as f64 / (2 * li + 1) as f64 * a * a)
    }

    /// Transition rate divided by `rat_sft`.
    pub fn relative_rate(&self, ctx: &AcmContext, li: i32, ni: usize,
                         lf: i32, nf: usize) -> Result<f64> {
        Ok(self.transition_rate(li, ni, lf, nf)? / ctx.rat_sft)
    }
}

fn check_eig_ref(r: &EigRef, x: &Xparams) -> Result<()> {
    if r.idx == 0 || r.l < x.l_min || r.l > x.l_max || r.idx > x.dim_l(r.l) {
        return Err(Error::MissingReference(format!(
            "state {} of L = {} is outside the truncated space", r.idx, r.l)));
    }
    Ok(())
}

fn check_rat_ref(r: &RatRef, x: &Xparams) -> Result<()> {
    check_eig_ref(&EigRef { l: r.li, idx: r.idx_i, fit: r.fit }, x)
        .and_then(|_| check_eig_ref(&EigRef { l: r.lf, idx: r.idx_f, fit: r.fit }, x))
        .map_err(|_| Error::MissingReference(format!(
            "transition ({}, {}) -> ({}, {}) is outside the truncated space",
            r.li, r.idx_i, r.lf, r.idx_f)))
}

fn check_refs(ctx: &AcmContext, x: &Xparams) -> Result<()> {
    if let Some(ref r) = ctx.eig_ref {
        check_eig_ref(r, x)?;
    }
    if ctx.transition.is_some() {
        if let Some(ref r) = ctx.rat_ref {
            check_rat_ref(r, x)?;
        }
    }
    Ok(())
}

fn acm_compute(cg: &CgStore, ctx: &AcmContext, h: &OpSum, x: &Xparams)
               -> Result<AcmResults> {
    ctx.check()?;
    x.check(ctx.lambda_fun)?;
    check_refs(ctx, x)?;
    let mut engine = XspaceEngine::new(cg, ctx);
    let eig = dig_xspace(&mut engine, h, x)?;
    let melements = match ctx.transition {
        Some(ref tr) => Some(amp_xspeig(&mut engine, tr, &eig)?),
        None => None,
    };
    let XspaceEig { eigen_vals, lvals, .. } = eig;
    Ok(AcmResults { eigen_vals, melements, lvals })
}

/// Diagonalise `h` on the truncated space using the scales already in
/// `ctx`.
pub fn acm_scale(cg: &CgStore, ctx: &AcmContext, h: &OpSum, x: &Xparams)
                 -> Result<AcmResults> {
    acm_compute(cg, ctx, h, x)
}

/// Like `acm_scale`, but first recalibrates the energy divisor (and the
/// rate divisor, when a transition and its reference are set) so that the
/// reference state and transition reproduce their target values.  Returns
/// the recalibrated context along with the results.
pub fn acm_adapt(cg: &CgStore, ctx: &AcmContext, h: &OpSum, x: &Xparams)
                 -> Result<(AcmContext, AcmResults)> {
    let eig_ref = ctx.eig_ref.ok_or_else(|| {
        Error::MissingReference("no reference state was given".to_owned())
    })?;
    let results = acm_compute(cg, ctx, h, x)?;

    let delta = results.energy(eig_ref.l, eig_ref.idx)? - results.energy_base(ctx);
    let eig_sft = delta / eig_ref.fit;
    if !(eig_sft != 0.0 && eig_sft.is_finite()) {
        return Err(Error::Range(format!(
            "reference state {} of L = {} cannot be scaled to {}",
            eig_ref.idx, eig_ref.l, eig_ref.fit)));
    }
    let mut adapted = ctx.clone().with_eig_sft(eig_sft);

    if let (Some(_), Some(r)) = (ctx.transition.as_ref(), ctx.rat_ref) {
        let rat_sft = results.transition_rate(r.li, r.idx_i, r.lf, r.idx_f)? / r.fit;
        if !(rat_sft > 0.0 && rat_sft.is_finite()) {
            return Err(Error::Range(format!(
                "reference transition rate cannot be scaled to {}", r.fit)));
        }
        adapted = adapted.with_rat_sft(rat_sft);
    }
    Ok((adapted, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::hamiltonian::{acm_hamiltonian, HamCoefs};
    use super::super::utils::Toler;

    const TOLER: Toler = Toler { relerr: 1e-10, abserr: 1e-10 };

    fn ham_c11() -> OpSum {
        acm_hamiltonian(&HamCoefs { c11: 1.0, ..Default::default() })
    }

    #[test]
    fn test_scale_radial() {
        let cg = CgStore::new("/nonexistent");
        let ctx = AcmContext::default().with_transition(Some(OpSum::parse("Radial_b2").unwrap()));
        let x = Xparams { nu_max: 1, ..Default::default() };
        let r = acm_scale(&cg, &ctx, &ham_c11(), &x).unwrap();
        assert_eq!(r.lvals, vec![0]);
        assert_eq!(r.eigen_vals[0].len(), 2);
        let rel = r.relative_energies(&ctx);
        toler_assert_eq!(TOLER, rel[0][0], 0.0);
        assert!(rel[0][1] > 0.0);
        let a = r.amplitude(0, 1, 0, 1).unwrap();
        toler_assert_eq!(TOLER, r.transition_rate(0, 1, 0, 1).unwrap(), a * a);
        assert!(r.amplitude(0, 3, 0, 1).is_err());
        assert!(r.amplitude(2, 1, 0, 1).is_err());
    }

    #[test]
    fn test_adapt_energy() {
        let cg = CgStore::new("/nonexistent");
        let ctx = AcmContext::default()
            .with_eig_ref(Some(EigRef { l: 0, idx: 2, fit: 6.0 }));
        let x = Xparams { nu_max: 3, ..Default::default() };
        let (adapted, r) = acm_adapt(&cg, &ctx, &ham_c11(), &x).unwrap();
        let rel = r.relative_energies(&adapted);
        toler_assert_eq!(TOLER, rel[0][1], 6.0);
        assert!(adapted.eig_sft > 0.0);
        assert!(r.melements.is_none());
    }

    #[test]
    fn test_missing_reference() {
        let cg = CgStore::new("/nonexistent");
        let x = Xparams { nu_max: 1, ..Default::default() };
        match acm_adapt(&cg, &AcmContext::default(), &ham_c11(), &x) {
            Err(Error::MissingReference(_)) => {}
            r => panic!("{:?}", r),
        }
        let ctx = AcmContext::default()
            .with_eig_ref(Some(EigRef { l: 0, idx: 3, fit: 1.0 }));
        match acm_scale(&cg, &ctx, &ham_c11(), &x) {
            Err(Error::MissingReference(_)) => {}
            r => panic!("{:?}", r),
        }
        // the transition reference only matters with a transition
        let ctx = AcmContext::default()
            .with_rat_ref(Some(RatRef { li: 2, idx_i: 1, lf: 0, idx_f: 1, fit: 1.0 }));
        acm_scale(&cg, &ctx, &ham_c11(), &x).unwrap();
        let ctx = ctx.with_transition(Some(OpSum::parse("Radial_b2").unwrap()));
        match acm_scale(&cg, &ctx, &ham_c11(), &x) {
            Err(Error::MissingReference(_)) => {}
            r => panic!("{:?}", r),
        }
    }
}
