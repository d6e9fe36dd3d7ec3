//! Block diagonalisation by angular momentum and transition matrix
//! elements between eigenstates.
use super::context::Xparams;
use super::error::Result;
use super::linalg::{eigh, matmul, matmul_t, Transpose};
use super::mat::Mat;
use super::op::OpSum;
use super::xspace::XspaceEngine;

/// Eigenvalues and eigenvectors of each angular momentum block.
#[derive(Clone, Debug)]
pub struct XspaceEig {
    /// Ascending eigenvalues, one list per entry of `lvals`.
    pub eigen_vals: Vec<Vec<f64>>,
    /// Eigenvectors as columns, one matrix per entry of `lvals`.
    pub eigen_bases: Vec<Mat<f64>>,
    pub xparams: Xparams,
    pub lvals: Vec<i32>,
}

impl XspaceEig {
    /// Position of `l` in `lvals`.
    pub fn l_index(&self, l: i32) -> Option<usize> {
        self.lvals.iter().position(|&x| x == l)
    }

    /// Lowest eigenvalue over all blocks.
    pub fn ground_energy(&self) -> Option<f64> {
        self.eigen_vals.iter()
            .filter_map(|vals| vals.first().cloned())
            .fold(None, |m, x| Some(m.map_or(x, |m: f64| m.min(x))))
    }
}

/// Offsets of the angular momentum blocks in the full X-space ordering.
fn block_offsets(x: &Xparams, lvals: &[i32]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(lvals.len());
    let mut offset = 0;
    let mut l = x.l_min;
    for &lv in lvals {
        while l < lv {
            offset += x.dim_l(l);
            l += 1;
        }
        offsets.push(offset);
    }
    offsets
}

/// Eigenvalues in ascending order and the matching eigenvectors as
/// columns of the symmetric part of `m`.  Equal eigenvalues keep their
/// original order.
pub fn eigenfiddle(m: &Mat<f64>) -> Result<(Vec<f64>, Mat<f64>)> {
    let mut a = m.clone();
    a.symmetrize();
    let (w, z) = eigh(&a)?;
    let mut order: Vec<usize> = (0 .. w.len()).collect();
    order.sort_by(|&i, &j| w[i].partial_cmp(&w[j]).unwrap_or(::std::cmp::Ordering::Equal));
    let vals = order.iter().map(|&k| w[k]).collect();
    let n = z.num_rows();
    let mut basis = Mat::zero(n, order.len());
    for (j, &k) in order.iter().enumerate() {
        for i in 0 .. n {
            basis[(i, j)] = z[(i, k)];
        }
    }
    Ok((vals, basis))
}

/// Diagonalise `h` on each non-empty angular momentum block of `x`.
///
/// Tame operators do not mix angular momenta and are built one block at
/// a time; anything else is built on the whole space and then sliced.
pub fn dig_xspace(engine: &mut XspaceEngine, h: &OpSum, x: &Xparams)
                  -> Result<XspaceEig> {
    x.check(engine.lambda_fun())?;
    let lvals = x.lvals();
    let mut eigen_vals = Vec::with_capacity(lvals.len());
    let mut eigen_bases = Vec::with_capacity(lvals.len());
    if h.is_tame() {
        for &l in &lvals {
            let m = engine.rep_xspace(h, &x.with_l(l))?;
            let (vals, basis) = eigenfiddle(&m)?;
            eigen_vals.push(vals);
            eigen_bases.push(basis);
        }
    } else {
        let m = engine.rep_xspace(h, x)?;
        for (&l, &off) in lvals.iter().zip(&block_offsets(x, &lvals)) {
            let n = x.dim_l(l);
            let (vals, basis) = eigenfiddle(&m.submat(off .. off + n, off .. off + n))?;
            eigen_vals.push(vals);
            eigen_bases.push(basis);
        }
    }
    Ok(XspaceEig { eigen_vals, eigen_bases, xparams: *x, lvals })
}

/// Matrix elements of `tr` between eigenstates.  Block `[i][j]` maps the
/// eigenstates of `lvals[j]` (columns) to those of `lvals[i]` (rows).
pub fn amp_xspeig(engine: &mut XspaceEngine, tr: &OpSum, eig: &XspaceEig)
                  -> Result<Vec<Vec<Mat<f64>>>> {
    let x = &eig.xparams;
    let m = engine.rep_xspace(tr, x)?;
    let offsets = block_offsets(x, &eig.lvals);
    let mut melements = Vec::with_capacity(eig.lvals.len());
    for (i, &li) in eig.lvals.iter().enumerate() {
        let ni = x.dim_l(li);
        let mut row = Vec::with_capacity(eig.lvals.len());
        for (j, &lj) in eig.lvals.iter().enumerate() {
            let nj = x.dim_l(lj);
            let block = m.submat(offsets[i] .. offsets[i] + ni,
                                 offsets[j] .. offsets[j] + nj);
            let right = matmul(&block, &eig.eigen_bases[j]);
            row.push(matmul_t(Transpose::Ordinary, &eig.eigen_bases[i],
                              Transpose::None, &right));
        }
        melements.push(row);
    }
    Ok(melements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::cg::CgStore;
    use super::super::context::AcmContext;
    use super::super::hamiltonian::{acm_hamiltonian, HamCoefs};
    use super::super::utils::Toler;

    const TOLER: Toler = Toler { relerr: 1e-10, abserr: 1e-10 };

    #[test]
    fn test_eigenfiddle() {
        let m = Mat::from(vec![
            vec![2.0, 1.0, 0.0],
            vec![1.0, 2.0, 0.0],
            vec![0.0, 0.0, -1.0],
        ]);
        let (w, z) = eigenfiddle(&m).unwrap();
        toler_assert_eq!(TOLER, w[0], -1.0);
        toler_assert_eq!(TOLER, w[1], 1.0);
        toler_assert_eq!(TOLER, w[2], 3.0);
        let mz = matmul(&m, &z);
        for j in 0 .. 3 {
            for i in 0 .. 3 {
                toler_assert_eq!(TOLER, mz[(i, j)], w[j] * z[(i, j)]);
            }
        }

        // only the symmetric part matters
        let m = Mat::from(vec![
            vec![0.0, 2.0],
            vec![0.0, 0.0],
        ]);
        let (w, _) = eigenfiddle(&m).unwrap();
        toler_assert_eq!(TOLER, w[0], -1.0);
        toler_assert_eq!(TOLER, w[1], 1.0);
    }

    #[test]
    fn test_block_offsets() {
        let x = Xparams { nu_max: 1, v_max: 3, l_max: 4, ..Default::default() };
        let lvals = x.lvals();
        assert_eq!(lvals, vec![0, 2, 3, 4]);
        let offsets = block_offsets(&x, &lvals);
        assert_eq!(offsets[0], 0);
        for k in 1 .. lvals.len() {
            assert_eq!(offsets[k], offsets[k - 1] + x.dim_l(lvals[k - 1]));
        }
    }

    #[test]
    fn test_dig_radial() {
        let cg = CgStore::new("/nonexistent");
        let ctx = AcmContext::default();
        let mut engine = XspaceEngine::new(&cg, &ctx);
        let h = acm_hamiltonian(&HamCoefs { c11: 1.0, ..Default::default() });
        let x = Xparams { ..Default::default() };
        let eig = dig_xspace(&mut engine, &h, &x).unwrap();
        assert_eq!(eig.lvals, vec![0]);
        toler_assert_eq!(TOLER, eig.eigen_vals[0][0], -2.5);
        assert_eq!(eig.ground_energy(), Some(eig.eigen_vals[0][0]));
        assert_eq!(eig.l_index(0), Some(0));
        assert_eq!(eig.l_index(2), None);

        let tr = OpSum::parse("Radial_b2").unwrap();
        let melements = amp_xspeig(&mut engine, &tr, &eig).unwrap();
        toler_assert_eq!(TOLER, melements[0][0][(0, 0)], 2.5);
    }
}
