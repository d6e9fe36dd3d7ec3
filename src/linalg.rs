//! Linear algebra.
use std::cmp::max;
use cblas;
use lapacke;
use super::error::{Error, Result};
use super::mat::{Mat, MatMut, MatRef};
use super::utils::{self, cast};

pub use cblas::{Part, Transpose};

/// Eigenvalues below `-SQRT_DRIFT * max|w|` are rejected by the matrix
/// square roots; anything between that and zero is clamped to zero.
pub const SQRT_DRIFT: f64 = 1e-10;

pub fn part_to_u8(part: Part) -> u8 {
    match part {
        Part::Upper => b'U',
        Part::Lower => b'L',
    }
}

pub trait Gemm: Copy {
    unsafe fn gemm(
        layout: cblas::Layout,
        transa: Transpose,
        transb: Transpose,
        m: i32,
        n: i32,
        k: i32,
        alpha: Self,
        a: &[Self],
        lda: i32,
        b: &[Self],
        ldb: i32,
        beta: Self,
        c: &mut [Self],
        ldc: i32,
    );
}

impl Gemm for f64 {
    unsafe fn gemm(
        layout: cblas::Layout,
        transa: Transpose,
        transb: Transpose,
        m: i32,
        n: i32,
        k: i32,
        alpha: Self,
        a: &[Self],
        lda: i32,
        b: &[Self],
        ldb: i32,
        beta: Self,
        c: &mut [Self],
        ldc: i32,
    ) {
        cblas::dgemm(layout, transa, transb, m, n, k,
                     alpha, a, lda, b, ldb, beta, c, ldc)
    }
}

/// A thin wrapper over `Gemm::gemm` that panics if the sizes don't match.
/// We omit `Layout` because it can be trivially emulated by exchanging `a`
/// and `b`.
pub fn gemm(
    transa: Transpose,
    transb: Transpose,
    alpha: f64,
    a: MatRef<f64>,
    b: MatRef<f64>,
    beta: f64,
    mut c: MatMut<f64>,
) {
    let (ma, ka) = utils::swap_if(transa != Transpose::None, a.dims());
    let (kb, nb) = utils::swap_if(transb != Transpose::None, b.dims());
    let (mc, nc) = c.dims();
    assert_eq!(ma, mc);
    assert_eq!(nb, nc);
    assert_eq!(ka, kb);
    if mc == 0 || nc == 0 {
        return;
    }
    if ka == 0 {
        // BLAS rejects a zero leading dimension, so scale by hand
        for i in 0 .. mc {
            for j in 0 .. nc {
                c[(i, j)] *= beta;
            }
        }
        return;
    }
    let lda = cast(max(1, a.stride()));
    let ldb = cast(max(1, b.stride()));
    let ldc = cast(max(1, c.stride()));
    unsafe {
        f64::gemm(
            cblas::Layout::RowMajor,
            transa,
            transb,
            cast(ma),
            cast(nb),
            cast(ka),
            alpha,
            a.to_slice(),
            lda,
            b.to_slice(),
            ldb,
            beta,
            c.to_slice(),
            ldc,
        );
    }
}

/// `op(a) × op(b)` as a fresh matrix.
pub fn matmul_t(transa: Transpose, a: &Mat<f64>,
                transb: Transpose, b: &Mat<f64>) -> Mat<f64> {
    let (m, _) = utils::swap_if(transa != Transpose::None, a.dims());
    let (_, n) = utils::swap_if(transb != Transpose::None, b.dims());
    let mut c = Mat::zero(m, n);
    gemm(transa, transb, 1.0, a.as_ref(), b.as_ref(), 0.0, c.as_mut());
    c
}

/// `a × b` as a fresh matrix.
pub fn matmul(a: &Mat<f64>, b: &Mat<f64>) -> Mat<f64> {
    matmul_t(Transpose::None, a, Transpose::None, b)
}

pub trait Heevr: Copy {
    unsafe fn heevr(
        layout: lapacke::Layout,
        jobz: u8,
        range: u8,
        uplo: u8,
        n: i32,
        a: &mut [Self],
        lda: i32,
        vl: Self,
        vu: Self,
        il: i32,
        iu: i32,
        abstol: Self,
        m: &mut i32,
        w: &mut [Self],
        z: &mut [Self],
        ldz: i32,
        isuppz: &mut [i32],
    ) -> i32;
}

impl Heevr for f64 {
    unsafe fn heevr(
        layout: lapacke::Layout,
        jobz: u8,
        range: u8,
        uplo: u8,
        n: i32,
        a: &mut [Self],
        lda: i32,
        vl: Self,
        vu: Self,
        il: i32,
        iu: i32,
        abstol: Self,
        m: &mut i32,
        w: &mut [Self],
        z: &mut [Self],
        ldz: i32,
        isuppz: &mut [i32],
    ) -> i32 {
        lapacke::dsyevr(
            layout,
            jobz,
            range,
            uplo,
            n,
            a,
            lda,
            vl,
            vu,
            il,
            iu,
            abstol,
            m,
            w,
            z,
            ldz,
            isuppz,
        )
    }
}

/// All eigenpairs of a real symmetric matrix, right eigenvectors stored as
/// columns of `z`.  Eigenvalues come out in ascending order.  The content
/// of `a` is destroyed.
pub fn heevr(
    uplo: Part,
    a: MatMut<f64>,
    abstol: f64,
    w: &mut [f64],
    z: MatMut<f64>,
    isuppz: &mut Vec<i32>,
) -> ::std::result::Result<usize, i32> {
    let n = a.num_rows();
    assert_eq!(n, a.num_cols());
    assert!(w.len() >= n);
    assert_eq!(z.dims(), (n, n));
    if n == 0 {
        return Ok(0);
    }
    let lda = cast(a.stride());
    let ldz = cast(z.stride());
    isuppz.resize(2 * n, 0);
    let mut m = 0;
    let e = unsafe {
        f64::heevr(
            lapacke::Layout::RowMajor,
            b'V',
            b'A',
            part_to_u8(uplo),
            cast(n),
            a.to_slice(),
            lda,
            0.0,
            0.0,
            0,
            0,
            abstol,
            &mut m,
            w,
            z.to_slice(),
            ldz,
            isuppz,
        )
    };
    if e == 0 {
        Ok(cast(m))
    } else {
        Err(e)
    }
}

/// Eigenvalues (ascending) and eigenvectors (as columns) of the symmetric
/// part of `m`.  Eigenvalues that compare equal keep LAPACK's order.
pub fn eigh(m: &Mat<f64>) -> Result<(Vec<f64>, Mat<f64>)> {
    if !m.is_square() {
        return Err(Error::Range(format!(
            "cannot diagonalise a {}x{} matrix", m.num_rows(), m.num_cols())));
    }
    let n = m.num_rows();
    let mut a = m.clone();
    a.symmetrize();
    let mut w = vec![0.0; n];
    let mut z = Mat::zero(n, n);
    let mut isuppz = Vec::new();
    let found = heevr(Part::Upper, a.as_mut(), 0.0, &mut w, z.as_mut(),
                      &mut isuppz).map_err(Error::Lapack)?;
    if found != n {
        return Err(Error::Lapack(-1));
    }
    Ok((w, z))
}

/// Rebuild `z × diag(f(w)) × zᵀ`.
fn eigen_compose<F>(w: &[f64], z: &Mat<f64>, mut f: F) -> Result<Mat<f64>>
    where F: FnMut(f64) -> Result<f64>
{
    let n = w.len();
    let mut zf = z.clone();
    for (j, &wj) in w.iter().enumerate() {
        let fj = f(wj)?;
        for i in 0 .. n {
            zf[(i, j)] *= fj;
        }
    }
    Ok(matmul_t(Transpose::None, &zf, Transpose::Ordinary, z))
}

fn clamp_drift(w: &mut [f64]) -> Result<()> {
    let scale = w.iter().fold(0.0, |m: f64, x| m.max(x.abs()));
    for x in w.iter_mut() {
        if *x < 0.0 {
            if *x < -SQRT_DRIFT * scale {
                return Err(Error::NegativeEigenvalue(*x));
            }
            *x = 0.0;
        }
    }
    Ok(())
}

/// Positive-semidefinite square root of a real symmetric matrix.
pub fn matrix_sqrt(m: &Mat<f64>) -> Result<Mat<f64>> {
    let (mut w, z) = eigh(m)?;
    clamp_drift(&mut w)?;
    eigen_compose(&w, &z, |x| Ok(x.sqrt()))
}

/// Inverse of the positive-definite square root of a real symmetric matrix.
pub fn matrix_sqrt_inv(m: &Mat<f64>) -> Result<Mat<f64>> {
    let (mut w, z) = eigh(m)?;
    clamp_drift(&mut w)?;
    eigen_compose(&w, &z, |x| {
        if x == 0.0 {
            Err(Error::Singular("inverse square root of a singular matrix"
                                .to_owned()))
        } else {
            Ok(1.0 / x.sqrt())
        }
    })
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;
    use rand_xorshift::XorShiftRng;
    use super::*;
    use super::super::utils::Toler;

    const RNG_SEED: [u8; 16] = [
        0x1f, 0x0c, 0x92, 0x44, 0x6e, 0xd1, 0x35, 0xa8,
        0x7b, 0x02, 0xc9, 0x58, 0xe3, 0x16, 0x4a, 0xbd,
    ];

    const TOLER: Toler = Toler { relerr: 1e-10, abserr: 1e-10 };

    fn random_spd(rng: &mut XorShiftRng, n: usize) -> Mat<f64> {
        let mut x = Mat::zero(n, n);
        for i in 0 .. n {
            for j in 0 .. n {
                x[(i, j)] = rng.sample(StandardNormal);
            }
        }
        let mut a = matmul_t(Transpose::None, &x, Transpose::Ordinary, &x);
        for i in 0 .. n {
            a[(i, i)] += 1.0;
        }
        a
    }

    #[test]
    fn it_works() {
        let a = Mat::from(vec![vec![1.0, 2.0],
                               vec![3.0, 4.0]]);
        let b = Mat::from(vec![vec![5.0, 6.0],
                               vec![7.0, 8.0]]);
        let c0 = Mat::from(vec![vec![-1.0, -2.0],
                                vec![-3.0, -4.0]]);

        let mut c = c0.clone();
        gemm(Transpose::None, Transpose::None,
             2.0, a.as_ref(), b.as_ref(), 3.0, c.as_mut());
        assert_eq!(c, Mat::from(vec![vec![35.0, 38.0],
                                     vec![77.0, 88.0]]));

        let mut c = c0.clone();
        gemm(Transpose::Ordinary, Transpose::None,
             2.0, a.as_ref(), b.as_ref(), 3.0, c.as_mut());
        assert_eq!(c, Mat::from(vec![vec![49.0, 54.0],
                                     vec![67.0, 76.0]]));
    }

    #[test]
    fn test_eigh() {
        let m = Mat::from(vec![vec![2.0, 1.0],
                               vec![1.0, 2.0]]);
        let (w, z) = eigh(&m).unwrap();
        toler_assert_eq!(TOLER, w[0], 1.0);
        toler_assert_eq!(TOLER, w[1], 3.0);
        toler_assert_eq!(TOLER, z[(0, 0)].abs(), 0.5f64.sqrt());
        toler_assert_eq!(TOLER, z[(0, 0)] * z[(1, 0)], -0.5);
    }

    #[test]
    fn test_matrix_sqrt() {
        let mut rng = XorShiftRng::from_seed(RNG_SEED);
        for &n in &[1, 3, 6] {
            let a = random_spd(&mut rng, n);
            let s = matrix_sqrt(&a).unwrap();
            let si = matrix_sqrt_inv(&a).unwrap();
            let ss = matmul(&s, &s);
            let id = matmul(&s, &si);
            for i in 0 .. n {
                for j in 0 .. n {
                    toler_assert_eq!(TOLER, ss[(i, j)], a[(i, j)]);
                    toler_assert_eq!(TOLER, id[(i, j)],
                                     if i == j { 1.0 } else { 0.0 });
                }
            }
        }
    }

    #[test]
    fn test_matrix_sqrt_negative() {
        let m = Mat::from(vec![vec![1.0, 0.0],
                               vec![0.0, -1.0]]);
        match matrix_sqrt(&m) {
            Err(Error::NegativeEigenvalue(x)) => toler_assert_eq!(TOLER, x, -1.0),
            r => panic!("unexpected: {:?}", r),
        }
        let m = Mat::from(vec![vec![1.0, 0.0],
                               vec![0.0, -1e-14]]);
        let s = matrix_sqrt(&m).unwrap();
        toler_assert_eq!(TOLER, s[(1, 1)], 0.0);
        assert!(matrix_sqrt_inv(&m).is_err());
    }
}
