//! Dimensions and ordered label lists of the SO(5)⊃SO(3) and X-space
//! bases.
//!
//! Every list follows the same order: `L` slowest, then `v`, then `α`,
//! then `ν` fastest.
use std::fmt;

/// Seniority, multiplicity and angular momentum of a spherical state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
         Serialize, Deserialize)]
pub struct Vlabel {
    pub v: i32,
    pub alpha: i32,
    pub l: i32,
}

impl fmt::Display for Vlabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.v, self.alpha, self.l)
    }
}

/// Full X-space label `(ν, v, α, L)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
         Serialize, Deserialize)]
pub struct Xlabel {
    pub nu: i32,
    pub v: i32,
    pub alpha: i32,
    pub l: i32,
}

impl Xlabel {
    pub fn vlabel(&self) -> Vlabel {
        Vlabel { v: self.v, alpha: self.alpha, l: self.l }
    }
}

pub fn dim_so3(l: i32) -> i32 {
    2 * l + 1
}

pub fn dim_so5(v: i32) -> i32 {
    (v + 1) * (v + 2) * (2 * v + 3) / 6
}

/// Multiplicity `d(v, L)` of the SO(3) irrep `L` inside the SO(5) irrep
/// `v`.
pub fn dim_so5r3(v: i32, l: i32) -> i32 {
    if v < 0 || l < 0 {
        return 0;
    }
    let b = if l % 2 == 0 { l / 2 } else { (l + 3) / 2 };
    let mut d = if v >= b { 1 + (v - b) / 3 } else { 0 };
    if v >= l - 2 {
        d -= (v - l + 2) / 3;
    }
    d.max(0)
}

/// Number of `(v, α)` pairs with `v` in `v_min ..= v_max` at fixed `L`.
pub fn dim_so5r3_rng_v(v_min: i32, v_max: i32, l: i32) -> i32 {
    (v_min.max(0) ..= v_max).map(|v| dim_so5r3(v, l)).sum()
}

/// Number of `(α, L)` pairs with `L` in `l_min ..= l_max` at fixed `v`.
pub fn dim_so5r3_rng_l(v: i32, l_min: i32, l_max: i32) -> i32 {
    (l_min.max(0) ..= l_max).map(|l| dim_so5r3(v, l)).sum()
}

/// Number of `(v, α, L)` triples in the truncated spherical space.
pub fn dim_so5r3_rng_v_var_l(v_min: i32, v_max: i32,
                             l_min: i32, l_max: i32) -> i32 {
    (l_min.max(0) ..= l_max).map(|l| dim_so5r3_rng_v(v_min, v_max, l)).sum()
}

pub fn dim_radial(nu_min: i32, nu_max: i32) -> i32 {
    (nu_max - nu_min + 1).max(0)
}

pub fn dim_xspace(nu_min: i32, nu_max: i32, v_min: i32, v_max: i32,
                  l_min: i32, l_max: i32) -> i32 {
    dim_radial(nu_min, nu_max) * dim_so5r3_rng_v_var_l(v_min, v_max, l_min, l_max)
}

/// Every `L` that occurs in the SO(5) irrep `v`, ascending.
pub fn lvals_so5(v: i32) -> Vec<i32> {
    (0 ..= 2 * v.max(0)).filter(|&l| dim_so5r3(v, l) > 0).collect()
}

/// Labels `(v, α, L)` at fixed `L` with `v` in range.
pub fn lbs_so5r3_rng_v(v_min: i32, v_max: i32, l: i32) -> Vec<Vlabel> {
    let mut labels = Vec::new();
    for v in v_min.max(0) ..= v_max {
        for alpha in 1 ..= dim_so5r3(v, l) {
            labels.push(Vlabel { v, alpha, l });
        }
    }
    labels
}

/// Labels `(v, α, L)` at fixed `v` with `L` in range.
pub fn lbs_so5r3_rng_l(v: i32, l_min: i32, l_max: i32) -> Vec<Vlabel> {
    let mut labels = Vec::new();
    for l in l_min.max(0) ..= l_max {
        for alpha in 1 ..= dim_so5r3(v, l) {
            labels.push(Vlabel { v, alpha, l });
        }
    }
    labels
}

pub fn lbs_so5r3_rng_v_var_l(v_min: i32, v_max: i32,
                             l_min: i32, l_max: i32) -> Vec<Vlabel> {
    (l_min.max(0) ..= l_max)
        .flat_map(|l| lbs_so5r3_rng_v(v_min, v_max, l))
        .collect()
}

pub fn lbs_xspace(nu_min: i32, nu_max: i32, v_min: i32, v_max: i32,
                  l_min: i32, l_max: i32) -> Vec<Xlabel> {
    let mut labels = Vec::new();
    for s in lbs_so5r3_rng_v_var_l(v_min, v_max, l_min, l_max) {
        for nu in nu_min ..= nu_max {
            labels.push(Xlabel { nu, v: s.v, alpha: s.alpha, l: s.l });
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplicities() {
        let table: &[(i32, &[i32])] = &[
            (0, &[1, 0, 0, 0, 0, 0, 0]),
            (1, &[0, 0, 1, 0, 0, 0, 0]),
            (2, &[0, 0, 1, 0, 1, 0, 0]),
            (3, &[1, 0, 0, 1, 1, 0, 1]),
            (4, &[0, 0, 1, 0, 1, 1, 1, 0, 1]),
            (6, &[1, 0, 0, 1, 1, 0, 2, 1, 1, 1, 1, 0, 1]),
        ];
        for &(v, ds) in table {
            for (l, &d) in ds.iter().enumerate() {
                assert_eq!(dim_so5r3(v, l as i32), d, "v = {}, L = {}", v, l);
            }
        }
    }

    #[test]
    fn test_so5_dims_add_up() {
        for v in 0 .. 12 {
            let total: i32 = (0 ..= 2 * v)
                .map(|l| dim_so5r3(v, l) * dim_so3(l))
                .sum();
            assert_eq!(total, dim_so5(v), "v = {}", v);
        }
    }

    #[test]
    fn test_label_counts() {
        for &(v_min, v_max, l_min, l_max) in &[
            (0, 0, 0, 0),
            (0, 1, 0, 1),
            (0, 6, 0, 6),
            (2, 9, 1, 8),
            (5, 18, 0, 6),
        ] {
            let lbs = lbs_so5r3_rng_v_var_l(v_min, v_max, l_min, l_max);
            assert_eq!(lbs.len() as i32,
                       dim_so5r3_rng_v_var_l(v_min, v_max, l_min, l_max));
            for &(nu_min, nu_max) in &[(0, 0), (0, 3), (2, 5)] {
                let x = lbs_xspace(nu_min, nu_max, v_min, v_max, l_min, l_max);
                assert_eq!(x.len() as i32,
                           dim_xspace(nu_min, nu_max, v_min, v_max, l_min, l_max));
                let keys: Vec<_> = x.iter()
                    .map(|x| (x.l, x.v, x.alpha, x.nu))
                    .collect();
                let mut sorted = keys.clone();
                sorted.sort();
                assert_eq!(keys, sorted);
            }
        }
        for v in 0 .. 8 {
            assert_eq!(lbs_so5r3_rng_l(v, 0, 2 * v).len() as i32,
                       dim_so5r3_rng_l(v, 0, 2 * v));
        }
    }

    #[test]
    fn test_lvals_so5() {
        assert_eq!(lvals_so5(3), vec![0, 3, 4, 6]);
        assert_eq!(lvals_so5(1), vec![2]);
    }
}
