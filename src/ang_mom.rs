//! Angular momentum coupling.
use fnv::FnvHashMap;
use wigner_symbols::{ClebschGordan, Wigner6j};

/// Returns `(-1)^φ`
#[inline]
pub fn phase(phi: i32) -> f64 {
    if phi % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Returns `(2 * l + 1)^(e / 2)` for an integer angular momentum `l`.
#[inline]
pub fn lweight(l: i32, e: i32) -> f64 {
    ((2 * l + 1) as f64).powf(e as f64 / 2.0)
}

/// Whether `c` lies in the triangle `|a − b| ..= a + b`.
#[inline]
pub fn triangle(a: i32, b: i32, c: i32) -> bool {
    (a - b).abs() <= c && c <= a + b
}

/// SO(3) Clebsch–Gordan coefficient `⟨j1 m1 j2 m2 | j3 m3⟩`, with every
/// argument passed as twice its value so half-integers are exact.
pub fn cg_so3(tj1: i32, tm1: i32, tj2: i32, tm2: i32, tj3: i32, tm3: i32) -> f64 {
    let in_multiplet = |tj: i32, tm: i32| {
        tj >= 0 && tm.abs() <= tj && (tj + tm) % 2 == 0
    };
    if !in_multiplet(tj1, tm1) || !in_multiplet(tj2, tm2)
        || !in_multiplet(tj3, tm3)
        || tm1 + tm2 != tm3
        || !triangle(tj1, tj2, tj3)
        || (tj1 + tj2 + tj3) % 2 != 0
    {
        return 0.0;
    }
    ClebschGordan {
        tj1,
        tm1,
        tj2,
        tm2,
        tj12: tj3,
        tm12: tm3,
    }.value().into()
}

/// Memo table for Wigner 6-j symbols with integer arguments.
#[derive(Clone, Debug, Default)]
pub struct Wigner6jCtx {
    table: FnvHashMap<[i32; 6], f64>,
}

impl Wigner6jCtx {
    /// `{j1 j2 j3; j4 j5 j6}` for integer `j`s.
    pub fn w6j(&mut self, j1: i32, j2: i32, j3: i32,
               j4: i32, j5: i32, j6: i32) -> f64 {
        if !triangle(j1, j2, j3) || !triangle(j1, j5, j6)
            || !triangle(j4, j2, j6) || !triangle(j4, j5, j3)
        {
            return 0.0;
        }
        *self.table.entry([j1, j2, j3, j4, j5, j6]).or_insert_with(|| {
            Wigner6j {
                tj1: 2 * j1,
                tj2: 2 * j2,
                tj3: 2 * j3,
                tj4: 2 * j4,
                tj5: 2 * j5,
                tj6: 2 * j6,
            }.value().into()
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
