//! SO(5)⊃SO(3) Clebsch–Gordan coefficients.
//!
//! Tables live in a directory tree
//!
//! ```text
//! <base>/v2=<v2>/SO5CG_<v1>_<v2>_<v3>/SO5CG_<v1>_<v2>-<a2>-<L2>_<v3>
//! ```
//!
//! with `v1 <= v3`.  Each line of a table starts with one coefficient; the
//! rest of the line is ignored and the labels are recovered from the line
//! position through `cg_labels`.
use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use fnv::FnvHashMap;
use super::ang_mom::{phase, triangle};
use super::error::{Error, Result};
use super::io as lio;
use super::labels::{dim_so5, dim_so5r3};

/// Labels `(α1, L1, α3, L3)` of one line in a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CgLabel {
    pub alpha1: i32,
    pub l1: i32,
    pub alpha3: i32,
    pub l3: i32,
}

/// Identifies one table file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CgKey {
    pub v1: i32,
    pub v2: i32,
    pub alpha2: i32,
    pub l2: i32,
    pub v3: i32,
}

impl CgKey {
    /// Whether the coupling `v1 × (v2 α2 L2) → v3` can be non-zero.
    pub fn is_valid(&self) -> bool {
        self.v1 >= 0 && self.v3 >= 0
            && triangle(self.v1, self.v2, self.v3)
            && (self.v1 + self.v2 + self.v3) % 2 == 0
            && self.alpha2 >= 1
            && self.alpha2 <= dim_so5r3(self.v2, self.l2)
    }

    pub fn rel_path(&self) -> PathBuf {
        let CgKey { v1, v2, alpha2, l2, v3 } = *self;
        PathBuf::from(format!("v2={}", v2))
            .join(format!("SO5CG_{}_{}_{}", v1, v2, v3))
            .join(format!("SO5CG_{}_{}-{}-{}_{}", v1, v2, alpha2, l2, v3))
    }
}

/// Line order of the table for `(v1, ·, ·, L2, v3)`: `L1` outermost, then
/// `α1`, then `L3`, then `α3` innermost.
pub fn cg_labels(v1: i32, l2: i32, v3: i32) -> Vec<CgLabel> {
    let mut labels = Vec::new();
    for l1 in 0 ..= 2 * v1.max(0) {
        for alpha1 in 1 ..= dim_so5r3(v1, l1) {
            for l3 in (l1 - l2).abs() ..= l1 + l2 {
                for alpha3 in 1 ..= dim_so5r3(v3, l3) {
                    labels.push(CgLabel { alpha1, l1, alpha3, l3 });
                }
            }
        }
    }
    labels
}

/// Coefficients of one table, indexed by their labels.
#[derive(Clone, Debug, Default)]
pub struct CgTable {
    entries: FnvHashMap<CgLabel, f64>,
}

impl CgTable {
    pub fn get(&self, label: CgLabel) -> f64 {
        self.entries.get(&label).cloned().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Values in `cg_labels` order.
    pub fn values(&self, key: CgKey) -> Vec<f64> {
        cg_labels(key.v1, key.l2, key.v3).into_iter()
            .map(|label| self.get(label))
            .collect()
    }

    fn from_values(key: CgKey, values: &[f64]) -> io::Result<Self> {
        let labels = cg_labels(key.v1, key.l2, key.v3);
        if values.len() < labels.len() {
            return Err(lio::invalid_data(format!(
                "expected {} coefficients, found {}", labels.len(), values.len())));
        }
        Ok(Self { entries: labels.into_iter().zip(values.iter().cloned()).collect() })
    }

    /// The `v2 = 0` coupling is the identity.
    fn identity(key: CgKey) -> Self {
        let entries = cg_labels(key.v1, key.l2, key.v3).into_iter()
            .map(|label| {
                let x = (key.v1 == key.v3 && label.l1 == label.l3
                         && label.alpha1 == label.alpha3) as i32 as f64;
                (label, x)
            })
            .collect();
        Self { entries }
    }
}

/// Lazily loaded, append-only store of CG tables.
#[derive(Debug, Default)]
pub struct CgStore {
    base: PathBuf,
    tables: RefCell<FnvHashMap<CgKey, Rc<CgTable>>>,
}

impl CgStore {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: base.into(),
            tables: Default::default(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Number of tables loaded so far.
    pub fn num_tables(&self) -> usize {
        self.tables.borrow().len()
    }

    /// Table for `key`, which must have `v1 <= v3`.
    pub fn table(&self, key: CgKey) -> Result<Rc<CgTable>> {
        if let Some(table) = self.tables.borrow().get(&key) {
            return Ok(table.clone());
        }
        let path = self.base.join(key.rel_path());
        if !key.is_valid() || key.v1 > key.v3 {
            return Err(Error::CgFile(path, io::Error::new(
                io::ErrorKind::NotFound,
                "invalid coupling",
            )));
        }
        let table = if key.v2 == 0 {
            CgTable::identity(key)
        } else {
            let (found, values) = lio::read_first_fields(&path)
                .map_err(|e| Error::CgFile(path.clone(), e))?;
            CgTable::from_values(key, &values)
                .map_err(|e| Error::CgFile(found, e))?
        };
        let table = Rc::new(table);
        self.tables.borrow_mut().insert(key, table.clone());
        Ok(table)
    }

    /// `⟨v1 α1 L1; v2 α2 L2 ‖ v3 α3 L3⟩`
    pub fn cg_so5r3(&self, v1: i32, alpha1: i32, l1: i32,
                    v2: i32, alpha2: i32, l2: i32,
                    v3: i32, alpha3: i32, l3: i32) -> Result<f64> {
        let in_irrep = |v: i32, alpha: i32, l: i32| {
            v >= 0 && l >= 0 && alpha >= 1 && alpha <= dim_so5r3(v, l)
        };
        if !triangle(v1, v2, v3) || !triangle(l1, l2, l3)
            || (v1 + v2 + v3) % 2 != 0
            || !in_irrep(v1, alpha1, l1)
            || !in_irrep(v2, alpha2, l2)
            || !in_irrep(v3, alpha3, l3)
        {
            return Ok(0.0);
        }
        if v2 == 0 {
            let x = v1 == v3 && alpha1 == alpha3 && l1 == l3;
            return Ok(x as i32 as f64);
        }
        if v1 > v3 {
            let x = self.cg_so5r3(v3, alpha3, l3, v2, alpha2, l2,
                                  v1, alpha1, l1)?;
            let ratio = (dim_so5(v3) * (2 * l1 + 1)) as f64
                / (dim_so5(v1) * (2 * l3 + 1)) as f64;
            return Ok(phase(l3 + l2 - l1) * ratio.sqrt() * x);
        }
        let table = self.table(CgKey { v1, v2, alpha2, l2, v3 })?;
        Ok(table.get(CgLabel { alpha1, l1, alpha3, l3 }))
    }
}

/// Write one table, its coefficients given in `cg_labels` order.
pub fn write_table(base: &Path, key: CgKey, values: &[f64]) -> io::Result<()> {
    use std::fs;
    use std::io::Write;

    let labels = cg_labels(key.v1, key.l2, key.v3);
    if values.len() != labels.len() {
        return Err(lio::invalid_data(format!(
            "expected {} coefficients, got {}", labels.len(), values.len())));
    }
    let path = base.join(key.rel_path());
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = io::BufWriter::new(fs::File::create(&path)?);
    for (label, x) in labels.iter().zip(values) {
        writeln!(file, "{:?} {} {} {} {} {} {} {} {} {}",
                 x, key.v1, label.alpha1, label.l1, key.v2, key.alpha2, key.l2,
                 key.v3, label.alpha3, label.l3)?;
    }
    Ok(())
}

/// Write the tables with `v1 = 0` for `v2 = v3` in `1 ..= v_max`.  These
/// couplings are known in closed form.
pub fn write_scalar_tables(base: &Path, v_max: i32) -> io::Result<()> {
    for v in 1 ..= v_max {
        for l2 in 0 ..= 2 * v {
            for alpha2 in 1 ..= dim_so5r3(v, l2) {
                let key = CgKey { v1: 0, v2: v, alpha2, l2, v3: v };
                let values: Vec<_> = cg_labels(0, l2, v).into_iter()
                    .map(|label| (label.l3 == l2 && label.alpha3 == alpha2) as i32 as f64)
                    .collect();
                write_table(base, key, &values)?;
            }
        }
    }
    Ok(())
}

/// Write the `(v2 α2 L2) = (1 1 2)` tables up to `v3 = 3` along with the
/// scalar ones.  Below `v = 4` every coefficient is the square root of a
/// rational number.
pub fn write_quadrupole_tables(base: &Path) -> io::Result<()> {
    write_scalar_tables(base, 1)?;
    let key = |v1, v3| CgKey { v1, v2: 1, alpha2: 1, l2: 2, v3 };
    write_table(base, key(1, 2), &[1.0, 1.0])?;
    // (L1, L3) = (2, 0), (2, 3), (2, 4), (4, 3), (4, 4), (4, 6)
    write_table(base, key(2, 3), &[
        1.0,
        (5.0f64 / 7.0).sqrt(),
        (11.0f64 / 21.0).sqrt(),
        -(2.0f64 / 7.0).sqrt(),
        (10.0f64 / 21.0).sqrt(),
        1.0,
    ])
}

#[cfg(test)]
mod tests {
    use std::{env, fs};
    use std::io::Write;
    use super::*;
    use super::super::utils::Toler;

    const TOLER: Toler = Toler { relerr: 1e-12, abserr: 1e-12 };

    fn scratch(name: &str) -> PathBuf {
        let dir = env::temp_dir()
            .join(format!("acm-cg-{}-{}", name, ::std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_cg_labels() {
        let labels = cg_labels(2, 0, 5);
        assert_eq!(labels, vec![
            CgLabel { alpha1: 1, l1: 2, alpha3: 1, l3: 2 },
            CgLabel { alpha1: 1, l1: 4, alpha3: 1, l3: 4 },
        ]);
        let labels = cg_labels(0, 4, 2);
        assert_eq!(labels, vec![CgLabel { alpha1: 1, l1: 0, alpha3: 1, l3: 4 }]);
    }

    #[test]
    fn test_load_table() {
        let dir = scratch("load");
        let key = CgKey { v1: 2, v2: 3, alpha2: 1, l2: 0, v3: 5 };
        let path = dir.join(key.rel_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "0.5219012860502955 2 1 2 3 1 0 5 1 2").unwrap();
        writeln!(f, "0.4309458036856673 2 1 4 3 1 0 5 1 4").unwrap();
        drop(f);

        let store = CgStore::new(&dir);
        let table = store.table(key).unwrap();
        assert_eq!(table.values(key), vec![0.5219012860502955, 0.4309458036856673]);
        assert_eq!(store.cg_so5r3(2, 1, 4, 3, 1, 0, 5, 1, 4).unwrap(),
                   0.4309458036856673);
        assert_eq!(store.num_tables(), 1);

        // v1 > v3 goes through the swapped table
        let x = store.cg_so5r3(5, 1, 2, 3, 1, 0, 2, 1, 2).unwrap();
        let ratio = (dim_so5(2) * 5) as f64 / (dim_so5(5) * 5) as f64;
        toler_assert_eq!(TOLER, x, ratio.sqrt() * 0.5219012860502955);
        assert_eq!(store.num_tables(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_selection_rules() {
        let store = CgStore::new("/nonexistent");
        // parity
        assert_eq!(store.cg_so5r3(1, 1, 2, 1, 1, 2, 1, 1, 2).unwrap(), 0.0);
        // v triangle
        assert_eq!(store.cg_so5r3(0, 1, 0, 1, 1, 2, 3, 1, 3).unwrap(), 0.0);
        // α beyond the multiplicity
        assert_eq!(store.cg_so5r3(0, 1, 0, 1, 2, 2, 1, 1, 2).unwrap(), 0.0);
        // v2 = 0 needs no file
        assert_eq!(store.cg_so5r3(3, 1, 3, 0, 1, 0, 3, 1, 3).unwrap(), 1.0);
        assert_eq!(store.cg_so5r3(3, 1, 3, 0, 1, 0, 3, 1, 4).unwrap(), 0.0);
        match store.cg_so5r3(0, 1, 0, 1, 1, 2, 1, 1, 2) {
            Err(Error::CgFile(..)) => {}
            r => panic!("unexpected: {:?}", r),
        }
    }

    #[test]
    fn test_scalar_tables() {
        let dir = scratch("scalar");
        write_scalar_tables(&dir, 3).unwrap();
        let store = CgStore::new(&dir);
        assert_eq!(store.cg_so5r3(0, 1, 0, 3, 1, 6, 3, 1, 6).unwrap(), 1.0);
        assert_eq!(store.cg_so5r3(0, 1, 0, 2, 1, 4, 2, 1, 4).unwrap(), 1.0);
        // swapped: (1 1 2; 1 1 2 ‖ 0 1 0)
        toler_assert_eq!(TOLER, store.cg_so5r3(1, 1, 2, 1, 1, 2, 0, 1, 0).unwrap(),
                         1.0);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_quadrupole_tables() {
        let dir = scratch("quadrupole");
        write_quadrupole_tables(&dir).unwrap();
        let store = CgStore::new(&dir);
        let cg = |v1, l1, v3, l3| store.cg_so5r3(v1, 1, l1, 1, 1, 2, v3, 1, l3).unwrap();

        // each (v3, L3) state is reached with unit weight from v1
        for &(v1, v3, l3s) in &[(1, 2, &[2, 4][..]), (2, 3, &[0, 3, 4, 6][..])] {
            for &l3 in l3s {
                let norm: f64 = (0 ..= 2 * v1).map(|l1| cg(v1, l1, v3, l3).powi(2)).sum();
                toler_assert_eq!(TOLER, norm, 1.0);
            }
        }
        toler_assert_eq!(TOLER, cg(2, 2, 1, 2), (5.0f64 / 14.0).sqrt());
        toler_assert_eq!(TOLER, cg(2, 4, 1, 2), (9.0f64 / 14.0).sqrt());
        toler_assert_eq!(TOLER, cg(3, 0, 2, 2), (7.0f64 / 75.0).sqrt());
        assert_eq!(cg(2, 2, 3, 6), 0.0);

        let key = CgKey { v1: 1, v2: 1, alpha2: 1, l2: 2, v3: 2 };
        assert!(write_table(&dir, key, &[1.0]).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
