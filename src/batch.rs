use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::data::diff::{ShapeMismatch, max_abs_difference};
use crate::data::loader::GridLoader;
use crate::data::model::Shape;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Which of the two directories a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Why a file was left out of the comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No entry with the same name in the right-hand directory.
    MissingPair,
    /// The loader rejected one of the two files.
    LoadFailure { side: Side, message: String },
    ShapeMismatch { left: Shape, right: Shape },
    /// Both grids have zero cells, so there is no maximum to report.
    EmptyGrid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Compared { file: String, max_difference: f64 },
    Skipped { file: String, reason: SkipReason },
}

impl Outcome {
    pub fn file(&self) -> &str {
        match self {
            Outcome::Compared { file, .. } | Outcome::Skipped { file, .. } => file,
        }
    }
}

/// Everything a run decided, in the sorted order of the left directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    /// `(file, max_difference)` for every pair that was compared.
    pub fn compared(&self) -> impl Iterator<Item = (&str, f64)> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Compared {
                file,
                max_difference,
            } => Some((file.as_str(), *max_difference)),
            Outcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Skipped { file, reason } => Some((file.as_str(), reason)),
            Outcome::Compared { .. } => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Fatal errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("reading directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Compare every file in `left_dir` against its namesake in `right_dir`.
pub fn run_batch(
    left_dir: &Path,
    right_dir: &Path,
    loader: &dyn GridLoader,
) -> Result<BatchReport, BatchError> {
    run_batch_with(left_dir, right_dir, loader, |_| {})
}

/// Like [`run_batch`], calling `on_outcome` as soon as each file is decided.
///
/// Only listing `left_dir` can fail; every per-file problem becomes an
/// [`Outcome::Skipped`] and the loop moves on.
pub fn run_batch_with(
    left_dir: &Path,
    right_dir: &Path,
    loader: &dyn GridLoader,
    mut on_outcome: impl FnMut(&Outcome),
) -> Result<BatchReport, BatchError> {
    let names = sorted_entries(left_dir)?;
    log::info!(
        "Comparing {} entries of {} against {}",
        names.len(),
        left_dir.display(),
        right_dir.display()
    );

    let mut report = BatchReport::default();
    for name in names {
        let outcome = compare_pair(left_dir, right_dir, &name, loader);
        if let Outcome::Skipped { file, reason } = &outcome {
            log::warn!("Skipping {file}: {reason:?}");
        }
        on_outcome(&outcome);
        report.outcomes.push(outcome);
    }

    log::info!(
        "Compared {} files, skipped {}",
        report.compared().count(),
        report.skipped().count()
    );
    Ok(report)
}

fn sorted_entries(dir: &Path) -> Result<Vec<OsString>, BatchError> {
    let read_err = |source: std::io::Error| BatchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = std::fs::read_dir(dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;
    names.sort();
    Ok(names)
}

fn compare_pair(
    left_dir: &Path,
    right_dir: &Path,
    name: &OsString,
    loader: &dyn GridLoader,
) -> Outcome {
    let file = name.to_string_lossy().into_owned();
    let skip = |reason: SkipReason| Outcome::Skipped {
        file: file.clone(),
        reason,
    };

    let right_path = right_dir.join(name);
    if !right_path.exists() {
        return skip(SkipReason::MissingPair);
    }

    let left = match loader.load(&left_dir.join(name)) {
        Ok(loaded) => loaded.grid,
        Err(e) => {
            return skip(SkipReason::LoadFailure {
                side: Side::Left,
                message: format!("{e:#}"),
            });
        }
    };
    let right = match loader.load(&right_path) {
        Ok(loaded) => loaded.grid,
        Err(e) => {
            return skip(SkipReason::LoadFailure {
                side: Side::Right,
                message: format!("{e:#}"),
            });
        }
    };

    match max_abs_difference(&left, &right) {
        Ok(Some(max_difference)) => Outcome::Compared {
            file,
            max_difference,
        },
        Ok(None) => skip(SkipReason::EmptyGrid),
        Err(ShapeMismatch { left, right }) => skip(SkipReason::ShapeMismatch { left, right }),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;

    use anyhow::{Result, anyhow};
    use tempfile::TempDir;

    use super::*;
    use crate::data::model::{Grid, LoadedGrid};

    /// Serves grids from memory keyed by path; unknown paths fail to load.
    /// Records every path it was asked for.
    #[derive(Default)]
    struct FakeLoader {
        grids: HashMap<PathBuf, Grid>,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl FakeLoader {
        fn with(mut self, path: PathBuf, rows: Vec<Vec<f64>>) -> Self {
            self.grids.insert(path, Grid::from_rows(rows).unwrap());
            self
        }
    }

    impl GridLoader for FakeLoader {
        fn load(&self, path: &Path) -> Result<LoadedGrid> {
            self.calls.borrow_mut().push(path.to_path_buf());
            self.grids
                .get(path)
                .cloned()
                .map(LoadedGrid::from)
                .ok_or_else(|| anyhow!("no grid for {}", path.display()))
        }
    }

    /// Left and right directories with empty placeholder files; the fake
    /// loader decides what they contain.
    fn dirs(left: &[&str], right: &[&str]) -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let l = tmp.path().join("hydrogen");
        let r = tmp.path().join("deuterium");
        fs::create_dir(&l).unwrap();
        fs::create_dir(&r).unwrap();
        for name in left {
            fs::write(l.join(name), b"").unwrap();
        }
        for name in right {
            fs::write(r.join(name), b"").unwrap();
        }
        (tmp, l, r)
    }

    #[test]
    fn results_follow_sorted_left_listing() {
        let (_tmp, l, r) = dirs(&["c", "a", "b"], &["b", "c", "a"]);
        let mut loader = FakeLoader::default();
        for (name, v) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            loader = loader
                .with(l.join(name), vec![vec![0.0]])
                .with(r.join(name), vec![vec![v]]);
        }

        let report = run_batch(&l, &r, &loader).unwrap();
        let compared: Vec<_> = report.compared().collect();
        assert_eq!(compared, vec![("a", 1.0), ("b", 2.0), ("c", 3.0)]);
    }

    #[test]
    fn left_only_files_are_skipped_without_loading() {
        let (_tmp, l, r) = dirs(&["only_left", "shared"], &["shared", "only_right"]);
        let loader = FakeLoader::default()
            .with(l.join("shared"), vec![vec![1.0, 2.0]])
            .with(r.join("shared"), vec![vec![1.0, 2.0]]);

        let report = run_batch(&l, &r, &loader).unwrap();

        assert_eq!(
            report.outcomes[0],
            Outcome::Skipped {
                file: "only_left".into(),
                reason: SkipReason::MissingPair
            }
        );
        assert_eq!(report.compared().collect::<Vec<_>>(), vec![("shared", 0.0)]);
        assert!(report.outcomes.iter().all(|o| o.file() != "only_right"));
        assert!(!loader.calls.borrow().contains(&l.join("only_left")));
    }

    #[test]
    fn shape_mismatch_is_skipped() {
        let (_tmp, l, r) = dirs(&["g"], &["g"]);
        let loader = FakeLoader::default()
            .with(l.join("g"), vec![vec![1.0, 2.0]])
            .with(r.join("g"), vec![vec![1.0], vec![2.0]]);

        let report = run_batch(&l, &r, &loader).unwrap();
        assert_eq!(
            report.outcomes,
            vec![Outcome::Skipped {
                file: "g".into(),
                reason: SkipReason::ShapeMismatch {
                    left: Shape::new(1, 2),
                    right: Shape::new(2, 1),
                },
            }]
        );
    }

    #[test]
    fn load_failure_does_not_stop_later_files() {
        let (_tmp, l, r) = dirs(&["a", "b", "c"], &["a", "b", "c"]);
        let loader = FakeLoader::default()
            .with(l.join("a"), vec![vec![1.0]])
            .with(r.join("a"), vec![vec![1.5]])
            // b only loads on the left
            .with(l.join("b"), vec![vec![1.0]])
            .with(l.join("c"), vec![vec![1.0, 2.0], vec![3.0, 4.0]])
            .with(r.join("c"), vec![vec![1.0, 2.0], vec![3.0, 5.0]]);

        let report = run_batch(&l, &r, &loader).unwrap();

        assert_eq!(report.compared().collect::<Vec<_>>(), vec![("a", 0.5), ("c", 1.0)]);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, "b");
        assert!(matches!(
            skipped[0].1,
            SkipReason::LoadFailure { side: Side::Right, message } if message.contains("no grid")
        ));
    }

    #[test]
    fn left_load_failure_skips_without_loading_right() {
        let (_tmp, l, r) = dirs(&["g"], &["g"]);
        let loader = FakeLoader::default().with(r.join("g"), vec![vec![1.0]]);

        let report = run_batch(&l, &r, &loader).unwrap();

        assert!(matches!(
            report.skipped().next(),
            Some(("g", SkipReason::LoadFailure { side: Side::Left, .. }))
        ));
        assert_eq!(*loader.calls.borrow(), vec![l.join("g")]);
    }

    #[test]
    fn empty_grids_are_skipped() {
        let (_tmp, l, r) = dirs(&["e"], &["e"]);
        let loader = FakeLoader::default()
            .with(l.join("e"), Vec::new())
            .with(r.join("e"), Vec::new());

        let report = run_batch(&l, &r, &loader).unwrap();
        assert_eq!(report.skipped().next(), Some(("e", &SkipReason::EmptyGrid)));
    }

    #[test]
    fn callback_sees_outcomes_in_order() {
        let (_tmp, l, r) = dirs(&["b", "a"], &["a"]);
        let loader = FakeLoader::default()
            .with(l.join("a"), vec![vec![2.0]])
            .with(r.join("a"), vec![vec![2.0]]);

        let mut seen = Vec::new();
        let report = run_batch_with(&l, &r, &loader, |o| seen.push(o.clone())).unwrap();
        assert_eq!(seen, report.outcomes);
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn missing_left_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = run_batch(
            &tmp.path().join("nope"),
            tmp.path(),
            &FakeLoader::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::ReadDir { .. }));
    }

    #[test]
    fn empty_left_directory_gives_empty_report() {
        let (_tmp, l, r) = dirs(&[], &["x"]);
        let report = run_batch(&l, &r, &FakeLoader::default()).unwrap();
        assert!(report.outcomes.is_empty());
    }
}
