use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::batch::run_batch_with;
use crate::data::loader::FileGridLoader;
use crate::report::{self, Labels};

#[derive(Debug, Parser)]
#[command(name = "isodiff", version)]
#[command(
    about = "Report the maximum per-cell difference between matching grid files",
    long_about = "Every file in HYDROGEN_DIR is paired with the file of the same name in \
                  DEUTERIUM_DIR. Both are loaded as grids (.csv, .dat/.txt, .json, .parquet) \
                  and the largest absolute cell difference is reported. Files without a \
                  partner, unreadable files and shape mismatches are skipped with a notice.\n\n\
                  Set RUST_LOG=debug for per-file diagnostics."
)]
pub struct CliArgs {
    /// Directory whose listing drives the comparison
    pub hydrogen_dir: PathBuf,

    /// Directory searched for same-named partner files
    pub deuterium_dir: PathBuf,
}

/// Run the comparison, printing skip notices as they happen and the summary
/// at the end.
pub fn run(args: CliArgs) -> Result<()> {
    let labels = Labels::default();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut write_err = None;
    let report = run_batch_with(
        &args.hydrogen_dir,
        &args.deuterium_dir,
        &FileGridLoader,
        |outcome| {
            if write_err.is_none() {
                write_err = report::write_skip_notice(&mut out, outcome, &labels).err();
            }
        },
    )?;
    if let Some(e) = write_err {
        return Err(e).context("writing skip notice");
    }

    report::write_summary(&mut out, &report).context("writing summary")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn both_directories_are_required() {
        assert!(CliArgs::try_parse_from(["isodiff", "h"]).is_err());
        let args = CliArgs::try_parse_from(["isodiff", "h", "d"]).unwrap();
        assert_eq!(args.hydrogen_dir, PathBuf::from("h"));
        assert_eq!(args.deuterium_dir, PathBuf::from("d"));
    }
}
