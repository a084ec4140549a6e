use std::io::{self, Write};

use crate::batch::{BatchReport, Outcome, Side, SkipReason};

/// Names the two directories in skip notices.
#[derive(Debug, Clone)]
pub struct Labels {
    pub left: String,
    pub right: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            left: "hydrogen".to_string(),
            right: "deuterium".to_string(),
        }
    }
}

impl Labels {
    fn for_side(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Short human phrase for a skip, e.g. `Grid size mismatch`.
pub fn reason_phrase(reason: &SkipReason, labels: &Labels) -> String {
    match reason {
        SkipReason::MissingPair => format!("{} file not found", capitalize(&labels.right)),
        SkipReason::LoadFailure { .. } => "Failed to load data".to_string(),
        SkipReason::ShapeMismatch { .. } => "Grid size mismatch".to_string(),
        SkipReason::EmptyGrid => "Empty grid".to_string(),
    }
}

/// `<reason> for <file>. Skipping.` for skipped outcomes; nothing otherwise.
pub fn write_skip_notice(w: &mut impl Write, outcome: &Outcome, labels: &Labels) -> io::Result<()> {
    let Outcome::Skipped { file, reason } = outcome else {
        return Ok(());
    };
    writeln!(w, "{} for {file}. Skipping.", reason_phrase(reason, labels))?;

    match reason {
        SkipReason::LoadFailure { side, message } => {
            log::debug!("{} copy of {file}: {message}", labels.for_side(*side));
        }
        SkipReason::ShapeMismatch { left, right } => {
            log::debug!(
                "{file}: {} {left} vs {} {right}",
                labels.left,
                labels.right
            );
        }
        SkipReason::MissingPair | SkipReason::EmptyGrid => {}
    }
    Ok(())
}

/// Blank line, header, then `<file>: <value>` per compared file.
pub fn write_summary(w: &mut impl Write, report: &BatchReport) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "Summary of Maximum Differences:")?;
    for (file, max_difference) in report.compared() {
        // Debug formatting keeps the trailing `.0` on whole numbers.
        writeln!(w, "{file}: {max_difference:?}")?;
    }
    Ok(())
}
