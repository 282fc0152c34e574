//! Dotted stage lines on the terminal: `Checking device ...... DONE`.

use crate::error::StressResult;
use owo_colors::OwoColorize;
use std::io::Write;

/// Column at which the stage marker starts, less the separating space.
const MARKER_COLUMN: usize = 75;

/// Writes one progress line per stage.
pub struct Progress<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> Progress<W> {
    pub fn new(out: W, color: bool) -> Self {
        Progress { out, color }
    }

    /// Print the label and its dot leader, leaving the line open.
    pub fn begin(&mut self, label: &str) -> StressResult<()> {
        write!(self.out, "{:.<width$} ", format!("{} ", label), width = MARKER_COLUMN)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn done(&mut self) -> StressResult<()> {
        if self.color {
            writeln!(self.out, "{}", "DONE".green().bold())?;
        } else {
            writeln!(self.out, "DONE")?;
        }
        Ok(())
    }

    pub fn failed(&mut self) -> StressResult<()> {
        if self.color {
            writeln!(self.out, "{}", "FAILED".red().bold())?;
        } else {
            writeln!(self.out, "FAILED")?;
        }
        Ok(())
    }

    /// Print an indented detail line below a stage.
    pub fn detail(&mut self, line: &str) -> StressResult<()> {
        writeln!(self.out, "    {}", line)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
