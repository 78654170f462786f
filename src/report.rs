//! Per-file reports printed by the CLI.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::validate::Verdict;

/// A path paired with its verdict.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>, verdict: Verdict) -> Self {
        Self {
            path: path.into(),
            verdict,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }

    /// Render as `OK   <path>` or `FAIL <path>: <message>`.
    ///
    /// `with_location` appends the directory and tile of the fault.
    pub fn text(&self, with_location: bool) -> String {
        if self.verdict.is_valid() {
            return format!("OK   {}", self.path.display());
        }

        let mut line = format!("FAIL {}: {}", self.path.display(), self.verdict.message());
        if with_location {
            if let Some(location) = self.verdict.location() {
                line.push_str(&format!(
                    " [directory {}, tile {}]",
                    location.directory, location.tile
                ));
            }
        }
        line
    }

    /// Render as a single-line JSON object.
    pub fn json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text(false))
    }
}
