//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod check;
pub mod curve;
pub mod distribute;
pub mod expected;
pub mod month;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::Result;

/// Open `path` for writing, creating parent directories; stdout when `None`.
pub(crate) fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            info!(path = %path.display(), "writing output");
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
