//! Writing definition files to disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Reject paths that cannot be written before anything is fetched.
pub fn validate_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::Validation("export path must not be empty".into()));
    }
    if path.is_dir() {
        return Err(Error::Validation(format!(
            "export path {} is a directory",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(Error::Validation(format!(
                "parent directory {} does not exist",
                parent.display()
            )));
        }
    }
    Ok(())
}

/// Replace `path` with `text`.
pub fn write_definition(path: &Path, text: &str) -> Result<()> {
    let wrap = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(wrap)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes()).map_err(wrap)?;
    writer.flush().map_err(wrap)?;
    Ok(())
}
