//! Command implementations.

pub mod describe;
pub mod profile;
pub mod providers;
pub mod run;
pub mod split;

pub use self::describe::{describe_segments, execute_describe};
pub use self::profile::execute_profile;
pub use self::providers::execute_providers;
pub use self::run::execute_run;
pub use self::split::{execute_split, split_source};

use crate::error::{CliError, Result};
use std::fs;
use std::path::Path;

/// Read a UTF-8 text file, dropping a leading byte-order mark
pub fn read_text(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::InvalidInput(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

/// Write text to a file, ending it with a newline
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut contents = text.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_text_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.txt");
        fs::write(&path, "\u{feff}他坐下。").unwrap();
        assert_eq!(read_text(&path).unwrap(), "他坐下。");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_text(&dir.path().join("missing.txt")),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_write_text_adds_newline_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("segments.txt");
        write_text(&path, "1. 甲").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1. 甲\n");
    }
}
