use std::{fs, path::Path};

use log::debug;

use crate::error::ResourceError;

/// Read a source file to a string.
pub fn read(path: impl AsRef<Path>) -> Result<String, ResourceError> {
    let path = path.as_ref();
    debug!("reading {}", path.display());
    fs::read_to_string(path).map_err(|source| ResourceError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file() {
        let err = read("tests/files/does_not_exist.sml").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn existing_file() {
        let src = read("tests/files/countdown.sml").unwrap();
        assert!(src.contains("jnz"));
    }
}
