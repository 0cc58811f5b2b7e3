//! Credential presence check. The file's content is never read.

use crate::error::ToolError;
use crate::paths::ToolPaths;

pub fn has_credentials(paths: &ToolPaths) -> bool {
    paths.config_file().exists()
}

pub fn require_credentials(paths: &ToolPaths) -> Result<(), ToolError> {
    if has_credentials(paths) {
        Ok(())
    } else {
        Err(ToolError::MissingCredentials(paths.config_file()))
    }
}
