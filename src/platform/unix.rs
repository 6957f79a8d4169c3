use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::Platform;

pub struct NativePlatform;

impl Platform for NativePlatform {
    fn script_extension() -> &'static str {
        "sh"
    }

    fn set_executable(path: &Path) {
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755));
    }

    fn data_dir() -> PathBuf {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".lca")
    }
}
