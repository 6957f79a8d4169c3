use std::path::{Path, PathBuf};

use super::Platform;

pub struct NativePlatform;

impl Platform for NativePlatform {
    fn script_extension() -> &'static str {
        "bat"
    }

    fn set_executable(_path: &Path) {
        // Executability is extension-driven on Windows.
    }

    fn data_dir() -> PathBuf {
        dirs::data_dir()
            .expect("Could not find APPDATA directory")
            .join("lca")
    }
}
