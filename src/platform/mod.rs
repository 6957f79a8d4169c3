use std::path::{Path, PathBuf};

/// Platform-specific operations abstracted behind a common interface.
/// Each OS provides its own `NativePlatform` implementation so call sites
/// remain free of `#[cfg]` blocks.
pub trait Platform {
    /// File extension for synthesized scripts (`"sh"` / `"bat"`).
    fn script_extension() -> &'static str;

    /// Mark a file as executable (0o755 on Unix, no-op on Windows).
    fn set_executable(path: &Path);

    /// Root data directory for the agent.
    /// Unix: `~/.lca`, Windows: `%APPDATA%\lca`.
    fn data_dir() -> PathBuf;
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::NativePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativePlatform;
