use std::path::PathBuf;
use std::sync::OnceLock;

/// Returns the workspace root directory (the parent of this crate's manifest dir).
fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Ensures the test output directory exists. Safe to call multiple times.
pub fn ensure_test_output_dir() -> PathBuf {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = workspace_root().join("test_output");
        std::fs::create_dir_all(&dir).expect("Failed to create test_output directory");
        dir
    })
    .clone()
}

/// Returns the path to a file inside the shared test output directory.
pub fn test_output_path(name: &str) -> PathBuf {
    ensure_test_output_dir().join(name)
}

/// Returns a fresh, empty directory inside the test output directory.
///
/// Tests that write several files use one of these each so parallel tests
/// never share output paths.
pub fn test_output_dir(name: &str) -> PathBuf {
    let dir = ensure_test_output_dir().join(name);
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("Failed to clear test output directory");
    }
    std::fs::create_dir_all(&dir).expect("Failed to create test output directory");
    dir
}
