use std::path::PathBuf;

pub const BUILD_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

/// Returns the build directory of a test, emptied.
pub fn clean_dir(test_name: &str) -> PathBuf {
    let dir = PathBuf::from(BUILD_DIR).join(test_name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("failed to create test build directory");
    dir
}
