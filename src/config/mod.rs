pub mod db;
pub mod default;

use anyhow::Result;
use std::path::PathBuf;

/// Name of the per-user data directory under the home directory
pub const USER_DIR_NAME: &str = ".rtspscan";

/// Get the per-user data directory, creating it if needed.
pub fn get_user_dir_path() -> Result<PathBuf> {
    let home = home::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))?;
    let dir = home.join(USER_DIR_NAME);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Get the path of a file in the per-user data directory.
pub fn get_user_file_path(file_name: &str) -> Result<PathBuf> {
    Ok(get_user_dir_path()?.join(file_name))
}
