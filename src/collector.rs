use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recursively list all `.json` files under a root directory.
/// Extension match is case-insensitive; results are sorted so a run
/// processes files in a deterministic order.
pub fn collect_json_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("data directory not found: {}", root.display()),
        ));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext == "json" {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
