//! Versions the files under `static/` so templates can append `?v=` to asset
//! URLs and browsers refetch only after a change.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

fn main() {
    let static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");
    println!("cargo:rerun-if-changed={}", static_dir.display());

    let mut files = Vec::new();
    collect_files(&static_dir, &mut files);
    files.sort();

    let mut hasher = Sha256::new();
    for file in &files {
        println!("cargo:rerun-if-changed={}", file.display());
        match fs::read(file) {
            Ok(bytes) => {
                hasher.update(file.strip_prefix(&static_dir).unwrap_or(file).to_string_lossy().as_bytes());
                hasher.update(&bytes);
            }
            Err(e) => println!("cargo:warning=Skipping {}: {e}", file.display()),
        }
    }

    let version = if files.is_empty() {
        "dev".to_owned()
    } else {
        format!("{:x}", hasher.finalize()).chars().take(10).collect()
    };
    println!("cargo:rustc-env=STATIC_VERSION={version}");
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}
