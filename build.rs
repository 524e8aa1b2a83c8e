use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::Path;

const STATIC_DIR: &str = "static";

/// Hash every file under `dir` in name order, descending into subdirectories.
fn hash_dir(dir: &Path, hasher: &mut DefaultHasher) -> io::Result<()> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            hash_dir(&path, hasher)?;
        } else {
            path.strip_prefix(STATIC_DIR).unwrap_or(&path).hash(hasher);
            fs::read(&path)?.hash(hasher);
        }
    }
    Ok(())
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed={STATIC_DIR}/");

    let mut hasher = DefaultHasher::new();
    hash_dir(Path::new(STATIC_DIR), &mut hasher)?;

    let hash = format!("{:016x}", hasher.finish());
    println!("cargo:rustc-env=STATIC_HASH={}", &hash[..8]);
    Ok(())
}
