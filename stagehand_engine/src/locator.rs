use std::fs;
use std::path::{Path, PathBuf};

/// Name of the import descriptor inside a mod folder.
pub const DESCRIPTOR_NAME: &str = "stage_imports.ini";

/// Filesystem layout of a mod folder.
#[derive(Debug, Clone)]
pub struct ModPaths {
    root: PathBuf,
}

impl ModPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor(&self) -> PathBuf {
        self.root.join(DESCRIPTOR_NAME)
    }

    pub fn geometry_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn texture_dir(&self) -> PathBuf {
        self.root.join("assets").join("textures")
    }

    pub fn path_dir(&self) -> PathBuf {
        self.root.join("assets").join("paths")
    }

    pub fn geometry_file(&self, name: &str) -> PathBuf {
        self.geometry_dir()
            .join(format!("{}.blvl", strip_extension(name)))
    }

    pub fn texture_file(&self, name: &str) -> PathBuf {
        self.texture_dir()
            .join(format!("{}.pak", strip_extension(name)))
    }

    pub fn path_file(&self, name: &str) -> PathBuf {
        self.path_dir()
            .join(format!("{}.path", strip_extension(name)))
    }
}

/// Best-effort pick of the first file in `dir` carrying `extension`.
/// Returns the base name with the extension stripped; `None` when the
/// directory is absent or holds no match. First-match order follows the
/// filesystem and is not guaranteed stable.
pub fn detect_file(dir: &Path, extension: &str) -> Option<String> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            return path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| stem.to_string());
        }
    }
    None
}

/// Drops a trailing extension if one is present, so descriptor entries may
/// name assets either way.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) => &name[..index],
        None => name,
    }
}
