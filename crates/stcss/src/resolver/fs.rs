//! File and module resolution capabilities injected into the resolver.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{Result, StcssError};

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the real file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory file system. Files can be replaced at any time, which makes
/// it suitable for watch-mode style tests.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a file system from `(path, contents)` pairs.
    pub fn with_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<PathBuf>,
        C: Into<String>,
    {
        let fs = Self::new();
        for (path, contents) in files {
            fs.write(path, contents);
        }
        fs
    }

    pub fn write(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.write().insert(path.into(), contents.into());
    }

    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.write().remove(path)
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.read().get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }
}

/// Maps `(context directory, request)` to an absolute path.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, context: &Path, request: &str) -> Result<PathBuf>;
}

impl<F> ModuleResolver for F
where
    F: Fn(&Path, &str) -> Result<PathBuf> + Send + Sync,
{
    fn resolve(&self, context: &Path, request: &str) -> Result<PathBuf> {
        self(context, request)
    }
}

/// Resolves relative requests against the context directory and bare
/// package requests against registered package directories.
#[derive(Clone, Debug, Default)]
pub struct RelativeModuleResolver {
    packages: HashMap<String, PathBuf>,
}

impl RelativeModuleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a package: `request` values starting with `name/` resolve
    /// inside `root`.
    pub fn with_package(mut self, name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.packages.insert(name.into(), root.into());
        self
    }
}

impl ModuleResolver for RelativeModuleResolver {
    fn resolve(&self, context: &Path, request: &str) -> Result<PathBuf> {
        if request.is_empty() {
            return Err(StcssError::module_not_found(request, context));
        }
        if request.starts_with("./") || request.starts_with("../") {
            return Ok(normalize_path(&context.join(request)));
        }
        if Path::new(request).is_absolute() {
            return Ok(normalize_path(Path::new(request)));
        }
        let (package, rest) = split_package_request(request);
        match self.packages.get(package) {
            Some(root) if rest.is_empty() => Ok(normalize_path(root)),
            Some(root) => Ok(normalize_path(&root.join(rest))),
            None => Err(StcssError::module_not_found(request, context)),
        }
    }
}

/// Splits `@scope/pkg/file` or `pkg/file` into package name and the rest.
fn split_package_request(request: &str) -> (&str, &str) {
    let separators: Vec<usize> = request.match_indices('/').map(|(i, _)| i).collect();
    let package_end = if request.starts_with('@') {
        separators.get(1).copied()
    } else {
        separators.first().copied()
    };
    match package_end {
        Some(end) => (&request[..end], &request[end + 1..]),
        None => (request, ""),
    }
}

/// Lexically normalizes `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_resolution() {
        let resolver = RelativeModuleResolver::new();
        let path = resolver.resolve(Path::new("/src/components"), "../theme/colors.st.css").unwrap();
        assert_eq!(path, PathBuf::from("/src/theme/colors.st.css"));
    }

    #[test]
    fn test_package_resolution() {
        let resolver = RelativeModuleResolver::new()
            .with_package("ui-kit", "/node_modules/ui-kit")
            .with_package("@org/theme", "/node_modules/@org/theme");
        assert_eq!(
            resolver.resolve(Path::new("/src"), "ui-kit/button.st.css").unwrap(),
            PathBuf::from("/node_modules/ui-kit/button.st.css")
        );
        assert_eq!(
            resolver.resolve(Path::new("/src"), "@org/theme/dark.st.css").unwrap(),
            PathBuf::from("/node_modules/@org/theme/dark.st.css")
        );
        assert!(resolver.resolve(Path::new("/src"), "unknown/x.css").is_err());
    }

    #[test]
    fn test_memory_file_system() {
        let fs = MemoryFileSystem::with_files([("/a.css", ".a {}")]);
        assert_eq!(fs.read_to_string(Path::new("/a.css")).unwrap(), ".a {}");
        fs.write("/a.css", ".b {}");
        assert_eq!(fs.read_to_string(Path::new("/a.css")).unwrap(), ".b {}");
        assert!(fs.read_to_string(Path::new("/missing.css")).is_err());
    }
}
