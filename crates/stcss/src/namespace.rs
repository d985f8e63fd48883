//! Namespace strategies.
//!
//! A namespace is a pure function of the declared namespace and the file
//! identity. Strategies are injected into the resolver; the collision
//! registry is an explicit object shared by whoever needs the guarantee.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::{Result, StcssError};

pub trait NamespaceStrategy: Send + Sync {
    /// Computes the namespace for `path`.
    ///
    /// `declared` is already sanitized. `origin` is the file that requested
    /// processing, when there is one.
    fn namespace(&self, declared: &str, path: &Path, origin: Option<&Path>) -> Result<String>;
}

impl<T: NamespaceStrategy + ?Sized> NamespaceStrategy for Arc<T> {
    fn namespace(&self, declared: &str, path: &Path, origin: Option<&Path>) -> Result<String> {
        (**self).namespace(declared, path, origin)
    }
}

/// Uses the declared namespace unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainStrategy;

impl NamespaceStrategy for PlainStrategy {
    fn namespace(&self, declared: &str, _path: &Path, _origin: Option<&Path>) -> Result<String> {
        Ok(declared.to_string())
    }
}

/// Appends a short digest of the package identity and the path relative to
/// the package root, so output is stable across machines.
#[derive(Clone, Debug)]
pub struct PackageHashStrategy {
    package_root: PathBuf,
    package_id: String,
    hash_length: usize,
}

impl PackageHashStrategy {
    pub const DEFAULT_HASH_LENGTH: usize = 6;

    pub fn new(package_root: impl Into<PathBuf>, package_id: impl Into<String>) -> Self {
        Self {
            package_root: package_root.into(),
            package_id: package_id.into(),
            hash_length: Self::DEFAULT_HASH_LENGTH,
        }
    }

    pub fn with_hash_length(mut self, hash_length: usize) -> Self {
        self.hash_length = hash_length.clamp(1, 64);
        self
    }

    fn digest(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.package_root).unwrap_or(path);
        let relative = relative.to_string_lossy().replace('\\', "/");
        let mut hasher = Sha256::new();
        hasher.update(self.package_id.as_bytes());
        hasher.update(b"/");
        hasher.update(relative.as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        hex[..self.hash_length].to_string()
    }
}

impl NamespaceStrategy for PackageHashStrategy {
    fn namespace(&self, declared: &str, path: &Path, _origin: Option<&Path>) -> Result<String> {
        Ok(format!("{declared}{}", self.digest(path)))
    }
}

/// Records which file owns each namespace.
#[derive(Debug, Default)]
pub struct CollisionRegistry {
    owners: Mutex<HashMap<String, PathBuf>>,
}

impl CollisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `namespace` for `path`. Claiming again for the same path is a
    /// no-op.
    pub fn claim(&self, namespace: &str, path: &Path) -> Result<()> {
        let mut owners = self.owners.lock();
        match owners.get(namespace) {
            Some(existing) if existing != path => Err(StcssError::NamespaceCollision {
                namespace: namespace.to_string(),
                path: path.to_path_buf(),
                existing: existing.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                owners.insert(namespace.to_string(), path.to_path_buf());
                Ok(())
            }
        }
    }

    pub fn owner(&self, namespace: &str) -> Option<PathBuf> {
        self.owners.lock().get(namespace).cloned()
    }

    pub fn len(&self) -> usize {
        self.owners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wraps a strategy and rejects namespaces already owned by another file.
pub struct NoCollisionStrategy<S> {
    inner: S,
    registry: Arc<CollisionRegistry>,
}

impl<S: NamespaceStrategy> NoCollisionStrategy<S> {
    pub fn new(inner: S, registry: Arc<CollisionRegistry>) -> Self {
        Self { inner, registry }
    }

    pub fn registry(&self) -> &Arc<CollisionRegistry> {
        &self.registry
    }
}

impl<S: NamespaceStrategy> NamespaceStrategy for NoCollisionStrategy<S> {
    fn namespace(&self, declared: &str, path: &Path, origin: Option<&Path>) -> Result<String> {
        let namespace = self.inner.namespace(declared, path, origin)?;
        self.registry.claim(&namespace, path)?;
        Ok(namespace)
    }
}

/// Turns arbitrary text into an identifier usable as a namespace.
pub fn sanitize_namespace(raw: &str) -> String {
    let mut out: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                c
            } else {
                '-'
            }
        })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) || out.starts_with("--") {
        out.insert(0, '_');
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Default declared namespace: the file stem without `.st`.
pub fn namespace_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(".st.css")
        .or_else(|| name.strip_suffix(".css"))
        .unwrap_or(&name);
    sanitize_namespace(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_from_path() {
        assert_eq!(namespace_from_path(Path::new("/a/button.st.css")), "button");
        assert_eq!(namespace_from_path(Path::new("/a/my view.css")), "my-view");
        assert_eq!(namespace_from_path(Path::new("/a/1col.st.css")), "_1col");
    }

    #[test]
    fn test_package_hash_is_relative_to_root() {
        let a = PackageHashStrategy::new("/pkg-a", "lib@1");
        let b = PackageHashStrategy::new("/elsewhere/pkg-a", "lib@1");
        let ns_a = a.namespace("btn", Path::new("/pkg-a/src/btn.st.css"), None).unwrap();
        let ns_b = b
            .namespace("btn", Path::new("/elsewhere/pkg-a/src/btn.st.css"), None)
            .unwrap();
        assert_eq!(ns_a, ns_b);
        assert!(ns_a.starts_with("btn"));
        assert_eq!(ns_a.len(), "btn".len() + PackageHashStrategy::DEFAULT_HASH_LENGTH);
    }

    #[test]
    fn test_package_hash_differs_by_path() {
        let strategy = PackageHashStrategy::new("/pkg", "lib");
        let one = strategy.namespace("x", Path::new("/pkg/a.st.css"), None).unwrap();
        let two = strategy.namespace("x", Path::new("/pkg/b.st.css"), None).unwrap();
        assert_ne!(one, two);
    }

    #[test]
    fn test_collision_registry() {
        let registry = Arc::new(CollisionRegistry::new());
        let strategy = NoCollisionStrategy::new(PlainStrategy, registry.clone());
        assert!(strategy.namespace("x", Path::new("/a.css"), None).is_ok());
        assert!(strategy.namespace("x", Path::new("/a.css"), None).is_ok());
        let err = strategy.namespace("x", Path::new("/b.css"), None).unwrap_err();
        assert!(matches!(err, StcssError::NamespaceCollision { .. }));
        assert_eq!(registry.len(), 1);
    }
}
