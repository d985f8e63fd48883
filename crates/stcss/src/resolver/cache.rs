//! Memoized stylesheet analysis.
//!
//! Each path owns a slot holding the content hash it was computed from and a
//! `OnceCell` with the analysis result. Concurrent requests for the same
//! content compute once; a changed hash replaces the slot.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::meta::Meta;

/// An analyzed stylesheet with its resolved direct dependencies.
#[derive(Debug)]
pub struct CachedMeta {
    pub meta: Arc<Meta>,
    pub dependencies: Vec<PathBuf>,
}

#[derive(Debug)]
struct Slot {
    content_hash: String,
    value: OnceCell<CachedMeta>,
}

#[derive(Debug, Default)]
pub struct MetaCache {
    slots: Mutex<HashMap<PathBuf, Arc<Slot>>>,
}

impl MetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_hash(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Returns the cached meta for `path` if it was computed from `text`,
    /// otherwise runs `compute` and caches its result. Errors are not cached.
    pub fn get_or_process<F>(&self, path: &Path, text: &str, compute: F) -> Result<Arc<Meta>>
    where
        F: FnOnce() -> Result<CachedMeta>,
    {
        let content_hash = Self::content_hash(text);
        let slot = {
            let mut slots = self.slots.lock();
            match slots.get(path) {
                Some(slot) if slot.content_hash == content_hash => slot.clone(),
                _ => {
                    let slot = Arc::new(Slot {
                        content_hash,
                        value: OnceCell::new(),
                    });
                    slots.insert(path.to_path_buf(), slot.clone());
                    slot
                }
            }
        };
        if let Some(cached) = slot.value.get() {
            log::debug!("meta cache hit: {}", path.display());
            return Ok(cached.meta.clone());
        }
        let cached = slot.value.get_or_try_init(|| {
            log::debug!("meta cache miss: {}", path.display());
            compute()
        })?;
        Ok(cached.meta.clone())
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Meta>> {
        let slot = self.slots.lock().get(path).cloned()?;
        slot.value.get().map(|cached| cached.meta.clone())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    /// Paths that import `path` directly or transitively.
    pub fn dependents(&self, path: &Path) -> Vec<PathBuf> {
        let graph: Vec<(PathBuf, Vec<PathBuf>)> = self
            .slots
            .lock()
            .iter()
            .filter_map(|(key, slot)| {
                slot.value
                    .get()
                    .map(|cached| (key.clone(), cached.dependencies.clone()))
            })
            .collect();

        let mut found = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::from([path.to_path_buf()]);
        let mut queue = VecDeque::from([path.to_path_buf()]);
        while let Some(current) = queue.pop_front() {
            for (importer, dependencies) in &graph {
                if dependencies.contains(&current) && seen.insert(importer.clone()) {
                    found.push(importer.clone());
                    queue.push_back(importer.clone());
                }
            }
        }
        found
    }

    /// Evicts `path` and every cached file that transitively imports it.
    /// Returns the evicted paths, `path` first when it was cached.
    pub fn invalidate(&self, path: &Path) -> Vec<PathBuf> {
        let dependents = self.dependents(path);
        let mut slots = self.slots.lock();
        let mut evicted = Vec::new();
        if slots.remove(path).is_some() {
            evicted.push(path.to_path_buf());
        }
        for dependent in dependents {
            if slots.remove(&dependent).is_some() {
                evicted.push(dependent);
            }
        }
        log::debug!("invalidated {} cached stylesheet(s) for {}", evicted.len(), path.display());
        evicted
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(path: &str, dependencies: &[&str]) -> CachedMeta {
        CachedMeta {
            meta: Arc::new(Meta::new(path)),
            dependencies: dependencies.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn test_same_content_computes_once() {
        let cache = MetaCache::new();
        let path = Path::new("/a.css");
        let mut calls = 0;
        cache
            .get_or_process(path, "x", || {
                calls += 1;
                Ok(cached("/a.css", &[]))
            })
            .unwrap();
        cache
            .get_or_process(path, "x", || {
                calls += 1;
                Ok(cached("/a.css", &[]))
            })
            .unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_changed_content_recomputes() {
        let cache = MetaCache::new();
        let path = Path::new("/a.css");
        let first = cache.get_or_process(path, "x", || Ok(cached("/a.css", &[]))).unwrap();
        let second = cache.get_or_process(path, "y", || Ok(cached("/a.css", &[]))).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_invalidate_cycle_terminates() {
        let cache = MetaCache::new();
        cache.get_or_process(Path::new("/a.css"), "a", || Ok(cached("/a.css", &["/b.css"]))).unwrap();
        cache.get_or_process(Path::new("/b.css"), "b", || Ok(cached("/b.css", &["/a.css"]))).unwrap();
        cache.get_or_process(Path::new("/c.css"), "c", || Ok(cached("/c.css", &[]))).unwrap();

        let evicted = cache.invalidate(Path::new("/a.css"));
        assert_eq!(evicted, vec![PathBuf::from("/a.css"), PathBuf::from("/b.css")]);
        assert_eq!(cache.len(), 1);
    }
}
