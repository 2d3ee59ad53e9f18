use crate::core::io::codec::{self, CodecError};
use crate::core::models::atom::Atom;
use crate::core::models::trajectory::Trajectory;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

const ENTRY_EXTENSION: &str = "traj";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to encode trajectory: {0}")]
    Codec(#[from] CodecError),
    #[error("Cache store I/O error: {0}")]
    Store(#[from] io::Error),
}

/// Content address of a relaxation input.
///
/// A SHA-256 digest over a namespace string and the bit patterns of every atom's element
/// and coordinates, encoded as unpadded base64url (43 characters from `A-Z a-z 0-9 - _`),
/// so it can be used directly as a file or object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(namespace: &str, atoms: &[Atom]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((namespace.len() as u64).to_le_bytes());
        hasher.update(namespace.as_bytes());
        hasher.update((atoms.len() as u64).to_le_bytes());
        for atom in atoms {
            hasher.update([atom.element.atomic_number()]);
            for coord in atom.position.coords.iter() {
                hasher.update(coord.to_bits().to_le_bytes());
            }
        }
        Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key-value store of encoded trajectories.
///
/// No locking is implied: two processes writing the same key may both compute and the
/// last write wins.
pub trait TrajectoryStore {
    fn exists(&self, key: &CacheKey) -> bool;
    fn read(&self, key: &CacheKey) -> io::Result<Vec<u8>>;
    fn write(&self, key: &CacheKey, bytes: &[u8]) -> io::Result<()>;
    fn remove(&self, key: &CacheKey) -> io::Result<()>;
}

impl<S: TrajectoryStore + ?Sized> TrajectoryStore for &S {
    fn exists(&self, key: &CacheKey) -> bool {
        (**self).exists(key)
    }

    fn read(&self, key: &CacheKey) -> io::Result<Vec<u8>> {
        (**self).read(key)
    }

    fn write(&self, key: &CacheKey, bytes: &[u8]) -> io::Result<()> {
        (**self).write(key, bytes)
    }

    fn remove(&self, key: &CacheKey) -> io::Result<()> {
        (**self).remove(key)
    }
}

/// Stores each entry as `<root>/<key>.traj`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(format!("{}.{}", key.as_str(), ENTRY_EXTENSION))
    }

    /// Deletes every entry in the store and returns how many were removed.
    pub fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl TrajectoryStore for DirectoryStore {
    fn exists(&self, key: &CacheKey) -> bool {
        self.entry_path(key).is_file()
    }

    fn read(&self, key: &CacheKey) -> io::Result<Vec<u8>> {
        fs::read(self.entry_path(key))
    }

    fn write(&self, key: &CacheKey, bytes: &[u8]) -> io::Result<()> {
        // Write beside the final path and rename, so readers never see a partial entry.
        let final_path = self.entry_path(key);
        let tmp_path = self
            .root
            .join(format!("{}.{}.tmp", key.as_str(), std::process::id()));
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &final_path)
    }

    fn remove(&self, key: &CacheKey) -> io::Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// An in-process store, mostly for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> io::Error {
        io::Error::other("memory store lock poisoned")
    }
}

impl TrajectoryStore for MemoryStore {
    fn exists(&self, key: &CacheKey) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    fn read(&self, key: &CacheKey) -> io::Result<Vec<u8>> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries
            .get(key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, key.to_string()))
    }

    fn write(&self, key: &CacheKey, bytes: &[u8]) -> io::Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> io::Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

/// Makes an expensive trajectory computation run once per distinct input.
///
/// Every key is derived from the cache's namespace and the atom list, so the namespace
/// must describe everything else the computation depends on (algorithm version, evaluator,
/// masses, constraints, tolerances).
pub struct TrajectoryCache<S> {
    store: S,
    namespace: String,
}

impl<S: TrajectoryStore> TrajectoryCache<S> {
    pub fn new(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key_for(&self, atoms: &[Atom]) -> CacheKey {
        CacheKey::derive(&self.namespace, atoms)
    }

    /// Reads and decodes an entry. Unreadable or undecodable entries count as absent.
    pub fn load(&self, key: &CacheKey) -> Option<Trajectory> {
        if !self.store.exists(key) {
            return None;
        }
        let bytes = match self.store.read(key) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%key, error = %e, "Cache entry unreadable; treating as a miss.");
                return None;
            }
        };
        match codec::decode(&bytes) {
            Ok(trajectory) => Some(trajectory),
            Err(e) => {
                warn!(%key, error = %e, "Cache entry corrupt; treating as a miss.");
                None
            }
        }
    }

    /// Encodes and persists a trajectory under `key`.
    pub fn store_entry(&self, key: &CacheKey, trajectory: &Trajectory) -> Result<(), CacheError> {
        let bytes = codec::encode(trajectory)?;
        self.store.write(key, &bytes)?;
        Ok(())
    }

    /// Returns the cached trajectory for `atoms`, computing and persisting it on a miss.
    ///
    /// A hit and a fresh computation are indistinguishable to the caller because the codec
    /// round-trips exactly. Errors from `compute` propagate and nothing is stored. A failed
    /// write is logged and the computed trajectory is still returned; the next call will
    /// simply compute again.
    pub fn load_or_compute<F, E>(&self, atoms: &[Atom], compute: F) -> Result<Trajectory, E>
    where
        F: FnOnce() -> Result<Trajectory, E>,
    {
        let key = self.key_for(atoms);
        if let Some(trajectory) = self.load(&key) {
            info!(%key, frames = trajectory.len(), "Trajectory cache hit.");
            return Ok(trajectory);
        }

        info!(%key, "Trajectory cache miss; computing.");
        let trajectory = compute()?;
        match self.store_entry(&key, &trajectory) {
            Ok(()) => debug!(%key, "Trajectory persisted."),
            Err(e) => warn!(%key, error = %e, "Failed to persist trajectory."),
        }
        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;
    use crate::core::models::trajectory::Frame;
    use nalgebra::Point3;
    use std::cell::Cell;
    use tempfile::tempdir;

    fn atoms() -> Vec<Atom> {
        vec![
            Atom::new(Element::CARBON, Point3::new(0.0, 0.0, 0.0)),
            Atom::new(Element::HYDROGEN, Point3::new(0.109, 0.0, 0.0)),
        ]
    }

    fn relaxed(atoms: &[Atom]) -> Trajectory {
        let mut moved = atoms.to_vec();
        moved[1].position.x = 0.1;
        Trajectory::new(vec![Frame::new(atoms.to_vec()), Frame::new(moved)]).unwrap()
    }

    #[test]
    fn key_is_url_safe_and_fixed_length() {
        let key = CacheKey::derive("v1", &atoms());
        assert_eq!(key.as_str().len(), 43);
        assert!(
            key.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn key_is_deterministic_and_content_sensitive() {
        let a = atoms();
        assert_eq!(CacheKey::derive("v1", &a), CacheKey::derive("v1", &a));

        let mut nudged = a.clone();
        nudged[1].position.x = f64::from_bits(nudged[1].position.x.to_bits() + 1);
        assert_ne!(CacheKey::derive("v1", &a), CacheKey::derive("v1", &nudged));

        let mut swapped = a.clone();
        swapped[0].element = Element::SILICON;
        assert_ne!(CacheKey::derive("v1", &a), CacheKey::derive("v1", &swapped));

        assert_ne!(CacheKey::derive("v1", &a), CacheKey::derive("v2", &a));
    }

    #[test]
    fn key_distinguishes_signed_zero() {
        let mut a = atoms();
        let mut b = atoms();
        a[0].position.y = 0.0;
        b[0].position.y = -0.0;
        assert_ne!(CacheKey::derive("", &a), CacheKey::derive("", &b));
    }

    #[test]
    fn compute_runs_once_per_key() {
        let cache = TrajectoryCache::new(MemoryStore::new(), "test");
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok::<_, CacheError>(relaxed(&atoms()))
        };

        let first = cache.load_or_compute(&atoms(), compute).unwrap();
        let second = cache.load_or_compute(&atoms(), compute).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(
            codec::encode(&first).unwrap(),
            codec::encode(&second).unwrap()
        );
    }

    #[test]
    fn compute_errors_propagate_and_are_not_cached() {
        let cache = TrajectoryCache::new(MemoryStore::new(), "test");
        let result: Result<Trajectory, &str> = cache.load_or_compute(&atoms(), || Err("boom"));
        assert_eq!(result, Err("boom"));
        assert!(cache.store().is_empty());
    }

    #[test]
    fn corrupt_entry_self_heals() {
        let dir = tempdir().unwrap();
        let cache = TrajectoryCache::new(DirectoryStore::open(dir.path()).unwrap(), "test");
        let key = cache.key_for(&atoms());
        fs::write(cache.store().entry_path(&key), b"garbage").unwrap();

        let calls = Cell::new(0);
        let trajectory = cache
            .load_or_compute(&atoms(), || {
                calls.set(calls.get() + 1);
                Ok::<_, CacheError>(relaxed(&atoms()))
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(cache.load(&key), Some(trajectory));
    }

    #[test]
    fn directory_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let expected = relaxed(&atoms());
        {
            let cache = TrajectoryCache::new(DirectoryStore::open(dir.path()).unwrap(), "ns");
            cache
                .load_or_compute(&atoms(), || Ok::<_, CacheError>(expected.clone()))
                .unwrap();
        }
        let reopened = TrajectoryCache::new(DirectoryStore::open(dir.path()).unwrap(), "ns");
        let loaded = reopened
            .load_or_compute(&atoms(), || -> Result<Trajectory, CacheError> {
                panic!("should have been a cache hit")
            })
            .unwrap();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn directory_store_clear_and_remove() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::open(dir.path().join("nested")).unwrap();
        let key = CacheKey::derive("ns", &atoms());
        store.write(&key, b"bytes").unwrap();
        assert!(store.exists(&key));
        assert_eq!(store.read(&key).unwrap(), b"bytes");

        store.remove(&key).unwrap();
        assert!(!store.exists(&key));
        store.remove(&key).unwrap();

        store.write(&key, b"bytes").unwrap();
        assert_eq!(store.clear().unwrap(), 1);
        assert!(!store.exists(&key));
    }
}
