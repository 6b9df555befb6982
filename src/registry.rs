//! Keyed registration table and instance cache.
//!
//! The registry owns two maps: key → [`RegistrationEntry`] and key → cached [`Instance`].
//! Entries are write-once, and an entry whose instance is cached can no longer be
//! removed. Each key also has a build claim so that at most one build of the same key
//! runs at a time.
//!
//! # Build claims
//!
//! A thread that finds a key claimed by another thread waits for the claim to be
//! released. Before waiting it follows the chain of owner → awaited key; if the chain
//! leads back to a key the waiting thread owns, the wait would never end and
//! [`ContainerError::CircularDependency`] is returned instead.
//!
//! # Lock Poisoning Recovery
//!
//! A poisoned lock is recovered by extracting the inner value. The maps are only ever
//! changed by single `insert`/`remove` calls, so a panic while holding a guard cannot
//! leave them half-updated.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, ThreadId};

use tracing::{debug, warn};

use crate::{ContainerError, Instance, RegistrationEntry};

#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, RegistrationEntry>>,
    cache: RwLock<HashMap<String, Instance>>,
    builds: Mutex<Builds>,
    released: Condvar,
}

/// Keys being built, and the key each blocked thread is waiting for.
#[derive(Default)]
struct Builds {
    owners: HashMap<String, ThreadId>,
    waiting: HashMap<ThreadId, String>,
}

impl Builds {
    /// The key chain `held -> .. -> held` if waiting for `key` would never end.
    fn cycle(&self, key: &str, me: ThreadId) -> Option<Vec<String>> {
        let mut path = vec![key.to_string()];
        let mut current: &str = key;
        for _ in 0..=self.waiting.len() {
            let owner = self.owners.get(current)?;
            if *owner == me {
                let mut chain = vec![current.to_string()];
                chain.extend(path);
                return Some(chain);
            }
            current = self.waiting.get(owner).map(String::as_str)?;
            path.push(current.to_string());
        }
        None
    }
}

/// An exclusive claim on building one key. Released on drop.
pub(crate) struct BuildClaim<'a> {
    registry: &'a Registry,
    key: String,
}

impl Drop for BuildClaim<'_> {
    fn drop(&mut self) {
        let mut builds = self.registry.builds();
        builds.owners.remove(&self.key);
        drop(builds);
        self.registry.released.notify_all();
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> RwLockReadGuard<'_, HashMap<String, RegistrationEntry>> {
        self.entries.read().unwrap_or_else(|p| p.into_inner())
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, RegistrationEntry>> {
        self.entries.write().unwrap_or_else(|p| p.into_inner())
    }

    fn cache(&self) -> RwLockReadGuard<'_, HashMap<String, Instance>> {
        self.cache.read().unwrap_or_else(|p| p.into_inner())
    }

    /// Inserts an entry for a key that has none.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::DuplicateKey`] if the key is already registered. The existing
    ///   entry is left untouched.
    pub fn register(&self, key: &str, entry: RegistrationEntry) -> Result<(), ContainerError> {
        let mut entries = self.entries_mut();
        if entries.contains_key(key) {
            warn!(key, "refusing to overwrite registered key");
            return Err(ContainerError::DuplicateKey {
                key: key.to_string(),
            });
        }
        debug!(key, kind = entry.kind(), "registered entry");
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    /// Removes the entry for a key that has not been materialized yet.
    ///
    /// Instances already handed out to callers are not affected.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::AlreadyMaterialized`] if the key has a cached instance
    /// - [`ContainerError::UnknownKey`] if the key is not registered
    pub fn unregister(&self, key: &str) -> Result<(), ContainerError> {
        // Lock order is always entries, then cache.
        let mut entries = self.entries_mut();
        if self.cache().contains_key(key) {
            warn!(key, "refusing to unregister materialized key");
            return Err(ContainerError::AlreadyMaterialized {
                key: key.to_string(),
            });
        }
        match entries.remove(key) {
            Some(_) => {
                debug!(key, "unregistered entry");
                Ok(())
            }
            None => Err(ContainerError::UnknownKey {
                key: key.to_string(),
            }),
        }
    }

    /// Returns a copy of the entry so the caller can build without holding the lock.
    pub fn entry(&self, key: &str) -> Option<RegistrationEntry> {
        self.entries().get(key).cloned()
    }

    pub fn cached(&self, key: &str) -> Option<Instance> {
        self.cache().get(key).cloned()
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.cache().contains_key(key)
    }

    /// Stores the materialized instance for a key.
    ///
    /// Only the first instance stored for a key is kept; the kept instance is returned.
    pub(crate) fn set_cached(&self, key: &str, instance: Instance) -> Instance {
        let mut cache = self.cache.write().unwrap_or_else(|p| p.into_inner());
        cache.entry(key.to_string()).or_insert(instance).clone()
    }

    /// Claims the key for building, waiting while another thread holds the claim.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::CircularDependency`] if the owner of the claim is, directly or
    ///   through other threads, waiting for a key this thread holds
    pub(crate) fn claim(&self, key: &str) -> Result<BuildClaim<'_>, ContainerError> {
        let me = thread::current().id();
        let mut builds = self.builds();
        while builds.owners.contains_key(key) {
            if let Some(chain) = builds.cycle(key, me) {
                builds.waiting.remove(&me);
                warn!(chain = %chain.join(" -> "), "circular dependency across threads");
                return Err(ContainerError::CircularDependency { chain });
            }
            builds.waiting.insert(me, key.to_string());
            builds = self
                .released
                .wait(builds)
                .unwrap_or_else(|p| p.into_inner());
        }
        builds.waiting.remove(&me);
        builds.owners.insert(key.to_string(), me);
        Ok(BuildClaim {
            registry: self,
            key: key.to_string(),
        })
    }

    fn builds(&self) -> MutexGuard<'_, Builds> {
        self.builds.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
