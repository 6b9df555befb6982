//! The container facade: registration, caching reads and fresh construction.
//!
//! # Examples
//!
//! ```
//! use autowire::{Container, RegistrationEntry};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container
//!     .register("answer", RegistrationEntry::factory(|_| Ok(123i32)))
//!     .unwrap();
//!
//! let first: Arc<i32> = container.resolve_as("answer").unwrap().unwrap();
//! let second: Arc<i32> = container.resolve_as("answer").unwrap().unwrap();
//! assert_eq!(*first, 123);
//! assert!(Arc::ptr_eq(&first, &second));
//!
//! // Absent keys are an empty result, not an error
//! assert!(container.resolve("missing").unwrap().is_none());
//! ```

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, trace};

use crate::catalog::{TypeCatalog, TypeDescriptor};
use crate::registry::Registry;
use crate::resolver::{ResolutionGuard, Resolver};
use crate::{
    ContainerConfig, ContainerError, ContainerEvent, ContainerOptions, Injectable, Instance,
    RegistrationEntry,
};

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives every [`ContainerEvent`]. It must be thread-safe because a
/// container is usually shared across threads.
pub type TraceCallback = dyn Fn(&ContainerEvent) + Send + Sync + 'static;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// A lazily materializing dependency-injection container.
///
/// Registration is expected to happen during an initialization phase, before
/// concurrent reads begin. Concurrent registration is memory-safe but its ordering
/// relative to in-flight reads is unspecified.
pub struct Container {
    id: u64,
    options: ContainerOptions,
    registry: Registry,
    catalog: TypeCatalog,
    resolver: Resolver,
    trace: Mutex<Option<Arc<TraceCallback>>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("keys", &self.registry.keys())
            .finish_non_exhaustive()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            options,
            registry: Registry::new(),
            catalog: TypeCatalog::new(),
            resolver: Resolver::new(options.untyped_parameters),
            trace: Mutex::new(None),
        }
    }

    /// Creates a container with the configured options and registers every entry.
    ///
    /// Types named by the entries may be declared afterwards; they are only looked up
    /// when a key is materialized.
    pub fn from_config(config: &ContainerConfig) -> Result<Self, ContainerError> {
        let container = Self::with_options(config.options);
        container.register_all(config.registrations()?)?;
        Ok(container)
    }

    /// Loads a `.json` or `.toml` configuration file. See [`Container::from_config`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        Self::from_config(&ContainerConfig::from_path(path)?)
    }

    pub fn options(&self) -> ContainerOptions {
        self.options
    }

    // ---------------------------------------------------------------------------------------------
    // Tracing
    // ---------------------------------------------------------------------------------------------

    /// Set a tracing callback for container operations.
    ///
    /// The callback is invoked after the operation completes, with no container lock,
    /// build claim or in-flight resolution held, so it may call back into the container.
    pub fn set_trace_callback(&self, callback: impl Fn(&ContainerEvent) + Send + Sync + 'static) {
        let mut guard = self.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    pub fn clear_trace_callback(&self) {
        let mut guard = self.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    fn emit_event(&self, event: ContainerEvent) {
        let callback = self
            .trace
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(callback) = callback {
            callback(&event);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------------------------------

    /// Registers an entry for a key.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::DuplicateKey`] if the key is already registered; the first
    ///   entry is kept
    pub fn register(&self, key: &str, entry: RegistrationEntry) -> Result<(), ContainerError> {
        self.registry.register(key, entry)?;
        self.emit_event(ContainerEvent::Register {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Registers a typed factory. See [`RegistrationEntry::factory`].
    pub fn register_factory<T, F>(&self, key: &str, factory: F) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.register(key, RegistrationEntry::factory(factory))
    }

    /// Registers a key that auto-wires the declared type `type_name`.
    pub fn register_type(&self, key: &str, type_name: &str) -> Result<(), ContainerError> {
        self.register(key, RegistrationEntry::type_name(type_name))
    }

    /// Registers a key that auto-wires `type_name` and then assigns `fields` in order.
    pub fn register_recipe<K, I>(
        &self,
        key: &str,
        type_name: &str,
        fields: I,
    ) -> Result<(), ContainerError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.register(key, RegistrationEntry::recipe(type_name, fields))
    }

    /// Registers several entries, stopping at the first failure.
    pub fn register_all<K, I>(&self, entries: I) -> Result<(), ContainerError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, RegistrationEntry)>,
    {
        entries
            .into_iter()
            .try_for_each(|(key, entry)| self.register(key.as_ref(), entry))
    }

    /// Removes the entry of a key that has not been materialized.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::AlreadyMaterialized`] if the key has a cached instance
    /// - [`ContainerError::UnknownKey`] if the key is not registered
    pub fn unregister(&self, key: &str) -> Result<(), ContainerError> {
        self.registry.unregister(key)?;
        self.emit_event(ContainerEvent::Unregister {
            key: key.to_string(),
        });
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.registry.contains(key)
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.registry.is_cached(key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.registry.keys()
    }

    // ---------------------------------------------------------------------------------------------
    // Type catalog
    // ---------------------------------------------------------------------------------------------

    /// Declares `T` under `type_name` so type-name and recipe entries can build it.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::DuplicateType`] if the name is already declared
    pub fn declare_type<T: Injectable>(&self, type_name: &str) -> Result<(), ContainerError> {
        self.declare(TypeDescriptor::of::<T>(type_name))
    }

    pub fn declare(&self, descriptor: TypeDescriptor) -> Result<(), ContainerError> {
        let type_name = descriptor.type_name().to_string();
        self.catalog.declare(descriptor)?;
        self.emit_event(ContainerEvent::Declare { type_name });
        Ok(())
    }

    pub(crate) fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    // ---------------------------------------------------------------------------------------------
    // Materialization
    // ---------------------------------------------------------------------------------------------

    /// Returns the cached instance for a key, materializing and caching it on first read.
    ///
    /// Returns `Ok(None)` if the key is not registered. Concurrent first reads of the
    /// same key are serialized: one caller builds, the others receive its instance.
    ///
    /// # Errors
    ///
    /// Any error raised while materializing the entry or its dependencies. A failed
    /// materialization caches nothing.
    pub fn resolve(&self, key: &str) -> Result<Option<Instance>, ContainerError> {
        if let Some(instance) = self.registry.cached(key) {
            trace!(key, "cache hit");
            self.emit_resolve(key, true, true);
            return Ok(Some(instance));
        }

        let Some(entry) = self.registry.entry(key) else {
            trace!(key, "not registered");
            self.emit_resolve(key, false, false);
            return Ok(None);
        };

        let (instance, cached) = {
            let _in_flight = ResolutionGuard::enter(self.id, key)?;
            let _claim = self.registry.claim(key)?;

            // Another thread may have finished building while this one waited.
            match self.registry.cached(key) {
                Some(instance) => (instance, true),
                None => {
                    debug!(key, kind = entry.kind(), "materializing");
                    let instance = self.resolver.materialize(self, key, &entry)?;
                    (self.registry.set_cached(key, instance), false)
                }
            }
        };

        self.emit_resolve(key, true, cached);
        Ok(Some(instance))
    }

    fn emit_resolve(&self, key: &str, found: bool, cached: bool) {
        self.emit_event(ContainerEvent::Resolve {
            key: key.to_string(),
            found,
            cached,
        });
    }

    /// Typed [`Container::resolve`].
    ///
    /// # Errors
    ///
    /// - [`ContainerError::TypeMismatch`] if the instance is not a `T`
    pub fn resolve_as<T: Send + Sync + 'static>(
        &self,
        key: &str,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        self.resolve(key)?
            .map(|instance| downcast::<T>(key, instance))
            .transpose()
    }

    /// Builds a fresh instance for a key without reading or writing the cache.
    ///
    /// Dependencies of the key are still resolved through the caching path.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::UnknownKey`] if the key is not registered
    /// - any error raised while materializing
    pub fn construct(&self, key: &str) -> Result<Instance, ContainerError> {
        let entry = self
            .registry
            .entry(key)
            .ok_or_else(|| ContainerError::UnknownKey {
                key: key.to_string(),
            })?;

        let instance = {
            let _in_flight = ResolutionGuard::enter(self.id, key)?;
            debug!(key, kind = entry.kind(), "constructing fresh instance");
            self.resolver.materialize(self, key, &entry)?
        };

        self.emit_event(ContainerEvent::Construct {
            key: key.to_string(),
        });
        Ok(instance)
    }

    /// Typed [`Container::construct`].
    pub fn construct_as<T: Send + Sync + 'static>(
        &self,
        key: &str,
    ) -> Result<Arc<T>, ContainerError> {
        downcast(key, self.construct(key)?)
    }
}

fn downcast<T: Send + Sync + 'static>(
    key: &str,
    instance: Instance,
) -> Result<Arc<T>, ContainerError> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
        })
}
