//! Trait for reaching one process-wide container.
//!
//! This module provides the `ContainerApi` trait with default implementations that
//! delegate to a `'static` [`Container`]. Implementors only supply the accessor.
//!
//! The static container lives until the process exits. Nothing is ever evicted, so
//! registrations belong in the application's initialization phase.

use std::sync::{Arc, LazyLock};

use crate::{Container, ContainerError, ContainerEvent, Injectable, Instance, RegistrationEntry};

/// Type alias for the lazily created static container.
pub type StaticContainer = LazyLock<Container>;

pub trait ContainerApi {
    /// Access the container static.
    fn container() -> &'static StaticContainer;

    fn set_trace_callback(&self, callback: impl Fn(&ContainerEvent) + Send + Sync + 'static) {
        Self::container().set_trace_callback(callback)
    }

    fn clear_trace_callback(&self) {
        Self::container().clear_trace_callback()
    }

    fn register(&self, key: &str, entry: RegistrationEntry) -> Result<(), ContainerError> {
        Self::container().register(key, entry)
    }

    fn register_factory<T, F>(&self, key: &str, factory: F) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        Self::container().register_factory(key, factory)
    }

    fn register_type(&self, key: &str, type_name: &str) -> Result<(), ContainerError> {
        Self::container().register_type(key, type_name)
    }

    fn declare_type<T: Injectable>(&self, type_name: &str) -> Result<(), ContainerError> {
        Self::container().declare_type::<T>(type_name)
    }

    fn unregister(&self, key: &str) -> Result<(), ContainerError> {
        Self::container().unregister(key)
    }

    fn contains(&self, key: &str) -> bool {
        Self::container().contains(key)
    }

    fn resolve(&self, key: &str) -> Result<Option<Instance>, ContainerError> {
        Self::container().resolve(key)
    }

    fn resolve_as<T: Send + Sync + 'static>(
        &self,
        key: &str,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        Self::container().resolve_as(key)
    }

    fn construct(&self, key: &str) -> Result<Instance, ContainerError> {
        Self::container().construct(key)
    }

    fn construct_as<T: Send + Sync + 'static>(&self, key: &str) -> Result<Arc<T>, ContainerError> {
        Self::container().construct_as(key)
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
