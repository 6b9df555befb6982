//! # Autowire
//!
//! A thread-safe dependency-injection container that maps string keys to factories or
//! declarative construction recipes, and lazily materializes and caches the resulting
//! object graph on first access.
//!
//! ## Quick Start
//!
//! ```rust
//! use autowire::{Arguments, Container, ContainerError, Injectable, Parameter};
//! use std::sync::Arc;
//!
//! struct Database;
//! impl Injectable for Database {
//!     fn construct(_: &Arguments) -> Result<Self, ContainerError> {
//!         Ok(Database)
//!     }
//! }
//!
//! struct Repository {
//!     db: Arc<Database>,
//! }
//! impl Injectable for Repository {
//!     fn parameters() -> Vec<Parameter> {
//!         vec![Parameter::capability("db", "Database")]
//!     }
//!     fn construct(args: &Arguments) -> Result<Self, ContainerError> {
//!         Ok(Repository { db: args.required(0)? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.declare_type::<Database>("Database")?;
//! container.declare_type::<Repository>("Repository")?;
//! container.register_type("Database", "Database")?;
//! container.register_type("Repository", "Repository")?;
//!
//! let repo: Arc<Repository> = container.resolve_as("Repository")?.unwrap();
//! let db: Arc<Database> = container.resolve_as("Database")?.unwrap();
//! assert!(Arc::ptr_eq(&repo.db, &db));
//! # Ok::<(), ContainerError>(())
//! ```
//!
//! ## Features
//!
//! - **Write-once**: a key can be registered once, and a materialized key can't be removed
//! - **Lazy and cached**: `resolve` builds on first read and then returns the same instance
//! - **Fresh builds**: `construct` bypasses the cache every call
//! - **Auto-wiring**: declared parameter manifests instead of runtime reflection
//! - **Cycle detection**: a dependency cycle is an error, not unbounded recursion
//! - **Tracing support**: optional callback for container events, plus `tracing` diagnostics
//!
//! ## Entry kinds
//!
//! - [`RegistrationEntry::Factory`] - a callable receiving the container
//! - [`RegistrationEntry::TypeName`] - auto-wire a declared type
//! - [`RegistrationEntry::Recipe`] - auto-wire a declared type, then assign field literals

mod macros;

mod catalog;
mod config;
mod container;
mod container_error;
mod container_event;
mod container_trait;
mod entry;
mod injectable;
mod registry;
mod resolver;

pub use catalog::{TypeCatalog, TypeDescriptor};
pub use config::{ContainerConfig, ContainerOptions, UntypedParameterPolicy};
pub use container::{Container, TraceCallback};
pub use container_error::ContainerError;
pub use container_event::ContainerEvent;
pub use container_trait::{ContainerApi, StaticContainer};
pub use entry::{FactoryFn, Fields, Instance, RegistrationEntry, CLASS_FIELD};
pub use injectable::{
    literal, Arguments, Fallback, FieldError, Injectable, Parameter, ParameterKind,
};
pub use registry::Registry;
pub use resolver::Resolver;
