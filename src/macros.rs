//! Macro for defining a process-wide container.

/// Creates a module holding one lazily created, process-wide container.
///
/// The macro generates a module containing:
/// - The container static (hidden)
/// - An `Api` struct that implements `ContainerApi`
/// - Free functions delegating to it
///
/// The container is created on first use and lives until the process exits.
///
/// # Examples
///
/// ```rust
/// use autowire::define_container;
/// use std::sync::Arc;
///
/// define_container!(app);
///
/// app::register_factory("greeting", |_| Ok("Hello".to_string())).unwrap();
///
/// let greeting: Arc<String> = app::resolve_as("greeting").unwrap().unwrap();
/// assert_eq!(greeting.as_str(), "Hello");
/// assert!(app::resolve("missing").unwrap().is_none());
/// ```
///
/// # Multiple Containers
///
/// Each invocation is isolated:
///
/// ```rust
/// use autowire::define_container;
///
/// define_container!(database);
/// define_container!(cache);
///
/// database::register_factory("url", |_| Ok("postgres://localhost".to_string())).unwrap();
///
/// assert!(database::contains("url"));
/// assert!(!cache::contains("url"));
/// ```
#[macro_export]
macro_rules! define_container {
    ($name:ident) => {
        pub mod $name {
            use std::sync::{Arc, LazyLock};

            static CONTAINER: $crate::StaticContainer = LazyLock::new($crate::Container::new);

            struct Api;

            impl $crate::ContainerApi for Api {
                fn container() -> &'static $crate::StaticContainer {
                    &CONTAINER
                }
            }

            const API: Api = Api;

            /// Borrow the underlying container, e.g. to hand it to code expecting `&Container`.
            pub fn container() -> &'static $crate::Container {
                &CONTAINER
            }

            pub fn register(
                key: &str,
                entry: $crate::RegistrationEntry,
            ) -> Result<(), $crate::ContainerError> {
                use $crate::ContainerApi;
                API.register(key, entry)
            }

            pub fn register_factory<T, F>(
                key: &str,
                factory: F,
            ) -> Result<(), $crate::ContainerError>
            where
                T: Send + Sync + 'static,
                F: Fn(&$crate::Container) -> Result<T, $crate::ContainerError>
                    + Send
                    + Sync
                    + 'static,
            {
                use $crate::ContainerApi;
                API.register_factory(key, factory)
            }

            pub fn register_type(key: &str, type_name: &str) -> Result<(), $crate::ContainerError> {
                use $crate::ContainerApi;
                API.register_type(key, type_name)
            }

            pub fn declare_type<T: $crate::Injectable>(
                type_name: &str,
            ) -> Result<(), $crate::ContainerError> {
                use $crate::ContainerApi;
                API.declare_type::<T>(type_name)
            }

            pub fn unregister(key: &str) -> Result<(), $crate::ContainerError> {
                use $crate::ContainerApi;
                API.unregister(key)
            }

            pub fn contains(key: &str) -> bool {
                use $crate::ContainerApi;
                API.contains(key)
            }

            pub fn resolve(key: &str) -> Result<Option<$crate::Instance>, $crate::ContainerError> {
                use $crate::ContainerApi;
                API.resolve(key)
            }

            pub fn resolve_as<T: Send + Sync + 'static>(
                key: &str,
            ) -> Result<Option<Arc<T>>, $crate::ContainerError> {
                use $crate::ContainerApi;
                API.resolve_as(key)
            }

            pub fn construct(key: &str) -> Result<$crate::Instance, $crate::ContainerError> {
                use $crate::ContainerApi;
                API.construct(key)
            }

            pub fn construct_as<T: Send + Sync + 'static>(
                key: &str,
            ) -> Result<Arc<T>, $crate::ContainerError> {
                use $crate::ContainerApi;
                API.construct_as(key)
            }

            pub fn set_trace_callback(
                callback: impl Fn(&$crate::ContainerEvent) + Send + Sync + 'static,
            ) {
                use $crate::ContainerApi;
                API.set_trace_callback(callback)
            }

            pub fn clear_trace_callback() {
                use $crate::ContainerApi;
                API.clear_trace_callback()
            }
        }
    };
}
