/// Events emitted by a container during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use autowire::ContainerEvent;
///
/// let event = ContainerEvent::Register { key: "Logger".into() };
/// assert_eq!(event.to_string(), "register { key: Logger }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerEvent {
    /// A registration entry was added.
    Register { key: String },

    /// A registration entry was removed.
    Unregister { key: String },

    /// A type descriptor was declared.
    Declare { type_name: String },

    /// A key was read through the caching path.
    Resolve {
        key: String,
        /// Whether the key produced an instance.
        found: bool,
        /// Whether the instance came from the cache.
        cached: bool,
    },

    /// A fresh instance was built, bypassing the cache.
    Construct { key: String },
}

impl std::fmt::Display for ContainerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerEvent::Register { key } => write!(f, "register {{ key: {key} }}"),
            ContainerEvent::Unregister { key } => write!(f, "unregister {{ key: {key} }}"),
            ContainerEvent::Declare { type_name } => {
                write!(f, "declare {{ type_name: {type_name} }}")
            }
            ContainerEvent::Resolve { key, found, cached } => write!(
                f,
                "resolve {{ key: {key}, found: {found}, cached: {cached} }}"
            ),
            ContainerEvent::Construct { key } => write!(f, "construct {{ key: {key} }}"),
        }
    }
}
