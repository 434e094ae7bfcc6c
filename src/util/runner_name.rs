// Layer 1: Standard library imports
use std::fmt::{self, Display};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// Unique key for every per-runner resource: queues, metrics cells,
/// transform engines, sinks, and executors are all indexed by `RunnerName`.
///
/// Unlike [`ActorId`](crate)-style identifiers elsewhere in this lineage,
/// runner identity is operator-assigned (it comes from configuration, not
/// generated at spawn time), so this wraps `Arc<str>` rather than a `Uuid`:
/// cheap to clone and hash, and compares equal across independently
/// constructed values with the same text.
///
/// # Example
///
/// ```rust
/// use circulator::util::RunnerName;
///
/// let a = RunnerName::new("orders-to-warehouse");
/// let b = RunnerName::new("orders-to-warehouse");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunnerName(Arc<str>);

impl RunnerName {
    /// Create a runner name from any string-like value.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Borrow the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RunnerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunnerName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RunnerName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
