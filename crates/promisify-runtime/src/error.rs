//! Error types for the host object model

use crate::object::ObjectId;
use crate::realm::Realm;
use crate::value::Value;

/// Result type for object model operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Object model error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// A value thrown by a native function body
    #[error("Uncaught exception: {0}")]
    Thrown(Value),

    /// Attempted to call a value that is not a function
    #[error("{0} is not a function")]
    NotCallable(String),

    /// Attempted to construct with a non-constructible function
    #[error("{0} is not a constructor")]
    NotConstructor(String),

    /// Generic type error
    #[error("Type error: {0}")]
    TypeError(String),

    /// Property addition on a non-extensible object
    #[error("Cannot add property '{0}': object is not extensible")]
    NotExtensible(String),

    /// Assignment to a read-only property
    #[error("Cannot assign to read only property '{0}'")]
    ReadOnly(String),

    /// Redefinition of a non-configurable property
    #[error("Cannot redefine property '{0}'")]
    NonConfigurable(String),

    /// Prototype assignment would create a cycle
    #[error("Cyclic prototype chain through object {0}")]
    PrototypeCycle(ObjectId),

    /// Handle does not refer to an object in this realm
    #[error("Object {0} does not belong to this realm")]
    InvalidObject(ObjectId),
}

impl RuntimeError {
    /// Shorthand for throwing an arbitrary value
    pub fn throw(value: impl Into<Value>) -> Self {
        RuntimeError::Thrown(value.into())
    }

    /// Convert the failure into the value guest code observes.
    ///
    /// Thrown values pass through untouched; every other failure becomes a
    /// `TypeError` object allocated in `realm`.
    pub fn into_value(self, realm: &mut Realm) -> Value {
        match self {
            RuntimeError::Thrown(value) => value,
            other => realm.type_error(&other.to_string()),
        }
    }
}
