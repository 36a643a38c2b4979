//! Model construction errors.

/// Model result type
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building the descriptor forest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A test with the same name already exists in the suite
    #[error("a test named '{name}' is already registered in suite '{suite}'")]
    DuplicateTest {
        /// Duplicate test name
        name: String,
        /// Owning suite name
        suite: String,
    },

    /// A sub-suite with the same name already exists in the suite
    #[error("a sub-suite named '{name}' is already registered in suite '{suite}'")]
    DuplicateSuite {
        /// Duplicate sub-suite name
        name: String,
        /// Owning suite name
        suite: String,
    },

    /// Node names cannot be empty or contain the path separator
    #[error("invalid node name '{name}': {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Why it was rejected
        reason: String,
    },
}
