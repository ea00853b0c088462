use miette::Diagnostic;
use thiserror::Error;

/// Error type for resource-quantity parsing
#[derive(Error, Debug, Diagnostic)]
pub enum QuantityError {
    /// CPU quantity is present but malformed
    #[error("Invalid CPU quantity: '{value}'")]
    #[diagnostic(
        code(protostar::quantity::invalid_cpu),
        help("Use millicores like '250m' or whole/fractional cores like '1' or '0.5'")
    )]
    InvalidCpu { value: String },

    /// Memory quantity carries a recognized unit but a malformed number
    #[error("Invalid memory quantity: '{value}'")]
    #[diagnostic(
        code(protostar::quantity::invalid_memory),
        help("Use binary quantities like '2048Ki' or '512Mi'")
    )]
    InvalidMemory { value: String },

    /// Pod-count quantity is present but malformed
    #[error("Invalid pod-count quantity: '{value}'")]
    #[diagnostic(
        code(protostar::quantity::invalid_pods),
        help("Pod capacity must be a plain non-negative integer like '110'")
    )]
    InvalidPods { value: String },
}

/// Result type alias for quantity parsing
pub type Result<T> = std::result::Result<T, QuantityError>;

impl QuantityError {
    /// Create an InvalidCpu error
    pub fn invalid_cpu(value: impl Into<String>) -> Self {
        Self::InvalidCpu {
            value: value.into(),
        }
    }

    /// Create an InvalidMemory error
    pub fn invalid_memory(value: impl Into<String>) -> Self {
        Self::InvalidMemory {
            value: value.into(),
        }
    }

    /// Create an InvalidPods error
    pub fn invalid_pods(value: impl Into<String>) -> Self {
        Self::InvalidPods {
            value: value.into(),
        }
    }
}
