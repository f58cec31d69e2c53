// Error handling module
// Defines the error taxonomy shared by the resolver, executors, runner and writers

use thiserror::Error;

/// Errors that can occur during a benchmark run
#[derive(Error, Debug)]
pub enum BenchError {
    /// One or more required settings are missing or empty
    #[error("Configuration error: missing environment variables: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    /// Transport-level failure while talking to the endpoint
    #[error("Execution error: {0}")]
    Execution(String),

    /// Endpoint answered with a non-success status
    #[error("Execution error: endpoint returned {status} - {body}")]
    Status { status: u16, body: String },

    /// Endpoint did not answer within the per-request timeout
    #[error("Execution error: request timed out after {timeout:?}")]
    Timeout { timeout: std::time::Duration },

    /// The run was started without any prompts
    #[error("No prompts to run: at least one prompt is required")]
    EmptyPrompts,

    /// Aggregation was asked to summarize zero records
    #[error("Cannot summarize an empty run")]
    EmptyRun,

    /// Mock latency interval is unusable
    #[error(
        "Invalid latency range: [{min}, {max}] (bounds must be non-negative seconds with at most 4 decimals, min <= max)"
    )]
    InvalidLatencyRange { min: f64, max: f64 },

    /// Malformed request log
    #[error("CSV error on line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// True for the failures a live request can produce
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            BenchError::Execution(_) | BenchError::Status { .. } | BenchError::Timeout { .. }
        )
    }

    /// True when required settings could not be resolved
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, BenchError::Configuration { .. })
    }
}

/// Result type alias for bench operations
pub type Result<T> = std::result::Result<T, BenchError>;
