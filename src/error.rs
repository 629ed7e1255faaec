// ABOUTME: The fallible boundaries the core exposes - field allocation and config file I/O (§7)
// ABOUTME: Everywhere else the core follows the teacher's convention of infallible, clamped writes

use thiserror::Error;

/// Failure constructing a simulator, or loading/saving its configuration.
/// Resource exhaustion and I/O are the only "kinds" of error §7 treats as
/// fatal/propagated; everything else (out-of-range inputs, numerical
/// outliers, precondition violations) is handled silently or via
/// `DiagnosticsSink`.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("failed to allocate field '{field}' ({cells} cells)")]
    AllocationFailed { field: &'static str, cells: usize },

    #[error("invalid world size: {world_size_km} km (must be > 0)")]
    InvalidWorldSize { world_size_km: f32 },

    #[error("failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),
}
