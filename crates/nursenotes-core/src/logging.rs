//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

/// Correlation ID propagated across a request. Format: UUIDv7.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "storage", "auth", "upload"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "catalog", "pool", "object_store", "session"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "catalog_page", "store_object", "sign_in"
pub const OPERATION: &str = "op";

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// User UUID acting or being acted on.
pub const USER_ID: &str = "user_id";

/// Object storage key.
pub const STORAGE_KEY: &str = "storage_key";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Byte size of an upload or stored object.
pub const SIZE_BYTES: &str = "size_bytes";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
