//! Shared constants for end-to-end tests

// ============================================================================
// Token Verification
// ============================================================================

/// Secret the test server verifies tokens with
pub const JWT_SECRET: &str = "e2e-test-secret";

/// User the default test token belongs to
pub const USER_ID: i64 = 7;

/// A second user, for cross-user session checks
#[allow(dead_code)]
pub const OTHER_USER_ID: i64 = 8;

// ============================================================================
// Protocol
// ============================================================================

pub const SESSION_HEADER: &str = "mcp-session-id";

#[allow(dead_code)]
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between server readiness checks
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// HTTP request timeout for test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
