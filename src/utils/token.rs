//! Artifact token generation.
//!
//! Compiled script files are named by a random token rather than by their
//! source path, so two builds (or two pages with colliding base names)
//! never overwrite each other's artifacts.

use rand::Rng;

/// Random bytes per token. Hex-encodes to 44 characters, which keeps the
/// collision probability negligible for any realistic page count.
const TOKEN_BYTES: usize = 22;

/// Generate a fresh artifact token.
///
/// Tokens are random, never derived from the source path.
pub fn artifact_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

// ============================================================================
// Tests
// ============================================================================
