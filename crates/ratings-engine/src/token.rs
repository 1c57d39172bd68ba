//! Anonymous voter tokens.

use uuid::Uuid;

/// Mint an opaque token handed to an anonymous client on its first vote.
/// 32 lowercase hex characters.
pub fn mint_token() -> String {
    Uuid::new_v4().simple().to_string()
}
