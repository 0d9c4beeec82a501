//! Identity & Token Service: password hashing, reset codes, and the
//! session/upload/cache-insert JWT families.

pub mod password;
pub mod tokens;

pub use password::{generate_reset_code, hash_password, verify_password, PasswordError};
pub use tokens::{Claims, TokenError, TokenKind, TokenService};
