/// Argon2 password hashing
pub mod password;
/// Access/refresh token issuance and verification
pub mod token;

pub use password::{hash_password, verify_against_dummy, verify_password};
pub use token::{TokenKeys, TokenKind, TokenPair};
