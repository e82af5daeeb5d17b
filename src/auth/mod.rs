pub mod password;
pub mod principal;
pub mod token;

pub use password::{PasswordError, PasswordHasher};
pub use principal::{Principal, Role};
pub use token::{fingerprint, issue_token, verify_token, AuthError, Claims, VerifiedClaims};
