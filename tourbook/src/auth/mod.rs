//! Token issuing and password hashing
//!
//! Complements the [`protect`](crate::middleware::protect) middleware: this
//! module creates what the middleware later checks.
//!
//! # Example
//!
//! ```rust,ignore
//! use tourbook::auth::{JwtGenerator, PasswordHasher};
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("pass1234")?;
//! assert!(hasher.verify("pass1234", &hash)?);
//!
//! let token = JwtGenerator::new(&config.jwt)?.generate(&user_id, "user")?;
//! ```

pub mod config;
pub mod password;
pub mod tokens;

pub use config::PasswordConfig;
pub use password::PasswordHasher;
pub use tokens::JwtGenerator;
