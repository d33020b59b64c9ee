//! Credential verification backed by signed tokens.

pub mod jwt;

pub use jwt::{Claims, JwtCredentialVerifier};
