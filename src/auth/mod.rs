//! Authentication for Atrium
//!
//! Bearer token verification against the identity provider's signing
//! secret. A verified token yields the requesting user's id, email, and
//! role; everything downstream consumes only that triple.

mod jwt;

pub use jwt::{extract_bearer_token, AuthUser, Claims, JwtVerifier, Role};
