//! Bearer token authentication

pub mod jwt;

pub use jwt::{authenticate, Claims, JwtService};
