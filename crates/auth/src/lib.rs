//! `souk-auth`: authorization boundary for the marketplace core.
//!
//! Authentication (credential checks, token issuance) lives outside the core.
//! This crate only turns a verified bearer token into a [`Principal`] and
//! answers "may this principal perform this operation?".

pub mod authorize;
pub mod claims;
pub mod principal;
pub mod roles;

pub use authorize::{authorize, AuthzError, Operation};
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use principal::Principal;
pub use roles::Role;
