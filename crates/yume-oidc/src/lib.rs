mod jwks;
mod oidc;
pub mod refresh;

#[cfg(test)]
mod test_utils;

pub use jwks::{DefaultJwkClient, JwkClient, JwkError, JwkHttpClient, ValidationOptions};
pub use oidc::{OidcConfig, OidcError};
