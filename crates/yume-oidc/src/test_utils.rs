use crate::jwks::{JwkError, JwkHttpClient};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Secret behind the `yume-test` key in `resources/test/jwks.json`.
const TEST_SECRET: &[u8] = b"yume-test-signing-secret-0123456789abcdef";

pub(crate) fn load_json<T: DeserializeOwned>(name: &str) -> T {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources/test").join(name);
    let data =
        std::fs::read_to_string(&path).unwrap_or_else(|error| panic!("cannot read {}: {error}", path.display()));
    serde_json::from_str(&data).unwrap_or_else(|error| panic!("cannot parse {}: {error}", path.display()))
}

pub(crate) fn mint_token<T: Serialize>(kid: Option<&str>, claims: &T) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = kid.map(ToOwned::to_owned);
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(TEST_SECRET)).expect("token")
}

/// Serves a fixed key set and counts how often it gets fetched.
#[derive(Clone)]
pub(crate) struct MockJwkClient {
    jwks: Arc<JwkSet>,
    fetches: Arc<AtomicUsize>,
}

impl MockJwkClient {
    pub(crate) fn new(jwks: &JwkSet) -> Self {
        Self {
            jwks: Arc::new(jwks.clone()),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn fetches(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

impl JwkHttpClient for MockJwkClient {
    async fn fetch_jwks(&self, _url: &Url) -> Result<JwkSet, JwkError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(JwkSet::clone(&self.jwks))
    }
}
