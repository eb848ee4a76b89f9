use crate::refresh::{RefreshableValue, Refresher};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{DecodingKey, TokenData, Validation};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How long a fetched key set is considered fresh. Unknown key ids seen
/// within this window do not trigger another fetch.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Error, Debug)]
pub enum JwkError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token header carries no key id")]
    MissingKeyId,

    #[error("Key with id {0:?} does not exist")]
    UnknownKeyId(String),
}

/// HTTP transport used to fetch the JWK set, abstracted for tests.
pub trait JwkHttpClient: Send + Sync + 'static {
    fn fetch_jwks(&self, url: &Url) -> impl Future<Output = Result<JwkSet, JwkError>> + Send;
}

impl JwkHttpClient for reqwest::Client {
    async fn fetch_jwks(&self, url: &Url) -> Result<JwkSet, JwkError> {
        let jwks = self.get(url.clone()).send().await?.error_for_status()?.json().await?;
        Ok(jwks)
    }
}

struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }
}

impl From<&JwkSet> for KeySet {
    fn from(jwks: &JwkSet) -> Self {
        let keys = jwks
            .keys
            .iter()
            .filter_map(|jwk| {
                let kid = jwk.common.key_id.clone()?;
                match DecodingKey::from_jwk(jwk) {
                    Ok(key) => Some((kid, key)),
                    Err(error) => {
                        tracing::warn!(%kid, error = &error as &dyn Error, "skipping unusable jwk");
                        None
                    }
                }
            })
            .collect();
        Self { keys }
    }
}

struct JwkFetcher<C> {
    http_client: C,
    url: Url,
}

impl<C: JwkHttpClient> Refresher for JwkFetcher<C> {
    type Value = KeySet;
    type Error = JwkError;

    async fn refresh(&self) -> Result<KeySet, JwkError> {
        let jwks = self.http_client.fetch_jwks(&self.url).await?;
        Ok(KeySet::from(&jwks))
    }
}

#[derive(Debug, Default, Clone)]
pub struct ValidationOptions {
    /// Accepted `aud` values. When empty the audience is not checked.
    pub audiences: Option<Vec<String>>,
}

/// Validates bearer tokens against the signing keys of an identity provider.
///
/// Cloning is cheap, all clones share one cached key set.
pub struct JwkClient<C: JwkHttpClient> {
    keys: Arc<RefreshableValue<JwkFetcher<C>>>,
}

pub type DefaultJwkClient = JwkClient<reqwest::Client>;

impl<C: JwkHttpClient> Clone for JwkClient<C> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<C: JwkHttpClient> JwkClient<C> {
    /// Fetches the key set once before returning.
    pub async fn new(http_client: C, jwks_url: Url) -> Result<Self, JwkError> {
        let fetcher = JwkFetcher {
            http_client,
            url: jwks_url,
        };
        let keys = RefreshableValue::new(fetcher, MIN_REFRESH_INTERVAL).await?;
        Ok(Self { keys: Arc::new(keys) })
    }

    /// Builds a client from an already parsed key set, skipping the initial fetch.
    pub fn from_jwk_set(http_client: C, jwks_url: Url, jwks: &JwkSet) -> Self {
        let fetcher = JwkFetcher {
            http_client,
            url: jwks_url,
        };
        let keys = RefreshableValue::seeded(fetcher, MIN_REFRESH_INTERVAL, KeySet::from(jwks));
        Self { keys: Arc::new(keys) }
    }

    pub async fn decode<T: DeserializeOwned>(
        &self,
        token: &str,
        options: &ValidationOptions,
    ) -> Result<TokenData<T>, JwkError> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header.kid.ok_or(JwkError::MissingKeyId)?;

        let keys = self.keys.get().await;
        let Some(key) = keys.get(&kid) else {
            // The provider may have rotated its keys since the last fetch.
            self.spawn_refresh();
            return Err(JwkError::UnknownKeyId(kid));
        };

        let mut validation = Validation::new(header.alg);
        match &options.audiences {
            Some(audiences) => validation.set_audience(audiences),
            None => validation.validate_aud = false,
        }

        Ok(jsonwebtoken::decode(token, key, &validation)?)
    }

    /// Re-fetches the key set, rate limited and deduplicated.
    pub async fn refresh(&self) -> Result<bool, JwkError> {
        self.keys.refresh().await
    }

    fn spawn_refresh(&self) {
        let keys = Arc::clone(&self.keys);
        tokio::spawn(async move {
            if let Err(error) = keys.refresh().await {
                tracing::warn!(error = &error as &dyn Error, "failed to refresh jwk set");
            }
        });
    }
}
