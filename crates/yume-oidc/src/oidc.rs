use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum OidcError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// The subset of the OpenID Connect discovery document the server needs.
#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    pub issuer: Url,
    pub jwks_uri: Url,
}

impl OidcConfig {
    /// Loads the discovery document published by the issuer.
    pub async fn from_issuer_url(client: &reqwest::Client, issuer_url: &Url) -> Result<Self, OidcError> {
        let config = client
            .get(discovery_endpoint(issuer_url)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(config)
    }
}

/// `<issuer>/.well-known/openid-configuration`, keeping any path the
/// issuer url already carries.
fn discovery_endpoint(issuer_url: &Url) -> Result<Url, url::ParseError> {
    let mut base = issuer_url.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(".well-known/openid-configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::load_json;

    #[test]
    fn discovery_endpoint_keeps_the_issuer_path() {
        let issuer = Url::parse("https://id.example.com/realms/dreams").expect("issuer url");
        let endpoint = discovery_endpoint(&issuer).expect("endpoint");
        assert_eq!(
            endpoint.as_str(),
            "https://id.example.com/realms/dreams/.well-known/openid-configuration"
        );
    }

    #[test]
    fn discovery_endpoint_accepts_a_trailing_slash() {
        let issuer = Url::parse("https://id.example.com/").expect("issuer url");
        let endpoint = discovery_endpoint(&issuer).expect("endpoint");
        assert_eq!(endpoint.as_str(), "https://id.example.com/.well-known/openid-configuration");
    }

    #[test]
    fn discovery_document_parses() {
        let config: OidcConfig = load_json("openid-configuration.json");
        assert_eq!(config.jwks_uri.as_str(), "https://id.example.com/.well-known/jwks.json");
    }
}
