//! Password sign-in against the Identity Toolkit REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::session::{IdentityError, IdentityProvider, SessionToken, SignedIn};
use crate::config::{IdentitySettings, Secret};

#[derive(Clone)]
pub struct IdentityToolkitClient {
    http: Client,
    sign_in_url: String,
    api_key: Secret,
}

impl IdentityToolkitClient {
    pub fn new(http: Client, settings: &IdentitySettings) -> Self {
        Self {
            http,
            sign_in_url: format!(
                "{}/v1/accounts:signInWithPassword",
                settings.base_url.as_str().trim_end_matches('/')
            ),
            api_key: settings.api_key.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

#[async_trait]
impl IdentityProvider for IdentityToolkitClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, IdentityError> {
        let response = self
            .http
            .post(&self.sign_in_url)
            .query(&[("key", self.api_key.expose())])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        let status = response.status();
        debug!(target = "butik::identity", status = status.as_u16(), "sign-in answered");
        if status.is_client_error() {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(IdentityError::Unavailable(format!(
                "identity provider returned status {}",
                status.as_u16()
            )));
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;
        let token = SessionToken::new(body.id_token).ok_or_else(|| {
            IdentityError::Unavailable("identity provider returned an empty token".to_string())
        })?;
        let expires_in = body
            .expires_in
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(3600));

        Ok(SignedIn {
            token,
            email: body.email.unwrap_or_else(|| email.to_string()),
            expires_in,
        })
    }
}
