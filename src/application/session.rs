//! Admin sign-in delegated to the identity provider, and the session marker it yields.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Identity token stored in the session cookie and forwarded on document writes.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Email claim of the token, read without verification.
    ///
    /// Verification belongs to the identity provider and the document store rules;
    /// the claim is only used to stamp `createdBy`/`updatedBy`.
    pub fn email_claim(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct Claims {
            email: Option<String>,
        }

        let payload = self.0.split('.').nth(1)?;
        let decoded = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: Claims = serde_json::from_slice(&decoded).ok()?;
        claims.email.filter(|email| !email.trim().is_empty())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: SessionToken,
    pub email: String,
    pub expires_in: Duration,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, IdentityError>;
}

#[derive(Clone)]
pub struct SessionService {
    provider: Arc<dyn IdentityProvider>,
}

impl SessionService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SignedIn, IdentityError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }

        match self.provider.sign_in(email, password).await {
            Ok(signed_in) => {
                info!(
                    target = "butik::session",
                    email = %signed_in.email,
                    "admin signed in"
                );
                Ok(signed_in)
            }
            Err(err) => {
                warn!(target = "butik::session", error = %err, "admin sign-in failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn token_with_payload(payload: &str) -> SessionToken {
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        SessionToken::new(format!("eyJhbGciOiJSUzI1NiJ9.{encoded}.c2ln")).expect("token")
    }

    #[test]
    fn email_claim_is_read_from_payload() {
        let token = token_with_payload(r#"{"email":"admin@toko.id","sub":"u1"}"#);
        assert_eq!(token.email_claim().as_deref(), Some("admin@toko.id"));
    }

    #[test]
    fn opaque_tokens_have_no_email() {
        let token = SessionToken::new("true").expect("token");
        assert_eq!(token.email_claim(), None);
        assert!(SessionToken::new("   ").is_none());
    }

    #[test]
    fn debug_output_hides_token() {
        let token = SessionToken::new("secret-token").expect("token");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IdentityProvider for RecordingProvider {
        async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, IdentityError> {
            self.calls.lock().unwrap().push(email.to_string());
            if password == "correct" {
                Ok(SignedIn {
                    token: SessionToken::new("id-token").unwrap(),
                    email: email.to_string(),
                    expires_in: Duration::from_secs(3600),
                })
            } else {
                Err(IdentityError::InvalidCredentials)
            }
        }
    }

    #[tokio::test]
    async fn login_trims_email_and_skips_blank_credentials() {
        let provider = Arc::new(RecordingProvider::default());
        let service = SessionService::new(provider.clone());

        let signed_in = service
            .login("  admin@toko.id ", "correct")
            .await
            .expect("signed in");
        assert_eq!(signed_in.email, "admin@toko.id");

        let err = service.login("", "correct").await.expect_err("blank email");
        assert!(matches!(err, IdentityError::InvalidCredentials));
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }
}
