use reqwest::Client;

use crate::config::HttpClientSettings;

use super::error::InfraError;

pub fn user_agent() -> &'static str {
    concat!("butik/", env!("CARGO_PKG_VERSION"))
}

/// Outbound client shared by the document store, image host and identity adapters.
pub fn build(settings: &HttpClientSettings) -> Result<Client, InfraError> {
    Client::builder()
        .user_agent(user_agent())
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .build()
        .map_err(|err| InfraError::http_client(err.to_string()))
}
