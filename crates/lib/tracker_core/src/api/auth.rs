//! Auth endpoints: token exchange and "who am I".

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::models::{Identity, MeResponse};
use crate::transport::{ApiClient, ApiRequest, TransportError};

pub const TOKEN_PATH: &str = "auth/token/";
pub const ME_PATH: &str = "auth/me/";

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Body of `POST /auth/token/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access: Option<String>,
}

/// Exchange credentials for a bearer token.
///
/// Sent anonymously: a rejected password must not touch an existing session.
pub async fn obtain_token(
    client: &ApiClient,
    username: &str,
    password: &str,
    cancel: &CancellationToken,
) -> Result<TokenResponse, TransportError> {
    let request = ApiRequest::post(TOKEN_PATH)
        .json(&TokenRequest { username, password })?
        .anonymous();
    client.fetch(&request, cancel).await
}

/// Resolve the identity behind the current token.
pub async fn me(client: &ApiClient, cancel: &CancellationToken) -> Result<Identity, TransportError> {
    let me: MeResponse = client.fetch(&ApiRequest::get(ME_PATH), cancel).await?;
    Ok(me.into())
}
