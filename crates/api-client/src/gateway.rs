use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use dcinv_api::{RefreshRequest, RefreshResponse};

use crate::error::ClientError;
use crate::retry::{RetryPolicy, retry_on_timeout};
use crate::session::Session;

/// Whether a timed-out call may be sent again.
///
/// A timeout does not tell whether the server processed the request, so
/// only reads and deletes are replayed. Creating calls are sent once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    OnTimeout,
    Never,
}

/// Wraps every outbound call: attaches the bearer token, recovers from an
/// expired access token with one refresh-and-retry, and retries timeouts
/// according to the [`RetryPolicy`] for calls marked [`Replay::OnTimeout`].
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    retry: RetryPolicy,
}

impl Gateway {
    pub fn new(http: reqwest::Client, base_url: &str, session: Session, retry: RetryPolicy) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            retry,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send a request that carries no credentials (login, refresh).
    pub async fn send_anonymous<F>(&self, label: &str, build: F) -> Result<Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        retry_on_timeout(&self.retry, label, |_| {
            let request = build(&self.http);
            async move { request.send().await.map_err(ClientError::from_reqwest) }
        })
        .await
    }

    /// Authenticated call that returns any response other than 401 as-is.
    ///
    /// `build` is invoked once per attempt, so bodies that cannot be cloned
    /// (multipart forms) are rebuilt each time.
    pub async fn execute_raw<F>(
        &self,
        label: &str,
        replay: Replay,
        build: F,
    ) -> Result<Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = self
            .session
            .access_token()
            .ok_or(ClientError::Unauthenticated)?;

        let resp = self.send_authorized(label, replay, &build, &token).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        debug!("{label}: access token rejected");
        let fresh = self
            .session
            .refresh_after(&token, |refresh| self.request_refresh(refresh))
            .await?;

        let retried = self.send_authorized(label, replay, &build, &fresh).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!("{label}: refreshed token rejected; clearing session");
            self.session.clear();
            return Err(ClientError::SessionExpired);
        }
        Ok(retried)
    }

    /// Authenticated call that maps every non-success status to an error.
    pub async fn execute<F>(
        &self,
        label: &str,
        replay: Replay,
        build: F,
    ) -> Result<Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let resp = self.execute_raw(label, replay, build).await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(ClientError::from_response(resp).await)
        }
    }

    /// Authenticated call decoding a JSON body.
    pub async fn execute_json<T, F>(
        &self,
        label: &str,
        replay: Replay,
        build: F,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let resp = self.execute_raw(label, replay, build).await?;
        parse_json(resp).await
    }

    async fn send_authorized<F>(
        &self,
        label: &str,
        replay: Replay,
        build: &F,
        token: &str,
    ) -> Result<Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let policy = match replay {
            Replay::OnTimeout => self.retry,
            Replay::Never => RetryPolicy::once(),
        };
        retry_on_timeout(&policy, label, |_| {
            let request = build(&self.http).bearer_auth(token);
            async move { request.send().await.map_err(ClientError::from_reqwest) }
        })
        .await
    }

    async fn request_refresh(&self, refresh: String) -> Result<RefreshResponse, ClientError> {
        let url = self.url("/token/refresh/");
        let body = RefreshRequest { refresh };
        let resp = self
            .send_anonymous("token refresh", |http| http.post(&url).json(&body))
            .await?;
        parse_json(resp).await
    }
}

/// Return the deserialized body on 2xx, or the classified error.
pub async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        return Err(ClientError::from_response(resp).await);
    }
    resp.json().await.map_err(ClientError::from_reqwest)
}

/// Return the raw body on 2xx, or the classified error.
pub async fn read_bytes(resp: Response) -> Result<Vec<u8>, ClientError> {
    if !resp.status().is_success() {
        return Err(ClientError::from_response(resp).await);
    }
    let bytes = resp.bytes().await.map_err(ClientError::from_reqwest)?;
    Ok(bytes.to_vec())
}
