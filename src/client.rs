use std::fmt;

use reqwest::{header::HeaderMap, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    http::{build_auth_headers, error_code_for_status, is_connect_error, is_transient},
    retry::{exponential_backoff, retry, RetryOptions},
    timeout::{fetch_with_timeout, transport_error, with_timeout},
    types::{PasswordResetRequest, RegisterRequest},
    wire::parse_error_envelope,
    ClientOptions, CreateGroupCommand, DrawResult, DrawValidation, ElfResult, Group,
    MessageResponse, RegisterCommand, RegisterResponse, Result, RevealTracking, SantaError,
};

/// Which failures a request may be retried on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RetryPolicy {
    /// Idempotent request: network errors, timeouts and retryable statuses.
    Transient,
    /// Request with side effects: only failures where it never reached the server.
    ConnectOnly,
}

#[derive(Clone)]
/// HTTP client for the Secret Santa backend routes.
///
/// Every call is sent under the configured deadline and retried with
/// exponential backoff according to the route's side effects.
pub struct SantaClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    participant_token: Option<String>,
    options: ClientOptions,
}

impl fmt::Debug for SantaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SantaClient")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field(
                "participant_token",
                &self.participant_token.as_ref().map(|_| "<redacted>"),
            )
            .field("options", &self.options)
            .finish()
    }
}

impl SantaClient {
    /// Creates an anonymous client for the application served at `base_url`.
    ///
    /// Example: `"https://santa.example.com"`; routes such as `/api/groups` are
    /// appended to it.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        Self {
            http: reqwest::Client::new(),
            base_url,
            access_token: None,
            participant_token: None,
            options: ClientOptions::default(),
        }
    }

    /// Authenticates as a registered user with a session access token.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Authenticates as an unregistered participant.
    ///
    /// The token is sent as the `token` query parameter and takes precedence over
    /// an access token.
    pub fn with_participant_token(mut self, token: impl Into<String>) -> Self {
        self.participant_token = Some(token.into());
        self
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `SANTA_BASE_URL`: application origin (required)
    /// - `SANTA_ACCESS_TOKEN`: session access token (optional, Bearer prefix optional)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use santa_http::SantaClient;
    ///
    /// let client = SantaClient::from_env().expect("missing SANTA_BASE_URL");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let base_url = std::env::var("SANTA_BASE_URL")
            .map_err(|_| "missing SANTA_BASE_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("SANTA_BASE_URL is set but empty".to_owned());
        }
        let client = Self::new(base_url);
        match std::env::var("SANTA_ACCESS_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Ok(client.with_access_token(token)),
            _ => Ok(client),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Creates a gift-exchange group owned by the authenticated user.
    pub async fn create_group(&self, command: &CreateGroupCommand) -> Result<Group> {
        if command.name.trim().is_empty() {
            return Err(SantaError::Validation(
                "group name must not be empty".to_owned(),
            ));
        }
        self.send(
            Method::POST,
            "/api/groups",
            Some(command),
            RetryPolicy::ConnectOnly,
        )
        .await
    }

    /// Checks whether the draw can be executed for the group.
    pub async fn validate_draw(&self, group_id: i64) -> Result<DrawValidation> {
        ensure_id("group", group_id)?;
        let path = format!("/api/groups/{group_id}/draw/validate");
        self.send::<(), _>(Method::POST, &path, None, RetryPolicy::Transient)
            .await
    }

    /// Executes the draw. The assignment itself is computed by the backend.
    pub async fn execute_draw(&self, group_id: i64) -> Result<DrawResult> {
        ensure_id("group", group_id)?;
        let path = format!("/api/groups/{group_id}/draw");
        self.send::<(), _>(Method::POST, &path, None, RetryPolicy::ConnectOnly)
            .await
    }

    /// Registers a new account. The email is sent trimmed.
    pub async fn register(&self, command: &RegisterCommand) -> Result<RegisterResponse> {
        ensure_email(&command.email)?;
        let body = RegisterRequest {
            email: command.email.trim(),
            password: &command.password,
        };
        self.send(
            Method::POST,
            "/api/auth/register",
            Some(&body),
            RetryPolicy::ConnectOnly,
        )
        .await
    }

    /// Requests a password-reset email for `email`.
    ///
    /// The backend sends an email for every accepted request, so only connect
    /// failures are retried.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse> {
        ensure_email(email)?;
        let body = PasswordResetRequest {
            email: email.trim(),
        };
        self.send(
            Method::POST,
            "/api/auth/reset-password",
            Some(&body),
            RetryPolicy::ConnectOnly,
        )
        .await
    }

    /// Records that the participant revealed their draw result.
    pub async fn track_reveal(&self, participant_id: i64) -> Result<RevealTracking> {
        ensure_id("participant", participant_id)?;
        let path = format!("/api/participants/{participant_id}/reveal");
        self.send::<(), _>(Method::POST, &path, None, RetryPolicy::Transient)
            .await
    }

    /// Fetches the result of the participant this elf is helping.
    pub async fn elf_result(&self, participant_id: i64) -> Result<ElfResult> {
        ensure_id("participant", participant_id)?;
        let path = format!("/api/participants/{participant_id}/elf-result");
        self.send::<(), _>(Method::GET, &path, None, RetryPolicy::Transient)
            .await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        policy: RetryPolicy,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let headers = build_auth_headers(
            self.participant_token.as_deref(),
            self.access_token.as_deref(),
        )?;
        let options = self.retry_options(policy);

        retry(
            || {
                let request = self.build_request(method.clone(), &url, &headers, body);
                self.execute(request)
            },
            &options,
        )
        .await
    }

    fn build_request<B>(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&B>,
    ) -> reqwest::RequestBuilder
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.http.request(method, url).headers(headers.clone());
        if let Some(token) = &self.participant_token {
            request = request.query(&[("token", token)]);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let timeout = self.options.timeout();
        let response = fetch_with_timeout(request, timeout).await?;
        let status = response.status();
        let body = with_timeout(
            async move { response.text().await.map_err(body_read_error) },
            timeout,
        )
        .await?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), body));
        }

        serde_json::from_str::<T>(&body).map_err(|err| {
            SantaError::Decode(format!("invalid response JSON: {err}; body: {body}"))
        })
    }

    fn retry_options(&self, policy: RetryPolicy) -> RetryOptions<SantaError> {
        let base = self.options.retry_backoff();
        let predicate: fn(&SantaError) -> bool = match policy {
            RetryPolicy::Transient => is_transient,
            RetryPolicy::ConnectOnly => is_connect_error,
        };
        RetryOptions::<SantaError>::new(self.options.max_retries)
            .should_retry(move |err, _| predicate(err))
            .calculate_delay(move |attempt| exponential_backoff(base, attempt))
    }
}

fn error_from_response(status: u16, body: String) -> SantaError {
    match parse_error_envelope(&body) {
        Some(error) => SantaError::Api {
            status,
            code: error
                .code
                .unwrap_or_else(|| error_code_for_status(status).to_owned()),
            message: error.message,
        },
        None => {
            #[cfg(feature = "tracing")]
            tracing::warn!(status, "non-success response without error envelope");
            SantaError::Http { status, body }
        }
    }
}

/// The server has already answered once the body is being read, so a failure
/// here is a decode error rather than a network error. Deadlines stay `Timeout`.
fn body_read_error(err: reqwest::Error) -> SantaError {
    if err.is_timeout() {
        return transport_error(err);
    }
    SantaError::Decode(format!("failed to read response body: {err}"))
}

fn ensure_id(kind: &str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(SantaError::Validation(format!(
            "{kind} id must be a positive integer, got {id}"
        )));
    }
    Ok(())
}

fn ensure_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(SantaError::Validation("email is required".to_owned()));
    }
    Ok(())
}
