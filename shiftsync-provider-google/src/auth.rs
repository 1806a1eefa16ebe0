//! OAuth for the Gmail and Calendar APIs.
//!
//! Runs use a stored refresh token; [`authorize`] is the one-time consent flow
//! that produces it.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::ensure_success;
use crate::types::{DEFAULT_TOKEN_URI, GoogleCredentials, TokenResponse};

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/calendar",
];

const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";

const REDIRECT_PORT: u16 = 8085;

fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

/// Refresh tokens are exchanged again this long before the access token expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Hands out access tokens, refreshing them when they are about to expire.
#[derive(Debug)]
pub struct GoogleAuth {
    http: reqwest::Client,
    credentials: GoogleCredentials,
    cached: Mutex<Option<AccessToken>>,
}

impl GoogleAuth {
    pub fn new(credentials: GoogleCredentials) -> Self {
        GoogleAuth {
            http: reqwest::Client::new(),
            credentials,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String> {
        let now = Utc::now();
        if let Some(cached) = self.cached_token() {
            if cached.expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS) {
                return Ok(cached.token);
            }
        }

        let fresh = self.refresh().await?;
        let token = AccessToken {
            token: fresh.access_token,
            expires_at: now + Duration::seconds(fresh.expires_in),
        };
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        Ok(token.token)
    }

    fn cached_token(&self) -> Option<AccessToken> {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn refresh(&self) -> Result<TokenResponse> {
        debug!(token_uri = %self.credentials.token_uri, "Refreshing access token");

        let response = self
            .http
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach token endpoint")?;

        ensure_success(response)
            .await
            .context("Failed to refresh token")?
            .json()
            .await
            .context("Invalid token response")
    }
}

/// Start a local HTTP server to receive the OAuth callback.
/// Returns (code, state).
fn wait_for_callback(listener: TcpListener) -> Result<(String, String)> {
    let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // GET /callback?code=xxx&state=yyy HTTP/1.1
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .context("Invalid request")?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        bail!("Authorization was denied: {}", error);
    }
    let code = param("code").context("No code in callback")?;
    let state = param("state").context("No state in callback")?;

    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>shiftsync is authorized</h1>\
        <p>You can close this window and return to the terminal.</p>\
        </body></html>";

    stream.write_all(response.as_bytes())?;
    stream.flush()?;

    Ok((code, state))
}

/// The consent page for Gmail read and Calendar write access.
fn consent_url(client_id: &str, state: &str) -> Result<url::Url> {
    let scopes = SCOPES.join(" ");
    let redirect = redirect_uri();
    let url = url::Url::parse_with_params(
        AUTH_URI,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect.as_str()),
            ("response_type", "code"),
            ("scope", scopes.as_str()),
            // Needed for Google to issue a refresh token every time.
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )?;
    Ok(url)
}

/// Unguessable value tying the callback to this consent request.
fn new_state() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Run the installed-app consent flow and return a credentials bundle.
pub async fn authorize(client_id: &str, client_secret: &str) -> Result<GoogleCredentials> {
    let state = new_state();
    let auth_url = consent_url(client_id, &state)?;

    let listener = TcpListener::bind(format!("127.0.0.1:{}", REDIRECT_PORT))
        .with_context(|| format!("Failed to bind to port {}", REDIRECT_PORT))?;

    println!("\nOpen this URL in your browser to authorize shiftsync:\n");
    println!("{}\n", auth_url);

    if open::that(auth_url.as_str()).is_err() {
        println!("(Could not open browser automatically, please copy the URL above)");
    }

    println!("Waiting for OAuth callback on port {}...", REDIRECT_PORT);
    let (code, returned_state) = tokio::task::spawn_blocking(move || wait_for_callback(listener))
        .await
        .context("Callback listener panicked")??;

    if returned_state != state {
        bail!("OAuth state mismatch, refusing the callback");
    }

    println!("\nReceived authorization code, exchanging for tokens...");

    let response = reqwest::Client::new()
        .post(DEFAULT_TOKEN_URI)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri().as_str()),
        ])
        .send()
        .await
        .context("Failed to reach token endpoint")?;

    let tokens: TokenResponse = ensure_success(response)
        .await
        .context("Failed to exchange code for tokens")?
        .json()
        .await
        .context("Invalid token response")?;

    let refresh_token = tokens
        .refresh_token
        .context("Google did not return a refresh token")?;

    Ok(GoogleCredentials {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
        refresh_token,
        token_uri: DEFAULT_TOKEN_URI.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn credentials(token_uri: String) -> GoogleCredentials {
        GoogleCredentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
            refresh_token: "1//refresh".into(),
            token_uri,
        }
    }

    #[tokio::test]
    async fn refreshes_once_and_caches() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "1//refresh".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.first","expires_in":3599,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;

        let auth = GoogleAuth::new(credentials(format!("{}/token", server.url())));

        assert_eq!(auth.access_token().await.unwrap(), "ya29.first");
        assert_eq!(auth.access_token().await.unwrap(), "ya29.first");
        mock.assert();
    }

    #[tokio::test]
    async fn rejected_refresh_token_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let auth = GoogleAuth::new(credentials(format!("{}/token", server.url())));
        let err = auth.access_token().await.unwrap_err();

        assert!(format!("{err:#}").contains("invalid_grant"));
    }

    #[test]
    fn consent_url_requests_offline_access() {
        let url = consent_url("client", "abc").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("access_type".into(), "offline".into())));
        assert!(pairs.contains(&("state".into(), "abc".into())));
        assert!(pairs.contains(&("scope".into(), SCOPES.join(" "))));
    }

    #[test]
    fn consent_state_is_random() {
        let first = new_state();
        let second = new_state();

        assert_ne!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
