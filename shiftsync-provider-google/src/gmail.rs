//! Gmail v1 as a [`MessageSource`].

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use shiftsync_core::{FetchedMessage, MessageQuery, MessageSource, StoreError};
use tracing::debug;

use crate::auth::GoogleAuth;
use crate::ensure_success;
use crate::types::{Message, MessageList, MessagePart};

pub const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

pub struct GmailSource {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    base_url: String,
}

impl GmailSource {
    pub fn new(auth: Arc<GoogleAuth>) -> Self {
        GmailSource {
            http: reqwest::Client::new(),
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn latest(&self, query: &MessageQuery) -> Result<Option<FetchedMessage>> {
        let token = self.auth.access_token().await?;
        let search = search_query(query);
        debug!(q = %search, "Searching mailbox");

        let response = self
            .http
            .get(format!("{}/users/me/messages", self.base_url))
            .bearer_auth(&token)
            .query(&[("q", search.as_str()), ("maxResults", "1")])
            .send()
            .await
            .context("Failed to search messages")?;
        let list: MessageList = ensure_success(response)
            .await
            .context("Failed to search messages")?
            .json()
            .await
            .context("Invalid message list")?;

        // Gmail lists newest first.
        let Some(newest) = list.messages.into_iter().next() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}/users/me/messages/{}", self.base_url, newest.id))
            .bearer_auth(&token)
            .query(&[("format", "full")])
            .send()
            .await
            .with_context(|| format!("Failed to fetch message {}", newest.id))?;
        let message: Message = ensure_success(response)
            .await
            .with_context(|| format!("Failed to fetch message {}", newest.id))?
            .json()
            .await
            .context("Invalid message")?;

        let received_at = message
            .internal_date
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .with_context(|| format!("Invalid internalDate '{}'", message.internal_date))?;

        let html = message_body(&message.payload)?
            .with_context(|| format!("Message {} has no text body", message.id))?;

        Ok(Some(FetchedMessage {
            id: message.id,
            html,
            received_at,
        }))
    }
}

/// Gmail search syntax for the configured filters.
fn search_query(query: &MessageQuery) -> String {
    let mut terms = Vec::new();
    if let Some(sender) = &query.sender {
        terms.push(format!("from:{}", quote(sender)));
    }
    if let Some(subject) = &query.subject {
        terms.push(format!("subject:{}", quote(subject)));
    }
    terms.push(format!("newer_than:{}d", query.lookback_days));
    terms.join(" ")
}

fn quote(term: &str) -> String {
    if term.contains(char::is_whitespace) {
        format!("\"{}\"", term.replace('"', ""))
    } else {
        term.to_string()
    }
}

/// The HTML part if there is one, otherwise the plain text part.
fn message_body(payload: &MessagePart) -> Result<Option<String>> {
    let part = find_part(payload, "text/html").or_else(|| find_part(payload, "text/plain"));
    let Some(data) = part
        .and_then(|p| p.body.as_ref())
        .and_then(|b| b.data.as_deref())
    else {
        return Ok(None);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .context("Message body is not valid base64url")?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

fn find_part<'a>(part: &'a MessagePart, mime_type: &str) -> Option<&'a MessagePart> {
    if part.mime_type.eq_ignore_ascii_case(mime_type) {
        return Some(part);
    }
    part.parts.iter().find_map(|child| find_part(child, mime_type))
}

impl MessageSource for GmailSource {
    async fn latest_message(
        &self,
        query: &MessageQuery,
    ) -> Result<Option<FetchedMessage>, StoreError> {
        self.latest(query)
            .await
            .map_err(|e| StoreError::new(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GoogleCredentials;
    use chrono::TimeZone;
    use mockito::{Matcher, Server, ServerGuard};

    async fn token_mock(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"ya29.test","expires_in":3599}"#)
            .create_async()
            .await
    }

    fn source(server: &ServerGuard) -> GmailSource {
        let auth = GoogleAuth::new(GoogleCredentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
            refresh_token: "1//refresh".into(),
            token_uri: format!("{}/token", server.url()),
        });
        GmailSource::new(Arc::new(auth)).with_base_url(server.url())
    }

    fn query() -> MessageQuery {
        MessageQuery {
            sender: Some("schedules@example.com".into()),
            subject: Some("Weekly schedule".into()),
            lookback_days: 7,
        }
    }

    #[test]
    fn builds_search_query() {
        assert_eq!(
            search_query(&query()),
            r#"from:schedules@example.com subject:"Weekly schedule" newer_than:7d"#
        );
        let unfiltered = MessageQuery {
            sender: None,
            subject: None,
            lookback_days: 3,
        };
        assert_eq!(search_query(&unfiltered), "newer_than:3d");
    }

    #[tokio::test]
    async fn fetches_html_part_of_newest_message() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server).await;

        let list = server
            .mock("GET", "/users/me/messages")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                search_query(&query()),
            ))
            .with_status(200)
            .with_body(r#"{"messages":[{"id":"m2","threadId":"t"},{"id":"m1","threadId":"t"}]}"#)
            .create_async()
            .await;

        let html = "<table><tr><td>Mon Jan 8</td><td>9:00-17:00</td></tr></table>";
        let encoded = URL_SAFE_NO_PAD.encode(html);
        let get = server
            .mock("GET", "/users/me/messages/m2")
            .match_query(Matcher::UrlEncoded("format".into(), "full".into()))
            .with_status(200)
            .with_body(format!(
                r#"{{
                  "id": "m2",
                  "internalDate": "1704456000000",
                  "payload": {{
                    "mimeType": "multipart/alternative",
                    "parts": [
                      {{"mimeType": "text/plain", "body": {{"data": "aGk"}}}},
                      {{"mimeType": "multipart/related", "parts": [
                        {{"mimeType": "text/html", "body": {{"data": "{encoded}"}}}}
                      ]}}
                    ]
                  }}
                }}"#
            ))
            .create_async()
            .await;

        let message = source(&server).latest_message(&query()).await.unwrap().unwrap();

        list.assert();
        get.assert();
        assert_eq!(message.id, "m2");
        assert_eq!(message.html, html);
        assert_eq!(
            message.received_at,
            Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn no_match_is_none() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let _list = server
            .mock("GET", "/users/me/messages")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"resultSizeEstimate":0}"#)
            .create_async()
            .await;

        assert_eq!(source(&server).latest_message(&query()).await.unwrap(), None);
    }

    #[test]
    fn falls_back_to_plain_text_and_accepts_padding() {
        let payload = MessagePart {
            mime_type: "text/plain".into(),
            body: Some(crate::types::MessagePartBody {
                data: Some("aGk=".into()),
            }),
            parts: Vec::new(),
        };
        assert_eq!(message_body(&payload).unwrap().as_deref(), Some("hi"));
    }
}
