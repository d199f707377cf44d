use super::{MessageGateway, MessageHandle};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gateway backed by a Mattermost-compatible REST API
/// (`POST /posts`, `PUT /posts/{id}`, `DELETE /posts/{id}`).
#[derive(Debug, Clone)]
pub struct RestMessageGateway {
    client: Client,
    api_base: String,
}

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    channel_id: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdatePostRequest<'a> {
    id: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: String,
}

impl RestMessageGateway {
    /// Build a gateway for `api_base` (e.g. `https://chat.example.com/api/v4`)
    /// authenticating with a bearer token.
    pub fn new(api_base: &str, token: &str) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| format!("Invalid token format: {}", e))?;
        headers.insert(header::AUTHORIZATION, auth_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, String> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            Err(format!("message not found: {}", body))
        } else {
            Err(format!("gateway returned {}: {}", status, body))
        }
    }
}

#[async_trait]
impl MessageGateway for RestMessageGateway {
    async fn create_message(
        &self,
        channel_id: &str,
        text: &str,
        root_id: Option<&str>,
    ) -> Result<MessageHandle, String> {
        let response = self
            .client
            .post(format!("{}/posts", self.api_base))
            .json(&CreatePostRequest {
                channel_id,
                message: text,
                root_id,
            })
            .send()
            .await
            .map_err(|e| format!("Failed to create post: {}", e))?;

        let post: PostResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| format!("Failed to parse create response: {}", e))?;

        Ok(MessageHandle { id: post.id })
    }

    async fn update_message(&self, message_id: &str, text: &str) -> Result<(), String> {
        let response = self
            .client
            .put(format!("{}/posts/{}", self.api_base, message_id))
            .json(&UpdatePostRequest {
                id: message_id,
                message: text,
            })
            .send()
            .await
            .map_err(|e| format!("Failed to update post: {}", e))?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), String> {
        let response = self
            .client
            .delete(format!("{}/posts/{}", self.api_base, message_id))
            .send()
            .await
            .map_err(|e| format!("Failed to delete post: {}", e))?;

        Self::check_status(response).await?;
        Ok(())
    }
}
