use anyhow::Context;
use async_trait::async_trait;
use domain::{Comment, ServiceError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{ApiResponse, Listing, Me, TokenResponse};
use crate::traits::RemoteContentService;

/// 单页最多 100 条，这是 Reddit listing 的上限
const PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    /// 通常为 https://www.reddit.com
    pub auth_url: String,
    /// 通常为 https://oauth.reddit.com
    pub api_url: String,
}

#[derive(Debug)]
pub struct RedditSession {
    access_token: String,
    username: String,
}

impl RedditSession {
    pub fn username(&self) -> &str {
        &self.username
    }
}

pub struct RedditDriver {
    config: RedditConfig,
    http: Client,
}

impl RedditDriver {
    pub fn new(config: RedditConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build Reddit HTTP client")?;

        Ok(Self { config, http })
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl RemoteContentService for RedditDriver {
    type Session = RedditSession;

    async fn authenticate(&self) -> Result<RedditSession, ServiceError> {
        let url = format!(
            "{}/api/v1/access_token",
            self.config.auth_url.trim_end_matches('/')
        );
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::Auth(e.to_string()))?;

        let token: TokenResponse = ensure_success(resp, ServiceError::Auth)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Auth(format!("unreadable token response: {}", e)))?;

        let access_token = match (token.access_token, token.error) {
            (_, Some(error)) => return Err(ServiceError::Auth(error)),
            (Some(t), None) => t,
            (None, None) => return Err(ServiceError::Auth("no access token issued".to_string())),
        };

        // 确认令牌对应的账号
        let resp = self
            .http
            .get(self.api("/api/v1/me"))
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| ServiceError::Auth(e.to_string()))?;
        let me: Me = ensure_success(resp, ServiceError::Auth)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Auth(format!("unreadable identity response: {}", e)))?;

        debug!("Reddit session established for u/{}", me.name);
        Ok(RedditSession {
            access_token,
            username: me.name,
        })
    }

    async fn list_own_comments(
        &self,
        session: &RedditSession,
        limit: usize,
    ) -> Result<Vec<Comment>, ServiceError> {
        let url = self.api(&format!("/user/{}/comments", session.username));
        let mut comments = Vec::new();
        let mut after: Option<String> = None;

        while comments.len() < limit {
            let page = (limit - comments.len()).min(PAGE_SIZE).to_string();
            let mut req = self
                .http
                .get(&url)
                .bearer_auth(&session.access_token)
                .query(&[("sort", "new"), ("limit", page.as_str()), ("raw_json", "1")]);
            if let Some(cursor) = &after {
                req = req.query(&[("after", cursor.as_str())]);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| ServiceError::Fetch(e.to_string()))?;
            let listing: Listing = ensure_success(resp, ServiceError::Fetch)
                .await?
                .json()
                .await
                .map_err(|e| ServiceError::Fetch(format!("unreadable listing: {}", e)))?;

            let fetched = listing.data.children.len();
            for thing in listing.data.children {
                // 单条坏数据只跳过该条，不影响整批
                match Comment::try_from(thing.data) {
                    Ok(comment) => comments.push(comment),
                    Err(e) => warn!("Skipping unreadable comment: {}", e),
                }
            }

            match listing.data.after {
                Some(cursor) if fetched > 0 => after = Some(cursor),
                _ => break,
            }
        }

        comments.truncate(limit);
        debug!("Fetched {} comment(s) for u/{}", comments.len(), session.username);
        Ok(comments)
    }

    async fn edit_comment(
        &self,
        session: &RedditSession,
        id: &str,
        new_body: &str,
    ) -> Result<(), ServiceError> {
        let resp = self
            .http
            .post(self.api("/api/editusertext"))
            .bearer_auth(&session.access_token)
            .form(&[("api_type", "json"), ("thing_id", id), ("text", new_body)])
            .send()
            .await
            .map_err(|e| ServiceError::Mutation(e.to_string()))?;

        let body: ApiResponse = ensure_success(resp, ServiceError::Mutation)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Mutation(format!("unreadable edit response: {}", e)))?;

        match body.json {
            Some(api) if !api.errors.is_empty() => Err(ServiceError::Mutation(format!(
                "edit rejected: {}",
                serde_json::Value::from(api.errors)
            ))),
            _ => Ok(()),
        }
    }

    async fn delete_comment(&self, session: &RedditSession, id: &str) -> Result<(), ServiceError> {
        let resp = self
            .http
            .post(self.api("/api/del"))
            .bearer_auth(&session.access_token)
            .form(&[("id", id)])
            .send()
            .await
            .map_err(|e| ServiceError::Mutation(e.to_string()))?;

        ensure_success(resp, ServiceError::Mutation).await?;
        Ok(())
    }
}

async fn ensure_success(
    resp: Response,
    kind: fn(String) -> ServiceError,
) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(kind("rate limited (HTTP 429)".to_string()));
    }

    let body = resp.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(kind(format!("HTTP {}: {}", status.as_u16(), snippet)))
}
