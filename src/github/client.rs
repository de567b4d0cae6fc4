// src/github/client.rs
// =============================================================================
// This module talks to the GitHub REST API to list and fetch repo contents.
//
// Strategy:
// - One endpoint does everything: GET /repos/{owner}/{repo}/contents/{path}
//   - a directory path returns a JSON array of entries
//   - a file path returns a single JSON object with a base64 body
// - Requests are authenticated with a token when one is configured
//   (anonymous access works but is limited to 60 requests per hour)
// - Rate limit responses are turned into GithubError::RateLimitExceeded so the
//   walker can stop quietly instead of failing
//
// Rust concepts:
// - Traits: RepoContents lets tests swap in a fake GitHub
// - async_trait: async methods on a trait object-friendly trait
// - Result: For error handling
// =============================================================================

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::content::ContentEntry;
use super::error::GithubError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("repo-letters/", env!("CARGO_PKG_VERSION"));

/// Where a repository lives: "owner/name".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinates {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    // Parses a GitHub URL to extract owner and repository name
    //
    // Supported formats:
    //   - https://github.com/owner/repo
    //   - https://github.com/owner/repo.git
    //   - github.com/owner/repo
    pub fn from_url(url: &str) -> Result<Self, GithubError> {
        let trimmed = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.");

        let path = trimmed
            .strip_prefix("github.com/")
            .ok_or_else(|| GithubError::InvalidUrl(url.to_string()))?;

        let mut parts = path.split('/').filter(|part| !part.is_empty());
        let (owner, repo) = match (parts.next(), parts.next()) {
            (Some(owner), Some(repo)) => (owner, repo),
            _ => return Err(GithubError::InvalidUrl(url.to_string())),
        };

        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        Ok(Self::new(owner, repo))
    }
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The remote listing/fetch capability the walker depends on.
#[async_trait]
pub trait RepoContents: Send + Sync {
    /// Lists `path` (the repository root when empty).
    ///
    /// For a file path the result holds exactly one entry, with its body.
    async fn list_contents(
        &self,
        repo: &RepoCoordinates,
        path: &str,
    ) -> Result<Vec<ContentEntry>, GithubError>;
}

// The contents endpoint answers with an array for directories and a bare
// object for files.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentEntry>),
    Single(ContentEntry),
}

/// reqwest-backed GitHub contents client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_url: Url,
}

impl GithubClient {
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self> {
        let api_url =
            Url::parse(api_url).with_context(|| format!("Invalid GitHub API URL '{}'", api_url))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GitHub token contains characters not allowed in a header")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, api_url })
    }

    fn contents_url(&self, repo: &RepoCoordinates, path: &str) -> Result<Url, GithubError> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GithubError::InvalidUrl(self.api_url.to_string()))?;
            segments
                .pop_if_empty()
                .extend(["repos", repo.owner.as_str(), repo.name.as_str(), "contents"]);
            segments.extend(path.split('/').filter(|part| !part.is_empty()));
        }
        Ok(url)
    }
}

#[async_trait]
impl RepoContents for GithubClient {
    async fn list_contents(
        &self,
        repo: &RepoCoordinates,
        path: &str,
    ) -> Result<Vec<ContentEntry>, GithubError> {
        let url = self.contents_url(repo, path)?;
        debug!(%url, "GET contents");

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if let Some(reset) = rate_limit_reset(status, response.headers()) {
            return Err(GithubError::RateLimitExceeded { reset });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Status {
                status,
                path: path.to_string(),
                message: error_message(&body),
            });
        }

        match response.json::<ContentsResponse>().await? {
            ContentsResponse::Listing(entries) => Ok(entries),
            ContentsResponse::Single(entry) => Ok(vec![entry]),
        }
    }
}

// Works out whether a response is GitHub saying "slow down", and if so when
// the quota comes back.
//
// Primary limits: 403/429 with x-ratelimit-remaining: 0 and x-ratelimit-reset
// (epoch seconds). Secondary limits: 429 or 403 with retry-after (seconds).
fn rate_limit_reset(status: StatusCode, headers: &HeaderMap) -> Option<DateTime<Utc>> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let header_num = |name: &str| -> Option<i64> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    };

    let exhausted = header_num("x-ratelimit-remaining") == Some(0);
    let retry_after = header_num("retry-after");

    if !exhausted && retry_after.is_none() && status != StatusCode::TOO_MANY_REQUESTS {
        // A plain 403 is a permissions problem, not throttling
        return None;
    }

    let reset = if exhausted {
        header_num("x-ratelimit-reset").and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    } else {
        retry_after.map(|secs| Utc::now() + chrono::Duration::seconds(secs))
    };

    Some(reset.unwrap_or_else(Utc::now))
}

// GitHub error bodies look like {"message": "...", "documentation_url": "..."}
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait instead of calling GithubClient directly?
//    - The walker only needs "list this path"
//    - Tests can implement the same trait with an in-memory repository
//    - No network needed to test the traversal logic
//
// 2. What is #[serde(untagged)]?
//    - serde tries each variant in order until one parses
//    - An array parses as Listing, an object as Single
//
// 3. Why set_sensitive(true) on the Authorization header?
//    - reqwest will not print the token in Debug output or logs
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::ContentKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lodash() -> RepoCoordinates {
        RepoCoordinates::new("lodash", "lodash")
    }

    #[test]
    fn test_parse_github_url() {
        let repo = RepoCoordinates::from_url("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.name, "rust");
    }

    #[test]
    fn test_parse_github_url_with_git() {
        let repo = RepoCoordinates::from_url("https://github.com/user/repo.git").unwrap();
        assert_eq!(repo, RepoCoordinates::new("user", "repo"));
        assert_eq!(repo.to_string(), "user/repo");
    }

    #[test]
    fn test_parse_invalid_url() {
        assert!(RepoCoordinates::from_url("https://gitlab.com/user/repo").is_err());
        assert!(RepoCoordinates::from_url("https://github.com/user").is_err());
    }

    #[test]
    fn test_contents_url_escapes_segments() {
        let client = GithubClient::new("https://api.github.com", None).unwrap();
        let url = client.contents_url(&lodash(), "").unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/lodash/lodash/contents");

        let url = client.contents_url(&lodash(), "src/my file.js").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/lodash/lodash/contents/src/my%20file.js"
        );
    }

    #[test]
    fn test_plain_forbidden_is_not_rate_limit() {
        let headers = HeaderMap::new();
        assert!(rate_limit_reset(StatusCode::FORBIDDEN, &headers).is_none());
        assert!(rate_limit_reset(StatusCode::TOO_MANY_REQUESTS, &headers).is_some());
    }

    #[tokio::test]
    async fn test_list_root_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/lodash/lodash/contents"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "src", "path": "src", "type": "dir", "size": 0},
                {"name": "README.md", "path": "README.md", "type": "file", "size": 12}
            ])))
            .mount(&server)
            .await;

        let client = GithubClient::new(&server.uri(), Some("secret")).unwrap();
        let entries = client.list_contents(&lodash(), "").await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ContentKind::Dir);
        assert_eq!(entries[1].name, "README.md");
    }

    #[tokio::test]
    async fn test_fetch_single_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/lodash/lodash/contents/src/a.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "a.js",
                "path": "src/a.js",
                "type": "file",
                "size": 2,
                "encoding": "base64",
                "content": "YWE=\n"
            })))
            .mount(&server)
            .await;

        let client = GithubClient::new(&server.uri(), None).unwrap();
        let entries = client.list_contents(&lodash(), "src/a.js").await.unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_base64());
        assert_eq!(entries[0].decoded_text().unwrap(), "aa");
    }

    #[tokio::test]
    async fn test_rate_limit_is_distinguishable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1700000000")
                    .set_body_json(json!({"message": "API rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let client = GithubClient::new(&server.uri(), None).unwrap();
        let err = client.list_contents(&lodash(), "").await.unwrap_err();

        match err {
            GithubError::RateLimitExceeded { reset } => {
                assert_eq!(reset.timestamp(), 1_700_000_000);
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
            )
            .mount(&server)
            .await;

        let client = GithubClient::new(&server.uri(), None).unwrap();
        let err = client.list_contents(&lodash(), "missing").await.unwrap_err();

        match err {
            GithubError::Status { status, path, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(path, "missing");
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
