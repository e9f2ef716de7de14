//! GitHub Releases client.

use cadence_core::{ReleaseHost, ReleaseRequest, RemoteError};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::{debug, info};

use crate::{GithubError, GithubResult};

const API_VERSION: &str = "2022-11-28";

/// Request body for `POST /repos/{owner}/{repo}/releases`.
#[derive(Debug, Serialize)]
struct CreateReleaseBody<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    target_commitish: &'a str,
}

/// Splits an `owner/repo` identifier.
///
/// # Errors
///
/// Returns [`GithubError::InvalidRepository`] unless the identifier has exactly
/// two non-empty segments.
pub fn parse_repository(repository: &str) -> GithubResult<(String, String)> {
    match repository.trim().split_once('/') {
        Some((owner, repo))
            if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
        {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(GithubError::InvalidRepository(repository.to_string())),
    }
}

/// Derives the web base URL from an API base URL.
///
/// `https://api.github.com` maps to `https://github.com`; an Enterprise
/// `https://host/api/v3` maps to `https://host`.
fn web_base(api: &Url) -> GithubResult<Url> {
    let mut web = api.clone();
    if web.host_str() == Some("api.github.com") {
        web.set_host(Some("github.com"))
            .map_err(|e| GithubError::InvalidUrl(e.to_string()))?;
    }
    let path = web
        .path()
        .trim_end_matches('/')
        .trim_end_matches("/api/v3")
        .to_string();
    web.set_path(&path);
    Ok(web)
}

fn join(base: &Url, segments: &[&str]) -> GithubResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| GithubError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Builds the error for a response that was not expected.
pub(crate) async fn unexpected_status(url: &Url, response: reqwest::Response) -> GithubError {
    let status = response.status();
    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .is_some_and(|v| v == "0"));
    if rate_limited {
        return GithubError::RateLimited(url.to_string());
    }
    let body = response.text().await.unwrap_or_default();
    GithubError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    }
}

/// Client for the GitHub Releases REST API of one repository.
pub struct GithubReleases {
    client: reqwest::Client,
    api_url: Url,
    web_url: Url,
    owner: String,
    repo: String,
    token: String,
}

impl GithubReleases {
    /// Creates a client for `repository` (`owner/repo`) against `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository identifier or the API URL is invalid,
    /// or if the HTTP client cannot be built.
    pub fn new(
        api_url: &str,
        repository: &str,
        token: impl Into<String>,
    ) -> GithubResult<Self> {
        let (owner, repo) = parse_repository(repository)?;
        let api_url =
            Url::parse(api_url).map_err(|e| GithubError::InvalidUrl(format!("{api_url}: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(GithubError::InvalidUrl(api_url.to_string()));
        }
        let web_url = web_base(&api_url)?;

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(GithubError::Client)?;

        Ok(Self {
            client,
            api_url,
            web_url,
            owner,
            repo,
            token: token.into(),
        })
    }

    /// Overrides the base URL used for human-readable release links.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn with_web_url(mut self, web_url: &str) -> GithubResult<Self> {
        self.web_url =
            Url::parse(web_url).map_err(|e| GithubError::InvalidUrl(format!("{web_url}: {e}")))?;
        Ok(self)
    }

    fn releases_url(&self, rest: &[&str]) -> GithubResult<Url> {
        let mut segments = vec!["repos", self.owner.as_str(), self.repo.as_str(), "releases"];
        segments.extend_from_slice(rest);
        join(&self.api_url, &segments)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Looks up the release attached to `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error for any response other than 200 or 404.
    pub async fn find_release(&self, tag: &str) -> GithubResult<bool> {
        let url = self.releases_url(&["tags", tag])?;
        debug!(%url, "looking up release");

        let response = self
            .request(reqwest::Method::GET, url.clone())
            .send()
            .await
            .map_err(|e| GithubError::Request {
                url: url.to_string(),
                source: e,
            })?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(unexpected_status(&url, response).await),
        }
    }

    /// Creates a release.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub rejects it, including
    /// when a release for the tag already exists.
    pub async fn post_release(&self, request: &ReleaseRequest<'_>) -> GithubResult<()> {
        let url = self.releases_url(&[])?;
        let body = CreateReleaseBody {
            tag_name: request.tag,
            name: request.title,
            body: request.body,
            target_commitish: request.target,
        };
        debug!(%url, tag = %request.tag, "creating release");

        let response = self
            .request(reqwest::Method::POST, url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| GithubError::Request {
                url: url.to_string(),
                source: e,
            })?;

        if response.status().is_success() {
            info!(tag = %request.tag, "created release");
            Ok(())
        } else {
            Err(unexpected_status(&url, response).await)
        }
    }

    /// Human-readable URL of the release for `tag`.
    #[must_use]
    pub fn html_url(&self, tag: &str) -> String {
        join(
            &self.web_url,
            &[self.owner.as_str(), self.repo.as_str(), "releases", "tag", tag],
        )
        .map_or_else(
            |_| format!("{}/{}/{}/releases/tag/{tag}", self.web_url, self.owner, self.repo),
            |url| url.to_string(),
        )
    }
}

impl ReleaseHost for GithubReleases {
    async fn release_exists(&self, tag: &str) -> Result<bool, RemoteError> {
        self.find_release(tag).await.map_err(Into::into)
    }

    async fn create_release(&self, request: &ReleaseRequest<'_>) -> Result<(), RemoteError> {
        self.post_release(request).await.map_err(Into::into)
    }

    fn release_url(&self, tag: &str) -> String {
        self.html_url(tag)
    }
}
