//! Contents-API client for a GitHub-style hosted repository.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

use rota_config::RemoteConfig;

use crate::error::SyncError;
use crate::store::{ContentStore, PutRequest, RemoteDocument, RemoteEntry};

const ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Clone)]
pub struct GithubContentStore {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GithubContentStore {
    pub fn new(remote: &RemoteConfig, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rota/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: remote.api_base.trim_end_matches('/').to_string(),
            owner: remote.owner.clone(),
            repo: remote.repo.clone(),
            token: remote
                .has_credential()
                .then(|| remote.token.trim().to_string()),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, ACCEPT);
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
            None => request,
        }
    }
}

/// Map a failed document read.  404 and 422 mean the path or branch does
/// not exist; anything else is a generic failure.
fn fetch_failure(status: StatusCode, path: &str, branch: &str) -> SyncError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => SyncError::RemoteReferenceInvalid {
            path: path.to_string(),
            branch: branch.to_string(),
            status: status.as_u16(),
        },
        other => SyncError::SyncFailure {
            status: other.as_u16(),
        },
    }
}

fn listing_entries(body: serde_json::Value) -> Result<Vec<RemoteEntry>, SyncError> {
    if !body.is_array() {
        return Err(SyncError::DiscoveryFailure(
            "repository listing is not an array".to_string(),
        ));
    }
    serde_json::from_value(body).map_err(|err| SyncError::DiscoveryFailure(err.to_string()))
}

#[async_trait]
impl ContentStore for GithubContentStore {
    fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    async fn fetch(&self, path: &str, branch: &str) -> Result<RemoteDocument, SyncError> {
        let response = self
            .authorized(self.client.get(self.contents_url(path)))
            .query(&[("ref", branch)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failure(status, path, branch));
        }

        response
            .json::<RemoteDocument>()
            .await
            .map_err(|err| SyncError::Decode(err.to_string()))
    }

    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        let response = self
            .authorized(self.client.get(self.contents_url(dir)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::SyncFailure {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|err| SyncError::DiscoveryFailure(err.to_string()))?;
        listing_entries(body)
    }

    async fn put(&self, path: &str, request: &PutRequest) -> Result<String, SyncError> {
        let response = self
            .authorized(self.client.put(self.contents_url(path)))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::PushConflict {
                status: status.as_u16(),
            });
        }

        let body: PutResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Decode(err.to_string()))?;
        Ok(body.content.sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(token: &str) -> GithubContentStore {
        let remote = RemoteConfig {
            api_base: "https://api.example.test/".to_string(),
            owner: "acme".to_string(),
            repo: "rosters".to_string(),
            token: token.to_string(),
            ..Default::default()
        };
        GithubContentStore::new(&remote, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn builds_contents_urls() {
        let store = store("");
        assert_eq!(
            store.contents_url("w5g-styczen.json"),
            "https://api.example.test/repos/acme/rosters/contents/w5g-styczen.json"
        );
        assert_eq!(
            store.contents_url(""),
            "https://api.example.test/repos/acme/rosters/contents/"
        );
    }

    #[test]
    fn credential_presence() {
        assert!(!store("").has_credential());
        assert!(!store("  ").has_credential());
        assert!(store("ghp_x").has_credential());
    }

    #[test]
    fn not_found_and_unprocessable_are_reference_errors() {
        for status in [StatusCode::NOT_FOUND, StatusCode::UNPROCESSABLE_ENTITY] {
            assert!(matches!(
                fetch_failure(status, "a.json", "dev"),
                SyncError::RemoteReferenceInvalid { status: s, .. } if s == status.as_u16()
            ));
        }
        assert!(matches!(
            fetch_failure(StatusCode::UNAUTHORIZED, "a.json", "dev"),
            SyncError::SyncFailure { status: 401 }
        ));
    }

    #[test]
    fn listing_must_be_an_array() {
        let ok = listing_entries(serde_json::json!([
            { "name": "w5g-a.json", "type": "file" },
            { "name": "README.md", "type": "file" }
        ]))
        .unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok[0].name, "w5g-a.json");

        assert!(matches!(
            listing_entries(serde_json::json!({ "message": "Not Found" })),
            Err(SyncError::DiscoveryFailure(_))
        ));
    }

    #[test]
    fn put_response_yields_new_hash() {
        let body: PutResponse = serde_json::from_value(serde_json::json!({
            "content": { "name": "w5g-a.json", "sha": "new-sha" },
            "commit": { "sha": "commit-sha" }
        }))
        .unwrap();
        assert_eq!(body.content.sha, "new-sha");
    }
}
