use serde::Serialize;
use serde_json::Value;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, error, info};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.github.com";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Environment variable {0} with the access token is not set")]
    MissingToken(String),
    #[error("Failed to read asset {path:?}")]
    ReadAsset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Asset path {0:?} has no file name")]
    AssetName(PathBuf),
    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },
    #[error("Failed to decode response of {url}")]
    Decode {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("Release response has no numeric `id` field")]
    MissingId,
}

/// Endpoints and fixed request settings of a release host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_url: String,
    pub upload_url: String,
    /// `owner/name`
    pub repository: String,
    pub content_type: String,
}

impl ClientSettings {
    pub fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/releases",
            self.api_url.trim_end_matches('/'),
            self.repository
        )
    }

    pub fn assets_url(&self, release: u64) -> String {
        format!(
            "{}/repos/{}/releases/{release}/assets",
            self.upload_url.trim_end_matches('/'),
            self.repository
        )
    }
}

/// payload of the create release call
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewRelease<'a> {
    pub tag_name: &'a str,
    pub name: &'a str,
}

/// Blocking client for the two calls of an upload: create release, add asset
#[derive(Debug)]
pub struct ReleaseClient {
    agent: ureq::Agent,
    settings: ClientSettings,
    token: String,
}

impl ReleaseClient {
    pub fn new(settings: ClientSettings, token: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .user_agent(concat!("benchflux-upload/", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            agent,
            settings,
            token: token.into(),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token)
    }

    /// create a release for `tag` and return its id
    #[tracing::instrument(skip(self), level = "info")]
    pub fn create_release(&self, tag: &str) -> Result<u64, UploadError> {
        let url = self.settings.releases_url();

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization())
            .set("Accept", "application/vnd.github+json")
            .send_json(NewRelease {
                tag_name: tag,
                name: tag,
            })
            .map_err(|error| request_error(&url, error))?;

        let body: Value = response.into_json().map_err(|source| UploadError::Decode {
            url: url.clone(),
            source,
        })?;
        let id = release_id(&body)?;

        info!(id = id, tag = tag, "Created release");

        Ok(id)
    }

    /// upload the raw bytes of `path` as an asset named after the file
    #[tracing::instrument(skip(self), level = "info")]
    pub fn upload_asset(&self, release: u64, path: &Path) -> Result<(), UploadError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::AssetName(path.to_path_buf()))?;
        let bytes = fs::read(path).map_err(|source| UploadError::ReadAsset {
            path: path.to_path_buf(),
            source,
        })?;
        let url = self.settings.assets_url(release);

        debug!(size = bytes.len(), name = %name, "Uploading asset");

        self.agent
            .post(&url)
            .query("name", &name)
            .set("Authorization", &self.authorization())
            .set("Content-Type", &self.settings.content_type)
            .send_bytes(&bytes)
            .map_err(|error| request_error(&url, error))?;

        info!(release = release, name = %name, "Uploaded asset");

        Ok(())
    }
}

/// read the release id from a create release response
pub fn release_id(body: &Value) -> Result<u64, UploadError> {
    body.get("id").and_then(Value::as_u64).ok_or(UploadError::MissingId)
}

fn request_error(url: &str, error: ureq::Error) -> UploadError {
    match error {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            error!(status = status, url = url, "Release host rejected request");

            UploadError::Status {
                url: url.to_owned(),
                status,
                body,
            }
        }
        ureq::Error::Transport(transport) => UploadError::Transport {
            url: url.to_owned(),
            source: Box::new(transport),
        },
    }
}
