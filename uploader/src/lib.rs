//! Publishing of a build artifact as the asset of a new release

pub mod release;

use release::{ReleaseClient, UploadError};
use std::path::Path;
use tracing::info;

/// create the release `tag` and attach `path` to it, returning the release id
///
/// There is no rollback, a failed upload leaves the created release behind.
pub fn publish(client: &ReleaseClient, tag: &str, path: &Path) -> Result<u64, UploadError> {
    info!(
        repository = %client.settings().repository,
        tag = tag,
        asset = ?path,
        "Publishing release"
    );

    let release = client.create_release(tag)?;
    client.upload_asset(release, path)?;

    Ok(release)
}
