use std::path::{Component, Path, PathBuf};

use rocket::fs::TempFile;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::resp::problem::{problems, Problem};

/// Where a stored record's media comes from. Uploaded assets carry the
/// provider id needed to release them on replacement or deletion;
/// externally hosted URLs are opaque to us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetSource {
    Uploaded { url: String, provider_id: String },
    External { url: String },
}

impl AssetSource {
    pub fn url(&self) -> &str {
        match self {
            AssetSource::Uploaded { url, .. } => url,
            AssetSource::External { url } => url,
        }
    }

    pub fn provider_id(&self) -> Option<&str> {
        match self {
            AssetSource::Uploaded { provider_id, .. } => Some(provider_id),
            AssetSource::External { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AssetKind {
    Thumbnail,
    Video,
    ProfileImage,
}

impl AssetKind {
    fn folder(self) -> &'static str {
        match self {
            AssetKind::Thumbnail => "thumbnails",
            AssetKind::Video => "videos",
            AssetKind::ProfileImage => "profiles",
        }
    }
}

/// External asset host, specified only at the interface. The default
/// implementation keeps files under the locally served content root.
#[rocket::async_trait]
pub trait AssetStore: Send + Sync {
    async fn store(&self, file: &mut TempFile<'_>, kind: AssetKind) -> Result<AssetSource, Problem>;

    async fn release(&self, provider_id: &str) -> Result<(), Problem>;
}

pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(public_content: impl AsRef<Path>) -> LocalAssetStore {
        LocalAssetStore {
            root: public_content.as_ref().join("assets"),
        }
    }

    fn file_name(file: &TempFile<'_>, kind: AssetKind) -> String {
        let ext = file
            .content_type()
            .and_then(|ct| ct.extension())
            .map(|e| e.as_str().to_string())
            .unwrap_or_else(|| "bin".to_string());

        format!("{}/{}.{}", kind.folder(), Uuid::new_v4(), ext)
    }
}

#[rocket::async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(&self, file: &mut TempFile<'_>, kind: AssetKind) -> Result<AssetSource, Problem> {
        let provider_id = Self::file_name(file, kind);
        let dest = self.root.join(&provider_id);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| problems::upstream_asset(e))?;
        }

        file.copy_to(&dest)
            .await
            .map_err(|e| problems::upstream_asset(e))?;

        tracing::debug!("stored uploaded asset as {}", provider_id);

        Ok(AssetSource::Uploaded {
            url: format!("/assets/{}", provider_id),
            provider_id,
        })
    }

    async fn release(&self, provider_id: &str) -> Result<(), Problem> {
        // Provider ids are generated by `store`; anything pointing outside
        // the asset root is not ours to delete.
        let relative = Path::new(provider_id);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(problems::upstream_asset("invalid asset id"));
        }

        tokio::fs::remove_file(self.root.join(relative))
            .await
            .map_err(|e| problems::upstream_asset(e))?;

        tracing::debug!("released uploaded asset {}", provider_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_serialization_keeps_tag() {
        let uploaded = AssetSource::Uploaded {
            url: "/assets/videos/abc.mp4".to_string(),
            provider_id: "videos/abc.mp4".to_string(),
        };
        let value = serde_json::to_value(&uploaded).unwrap();
        assert_eq!(value["kind"], "uploaded");

        let external = AssetSource::External {
            url: "https://cdn.example.com/clip.mp4".to_string(),
        };
        let value = serde_json::to_value(&external).unwrap();
        assert_eq!(value["kind"], "external");

        let back: AssetSource = serde_json::from_value(value).unwrap();
        assert_eq!(back, external);
        assert_eq!(back.provider_id(), None);
    }
}
