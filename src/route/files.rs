use std::path::PathBuf;

use rocket::fs::NamedFile;
use rocket::State;

use crate::config::Config;

/// Serves locally stored uploads. URLs for them are minted by the asset
/// store as `/assets/<provider_id>`.
#[get("/<path..>")]
pub async fn asset_file(path: PathBuf, c: &State<Config>) -> Option<NamedFile> {
    NamedFile::open(c.public_content.join("assets").join(path))
        .await
        .ok()
}
