use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;

use crate::error::Result;

/// Get the cache directory for a given video id
pub fn get_cache_dir(root: &Path, video_id: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    video_id.hash(&mut hasher);
    root.join(hasher.finish().to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("tldw")
}

/// Get the path for a cached raw transcript fetched with a language preference
pub fn get_transcript_path(cache_dir: &Path, languages: &[String]) -> PathBuf {
    cache_dir.join(format!("transcript_{}.json", languages.join("-")))
}

/// Get the path for cached page metadata
pub fn get_metadata_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("metadata.json")
}

/// Load a cached JSON value
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json_content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json_content)?)
}

/// Save a value as pretty JSON, creating parent directories as needed
pub async fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let pretty_json = serde_json::to_string_pretty(value)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
