use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use tokio::fs;

use crate::{error::Result, gemini::decode_data_uri, types::AnalysisResult};

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("autoedit")
}

/// Get the cache directory for a given video, keyed by its content
pub fn get_cache_dir(root: &Path, video_bytes: &[u8]) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    video_bytes.hash(&mut hasher);
    root.join(hasher.finish().to_string())
}

/// Get the path for a cached analysis file (model aware)
pub fn get_analysis_path(cache_dir: &Path, model: &str) -> PathBuf {
    cache_dir.join(format!("analysis_{}.json", model))
}

pub async fn load_analysis(path: &Path) -> Result<AnalysisResult> {
    let json_content = fs::read_to_string(path).await?;
    let result: AnalysisResult = serde_json::from_str(&json_content)?;
    Ok(result)
}

pub async fn save_analysis(result: &AnalysisResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, serde_json::to_string_pretty(result)?).await?;
    Ok(())
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Decode a generated image and write it as `<out_dir>/<id>.<ext>`
pub async fn save_image(out_dir: &Path, id: &str, image_url: &str) -> Result<PathBuf> {
    let (mime_type, bytes) = decode_data_uri(image_url)?;
    fs::create_dir_all(out_dir).await?;
    let path = out_dir.join(format!("{}.{}", id, extension_for(&mime_type)));
    fs::write(&path, bytes).await?;
    Ok(path)
}
