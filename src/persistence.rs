//! Persistence layer for saving/loading vector space indexes.
//!
//! Supports both JSON (human-readable) and bincode (efficient binary) formats.
//! Loading always re-validates the contents through [`VectorSpace::from_items`].

use crate::error::{FaqError, Result};
use crate::space::{ReferenceItem, VectorSpace};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default filename for the index.
pub const DEFAULT_INDEX_FILENAME: &str = "index.json";

/// Save format for indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json,
        }
    }
}

/// Descriptive header stored with every index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct IndexMeta {
    /// Embedder that produced the vectors.
    pub model_id: String,
    pub n_items: usize,
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
struct StoredItem {
    label: String,
    text: String,
    vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
struct IndexFile {
    meta: IndexMeta,
    items: Vec<StoredItem>,
}

/// Save a vector space to a file, format chosen by extension.
pub fn save_index(space: &VectorSpace, model_id: &str, path: &Path) -> Result<IndexMeta> {
    save_index_with_format(space, model_id, path, SaveFormat::from_path(path))
}

/// Save a vector space with specific format.
pub fn save_index_with_format(
    space: &VectorSpace,
    model_id: &str,
    path: &Path,
    format: SaveFormat,
) -> Result<IndexMeta> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| FaqError::io(parent, e))?;
        }
    }

    let meta = IndexMeta {
        model_id: model_id.to_string(),
        n_items: space.len(),
        dimension: space.dimension(),
    };
    let file = IndexFile {
        meta: meta.clone(),
        items: space
            .items()
            .iter()
            .map(|item| StoredItem {
                label: item.label.clone(),
                text: item.text.clone(),
                vector: item.vector.clone(),
            })
            .collect(),
    };

    let data = match format {
        SaveFormat::Json => serde_json::to_string_pretty(&file)?.into_bytes(),
        SaveFormat::Bincode => bincode::encode_to_vec(&file, bincode::config::standard())
            .map_err(|e| FaqError::Serialization(e.to_string()))?,
    };

    fs::write(path, &data).map_err(|e| FaqError::io(path, e))?;
    info!(path = %path.display(), items = meta.n_items, "saved index");

    Ok(meta)
}

/// Load a vector space and its header from a file.
pub fn load_index(path: &Path) -> Result<(VectorSpace, IndexMeta)> {
    if !path.exists() {
        return Err(FaqError::IndexNotFound(path.to_path_buf()));
    }
    load_index_with_format(path, SaveFormat::from_path(path))
}

/// Load a vector space with specific format.
pub fn load_index_with_format(path: &Path, format: SaveFormat) -> Result<(VectorSpace, IndexMeta)> {
    let data = fs::read(path).map_err(|e| FaqError::io(path, e))?;

    let file: IndexFile = match format {
        SaveFormat::Json => serde_json::from_slice(&data)?,
        SaveFormat::Bincode => {
            let (file, _): (IndexFile, usize) =
                bincode::decode_from_slice(&data, bincode::config::standard())
                    .map_err(|e| FaqError::Serialization(e.to_string()))?;
            file
        }
    };

    if file.items.len() != file.meta.n_items {
        return Err(FaqError::dimension(
            "index item count",
            file.meta.n_items,
            file.items.len(),
        ));
    }

    let items = file
        .items
        .into_iter()
        .enumerate()
        .map(|(index, item)| ReferenceItem {
            index,
            label: item.label,
            text: item.text,
            vector: item.vector,
        })
        .collect();
    let space = VectorSpace::from_items(items)?;

    if !space.is_empty() && space.dimension() != file.meta.dimension {
        return Err(FaqError::dimension(
            "index vectors",
            file.meta.dimension,
            space.dimension(),
        ));
    }

    Ok((space, file.meta))
}

/// Load an index and warn when it was built by a different model.
pub fn load_index_for_model(path: &Path, model_id: &str) -> Result<VectorSpace> {
    let (space, meta) = load_index(path)?;
    if meta.model_id != model_id {
        warn!(
            built_with = %meta.model_id,
            querying_with = model_id,
            "index was built with a different embedding model"
        );
    }
    Ok(space)
}

/// Check if an index file exists at the given path.
pub fn index_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// Get the size of an index file in bytes.
pub fn index_size(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|e| FaqError::io(path, e))?;
    Ok(metadata.len())
}
