use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;

use super::dataset_error::DatasetError;

/// Returns true if the path has a known image extension (case-insensitive).
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Image files directly inside `folder`, sorted by file name.
///
/// Subdirectories and files with other extensions are ignored.
pub fn list_images(folder: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let folder_err = |e| DatasetError::Folder {
        path: folder.to_path_buf(),
        source: e,
    };

    let mut images = Vec::new();
    for entry in fs::read_dir(folder).map_err(folder_err)? {
        let path = entry.map_err(folder_err)?.path();
        if path.is_file() && is_image_file(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}
