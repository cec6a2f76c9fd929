use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::dataset_error::DatasetError;
use super::image_catalog::list_images;

/// One labelled folder of face images.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub label: String,
    pub folder: PathBuf,
}

/// The training configuration: which folders belong to which person.
///
/// ```json
/// {"datasets": [{"label": "Alice", "folder": "alice"}]}
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub datasets: Vec<DatasetEntry>,
}

/// A descriptor entry resolved to concrete image files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledDataset {
    pub label: String,
    pub images: Vec<PathBuf>,
}

impl DatasetDescriptor {
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let json = fs::read_to_string(path).map_err(|e| DatasetError::DescriptorRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| DatasetError::DescriptorParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Lists the images of every entry, in entry order.
    ///
    /// Relative folders are resolved against `root`; absolute ones are used
    /// as they are.
    pub fn resolve(&self, root: &Path) -> Result<Vec<LabeledDataset>, DatasetError> {
        self.datasets
            .iter()
            .map(|entry| {
                let folder = root.join(&entry.folder);
                let images = list_images(&folder)?;
                log::debug!(
                    "Dataset '{}': {} images in {}",
                    entry.label,
                    images.len(),
                    folder.display()
                );
                Ok(LabeledDataset {
                    label: entry.label.clone(),
                    images,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_descriptor(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("datasets.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_load_parses_entries_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = write_descriptor(
            tmp.path(),
            r#"{"datasets": [{"label": "Alice", "folder": "alice"}, {"label": "Bob", "folder": "bob"}]}"#,
        );
        let descriptor = DatasetDescriptor::load(&path).unwrap();
        let labels: Vec<&str> = descriptor.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Alice", "Bob"]);
        assert_eq!(descriptor.datasets[1].folder, PathBuf::from("bob"));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = DatasetDescriptor::load(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DatasetError::DescriptorRead { .. }));
    }

    #[test]
    fn test_load_malformed_json_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_descriptor(tmp.path(), r#"{"datasets": [{"label": "Alice"}]}"#);
        let err = DatasetDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, DatasetError::DescriptorParse { path: p, .. } if p == path));
    }

    #[test]
    fn test_resolve_lists_images_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        let alice = tmp.path().join("alice");
        fs::create_dir(&alice).unwrap();
        fs::write(alice.join("2.png"), b"x").unwrap();
        fs::write(alice.join("1.png"), b"x").unwrap();

        let descriptor = DatasetDescriptor {
            datasets: vec![DatasetEntry {
                label: "Alice".to_string(),
                folder: PathBuf::from("alice"),
            }],
        };
        let resolved = descriptor.resolve(tmp.path()).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].label, "Alice");
        assert_eq!(resolved[0].images, vec![alice.join("1.png"), alice.join("2.png")]);
    }

    #[test]
    fn test_resolve_missing_folder_fails() {
        let tmp = TempDir::new().unwrap();
        let descriptor = DatasetDescriptor {
            datasets: vec![DatasetEntry {
                label: "Ghost".to_string(),
                folder: PathBuf::from("ghost"),
            }],
        };
        assert!(matches!(
            descriptor.resolve(tmp.path()).unwrap_err(),
            DatasetError::Folder { .. }
        ));
    }
}
