use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset descriptor {path}: {source}")]
    DescriptorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid dataset descriptor {path}: {source}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to list dataset folder {path}: {source}")]
    Folder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("face detection failed on {path}: {source}")]
    Detection {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}
