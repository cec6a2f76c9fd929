pub mod dataset_descriptor;
pub mod dataset_error;
pub mod image_catalog;
pub mod sample_loader;
