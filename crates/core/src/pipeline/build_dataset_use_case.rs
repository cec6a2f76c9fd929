use std::path::{Path, PathBuf};

use crate::dataset::image_catalog::list_images;
use crate::dataset::sample_loader::SampleLoader;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

use super::pipeline_logger::PipelineLogger;

/// Path of the `index`-th face written into `output_folder`.
pub fn face_file_name(output_folder: &Path, index: usize) -> PathBuf {
    output_folder.join(format!("face_{index:04}.png"))
}

/// Turns a folder of raw photos into a folder of canonical face crops,
/// one per photo that contains a face.
pub struct BuildDatasetUseCase {
    loader: SampleLoader,
    writer: Box<dyn ImageWriter>,
    logger: Box<dyn PipelineLogger>,
}

impl BuildDatasetUseCase {
    pub fn new(
        loader: SampleLoader,
        writer: Box<dyn ImageWriter>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            loader,
            writer,
            logger,
        }
    }

    /// Returns the number of faces stored.
    pub fn execute(
        &mut self,
        source_folder: &Path,
        output_folder: &Path,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let images = list_images(source_folder)?;
        self.logger.info(&format!(
            "Extracting faces from {} images in {}",
            images.len(),
            source_folder.display()
        ));

        let mut stored = 0;
        for (i, path) in images.iter().enumerate() {
            match self.loader.load_face(path)? {
                Some(face) => {
                    let target = face_file_name(output_folder, stored);
                    self.writer.write(&target, &Frame::from_gray(face, stored))?;
                    stored += 1;
                }
                None => {
                    log::warn!("No face found in {}, skipping", path.display());
                    self.logger.count("images skipped", 1);
                }
            }
            self.logger.progress(i + 1, images.len());
        }

        self.logger.count("faces stored", stored);
        self.logger.info(&format!(
            "Stored {stored} faces in {}",
            output_folder.display()
        ));
        self.logger.summary();
        Ok(stored)
    }
}
