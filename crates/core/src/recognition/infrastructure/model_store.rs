use std::fs;
use std::path::{Path, PathBuf};

use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::recognizer_model::{ModelArtifact, ModelRecord, RecognizerModel};
use crate::shared::constants::{MODEL_PARAMS_EXTENSION, MODEL_RECORD_EXTENSION};

/// Saves and loads models as a `<name>.json` record next to a
/// `<name>.bin` parameter blob.
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Splits a model path such as `models/eigen` (with or without an
    /// extension) into its store directory and model name.
    pub fn for_model_path(path: &Path) -> (Self, String) {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        (Self::new(dir), name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{MODEL_RECORD_EXTENSION}"))
    }

    pub fn params_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{MODEL_PARAMS_EXTENSION}"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.record_path(name).is_file() && self.params_path(name).is_file()
    }

    /// Writes both files next to their targets as `.part` files and only
    /// then renames them into place, params first. A failed save leaves
    /// any previous model under `name` loadable.
    pub fn save(&self, name: &str, model: &RecognizerModel) -> Result<(), RecognitionError> {
        let artifact = model.export()?;
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let record_path = self.record_path(name);
        let json = serde_json::to_string_pretty(&artifact.record).map_err(|e| {
            RecognitionError::Serialization {
                path: record_path.clone(),
                source: e,
            }
        })?;
        let params_path = self.params_path(name);

        let params_part = write_part(&params_path, &artifact.params)?;
        let record_part = write_part(&record_path, json.as_bytes()).map_err(|e| {
            let _ = fs::remove_file(&params_part);
            e
        })?;
        let committed = fs::rename(&params_part, &params_path)
            .map_err(|e| io_error(&params_path, e))
            .and_then(|_| {
                fs::rename(&record_part, &record_path).map_err(|e| io_error(&record_path, e))
            });
        if committed.is_err() {
            let _ = fs::remove_file(&params_part);
            let _ = fs::remove_file(&record_part);
        }
        committed?;

        log::info!(
            "Saved {} model to {} and {}",
            model.kind(),
            record_path.display(),
            params_path.display()
        );
        Ok(())
    }

    /// Reads both files and rebuilds the model they describe.
    ///
    /// Missing files are I/O errors; files that exist but disagree or do
    /// not parse are `ModelCorrupt`.
    pub fn load(&self, name: &str) -> Result<RecognizerModel, RecognitionError> {
        let record_path = self.record_path(name);
        let json = fs::read(&record_path).map_err(|e| io_error(&record_path, e))?;
        let record: ModelRecord = serde_json::from_slice(&json).map_err(|e| {
            RecognitionError::ModelCorrupt(format!("{}: {e}", record_path.display()))
        })?;

        let params_path = self.params_path(name);
        let params = fs::read(&params_path).map_err(|e| io_error(&params_path, e))?;

        let model = RecognizerModel::from_artifact(&ModelArtifact { record, params })?;
        log::info!(
            "Loaded {} model with {} labels from {}",
            model.kind(),
            model.labels().len(),
            record_path.display()
        );
        Ok(model)
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn write_part(target: &Path, bytes: &[u8]) -> Result<PathBuf, RecognitionError> {
    let part = part_path(target);
    if let Err(e) = fs::write(&part, bytes) {
        let _ = fs::remove_file(&part);
        return Err(io_error(&part, e));
    }
    Ok(part)
}

fn io_error(path: &Path, source: std::io::Error) -> RecognitionError {
    RecognitionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::algorithm_kind::AlgorithmKind;
    use crate::recognition::domain::sample::LabeledFaces;
    use crate::recognition::infrastructure::test_faces::striped_face;
    use tempfile::TempDir;

    fn trained(kind: AlgorithmKind) -> RecognizerModel {
        let datasets: Vec<LabeledFaces> = ["Alice", "Bob"]
            .iter()
            .enumerate()
            .map(|(person, name)| {
                LabeledFaces::new(*name, (0..3).map(|v| striped_face(person as u32, v, 24)).collect())
            })
            .collect();
        let mut model = RecognizerModel::new(kind);
        model.train(&datasets).unwrap();
        model
    }

    #[test]
    fn test_save_writes_record_and_params() {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::new(tmp.path().join("models"));
        store.save("eigen", &trained(AlgorithmKind::Eigen)).unwrap();

        assert!(store.exists("eigen"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.record_path("eigen")).unwrap()).unwrap();
        assert_eq!(json["algorithm"], "Eigen");
        assert_eq!(json["labels"]["0"], "Alice");
        assert_eq!(json["labels"]["1"], "Bob");
    }

    #[test]
    fn test_load_restores_saved_model() {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::new(tmp.path());
        let model = trained(AlgorithmKind::Lbph);
        store.save("lbph", &model).unwrap();

        let loaded = store.load("lbph").unwrap();
        assert_eq!(loaded.kind(), AlgorithmKind::Lbph);
        let probe = striped_face(0, 9, 24);
        assert_eq!(
            loaded.predict(&probe, 80.0).unwrap(),
            model.predict(&probe, 80.0).unwrap()
        );
    }

    #[test]
    fn test_missing_model_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = ModelStore::new(tmp.path()).load("absent").err().unwrap();
        assert!(matches!(err, RecognitionError::Io { path, .. } if path.ends_with("absent.json")));
    }

    #[test]
    fn test_swapped_params_file_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::new(tmp.path());
        store.save("eigen", &trained(AlgorithmKind::Eigen)).unwrap();
        store.save("fisher", &trained(AlgorithmKind::Fisher)).unwrap();
        fs::copy(store.params_path("fisher"), store.params_path("eigen")).unwrap();

        let err = store.load("eigen").err().unwrap();
        assert!(matches!(err, RecognitionError::ModelCorrupt(_)));
    }

    #[test]
    fn test_unparseable_record_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::new(tmp.path());
        store.save("m", &trained(AlgorithmKind::Eigen)).unwrap();
        fs::write(store.record_path("m"), "{ not json").unwrap();
        assert!(matches!(
            store.load("m").err().unwrap(),
            RecognitionError::ModelCorrupt(_)
        ));
    }

    #[test]
    fn test_saving_untrained_model_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::new(tmp.path());
        let err = store.save("m", &RecognizerModel::new(AlgorithmKind::Eigen)).unwrap_err();
        assert!(matches!(err, RecognitionError::ModelNotTrained));
        assert!(!store.exists("m"));
    }

    #[test]
    fn test_for_model_path_splits_dir_and_name() {
        let (store, name) = ModelStore::for_model_path(Path::new("models/eigen.json"));
        assert_eq!(store.dir(), Path::new("models"));
        assert_eq!(name, "eigen");

        let (store, name) = ModelStore::for_model_path(Path::new("lbph"));
        assert_eq!(store.dir(), Path::new("."));
        assert_eq!(name, "lbph");
    }

    #[test]
    fn test_successful_save_leaves_no_part_files() {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::new(tmp.path());
        store.save("m", &trained(AlgorithmKind::Lbph)).unwrap();

        assert!(!part_path(&store.record_path("m")).exists());
        assert!(!part_path(&store.params_path("m")).exists());
    }

    #[test]
    fn test_failed_params_write_keeps_previous_model() {
        let tmp = TempDir::new().unwrap();
        let store = ModelStore::new(tmp.path());
        let previous = trained(AlgorithmKind::Eigen);
        store.save("cast", &previous).unwrap();
        // a directory in the way makes the params write fail
        fs::create_dir(part_path(&store.params_path("cast"))).unwrap();

        let err = store.save("cast", &trained(AlgorithmKind::Lbph)).unwrap_err();
        assert!(matches!(err, RecognitionError::Io { .. }));
        assert!(!part_path(&store.record_path("cast")).exists());

        let loaded = store.load("cast").unwrap();
        assert_eq!(loaded.kind(), AlgorithmKind::Eigen);
        let face = striped_face(1, 7, 24);
        assert_eq!(
            loaded.predict(&face, f64::INFINITY).unwrap(),
            previous.predict(&face, f64::INFINITY).unwrap()
        );
    }
}
