use crate::recognition::domain::algorithm_kind::AlgorithmKind;
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::recognition::domain::recognition_error::RecognitionError;

use super::eigen_recognizer::EigenRecognizer;
use super::fisher_recognizer::FisherRecognizer;
use super::lbph_recognizer::LbphRecognizer;
use super::params_codec;

/// Creates an untrained recognizer of the given kind.
pub fn create_recognizer(kind: AlgorithmKind) -> Box<dyn FaceRecognizer> {
    log::debug!("Creating {kind} recognizer");
    match kind {
        AlgorithmKind::Eigen => Box::new(EigenRecognizer::new()),
        AlgorithmKind::Fisher => Box::new(FisherRecognizer::new()),
        AlgorithmKind::Lbph => Box::new(LbphRecognizer::new()),
    }
}

/// Rebuilds a trained recognizer from a blob written by
/// [`FaceRecognizer::export_params`].
///
/// Fails with `ModelCorrupt` when the blob was produced by a different
/// kind or cannot be decoded.
pub fn restore_recognizer(
    kind: AlgorithmKind,
    blob: &[u8],
) -> Result<Box<dyn FaceRecognizer>, RecognitionError> {
    let found = params_codec::peek_kind(blob)?;
    if found != kind {
        return Err(RecognitionError::ModelCorrupt(format!(
            "model record says {kind} but parameters were produced by {found}"
        )));
    }
    Ok(match kind {
        AlgorithmKind::Eigen => Box::new(EigenRecognizer::from_params(blob)?),
        AlgorithmKind::Fisher => Box::new(FisherRecognizer::from_params(blob)?),
        AlgorithmKind::Lbph => Box::new(LbphRecognizer::from_params(blob)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::infrastructure::test_faces::{striped_face, striped_samples};

    #[test]
    fn test_created_recognizer_reports_its_kind() {
        for kind in AlgorithmKind::ALL {
            let recognizer = create_recognizer(kind);
            assert_eq!(recognizer.kind(), kind);
            assert!(!recognizer.is_trained());
        }
    }

    #[test]
    fn test_every_kind_trains_and_restores() {
        let samples = striped_samples(2, 3, 24);
        let probe = striped_face(0, 11, 24);
        for kind in AlgorithmKind::ALL {
            let mut recognizer = create_recognizer(kind);
            recognizer.train(&samples).unwrap();
            let restored = restore_recognizer(kind, &recognizer.export_params().unwrap()).unwrap();
            assert_eq!(restored.kind(), kind);
            assert_eq!(
                restored.predict(&probe).unwrap(),
                recognizer.predict(&probe).unwrap()
            );
        }
    }

    #[test]
    fn test_restore_with_mismatched_kind_is_corrupt() {
        let mut eigen = create_recognizer(AlgorithmKind::Eigen);
        eigen.train(&striped_samples(2, 2, 24)).unwrap();
        let blob = eigen.export_params().unwrap();
        let err = restore_recognizer(AlgorithmKind::Fisher, &blob).err().unwrap();
        assert!(matches!(err, RecognitionError::ModelCorrupt(_)));
    }
}
