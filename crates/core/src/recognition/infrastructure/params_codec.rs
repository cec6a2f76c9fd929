use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::recognition::domain::algorithm_kind::AlgorithmKind;
use crate::recognition::domain::recognition_error::RecognitionError;

const MAGIC: &[u8; 4] = b"CWRP";
const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 2;

/// Wraps bincode-encoded recognizer state in a header naming its kind.
///
/// Layout: `"CWRP"`, format version, algorithm tag, payload.
pub fn encode<T: Serialize>(kind: AlgorithmKind, state: &T) -> Result<Vec<u8>, RecognitionError> {
    let mut blob = Vec::with_capacity(HEADER_LEN);
    blob.extend_from_slice(MAGIC);
    blob.push(VERSION);
    blob.push(kind.tag());
    bincode::serialize_into(&mut blob, state).map_err(|e| {
        RecognitionError::ModelCorrupt(format!("cannot encode {kind} parameters: {e}"))
    })?;
    Ok(blob)
}

/// Reads the kind recorded in a blob header.
pub fn peek_kind(blob: &[u8]) -> Result<AlgorithmKind, RecognitionError> {
    if blob.len() < HEADER_LEN || &blob[..MAGIC.len()] != MAGIC {
        return Err(RecognitionError::ModelCorrupt(
            "parameter blob has no recognizer header".to_string(),
        ));
    }
    let version = blob[MAGIC.len()];
    if version != VERSION {
        return Err(RecognitionError::ModelCorrupt(format!(
            "unsupported parameter format version {version}"
        )));
    }
    let tag = blob[MAGIC.len() + 1];
    AlgorithmKind::from_tag(tag)
        .ok_or_else(|| RecognitionError::ModelCorrupt(format!("unknown algorithm tag {tag}")))
}

/// Decodes a blob, failing unless it was produced by `expected`.
pub fn decode<T: DeserializeOwned>(
    expected: AlgorithmKind,
    blob: &[u8],
) -> Result<T, RecognitionError> {
    let found = peek_kind(blob)?;
    if found != expected {
        return Err(RecognitionError::ModelCorrupt(format!(
            "parameters were produced by {found}, expected {expected}"
        )));
    }
    bincode::deserialize(&blob[HEADER_LEN..]).map_err(|e| {
        RecognitionError::ModelCorrupt(format!("cannot decode {expected} parameters: {e}"))
    })
}
