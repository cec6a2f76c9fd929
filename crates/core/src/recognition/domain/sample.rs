use image::GrayImage;

use super::label_dictionary::LabelDictionary;

/// One canonical face image with the id of the person it shows.
#[derive(Clone, Debug)]
pub struct Sample {
    pub feature: GrayImage,
    pub label_id: i32,
}

impl Sample {
    pub fn new(feature: GrayImage, label_id: i32) -> Self {
        Self { feature, label_id }
    }
}

/// All face images of one person, before ids are assigned.
#[derive(Clone, Debug)]
pub struct LabeledFaces {
    pub label: String,
    pub faces: Vec<GrayImage>,
}

impl LabeledFaces {
    pub fn new(label: impl Into<String>, faces: Vec<GrayImage>) -> Self {
        Self {
            label: label.into(),
            faces,
        }
    }
}

/// Raw recognizer output: the nearest training label and its score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub label_id: i32,
    pub score: f64,
}

/// A prediction after the threshold and label lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct Identification {
    /// Accepted label id; `None` when the score failed the threshold or
    /// the id has no name.
    pub label_id: Option<i32>,
    pub label: String,
    pub score: f64,
}

impl Identification {
    pub fn is_unknown(&self) -> bool {
        self.label_id.is_none()
    }
}

/// Gives each dataset the next id, in order, and flattens the faces into
/// samples carrying that id.
pub fn assign_labels(datasets: &[LabeledFaces]) -> (LabelDictionary, Vec<Sample>) {
    let mut labels = LabelDictionary::new();
    let mut samples = Vec::with_capacity(datasets.iter().map(|d| d.faces.len()).sum());
    for dataset in datasets {
        let id = labels.assign(dataset.label.clone());
        samples.extend(dataset.faces.iter().map(|face| Sample::new(face.clone(), id)));
    }
    (labels, samples)
}
