pub mod eigen_recognizer;
pub mod features;
pub mod fisher_recognizer;
pub mod lbph_recognizer;
pub mod model_store;
pub mod params_codec;
pub mod recognizer_factory;
pub mod subspace;

#[cfg(test)]
pub(crate) mod test_faces;
