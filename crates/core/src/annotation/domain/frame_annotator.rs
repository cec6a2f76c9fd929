use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// A face box together with the name to print next to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub region: Region,
    pub label: String,
}

impl Annotation {
    pub fn new(region: Region, label: impl Into<String>) -> Self {
        Self {
            region,
            label: label.into(),
        }
    }
}

/// Domain interface for drawing identification results onto a frame.
///
/// Implementations modify the frame in-place (`&mut Frame`) to avoid allocation.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        annotations: &[Annotation],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
