use imgkit_image::ImageError;

use crate::parallel::ParallelError;

/// An error type for process objects and filters.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProcessError {
    /// The process object is idle.
    #[error("No active native operation for process object: {0}")]
    NoActiveOperation(String),

    /// An internal table is out of sync with the enums it maps.
    #[error("Logic error: {0}")]
    LogicError(String),

    /// The process object is still observing another native operation.
    #[error("Process object {0} is already running a native operation")]
    AlreadyActive(String),

    /// A filter parameter is out of its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A command requested the operation to stop.
    #[error("{0} was aborted")]
    Aborted(String),

    /// Error from the image layer.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// Error from the parallel executor.
    #[error(transparent)]
    ParallelError(#[from] ParallelError),
}

impl From<imgkit_tensor::TensorError> for ProcessError {
    fn from(e: imgkit_tensor::TensorError) -> Self {
        ProcessError::ImageError(ImageError::TensorError(e))
    }
}
