use imgkit_tensor::TensorError;

use crate::pixel_id::PixelId;

/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// The backend instance could not be created.
    #[error("Failed to construct image: {0}")]
    ConstructionError(String),

    /// A coordinate vector does not have one component per image axis.
    #[error("{method}: vector dimension mismatch, expected {expected} components but got {actual}")]
    DimensionMismatch {
        /// Operation that rejected the vector
        method: &'static str,
        /// Number of components required
        expected: usize,
        /// Number of components provided
        actual: usize,
    },

    /// The requested element type is not the element type of the image.
    #[error("The image is of type: {actual} but the {method} access method requires type: {expected}!")]
    TypeMismatch {
        /// Access method that was called
        method: &'static str,
        /// Pixel id implied by the access method
        expected: PixelId,
        /// Pixel id of the image
        actual: PixelId,
    },

    /// The operation is not available for this kind of image.
    #[error("{0}")]
    UnsupportedOperation(String),

    /// No backend instance is registered for this pixel id and dimension.
    #[error("Unsupported pixel type: {pixel_id} in {dimension} dimensions")]
    UnsupportedPixelType {
        /// Requested pixel id
        pixel_id: PixelId,
        /// Requested dimension
        dimension: u32,
    },

    /// The native backend rejected the operation.
    #[error(transparent)]
    TensorError(#[from] TensorError),
}

impl ImageError {
    pub(crate) fn dimension_mismatch(method: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            method,
            expected,
            actual,
        }
    }
}
