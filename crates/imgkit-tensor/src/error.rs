use thiserror::Error;

/// An error type for buffer allocation.
#[derive(Debug, Error, PartialEq)]
pub enum TensorAllocatorError {
    /// The requested buffer could not be reserved.
    #[error("Failed to allocate {0} elements")]
    AllocationFailed(usize),

    /// The requested buffer size overflows the address space.
    #[error("Requested buffer size overflows for shape {0:?}")]
    CapacityOverflow(Vec<usize>),
}

/// An error type for tensor and spatial image operations.
#[derive(Debug, Error, PartialEq)]
pub enum TensorError {
    /// Tensor shape does not match the provided data.
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape
        expected: usize,
        /// Actual number of elements in the data
        actual: usize,
    },

    /// Index exceeds tensor bounds.
    #[error("Index {index:?} out of bounds for size {size:?}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted
        index: Vec<i64>,
        /// The extent of the buffer along each axis
        size: Vec<usize>,
    },

    /// Spacing components must be finite and strictly positive.
    #[error("Invalid spacing {0:?}: every component must be finite and > 0")]
    InvalidSpacing(Vec<f64>),

    /// Underlying storage operation failed.
    #[error("Storage error: {0}")]
    StorageError(#[from] TensorAllocatorError),
}

impl TensorError {
    /// Creates an InvalidShape error with clear context.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Creates an IndexOutOfBounds error with clear context.
    pub fn index_out_of_bounds(index: Vec<i64>, size: &[usize]) -> Self {
        Self::IndexOutOfBounds {
            index,
            size: size.to_vec(),
        }
    }

    /// Returns true if this error was caused by running out of memory.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(
            self,
            Self::StorageError(TensorAllocatorError::AllocationFailed(_))
        )
    }
}
