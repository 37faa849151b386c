#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `imgkit-tensor` is the native numeric backend of imgkit. It owns pixel
//! buffers and the geometry that places them in physical space, and knows
//! nothing about runtime pixel types.
//!
//! - **Tensor**: contiguous n-dimensional buffer with shape and strides
//! - **SpatialImage**: a tensor plus origin and spacing, with index and
//!   physical point conversions
//!
//! ```rust
//! use imgkit_tensor::SpatialImage;
//!
//! let mut image = SpatialImage::<f32, 3>::new([4, 4, 2], 0.0).unwrap();
//! image.set_origin([1.0, 1.0, 1.0]);
//! assert_eq!(image.transform_physical_point_to_index([3.1, 1.0, 1.0]), [2, 0, 0]);
//! ```

/// Error types for the tensor module.
pub mod error;

/// Images with physical geometry.
pub mod spatial;

/// Tensor module containing the n-dimensional buffer.
pub mod tensor;

pub use crate::error::{TensorAllocatorError, TensorError};
pub use crate::spatial::SpatialImage;
pub use crate::tensor::Tensor;
