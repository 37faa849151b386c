#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! The native images of `imgkit-tensor` are generic over their element type
//! and dimension. This crate hides both parameters behind [`Image`], a handle
//! whose pixel type is a runtime [`PixelId`]:
//!
//! - [`PixelId`]: registry of supported pixel types with stable integer values
//! - [`TypedImage`]: the backend instance for one pixel kind and dimension
//! - [`ImageBase`]: the object-safe interface every backend implements
//! - [`Image`]: the handle callers use
//! - [`factory`]: runtime instantiation from a pixel id and a size
//!
//! ```rust
//! use imgkit_image::{Image, ImageError, PixelId};
//!
//! let pixel_id = PixelId::from_value(8);
//! let mut image = Image::new(&[16, 16, 4], pixel_id).unwrap();
//! image.set_pixel_as_f32(&[1, 2, 3], 0.25).unwrap();
//!
//! assert!(matches!(
//!     image.get_pixel_as_f64(&[1, 2, 3]),
//!     Err(ImageError::TypeMismatch { .. })
//! ));
//! ```

#[macro_use]
mod macros;

/// The object-safe backend interface.
pub mod base;

/// Error types for the image module.
pub mod error;

pub mod factory;

/// The type-erased image handle.
pub mod image;

/// Compile-time pixel kinds and scalar element types.
pub mod pixel;

/// Runtime pixel type identifiers.
pub mod pixel_id;

/// Backend instances for a concrete pixel kind and dimension.
pub mod typed;

pub use crate::base::ImageBase;
pub use crate::error::ImageError;
pub use crate::factory::{visit_scalar, ScalarImageVisitor};
pub use crate::image::Image;
pub use crate::pixel::{Basic, Label, PixelKind, ScalarPixel, Vector, VectorPixel};
pub use crate::pixel_id::{ImageTypeId, PixelId};
pub use crate::typed::{SharedImage, TypedImage};
