use std::any::Any;
use std::fmt::Debug;

use crate::error::ImageError;
use crate::pixel_id::PixelId;

macro_rules! declare_pixel_accessors {
    ($(($get:ident, $set:ident, $t:ty, $id:ident)),* $(,)?) => {
        $(
            #[doc = concat!("Get the pixel at `idx` of an image whose pixels are `", stringify!($t), "`.")]
            fn $get(&self, idx: &[u32]) -> Result<$t, ImageError>;

            #[doc = concat!("Set the pixel at `idx` of an image whose pixels are `", stringify!($t), "`.")]
            fn $set(&self, idx: &[u32], value: $t) -> Result<(), ImageError>;
        )*
    };
}

/// The non-generic interface shared by every backend instance.
///
/// One implementation exists per (pixel kind, dimension) pair, see
/// [`crate::TypedImage`]. Callers normally go through [`crate::Image`], which
/// owns a boxed `ImageBase`.
///
/// Setters take `&self`: the native storage is shared between shallow copies
/// and every mutation is visible through all of them.
pub trait ImageBase: Any + Debug + Send + Sync {
    /// Pixel id of the instance, fixed for its lifetime.
    fn pixel_id(&self) -> PixelId;

    /// Number of axes, 2 or 3.
    fn dimension(&self) -> u32;

    /// Components per pixel; 1 unless the image is a vector image.
    fn number_of_components_per_pixel(&self) -> u32;

    /// A new instance sharing the same native storage.
    fn shallow_copy(&self) -> Box<dyn ImageBase>;

    /// A new instance with duplicated native storage.
    fn deep_copy(&self) -> Result<Box<dyn ImageBase>, ImageError>;

    /// Physical coordinates of the first pixel.
    fn origin(&self) -> Vec<f64>;

    /// Set the physical coordinates of the first pixel.
    fn set_origin(&self, origin: &[f64]) -> Result<(), ImageError>;

    /// Physical distance between adjacent pixels along each axis.
    fn spacing(&self) -> Vec<f64>;

    /// Set the physical distance between adjacent pixels along each axis.
    fn set_spacing(&self, spacing: &[f64]) -> Result<(), ImageError>;

    /// Index of the pixel nearest to a physical point.
    fn transform_physical_point_to_index(&self, point: &[f64]) -> Result<Vec<i64>, ImageError>;

    /// Physical point of a pixel index.
    fn transform_index_to_physical_point(&self, index: &[i64]) -> Result<Vec<f64>, ImageError>;

    /// Extent along each axis.
    fn size(&self) -> Vec<u32>;

    /// Extent along one axis, 0 when `axis` is not an axis of the image.
    fn size_along(&self, axis: u32) -> u32;

    /// Human readable dump of the native state.
    fn describe(&self) -> String;

    /// Number of live owners of the native storage.
    fn reference_count(&self) -> usize;

    /// Access to the concrete instance for typed consumers.
    fn as_any(&self) -> &dyn Any;

    for_each_scalar_accessor!(declare_pixel_accessors);
}
