use std::fmt;

use imgkit_tensor::SpatialImage;

use crate::base::ImageBase;
use crate::error::ImageError;
use crate::factory;
use crate::pixel::{PixelKind, ScalarPixel};
use crate::pixel_id::{ImageTypeId, PixelId};
use crate::typed::{SharedImage, TypedImage};

macro_rules! facade_pixel_accessors {
    ($(($get:ident, $set:ident, $t:ty, $id:ident)),* $(,)?) => {
        $(
            #[doc = concat!("Get the pixel at `idx` of an image whose pixels are `", stringify!($t), "`.")]
            ///
            /// Only the first `dimension` components of `idx` are used.
            ///
            /// # Errors
            ///
            /// `TypeMismatch` if the image holds another element type,
            /// `UnsupportedOperation` for vector images, `DimensionMismatch`
            /// if `idx` is too short and `IndexOutOfBounds` outside the image.
            pub fn $get(&self, idx: &[u32]) -> Result<$t, ImageError> {
                self.base.$get(idx)
            }

            #[doc = concat!("Set the pixel at `idx` of an image whose pixels are `", stringify!($t), "`.")]
            ///
            /// The write is visible through every shallow copy of this image.
            pub fn $set(&mut self, idx: &[u32], value: $t) -> Result<(), ImageError> {
                self.base.$set(idx, value)
            }
        )*
    };
}

/// A type-erased image handle.
///
/// The handle owns one backend instance whose pixel type and dimension are
/// only known at runtime. Cloning is a shallow copy: both handles share the
/// pixel buffer and geometry. Use [`Image::deep_copy`] for an independent
/// image.
///
/// # Examples
///
/// ```
/// use imgkit_image::{Image, PixelId};
///
/// let mut image = Image::new(&[64, 48], PixelId::UInt16).unwrap();
/// image.set_pixel_as_u16(&[3, 4], 1024).unwrap();
/// assert_eq!(image.get_pixel_as_u16(&[3, 4]), Ok(1024));
/// assert!(image.get_pixel_as_f32(&[3, 4]).is_err());
/// ```
pub struct Image {
    base: Box<dyn ImageBase>,
}

impl Image {
    /// Create a zero-filled image of a runtime pixel type.
    ///
    /// The dimension is the length of `size`. Vector images get one component per axis.
    ///
    /// # Errors
    ///
    /// Fails with `UnsupportedPixelType` if no backend is registered for the pixel id and dimension.
    pub fn new(size: &[u32], pixel_id: PixelId) -> Result<Self, ImageError> {
        Self::with_components(size, pixel_id, 0)
    }

    /// Create a zero-filled image with an explicit number of components per pixel.
    ///
    /// `components` of 0 picks the default for the pixel id.
    pub fn with_components(
        size: &[u32],
        pixel_id: PixelId,
        components: u32,
    ) -> Result<Self, ImageError> {
        Ok(Self {
            base: factory::allocate(size, pixel_id, components)?,
        })
    }

    /// Wrap a native image of a known kind and dimension.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgkit_image::{Basic, Image, PixelId};
    /// use imgkit_tensor::SpatialImage;
    ///
    /// let native = SpatialImage::<f32, 3>::new([4, 4, 4], 0.5).unwrap();
    /// let image = Image::from_native::<Basic<f32>, 3>(native).unwrap();
    /// assert_eq!(image.pixel_id(), PixelId::Float32);
    /// ```
    pub fn from_native<K: PixelKind, const D: usize>(
        image: SpatialImage<K::Element, D>,
    ) -> Result<Self, ImageError> {
        Ok(Self::from_base(Box::new(TypedImage::<K, D>::new(image)?)))
    }

    /// Wrap a backend instance.
    pub fn from_base(base: Box<dyn ImageBase>) -> Self {
        Self { base }
    }

    /// Wrap a backend instance handed over by an external producer.
    ///
    /// # Errors
    ///
    /// A missing instance is rejected with `ConstructionError`.
    pub fn try_from_base(base: Option<Box<dyn ImageBase>>) -> Result<Self, ImageError> {
        base.map(Self::from_base).ok_or_else(|| {
            ImageError::ConstructionError("unable to initialize an image with a null instance".into())
        })
    }

    /// The backend instance.
    pub fn base(&self) -> &dyn ImageBase {
        self.base.as_ref()
    }

    /// The shared native storage, if the image is of kind `K` in `D` dimensions.
    pub fn native<K: PixelKind, const D: usize>(&self) -> Option<SharedImage<K, D>> {
        self.base
            .as_any()
            .downcast_ref::<TypedImage<K, D>>()
            .map(|typed| typed.shared().clone())
    }

    /// A new handle sharing this image's storage.
    pub fn shallow_copy(&self) -> Self {
        Self {
            base: self.base.shallow_copy(),
        }
    }

    /// A new handle with duplicated storage.
    ///
    /// # Errors
    ///
    /// Label images cannot be deep copied yet and fail with `UnsupportedOperation`.
    pub fn deep_copy(&self) -> Result<Self, ImageError> {
        Ok(Self {
            base: self.base.deep_copy()?,
        })
    }

    /// Pixel id of the image.
    pub fn pixel_id(&self) -> PixelId {
        self.base.pixel_id()
    }

    /// Number of axes.
    pub fn dimension(&self) -> u32 {
        self.base.dimension()
    }

    /// Combined pixel id and dimension.
    pub fn image_type_id(&self) -> ImageTypeId {
        ImageTypeId::new(self.pixel_id(), self.dimension())
    }

    /// Components per pixel.
    pub fn number_of_components_per_pixel(&self) -> u32 {
        self.base.number_of_components_per_pixel()
    }

    /// Physical coordinates of the first pixel.
    pub fn origin(&self) -> Vec<f64> {
        self.base.origin()
    }

    /// Set the physical coordinates of the first pixel.
    ///
    /// # Errors
    ///
    /// `origin` must have one component per axis.
    pub fn set_origin(&mut self, origin: &[f64]) -> Result<(), ImageError> {
        self.base.set_origin(origin)
    }

    /// Physical distance between adjacent pixels.
    pub fn spacing(&self) -> Vec<f64> {
        self.base.spacing()
    }

    /// Set the physical distance between adjacent pixels.
    ///
    /// # Errors
    ///
    /// `spacing` must have one finite, positive component per axis.
    pub fn set_spacing(&mut self, spacing: &[f64]) -> Result<(), ImageError> {
        self.base.set_spacing(spacing)
    }

    /// Index of the pixel nearest to a physical point.
    pub fn transform_physical_point_to_index(&self, point: &[f64]) -> Result<Vec<i64>, ImageError> {
        self.base.transform_physical_point_to_index(point)
    }

    /// Physical point of a pixel index.
    pub fn transform_index_to_physical_point(&self, index: &[i64]) -> Result<Vec<f64>, ImageError> {
        self.base.transform_index_to_physical_point(index)
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec<u32> {
        self.base.size()
    }

    /// Extent along `axis`, 0 if the image has no such axis.
    pub fn size_along(&self, axis: u32) -> u32 {
        self.base.size_along(axis)
    }

    /// Extent along the first axis.
    pub fn width(&self) -> u32 {
        self.size_along(0)
    }

    /// Extent along the second axis.
    pub fn height(&self) -> u32 {
        self.size_along(1)
    }

    /// Extent along the third axis, 0 for 2-D images.
    pub fn depth(&self) -> u32 {
        self.size_along(2)
    }

    /// Number of handles sharing the storage of this image.
    pub fn reference_count(&self) -> usize {
        self.base.reference_count()
    }

    /// Read a pixel with the element type chosen by type inference.
    ///
    /// Equivalent to the `get_pixel_as_*` method for `T`.
    pub fn get_pixel<T: ScalarPixel>(&self, idx: &[u32]) -> Result<T, ImageError> {
        T::get_from(self.base.as_ref(), idx)
    }

    /// Write a pixel with the element type chosen by type inference.
    pub fn set_pixel<T: ScalarPixel>(&mut self, idx: &[u32], value: T) -> Result<(), ImageError> {
        T::set_into(self.base.as_ref(), idx, value)
    }

    for_each_scalar_accessor!(facade_pixel_accessors);
}

impl Clone for Image {
    fn clone(&self) -> Self {
        self.shallow_copy()
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base.describe())
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Image").field(&self.base).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{Basic, Label};
    use approx::assert_relative_eq;

    #[test]
    fn null_instance_rejected() {
        assert!(matches!(
            Image::try_from_base(None),
            Err(ImageError::ConstructionError(_))
        ));
    }

    #[test]
    fn geometry_round_trip() -> Result<(), ImageError> {
        let mut image = Image::new(&[10, 10], PixelId::Float64)?;
        assert_eq!(image.origin(), vec![0.0, 0.0]);
        assert_eq!(image.spacing(), vec![1.0, 1.0]);

        let index = image.transform_physical_point_to_index(&[2.3, 4.7])?;
        assert_eq!(index, vec![2, 5]);
        let point = image.transform_index_to_physical_point(&index)?;
        assert_relative_eq!(point[0], 2.0);
        assert_relative_eq!(point[1], 5.0);

        image.set_spacing(&[0.5, 2.0])?;
        assert_eq!(
            image.transform_physical_point_to_index(&[2.3, 4.7])?,
            vec![5, 2]
        );
        assert!(image.transform_index_to_physical_point(&[1]).is_err());
        Ok(())
    }

    #[test]
    fn set_origin_checks_length() -> Result<(), ImageError> {
        let mut image = Image::new(&[4, 4, 4], PixelId::UInt8)?;
        assert_eq!(
            image.set_origin(&[1.0]),
            Err(ImageError::DimensionMismatch {
                method: "set_origin",
                expected: 3,
                actual: 1,
            })
        );
        image.set_origin(&[1.0, 2.0, 3.0])?;
        assert_eq!(image.origin(), vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn size_along_out_of_range() -> Result<(), ImageError> {
        let image = Image::new(&[7, 5], PixelId::Int32)?;
        assert_eq!(image.size(), vec![7, 5]);
        assert_eq!(image.size_along(1), 5);
        assert_eq!(image.size_along(2), 0);
        assert_eq!(image.depth(), 0);
        assert_eq!(image.size_along(u32::MAX), 0);
        Ok(())
    }

    #[test]
    fn clone_is_shallow() -> Result<(), ImageError> {
        let mut image = Image::new(&[3, 3], PixelId::UInt32)?;
        let alias = image.clone();
        assert_eq!(image.reference_count(), 2);
        image.set_pixel_as_u32(&[2, 2], 9)?;
        assert_eq!(alias.get_pixel_as_u32(&[2, 2])?, 9);
        Ok(())
    }

    #[test]
    fn generic_pixel_access() -> Result<(), ImageError> {
        let mut image = Image::new(&[3, 3], PixelId::Int8)?;
        image.set_pixel(&[1, 2], -5i8)?;
        assert_eq!(image.get_pixel::<i8>(&[1, 2])?, -5);
        assert!(image.get_pixel::<u8>(&[1, 2]).is_err());
        Ok(())
    }

    #[test]
    fn label_pixels_need_label_access() -> Result<(), ImageError> {
        let image = Image::new(&[2, 2], PixelId::LabelUInt8)?;
        assert_eq!(
            image.get_pixel_as_u8(&[0, 0]),
            Err(ImageError::TypeMismatch {
                method: "get_pixel_as_u8",
                expected: PixelId::UInt8,
                actual: PixelId::LabelUInt8,
            })
        );
        assert!(image.native::<Label<u8>, 2>().is_some());
        assert!(image.native::<Basic<u8>, 2>().is_none());
        Ok(())
    }

    #[test]
    fn display_dump() -> Result<(), ImageError> {
        let image = Image::new(&[4, 3], PixelId::UInt16)?;
        let text = image.to_string();
        assert!(text.contains("Size: [4, 3]"));
        assert!(text.contains("PixelID: 16-bit unsigned integer"));
        assert!(text.contains("ReferenceCount: 1"));
        Ok(())
    }
}
