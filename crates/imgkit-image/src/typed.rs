use std::any::Any;
use std::fmt;
use std::sync::Arc;

use imgkit_tensor::SpatialImage;
use parking_lot::RwLock;

use crate::base::ImageBase;
use crate::error::ImageError;
use crate::pixel::{PixelKind, ScalarPixel};
use crate::pixel_id::PixelId;

/// Native storage shared between the shallow copies of an image.
pub type SharedImage<K, const D: usize> = Arc<RwLock<SpatialImage<<K as PixelKind>::Element, D>>>;

/// The backend instance for one concrete pixel kind and dimension.
///
/// It holds the native [`SpatialImage`] behind a reference-counted lock;
/// [`ImageBase::shallow_copy`] clones the reference, [`ImageBase::deep_copy`]
/// duplicates the buffer.
pub struct TypedImage<K: PixelKind, const D: usize> {
    image: SharedImage<K, D>,
    components: usize,
}

impl<K: PixelKind, const D: usize> TypedImage<K, D> {
    /// Wrap a native image.
    ///
    /// # Errors
    ///
    /// Only 2 and 3 dimensional images are supported.
    pub fn new(image: SpatialImage<K::Element, D>) -> Result<Self, ImageError> {
        Self::check_dimension()?;
        let components = image.as_slice().first().map_or(1, K::components);
        Ok(Self {
            image: Arc::new(RwLock::new(image)),
            components,
        })
    }

    /// Allocate a zero-filled native image.
    ///
    /// # Errors
    ///
    /// Fails on unsupported dimensions or when the buffer cannot be allocated.
    pub fn allocate(size: [usize; D], components: usize) -> Result<Self, ImageError> {
        Self::check_dimension()?;
        let image = SpatialImage::new(size, K::zero_element(components))?;
        Ok(Self {
            image: Arc::new(RwLock::new(image)),
            components,
        })
    }

    /// The shared native storage.
    pub fn shared(&self) -> &SharedImage<K, D> {
        &self.image
    }

    fn check_dimension() -> Result<(), ImageError> {
        if D == 2 || D == 3 {
            Ok(())
        } else {
            Err(ImageError::ConstructionError(format!(
                "image dimension {} out of range, only 2 and 3 are supported",
                D
            )))
        }
    }

    fn to_array<T: Copy + Default>(
        method: &'static str,
        values: &[T],
    ) -> Result<[T; D], ImageError> {
        if values.len() != D {
            return Err(ImageError::dimension_mismatch(method, D, values.len()));
        }
        let mut out = [T::default(); D];
        out.copy_from_slice(values);
        Ok(out)
    }

    fn convert_index(idx: &[u32]) -> Result<[usize; D], ImageError> {
        if idx.len() < D {
            return Err(ImageError::dimension_mismatch("image index", D, idx.len()));
        }
        let mut index = [0usize; D];
        for (dst, &src) in index.iter_mut().zip(idx) {
            *dst = src as usize;
        }
        Ok(index)
    }

    /// Reject access through element type `T` before any storage is touched.
    fn check_access<T: ScalarPixel>(method: &'static str) -> Result<(), ImageError> {
        if K::PIXEL_ID.is_vector() {
            return Err(ImageError::UnsupportedOperation(format!(
                "{method} is not supported for vector images, the image is of type: {}",
                K::PIXEL_ID
            )));
        }
        if T::PIXEL_ID != K::PIXEL_ID {
            return Err(ImageError::TypeMismatch {
                method,
                expected: T::PIXEL_ID,
                actual: K::PIXEL_ID,
            });
        }
        Ok(())
    }

    fn internal_get_pixel<T: ScalarPixel>(
        &self,
        method: &'static str,
        idx: &[u32],
    ) -> Result<T, ImageError> {
        Self::check_access::<T>(method)?;
        let index = Self::convert_index(idx)?;
        let image = self.image.read();
        let pixel: &dyn Any = image.get_pixel(index)?;
        pixel
            .downcast_ref::<T>()
            .copied()
            .ok_or(ImageError::TypeMismatch {
                method,
                expected: T::PIXEL_ID,
                actual: K::PIXEL_ID,
            })
    }

    fn internal_set_pixel<T: ScalarPixel>(
        &self,
        method: &'static str,
        idx: &[u32],
        value: T,
    ) -> Result<(), ImageError> {
        Self::check_access::<T>(method)?;
        let index = Self::convert_index(idx)?;
        let mut image = self.image.write();
        let pixel: &mut dyn Any = image.get_pixel_mut(index)?;
        match pixel.downcast_mut::<T>() {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ImageError::TypeMismatch {
                method,
                expected: T::PIXEL_ID,
                actual: K::PIXEL_ID,
            }),
        }
    }
}

macro_rules! impl_pixel_accessors {
    ($(($get:ident, $set:ident, $t:ty, $id:ident)),* $(,)?) => {
        $(
            fn $get(&self, idx: &[u32]) -> Result<$t, ImageError> {
                self.internal_get_pixel::<$t>(stringify!($get), idx)
            }

            fn $set(&self, idx: &[u32], value: $t) -> Result<(), ImageError> {
                self.internal_set_pixel::<$t>(stringify!($set), idx, value)
            }
        )*
    };
}

impl<K: PixelKind, const D: usize> ImageBase for TypedImage<K, D> {
    fn pixel_id(&self) -> PixelId {
        K::PIXEL_ID
    }

    fn dimension(&self) -> u32 {
        D as u32
    }

    fn number_of_components_per_pixel(&self) -> u32 {
        self.components as u32
    }

    fn shallow_copy(&self) -> Box<dyn ImageBase> {
        Box::new(Self {
            image: Arc::clone(&self.image),
            components: self.components,
        })
    }

    fn deep_copy(&self) -> Result<Box<dyn ImageBase>, ImageError> {
        if K::PIXEL_ID.is_label() {
            return Err(ImageError::UnsupportedOperation(format!(
                "deep copy is not implemented for label images of type: {}",
                K::PIXEL_ID
            )));
        }
        let duplicate = self.image.read().try_duplicate()?;
        Ok(Box::new(Self {
            image: Arc::new(RwLock::new(duplicate)),
            components: self.components,
        }))
    }

    fn origin(&self) -> Vec<f64> {
        self.image.read().origin().to_vec()
    }

    fn set_origin(&self, origin: &[f64]) -> Result<(), ImageError> {
        let origin = Self::to_array("set_origin", origin)?;
        self.image.write().set_origin(origin);
        Ok(())
    }

    fn spacing(&self) -> Vec<f64> {
        self.image.read().spacing().to_vec()
    }

    fn set_spacing(&self, spacing: &[f64]) -> Result<(), ImageError> {
        let spacing = Self::to_array("set_spacing", spacing)?;
        self.image.write().set_spacing(spacing)?;
        Ok(())
    }

    fn transform_physical_point_to_index(&self, point: &[f64]) -> Result<Vec<i64>, ImageError> {
        let point = Self::to_array("transform_physical_point_to_index", point)?;
        Ok(self
            .image
            .read()
            .transform_physical_point_to_index(point)
            .to_vec())
    }

    fn transform_index_to_physical_point(&self, index: &[i64]) -> Result<Vec<f64>, ImageError> {
        let index = Self::to_array("transform_index_to_physical_point", index)?;
        Ok(self
            .image
            .read()
            .transform_index_to_physical_point(index)
            .to_vec())
    }

    fn size(&self) -> Vec<u32> {
        self.image.read().size().iter().map(|&s| s as u32).collect()
    }

    fn size_along(&self, axis: u32) -> u32 {
        self.image
            .read()
            .size()
            .get(axis as usize)
            .map_or(0, |&s| s as u32)
    }

    fn describe(&self) -> String {
        format!(
            "{}\n  PixelID: {}\n  ComponentsPerPixel: {}\n  ReferenceCount: {}",
            self.image.read(),
            K::PIXEL_ID,
            self.components,
            self.reference_count()
        )
    }

    fn reference_count(&self) -> usize {
        Arc::strong_count(&self.image)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    for_each_scalar_accessor!(impl_pixel_accessors);
}

impl<K: PixelKind, const D: usize> fmt::Debug for TypedImage<K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedImage")
            .field("pixel_id", &K::PIXEL_ID)
            .field("dimension", &D)
            .field("size", &self.image.read().size())
            .field("reference_count", &self.reference_count())
            .finish()
    }
}
