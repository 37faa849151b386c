//! Instantiation dispatch: from a runtime (pixel id, dimension) pair to a
//! concrete [`TypedImage`].
//!
//! This module is the only place that decides which backend type to
//! instantiate. The table is generated at build time from the list of
//! supported pixel kinds, one entry per kind and dimension.

use crate::base::ImageBase;
use crate::error::ImageError;
use crate::pixel::{Basic, Label, PixelKind, ScalarPixel, Vector};
use crate::pixel_id::PixelId;
use crate::typed::TypedImage;

type Allocator = fn(&[u32], u32) -> Result<Box<dyn ImageBase>, ImageError>;

struct RegistryEntry {
    pixel_id: PixelId,
    dimension: u32,
    allocate: Allocator,
}

fn allocate_typed<K: PixelKind, const D: usize>(
    size: &[u32],
    components: u32,
) -> Result<Box<dyn ImageBase>, ImageError> {
    if size.len() != D {
        return Err(ImageError::dimension_mismatch("image size", D, size.len()));
    }
    let components = if K::PIXEL_ID.is_vector() {
        if components == 0 {
            D
        } else {
            components as usize
        }
    } else if components <= 1 {
        1
    } else {
        return Err(ImageError::ConstructionError(format!(
            "{} pixels have a single component, got {}",
            K::PIXEL_ID,
            components
        )));
    };

    let mut extent = [0usize; D];
    for (dst, &src) in extent.iter_mut().zip(size) {
        *dst = src as usize;
    }
    Ok(Box::new(TypedImage::<K, D>::allocate(extent, components)?))
}

macro_rules! registry_entries {
    ($(($kind:ty)),* $(,)?) => {
        &[
            $(
                RegistryEntry {
                    pixel_id: <$kind as PixelKind>::PIXEL_ID,
                    dimension: 2,
                    allocate: allocate_typed::<$kind, 2>,
                },
                RegistryEntry {
                    pixel_id: <$kind as PixelKind>::PIXEL_ID,
                    dimension: 3,
                    allocate: allocate_typed::<$kind, 3>,
                },
            )*
        ]
    };
}

static REGISTRY: &[RegistryEntry] = for_each_image_type!(registry_entries);

fn lookup(pixel_id: PixelId, dimension: u32) -> Result<&'static RegistryEntry, ImageError> {
    REGISTRY
        .iter()
        .find(|e| e.pixel_id == pixel_id && e.dimension == dimension)
        .ok_or(ImageError::UnsupportedPixelType {
            pixel_id,
            dimension,
        })
}

/// Whether a backend is registered for the pixel id and dimension.
pub fn is_registered(pixel_id: PixelId, dimension: u32) -> bool {
    lookup(pixel_id, dimension).is_ok()
}

/// Every registered (pixel id, dimension) pair.
pub fn registered() -> impl Iterator<Item = (PixelId, u32)> {
    REGISTRY.iter().map(|e| (e.pixel_id, e.dimension))
}

/// Allocate a zero-filled backend instance for a runtime pixel id.
///
/// The dimension is the length of `size`. For vector pixel ids a
/// `components` of 0 means one component per axis; other pixel ids accept
/// 0 or 1.
///
/// # Errors
///
/// * [`ImageError::UnsupportedPixelType`] if nothing is registered for the pair.
/// * [`ImageError::ConstructionError`] on an invalid component count.
/// * [`ImageError::TensorError`] if the buffer cannot be allocated.
pub fn allocate(
    size: &[u32],
    pixel_id: PixelId,
    components: u32,
) -> Result<Box<dyn ImageBase>, ImageError> {
    let entry = lookup(pixel_id, size.len() as u32)?;
    log::trace!(
        "allocating {}-D {} image of size {:?}",
        entry.dimension,
        pixel_id,
        size
    );
    (entry.allocate)(size, components)
}

/// A computation over a scalar backend instance of any element type.
///
/// Used with [`visit_scalar`] so that typed code can run on a type-erased
/// image without enumerating the element types itself.
pub trait ScalarImageVisitor {
    /// Result of the visit.
    type Output;

    /// Run on the concrete instance.
    fn visit<T: ScalarPixel, const D: usize>(self, image: &TypedImage<Basic<T>, D>) -> Self::Output;
}

macro_rules! visit_scalar_kinds {
    ($image:expr, $visitor:expr; $($t:ty),* $(,)?) => {{
        let any = $image.as_any();
        $(
            if let Some(typed) = any.downcast_ref::<TypedImage<Basic<$t>, 2>>() {
                return Ok($visitor.visit(typed));
            }
            if let Some(typed) = any.downcast_ref::<TypedImage<Basic<$t>, 3>>() {
                return Ok($visitor.visit(typed));
            }
        )*
    }};
}

/// Dispatch a visitor to the concrete scalar instance behind `image`.
///
/// # Errors
///
/// Vector and label images are rejected with [`ImageError::UnsupportedPixelType`].
pub fn visit_scalar<V: ScalarImageVisitor>(
    image: &dyn ImageBase,
    visitor: V,
) -> Result<V::Output, ImageError> {
    visit_scalar_kinds!(image, visitor; i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);
    Err(ImageError::UnsupportedPixelType {
        pixel_id: image.pixel_id(),
        dimension: image.dimension(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_id_is_registered() {
        for id in PixelId::ALL {
            assert!(is_registered(id, 2), "{id}");
            assert!(is_registered(id, 3), "{id}");
        }
        assert_eq!(registered().count(), PixelId::ALL.len() * 2);
    }

    #[test]
    fn lookup_miss() {
        assert_eq!(
            allocate(&[2, 2], PixelId::Unknown, 0).err(),
            Some(ImageError::UnsupportedPixelType {
                pixel_id: PixelId::Unknown,
                dimension: 2,
            })
        );
        assert!(matches!(
            allocate(&[2, 2, 2, 2], PixelId::UInt8, 0),
            Err(ImageError::UnsupportedPixelType { dimension: 4, .. })
        ));
    }

    #[test]
    fn allocate_reports_tag() -> Result<(), ImageError> {
        for (id, dim) in registered() {
            let size = vec![3; dim as usize];
            let image = allocate(&size, id, 0)?;
            assert_eq!(image.pixel_id(), id);
            assert_eq!(image.dimension(), dim);
            assert_eq!(image.size(), size);
        }
        Ok(())
    }

    #[test]
    fn vector_components_default_to_dimension() -> Result<(), ImageError> {
        let image = allocate(&[2, 2, 2], PixelId::VectorFloat32, 0)?;
        assert_eq!(image.number_of_components_per_pixel(), 3);
        let image = allocate(&[2, 2], PixelId::VectorInt16, 5)?;
        assert_eq!(image.number_of_components_per_pixel(), 5);
        Ok(())
    }

    #[test]
    fn scalar_rejects_components() {
        assert!(matches!(
            allocate(&[2, 2], PixelId::Float64, 3),
            Err(ImageError::ConstructionError(_))
        ));
    }

    struct SumVisitor;

    impl ScalarImageVisitor for SumVisitor {
        type Output = f64;

        fn visit<T: ScalarPixel, const D: usize>(self, image: &TypedImage<Basic<T>, D>) -> f64 {
            image
                .shared()
                .read()
                .as_slice()
                .iter()
                .map(|v| num_traits::cast::<T, f64>(*v).unwrap_or(0.0))
                .sum()
        }
    }

    #[test]
    fn visitor_reaches_typed_instance() -> Result<(), ImageError> {
        let image = allocate(&[2, 2], PixelId::Int16, 0)?;
        image.set_pixel_as_i16(&[0, 1], -4)?;
        image.set_pixel_as_i16(&[1, 1], 10)?;
        assert_eq!(visit_scalar(image.as_ref(), SumVisitor)?, 6.0);

        let labels = allocate(&[2, 2], PixelId::LabelUInt8, 0)?;
        assert!(visit_scalar(labels.as_ref(), SumVisitor).is_err());
        Ok(())
    }
}
