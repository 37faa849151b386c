use std::fmt::Debug;
use std::marker::PhantomData;

use crate::base::ImageBase;
use crate::error::ImageError;
use crate::pixel_id::PixelId;

/// A plain numeric element type with direct pixel access.
///
/// Implemented for every 8, 16, 32 and 64-bit integer and for `f32`/`f64`.
pub trait ScalarPixel:
    Copy
    + Default
    + Debug
    + PartialOrd
    + num_traits::Bounded
    + num_traits::NumCast
    + Send
    + Sync
    + 'static
{
    /// Pixel id of a scalar image with this element type.
    const PIXEL_ID: PixelId;

    /// Read a pixel of this type through the type-erased interface.
    fn get_from(image: &dyn ImageBase, idx: &[u32]) -> Result<Self, ImageError>;

    /// Write a pixel of this type through the type-erased interface.
    fn set_into(image: &dyn ImageBase, idx: &[u32], value: Self) -> Result<(), ImageError>;
}

macro_rules! impl_scalar_pixel {
    ($(($get:ident, $set:ident, $t:ty, $id:ident)),* $(,)?) => {
        $(
            impl ScalarPixel for $t {
                const PIXEL_ID: PixelId = PixelId::$id;

                fn get_from(image: &dyn ImageBase, idx: &[u32]) -> Result<Self, ImageError> {
                    image.$get(idx)
                }

                fn set_into(image: &dyn ImageBase, idx: &[u32], value: Self) -> Result<(), ImageError> {
                    image.$set(idx, value)
                }
            }
        )*
    };
}

for_each_scalar_accessor!(impl_scalar_pixel);

/// The compile-time pixel type of a backend instance.
///
/// A kind fixes both the element stored per pixel and the [`PixelId`] the
/// instance reports.
pub trait PixelKind: Send + Sync + 'static {
    /// Element stored in the native buffer for one pixel.
    type Element: Clone + Debug + Send + Sync + 'static;

    /// Pixel id reported by instances of this kind.
    const PIXEL_ID: PixelId;

    /// Zero-valued element with the given number of components.
    fn zero_element(components: usize) -> Self::Element;

    /// Number of components held by an element.
    fn components(element: &Self::Element) -> usize;
}

/// Scalar pixels of element type `T`.
pub struct Basic<T>(PhantomData<fn() -> T>);

/// Variable-length vector pixels with components of type `T`.
pub struct Vector<T>(PhantomData<fn() -> T>);

/// Label map pixels with label values of type `T`.
pub struct Label<T>(PhantomData<fn() -> T>);

/// One pixel of a vector image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorPixel<T>(pub Vec<T>);

impl<T: ScalarPixel> PixelKind for Basic<T> {
    type Element = T;
    const PIXEL_ID: PixelId = T::PIXEL_ID;

    fn zero_element(_components: usize) -> T {
        T::default()
    }

    fn components(_element: &T) -> usize {
        1
    }
}

impl<T: ScalarPixel> PixelKind for Vector<T> {
    type Element = VectorPixel<T>;
    const PIXEL_ID: PixelId = T::PIXEL_ID.vector_of();

    fn zero_element(components: usize) -> VectorPixel<T> {
        VectorPixel(vec![T::default(); components])
    }

    fn components(element: &VectorPixel<T>) -> usize {
        element.0.len()
    }
}

macro_rules! impl_label_kind {
    ($($t:ty => $id:ident),* $(,)?) => {
        $(
            impl PixelKind for Label<$t> {
                type Element = $t;
                const PIXEL_ID: PixelId = PixelId::$id;

                fn zero_element(_components: usize) -> $t {
                    0
                }

                fn components(_element: &$t) -> usize {
                    1
                }
            }
        )*
    };
}

impl_label_kind!(u8 => LabelUInt8, u16 => LabelUInt16, u32 => LabelUInt32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_ids() {
        assert_eq!(<Basic<u16> as PixelKind>::PIXEL_ID, PixelId::UInt16);
        assert_eq!(<Vector<f32> as PixelKind>::PIXEL_ID, PixelId::VectorFloat32);
        assert_eq!(<Label<u32> as PixelKind>::PIXEL_ID, PixelId::LabelUInt32);
        assert_eq!(<i8 as ScalarPixel>::PIXEL_ID, PixelId::Int8);
    }

    #[test]
    fn vector_zero_element() {
        let e = <Vector<u8> as PixelKind>::zero_element(3);
        assert_eq!(e, VectorPixel(vec![0, 0, 0]));
        assert_eq!(<Vector<u8> as PixelKind>::components(&e), 3);
    }
}
