use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use imgkit_image::{visit_scalar, Basic, Image, ScalarImageVisitor, ScalarPixel, TypedImage};

use super::{run_blockwise, saturating_cast, to_f64};
use crate::config;
use crate::error::ProcessError;
use crate::native::NativeProcess;
use crate::process_object::ProcessObject;

/// Shift and scale pixel values: `out = (in + shift) * scale`.
///
/// The output has the pixel type and geometry of the input. Values outside
/// the pixel type range are clamped, and a warning reports how many were.
///
/// # Examples
///
/// ```rust
/// use imgkit_image::{Image, PixelId};
/// use imgkit_process::ShiftScaleFilter;
///
/// let mut image = Image::new(&[4, 4], PixelId::UInt8).unwrap();
/// image.set_pixel_as_u8(&[1, 1], 10).unwrap();
///
/// let filter = ShiftScaleFilter::new().with_shift(5.0).with_scale(2.0);
/// let output = filter.execute(&image).unwrap();
///
/// assert_eq!(output.get_pixel_as_u8(&[1, 1]).unwrap(), 30);
/// assert_eq!(output.get_pixel_as_u8(&[0, 0]).unwrap(), 10);
/// ```
pub struct ShiftScaleFilter {
    process_object: ProcessObject,
    shift: f64,
    scale: f64,
}

impl ShiftScaleFilter {
    /// Create the filter with shift 0 and scale 1.
    pub fn new() -> Self {
        Self {
            process_object: ProcessObject::new("ShiftScaleImageFilter"),
            shift: 0.0,
            scale: 1.0,
        }
    }

    /// Set the shift.
    pub fn with_shift(mut self, shift: f64) -> Self {
        self.shift = shift;
        self
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// The shift.
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// The scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Run the filter on `image`.
    ///
    /// # Errors
    ///
    /// * [`ProcessError::ImageError`] for vector and label images.
    /// * [`ProcessError::Aborted`] if a command aborted the run.
    pub fn execute(&self, image: &Image) -> Result<Image, ProcessError> {
        let native = Arc::new(NativeProcess::new(self.process_object.name()));
        self.process_object.pre_update(&native)?;
        let visitor = ShiftScaleVisitor {
            process: &native,
            shift: self.shift,
            scale: self.scale,
        };
        visit_scalar(image.base(), visitor)?
    }
}

impl Default for ShiftScaleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ShiftScaleFilter {
    type Target = ProcessObject;

    fn deref(&self) -> &ProcessObject {
        &self.process_object
    }
}

struct ShiftScaleVisitor<'a> {
    process: &'a NativeProcess,
    shift: f64,
    scale: f64,
}

impl ScalarImageVisitor for ShiftScaleVisitor<'_> {
    type Output = Result<Image, ProcessError>;

    fn visit<T: ScalarPixel, const D: usize>(self, image: &TypedImage<Basic<T>, D>) -> Self::Output {
        let clamped = AtomicUsize::new(0);
        let output = {
            // Commands may write the input through an alias while the run fires events.
            let src = image.shared().read().try_duplicate()?;
            let mut dst = src.new_like(T::default())?;
            run_blockwise(self.process, &src, &mut dst, |v| {
                let (out, was_clamped) =
                    saturating_cast::<T>((to_f64(*v) + self.shift) * self.scale);
                if was_clamped {
                    clamped.fetch_add(1, Ordering::Relaxed);
                }
                out
            })?;
            dst
        };

        let clamped = clamped.into_inner();
        if clamped > 0 && config::global_warning_display() {
            log::warn!(
                "{}: {} pixels clamped to the {} range",
                self.process.name(),
                clamped,
                T::PIXEL_ID
            );
        }
        Ok(Image::from_native::<Basic<T>, D>(output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use imgkit_image::{ImageError, PixelId};

    #[test]
    fn shift_scale_float() -> Result<(), ProcessError> {
        let mut image = Image::new(&[3, 2, 2], PixelId::Float32)?;
        image.set_origin(&[1.0, 2.0, 3.0])?;
        image.set_spacing(&[0.5, 0.5, 2.0])?;
        image.set_pixel_as_f32(&[2, 1, 1], 1.5)?;

        let filter = ShiftScaleFilter::new().with_shift(-0.5).with_scale(4.0);
        let output = filter.execute(&image)?;

        assert_relative_eq!(output.get_pixel_as_f32(&[2, 1, 1])?, 4.0);
        assert_relative_eq!(output.get_pixel_as_f32(&[0, 0, 0])?, -2.0);
        assert_eq!(output.origin(), image.origin());
        assert_eq!(output.spacing(), image.spacing());
        assert_eq!(output.pixel_id(), PixelId::Float32);
        assert_eq!(image.get_pixel_as_f32(&[2, 1, 1])?, 1.5);
        Ok(())
    }

    #[test]
    fn shift_scale_clamps_integers() -> Result<(), ProcessError> {
        let mut image = Image::new(&[2, 2], PixelId::Int8)?;
        image.set_pixel_as_i8(&[0, 0], 100)?;
        image.set_pixel_as_i8(&[1, 0], -100)?;

        let output = ShiftScaleFilter::new().with_scale(2.0).execute(&image)?;
        assert_eq!(output.get_pixel_as_i8(&[0, 0])?, i8::MAX);
        assert_eq!(output.get_pixel_as_i8(&[1, 0])?, i8::MIN);
        assert_eq!(output.get_pixel_as_i8(&[1, 1])?, 0);
        Ok(())
    }

    #[test]
    fn shift_scale_rejects_vector_images() -> Result<(), ProcessError> {
        let image = Image::new(&[2, 2], PixelId::VectorFloat64)?;
        let res = ShiftScaleFilter::new().execute(&image);
        assert_eq!(
            res.err(),
            Some(ProcessError::ImageError(ImageError::UnsupportedPixelType {
                pixel_id: PixelId::VectorFloat64,
                dimension: 2,
            }))
        );
        Ok(())
    }

    #[test]
    fn filter_is_idle_after_execute() -> Result<(), ProcessError> {
        let image = Image::new(&[8, 8], PixelId::UInt16)?;
        let filter = ShiftScaleFilter::new();
        filter.execute(&image)?;
        assert!(!filter.is_active());
        assert_relative_eq!(filter.progress(), 1.0);
        Ok(())
    }
}
