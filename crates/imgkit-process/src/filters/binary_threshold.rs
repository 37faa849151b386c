use std::ops::Deref;
use std::sync::Arc;

use imgkit_image::{visit_scalar, Basic, Image, ScalarImageVisitor, ScalarPixel, TypedImage};

use super::{run_blockwise, to_f64};
use crate::error::ProcessError;
use crate::native::NativeProcess;
use crate::process_object::ProcessObject;

/// Binarize an image: pixels in `[lower, upper]` become `inside`, the rest
/// become `outside`.
///
/// The output is an 8-bit unsigned image with the geometry of the input.
///
/// # Examples
///
/// ```rust
/// use imgkit_image::{Image, PixelId};
/// use imgkit_process::BinaryThresholdFilter;
///
/// let mut image = Image::new(&[3, 3], PixelId::Float64).unwrap();
/// image.set_pixel_as_f64(&[1, 1], 0.75).unwrap();
///
/// let filter = BinaryThresholdFilter::new()
///     .with_thresholds(0.5, 1.0)
///     .with_values(255, 0);
/// let mask = filter.execute(&image).unwrap();
///
/// assert_eq!(mask.pixel_id(), PixelId::UInt8);
/// assert_eq!(mask.get_pixel_as_u8(&[1, 1]).unwrap(), 255);
/// assert_eq!(mask.get_pixel_as_u8(&[0, 1]).unwrap(), 0);
/// ```
pub struct BinaryThresholdFilter {
    process_object: ProcessObject,
    lower: f64,
    upper: f64,
    inside: u8,
    outside: u8,
}

impl BinaryThresholdFilter {
    /// Create the filter with thresholds `[0, 255]`, inside 1 and outside 0.
    pub fn new() -> Self {
        Self {
            process_object: ProcessObject::new("BinaryThresholdImageFilter"),
            lower: 0.0,
            upper: 255.0,
            inside: 1,
            outside: 0,
        }
    }

    /// Set the inclusive thresholds.
    pub fn with_thresholds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Set the inside and outside values.
    pub fn with_values(mut self, inside: u8, outside: u8) -> Self {
        self.inside = inside;
        self.outside = outside;
        self
    }

    /// The inclusive thresholds.
    pub fn thresholds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// The inside and outside values.
    pub fn values(&self) -> (u8, u8) {
        (self.inside, self.outside)
    }

    /// Run the filter on `image`.
    ///
    /// # Errors
    ///
    /// * [`ProcessError::InvalidParameter`] if the lower threshold is above the upper one.
    /// * [`ProcessError::ImageError`] for vector and label images.
    /// * [`ProcessError::Aborted`] if a command aborted the run.
    pub fn execute(&self, image: &Image) -> Result<Image, ProcessError> {
        if self.lower > self.upper || self.lower.is_nan() || self.upper.is_nan() {
            return Err(ProcessError::InvalidParameter(format!(
                "lower threshold {} cannot be greater than upper threshold {}",
                self.lower, self.upper
            )));
        }
        let native = Arc::new(NativeProcess::new(self.process_object.name()));
        self.process_object.pre_update(&native)?;
        visit_scalar(
            image.base(),
            ThresholdVisitor {
                process: &native,
                filter: self,
            },
        )?
    }
}

impl Default for BinaryThresholdFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for BinaryThresholdFilter {
    type Target = ProcessObject;

    fn deref(&self) -> &ProcessObject {
        &self.process_object
    }
}

struct ThresholdVisitor<'a> {
    process: &'a NativeProcess,
    filter: &'a BinaryThresholdFilter,
}

impl ScalarImageVisitor for ThresholdVisitor<'_> {
    type Output = Result<Image, ProcessError>;

    fn visit<T: ScalarPixel, const D: usize>(self, image: &TypedImage<Basic<T>, D>) -> Self::Output {
        let (lower, upper) = self.filter.thresholds();
        let (inside, outside) = self.filter.values();
        let src = image.shared().read().try_duplicate()?;
        let mut dst = src.new_like(outside)?;
        run_blockwise(self.process, &src, &mut dst, |v| {
            let v = to_f64(*v);
            if lower <= v && v <= upper {
                inside
            } else {
                outside
            }
        })?;
        Ok(Image::from_native::<Basic<u8>, D>(dst)?)
    }
}
