use std::fmt;

use crate::error::TensorError;
use crate::tensor::Tensor;

/// An image of dimension `D` placed in physical space.
///
/// The pixel buffer is a [`Tensor`] whose axes are stored in reverse order so
/// that index component 0 (x) varies fastest in memory. Indices are always
/// given x-first, i.e. `[x, y]` or `[x, y, z]`.
///
/// # Examples
///
/// ```
/// use imgkit_tensor::SpatialImage;
///
/// let mut image = SpatialImage::<u16, 2>::new([4, 3], 0).unwrap();
/// image.set_pixel([3, 2], 7).unwrap();
/// assert_eq!(image.get_pixel([3, 2]), Ok(&7));
/// assert_eq!(image.as_slice()[11], 7);
/// ```
#[derive(Debug, PartialEq)]
pub struct SpatialImage<T, const D: usize> {
    data: Tensor<T, D>,
    origin: [f64; D],
    spacing: [f64; D],
}

fn reversed<const D: usize>(mut index: [usize; D]) -> [usize; D] {
    index.reverse();
    index
}

impl<T, const D: usize> SpatialImage<T, D> {
    /// Create a new image of the given size filled with `value`.
    ///
    /// The origin is zero and the spacing is one along every axis.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the pixel buffer cannot be allocated.
    pub fn new(size: [usize; D], value: T) -> Result<Self, TensorError>
    where
        T: Clone,
    {
        Ok(Self {
            data: Tensor::from_shape_val(reversed(size), value)?,
            origin: [0.0; D],
            spacing: [1.0; D],
        })
    }

    /// Create a new image from pixel data laid out x-fastest.
    ///
    /// # Errors
    ///
    /// If the data length does not match the product of `size`, an error is returned.
    pub fn from_vec(size: [usize; D], data: Vec<T>) -> Result<Self, TensorError> {
        Ok(Self {
            data: Tensor::from_shape_vec(reversed(size), data)?,
            origin: [0.0; D],
            spacing: [1.0; D],
        })
    }

    /// Extent of the image along each axis, x first.
    pub fn size(&self) -> [usize; D] {
        reversed(self.data.shape)
    }

    /// Number of pixels in the image.
    pub fn numel(&self) -> usize {
        self.data.numel()
    }

    /// Physical coordinates of the pixel at index zero.
    pub fn origin(&self) -> [f64; D] {
        self.origin
    }

    /// Set the physical coordinates of the pixel at index zero.
    pub fn set_origin(&mut self, origin: [f64; D]) {
        self.origin = origin;
    }

    /// Physical distance between adjacent pixels along each axis.
    pub fn spacing(&self) -> [f64; D] {
        self.spacing
    }

    /// Set the physical distance between adjacent pixels along each axis.
    ///
    /// # Errors
    ///
    /// Every component must be finite and strictly positive.
    pub fn set_spacing(&mut self, spacing: [f64; D]) -> Result<(), TensorError> {
        if spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(TensorError::InvalidSpacing(spacing.to_vec()));
        }
        self.spacing = spacing;
        Ok(())
    }

    /// Map a physical point to the index of the nearest pixel.
    ///
    /// Halfway cases round up. The returned index may lie outside the image;
    /// use [`SpatialImage::is_inside`] to check it.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgkit_tensor::SpatialImage;
    ///
    /// let image = SpatialImage::<u8, 2>::new([10, 10], 0).unwrap();
    /// assert_eq!(image.transform_physical_point_to_index([2.3, 4.7]), [2, 5]);
    /// ```
    pub fn transform_physical_point_to_index(&self, point: [f64; D]) -> [i64; D] {
        let mut index = [0i64; D];
        for (i, idx) in index.iter_mut().enumerate() {
            let continuous = (point[i] - self.origin[i]) / self.spacing[i];
            *idx = (continuous + 0.5).floor() as i64;
        }
        index
    }

    /// Map a pixel index to its physical point.
    pub fn transform_index_to_physical_point(&self, index: [i64; D]) -> [f64; D] {
        let mut point = [0f64; D];
        for (i, p) in point.iter_mut().enumerate() {
            *p = self.origin[i] + index[i] as f64 * self.spacing[i];
        }
        point
    }

    /// Whether the index addresses a pixel of this image.
    pub fn is_inside(&self, index: [i64; D]) -> bool {
        index
            .iter()
            .zip(self.size())
            .all(|(&i, extent)| i >= 0 && (i as u64) < extent as u64)
    }

    /// Get the pixel at the given index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is outside the image.
    pub fn get_pixel(&self, index: [usize; D]) -> Result<&T, TensorError> {
        match self.data.get(reversed(index)) {
            Some(v) => Ok(v),
            None => Err(self.out_of_bounds(index)),
        }
    }

    /// Get a mutable reference to the pixel at the given index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is outside the image.
    pub fn get_pixel_mut(&mut self, index: [usize; D]) -> Result<&mut T, TensorError> {
        let size = self.size();
        self.data.get_mut(reversed(index)).ok_or_else(|| {
            TensorError::index_out_of_bounds(index.iter().map(|&i| i as i64).collect(), &size)
        })
    }

    /// Overwrite the pixel at the given index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is outside the image.
    pub fn set_pixel(&mut self, index: [usize; D], value: T) -> Result<(), TensorError> {
        *self.get_pixel_mut(index)? = value;
        Ok(())
    }

    /// The pixel buffer, x-fastest.
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    /// The mutable pixel buffer, x-fastest.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        self.data.as_slice_mut()
    }

    /// Create an image with the same size and geometry and a new buffer.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the buffer cannot be allocated.
    pub fn new_like<U: Clone>(&self, value: U) -> Result<SpatialImage<U, D>, TensorError> {
        let mut image = SpatialImage::new(self.size(), value)?;
        image.origin = self.origin;
        image.spacing = self.spacing;
        Ok(image)
    }

    /// Duplicate the pixel buffer and geometry into a new, independent image.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the buffer cannot be allocated.
    pub fn try_duplicate(&self) -> Result<Self, TensorError>
    where
        T: Clone,
    {
        Ok(Self {
            data: self.data.try_duplicate()?,
            origin: self.origin,
            spacing: self.spacing,
        })
    }

    fn out_of_bounds(&self, index: [usize; D]) -> TensorError {
        TensorError::index_out_of_bounds(
            index.iter().map(|&i| i as i64).collect(),
            &self.size(),
        )
    }
}

impl<T, const D: usize> fmt::Display for SpatialImage<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SpatialImage ({:p})", self)?;
        writeln!(f, "  Dimension: {}", D)?;
        writeln!(f, "  Size: {:?}", self.size())?;
        writeln!(f, "  Origin: {:?}", self.origin)?;
        writeln!(f, "  Spacing: {:?}", self.spacing)?;
        writeln!(f, "  PixelType: {}", std::any::type_name::<T>())?;
        write!(f, "  BufferLength: {}", self.numel())
    }
}
