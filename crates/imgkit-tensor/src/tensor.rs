use crate::error::{TensorAllocatorError, TensorError};

/// Compute the row-major strides of a contiguous buffer with the given shape.
///
/// The last axis varies fastest in memory.
///
/// # Examples
///
/// ```rust
/// use imgkit_tensor::tensor::get_strides_from_shape;
///
/// let strides = get_strides_from_shape([2, 3, 4]);
/// assert_eq!(strides, [12, 4, 1]);
/// ```
pub fn get_strides_from_shape<const N: usize>(shape: [usize; N]) -> [usize; N] {
    let mut strides: [usize; N] = [0; N];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

/// Number of elements of a shape, or an error if the product overflows.
fn checked_numel<const N: usize>(shape: [usize; N]) -> Result<usize, TensorError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| TensorAllocatorError::CapacityOverflow(shape.to_vec()).into())
}

/// Reserve a buffer for `numel` elements, reporting allocation failure instead of aborting.
fn try_alloc<T>(numel: usize) -> Result<Vec<T>, TensorError> {
    let mut data = Vec::new();
    data.try_reserve_exact(numel)
        .map_err(|_| TensorAllocatorError::AllocationFailed(numel))?;
    Ok(data)
}

/// A multi-dimensional array with owned, contiguous data.
///
/// # Type Parameters
///
/// * `T` - The element type stored in the tensor
/// * `N` - The number of dimensions
///
/// # Examples
///
/// ```rust
/// use imgkit_tensor::Tensor;
///
/// let t = Tensor::<u8, 2>::from_shape_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
/// assert_eq!(t.shape, [2, 2]);
/// assert_eq!(t.get([1, 0]), Some(&3));
/// ```
#[derive(Debug, PartialEq)]
pub struct Tensor<T, const N: usize> {
    storage: Vec<T>,
    /// The shape of the tensor.
    pub shape: [usize; N],
    /// The strides of the tensor data in memory.
    pub strides: [usize; N],
}

impl<T, const N: usize> Tensor<T, N> {
    /// Creates a new `Tensor` with the given shape and data.
    ///
    /// # Errors
    ///
    /// If the number of elements in the data does not match the shape of the tensor, an error is returned.
    pub fn from_shape_vec(shape: [usize; N], data: Vec<T>) -> Result<Self, TensorError> {
        let numel = checked_numel(shape)?;
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        Ok(Self {
            storage: data,
            shape,
            strides: get_strides_from_shape(shape),
        })
    }

    /// Creates a new `Tensor` with the given shape filled with `value`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the buffer cannot be allocated.
    ///
    /// # Example
    ///
    /// ```
    /// use imgkit_tensor::Tensor;
    ///
    /// let t = Tensor::<u8, 3>::from_shape_val([2, 1, 3], 2).unwrap();
    /// assert_eq!(t.as_slice(), vec![2, 2, 2, 2, 2, 2]);
    /// ```
    pub fn from_shape_val(shape: [usize; N], value: T) -> Result<Self, TensorError>
    where
        T: Clone,
    {
        let numel = checked_numel(shape)?;
        let mut data = try_alloc(numel)?;
        data.resize(numel, value);
        Self::from_shape_vec(shape, data)
    }

    /// Create a new `Tensor` with the given shape and a function to generate the data.
    ///
    /// The function `f` is called with the index of the element to generate.
    ///
    /// # Example
    ///
    /// ```
    /// use imgkit_tensor::Tensor;
    ///
    /// let t = Tensor::<u8, 2>::from_shape_fn([2, 2], |[i, j]| (i * 2 + j) as u8).unwrap();
    /// assert_eq!(t.as_slice(), vec![0, 1, 2, 3]);
    /// ```
    pub fn from_shape_fn<F>(shape: [usize; N], f: F) -> Result<Self, TensorError>
    where
        F: Fn([usize; N]) -> T,
    {
        let numel = checked_numel(shape)?;
        let mut data = try_alloc(numel)?;
        data.extend((0..numel).map(|i| {
            let mut index = [0; N];
            let mut j = i;
            for k in (0..N).rev() {
                index[k] = j % shape[k];
                j /= shape[k];
            }
            f(index)
        }));
        Self::from_shape_vec(shape, data)
    }

    /// Returns the number of elements in the tensor.
    #[inline]
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Get the data of the tensor as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.storage
    }

    /// Get the data of the tensor as a mutable slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.storage
    }

    /// Consumes the tensor and returns its data.
    pub fn into_vec(self) -> Vec<T> {
        self.storage
    }

    /// Get the offset of the element at the given index.
    ///
    /// Returns `None` if any component is outside the shape.
    pub fn get_iter_offset(&self, index: [usize; N]) -> Option<usize> {
        let mut offset = 0;
        for ((&idx, dim_size), stride) in index.iter().zip(self.shape).zip(self.strides) {
            if idx >= dim_size {
                return None;
            }
            offset += idx * stride;
        }
        Some(offset)
    }

    /// Get the element at the given index, checking if the index is out of bounds.
    pub fn get(&self, index: [usize; N]) -> Option<&T> {
        self.get_iter_offset(index)
            .and_then(|i| self.storage.get(i))
    }

    /// Get a mutable reference to the element at the given index.
    pub fn get_mut(&mut self, index: [usize; N]) -> Option<&mut T> {
        self.get_iter_offset(index)
            .and_then(move |i| self.storage.get_mut(i))
    }

    /// Duplicate the tensor into freshly allocated storage.
    ///
    /// # Errors
    ///
    /// Returns a storage error instead of aborting when the allocation fails.
    pub fn try_duplicate(&self) -> Result<Self, TensorError>
    where
        T: Clone,
    {
        let mut data = try_alloc(self.storage.len())?;
        data.extend_from_slice(&self.storage);
        Ok(Self {
            storage: data,
            shape: self.shape,
            strides: self.strides,
        })
    }
}
