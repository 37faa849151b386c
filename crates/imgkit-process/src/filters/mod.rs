//! Image filters driven by a [`ProcessObject`](crate::ProcessObject).
//!
//! Every filter runs its work through a fresh [`NativeProcess`] that is
//! active for the duration of `execute`, so attached commands observe the
//! Start, Progress, Iteration and End events of each run.

mod binary_threshold;
mod shift_scale;

pub use binary_threshold::BinaryThresholdFilter;
pub use shift_scale::ShiftScaleFilter;

use imgkit_image::ScalarPixel;
use imgkit_tensor::SpatialImage;

use crate::error::ProcessError;
use crate::event::NativeEvent;
use crate::native::NativeProcess;
use crate::parallel::{self, BlockExt, BlockStrategy};

/// Apply `op` to every pixel, one block of the slowest axis at a time.
///
/// Fires Start, then Progress and Iteration after every block, then End. The
/// abort flag is checked before each block; when set, Abort is fired and the
/// run fails with [`ProcessError::Aborted`].
pub(crate) fn run_blockwise<T, U, const D: usize, F>(
    process: &NativeProcess,
    src: &SpatialImage<T, D>,
    dst: &mut SpatialImage<U, D>,
    op: F,
) -> Result<(), ProcessError>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    let num_threads = process.number_of_threads();
    let strategy = BlockStrategy::for_threads(num_threads);
    let blocks = src.size().last().copied().unwrap_or(1).max(1);
    let block_len = src.numel() / blocks;

    process.set_abort_generate_data(false);
    process.set_progress(0.0);
    process.invoke_event(NativeEvent::Start);

    if block_len > 0 {
        parallel::install(num_threads, || -> Result<(), ProcessError> {
            let src_blocks = src.as_slice().chunks(block_len);
            let dst_blocks = dst.as_slice_mut().chunks_mut(block_len);
            for (i, (src_block, dst_block)) in src_blocks.zip(dst_blocks).enumerate() {
                if process.abort_generate_data() {
                    process.invoke_event(NativeEvent::Abort);
                    return Err(ProcessError::Aborted(process.name().to_string()));
                }
                src_block.map_into(strategy, dst_block, &op)?;
                process.update_progress((i + 1) as f32 / blocks as f32);
                process.invoke_event(NativeEvent::Iteration);
            }
            Ok(())
        })??;
    }

    process.update_progress(1.0);
    process.invoke_event(NativeEvent::End);
    Ok(())
}

/// Convert to `T`, clamping to its range. The flag is set when the value was
/// clamped or was NaN.
pub(crate) fn saturating_cast<T: ScalarPixel>(value: f64) -> (T, bool) {
    if value.is_nan() {
        return (T::default(), true);
    }
    let lo = num_traits::cast::<T, f64>(T::min_value()).unwrap_or(f64::MIN);
    let hi = num_traits::cast::<T, f64>(T::max_value()).unwrap_or(f64::MAX);
    if value < lo {
        return (T::min_value(), true);
    }
    if value > hi {
        return (T::max_value(), true);
    }
    match num_traits::cast::<f64, T>(value) {
        Some(v) => (v, false),
        None if value < 0.0 => (T::min_value(), true),
        None => (T::max_value(), true),
    }
}

/// Widen a pixel value for arithmetic.
pub(crate) fn to_f64<T: ScalarPixel>(value: T) -> f64 {
    num_traits::cast::<T, f64>(value).unwrap_or(f64::NAN)
}
