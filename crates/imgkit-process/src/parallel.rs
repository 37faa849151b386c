//! Block execution for filters.
//!
//! A filter run sizes a rayon pool from the thread count of its native
//! operation with [`install`], then maps every block of pixels with
//! [`BlockExt::map_into`] using the [`BlockStrategy`] that count selects.
//! Events are fired between blocks, never from inside the pool.

use rayon::prelude::*;
use thiserror::Error;

/// Errors raised while running a block.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// rayon refused to build the pool.
    #[error("cannot build a pool of worker threads: {0}")]
    PoolBuild(String),

    /// A pool needs at least one worker.
    #[error("a filter needs at least one worker thread")]
    ZeroThreads,

    /// Source and destination blocks differ in length.
    #[error("block length mismatch: source has {src} pixels, destination {dst}")]
    BlockLength {
        /// Pixels in the source block.
        src: usize,
        /// Pixels in the destination block.
        dst: usize,
    },
}

/// How the pixels of one block are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockStrategy {
    /// One pixel after another on the calling thread.
    Inline,
    /// Split across the pool the block runs in.
    #[default]
    Pooled,
}

impl BlockStrategy {
    /// Pick the strategy for a native operation running on `num_threads`.
    pub fn for_threads(num_threads: usize) -> Self {
        match num_threads {
            0 | 1 => BlockStrategy::Inline,
            _ => BlockStrategy::Pooled,
        }
    }
}

/// Run `op` with every rayon call inside it bound to `num_threads` workers.
///
/// One thread runs `op` directly on the caller.
///
/// # Errors
///
/// [`ParallelError::ZeroThreads`] for a count of zero and
/// [`ParallelError::PoolBuild`] when rayon cannot spawn the workers.
pub fn install<R, F>(num_threads: usize, op: F) -> Result<R, ParallelError>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match num_threads {
        0 => Err(ParallelError::ZeroThreads),
        1 => Ok(op()),
        n => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .thread_name(|i| format!("imgkit-filter-{i}"))
                .build()
                .map_err(|e| ParallelError::PoolBuild(e.to_string()))?;
            Ok(pool.install(op))
        }
    }
}

/// Map a block of source pixels into a destination block.
pub trait BlockExt<T> {
    /// Write `op(src[i])` to `dst[i]` for every pixel of the block.
    ///
    /// # Errors
    ///
    /// [`ParallelError::BlockLength`] when the blocks differ in length.
    fn map_into<U, F>(&self, strategy: BlockStrategy, dst: &mut [U], op: F) -> Result<(), ParallelError>
    where
        U: Send,
        F: Fn(&T) -> U + Sync + Send;
}

impl<T: Sync> BlockExt<T> for [T] {
    fn map_into<U, F>(&self, strategy: BlockStrategy, dst: &mut [U], op: F) -> Result<(), ParallelError>
    where
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        if self.len() != dst.len() {
            return Err(ParallelError::BlockLength {
                src: self.len(),
                dst: dst.len(),
            });
        }
        match strategy {
            BlockStrategy::Inline => {
                for (s, d) in self.iter().zip(dst.iter_mut()) {
                    *d = op(s);
                }
            }
            BlockStrategy::Pooled => {
                dst.par_iter_mut()
                    .zip(self.par_iter())
                    .for_each(|(d, s)| *d = op(s));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_follows_thread_count() {
        assert_eq!(BlockStrategy::for_threads(0), BlockStrategy::Inline);
        assert_eq!(BlockStrategy::for_threads(1), BlockStrategy::Inline);
        assert_eq!(BlockStrategy::for_threads(8), BlockStrategy::Pooled);
    }

    #[test]
    fn inline_and_pooled_agree() -> Result<(), ParallelError> {
        let block = (0..257).map(|v| v as u8).collect::<Vec<_>>();
        let mut inline = vec![0u16; block.len()];
        let mut pooled = vec![0u16; block.len()];
        block.map_into(BlockStrategy::Inline, &mut inline, |v| *v as u16 + 300)?;
        install(4, || block.map_into(BlockStrategy::Pooled, &mut pooled, |v| *v as u16 + 300))??;
        assert_eq!(inline, pooled);
        assert_eq!(pooled[256], 556);
        Ok(())
    }

    #[test]
    fn blocks_must_match() {
        let block = [1.0f32, 2.0];
        let mut dst = [0.0f32; 3];
        let res = block.map_into(BlockStrategy::Inline, &mut dst, |v| *v);
        assert_eq!(res, Err(ParallelError::BlockLength { src: 2, dst: 3 }));
    }

    #[test]
    fn install_sizes_the_pool() -> Result<(), ParallelError> {
        assert_eq!(install(3, rayon::current_num_threads)?, 3);
        assert_eq!(install(1, || 7)?, 7);
        assert_eq!(install(0, || ()), Err(ParallelError::ZeroThreads));
        Ok(())
    }
}
