//! Parallel processing utilities for batch operations.
//!
//! Uses rayon to spread independent items over worker threads. Results keep
//! the order of the inputs; when several items fail, the error of the first
//! failing item in input order is reported.

use rayon::prelude::*;

use crate::traits::{AudioTransform, InversionOptions};
use crate::{TransformData, TransformError, TransformResult};

/// Worker pool and chunking settings for the parallel list helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParallelConfig {
    /// Number of worker threads; `None` uses the global rayon pool.
    pub thread_count: Option<usize>,
    /// Items processed per parallel wave; `None` processes all items at once.
    pub chunk_size: Option<usize>,
}

impl ParallelConfig {
    /// Global pool, no chunking.
    pub const fn new() -> Self {
        Self {
            thread_count: None,
            chunk_size: None,
        }
    }

    /// Run on a dedicated pool with `threads` workers.
    pub const fn with_thread_count(mut self, threads: usize) -> Self {
        self.thread_count = Some(threads);
        self
    }

    /// Bound the number of outputs in flight to `chunk_size`.
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }
}

/// Parallel counterpart of [`apply_transform_to_list`](super::apply_transform_to_list).
pub fn par_apply_transform_to_list<T>(
    transform: &T,
    items: &[TransformData],
) -> TransformResult<Vec<TransformData>>
where
    T: AudioTransform + ?Sized,
{
    par_apply_transform_to_list_with(transform, items, &ParallelConfig::default())
}

/// [`par_apply_transform_to_list`] with explicit pool and chunking settings.
///
/// # Errors
/// Fails on a zero chunk size, if the pool cannot be built, or with the first
/// failing item.
pub fn par_apply_transform_to_list_with<T>(
    transform: &T,
    items: &[TransformData],
    config: &ParallelConfig,
) -> TransformResult<Vec<TransformData>>
where
    T: AudioTransform + ?Sized,
{
    ParallelProcessor::process_with_config(items, |item| transform.forward(item), config)
}

/// Parallel counterpart of
/// [`apply_invert_transform_to_list`](super::apply_invert_transform_to_list).
pub fn par_apply_invert_transform_to_list<T>(
    transform: &T,
    items: &[TransformData],
    options: &InversionOptions,
) -> TransformResult<Vec<TransformData>>
where
    T: AudioTransform + ?Sized,
{
    par_apply_invert_transform_to_list_with(transform, items, options, &ParallelConfig::default())
}

/// [`par_apply_invert_transform_to_list`] with explicit pool and chunking settings.
///
/// # Errors
/// Fails on a zero chunk size, if the pool cannot be built, or with the first
/// failing item.
pub fn par_apply_invert_transform_to_list_with<T>(
    transform: &T,
    items: &[TransformData],
    options: &InversionOptions,
    config: &ParallelConfig,
) -> TransformResult<Vec<TransformData>>
where
    T: AudioTransform + ?Sized,
{
    ParallelProcessor::process_with_config(
        items,
        |item| transform.invert_with(item, options),
        config,
    )
}

/// Parallel batch processor for applying an operation to many tensors.
pub struct ParallelProcessor;

impl ParallelProcessor {
    /// Process every item on the global rayon pool.
    pub fn process<F>(items: &[TransformData], operation: F) -> TransformResult<Vec<TransformData>>
    where
        F: Fn(&TransformData) -> TransformResult<TransformData> + Sync,
    {
        let results: Vec<TransformResult<TransformData>> =
            items.par_iter().map(|item| operation(item)).collect();
        collect_in_order(results)
    }

    /// Process items in parallel chunks of `chunk_size`, bounding how many
    /// outputs are in flight at once.
    ///
    /// # Errors
    /// Fails on a zero chunk size, or with the first failing item.
    pub fn process_chunked<F>(
        items: &[TransformData],
        operation: F,
        chunk_size: usize,
    ) -> TransformResult<Vec<TransformData>>
    where
        F: Fn(&TransformData) -> TransformResult<TransformData> + Sync,
    {
        if chunk_size == 0 {
            return Err(TransformError::invalid_parameter("chunk size must be greater than 0"));
        }
        let mut processed = Vec::with_capacity(items.len());
        for (chunk_idx, chunk) in items.chunks(chunk_size).enumerate() {
            let results: Vec<_> = chunk.par_iter().map(|item| operation(item)).collect();
            let offset = chunk_idx * chunk_size;
            for (i, result) in results.into_iter().enumerate() {
                processed.push(result.map_err(|e| TransformError::batch_item(offset + i, e))?);
            }
        }
        Ok(processed)
    }

    /// Process items on a dedicated pool with `thread_count` workers
    /// (rayon's default when `None`).
    pub fn process_with_threads<F>(
        items: &[TransformData],
        operation: F,
        thread_count: Option<usize>,
    ) -> TransformResult<Vec<TransformData>>
    where
        F: Fn(&TransformData) -> TransformResult<TransformData> + Sync,
    {
        let pool = build_pool(thread_count)?;
        pool.install(|| Self::process(items, &operation))
    }

    /// Dispatch on `config`: dedicated pool when a thread count is set,
    /// chunked waves when a chunk size is set.
    pub fn process_with_config<F>(
        items: &[TransformData],
        operation: F,
        config: &ParallelConfig,
    ) -> TransformResult<Vec<TransformData>>
    where
        F: Fn(&TransformData) -> TransformResult<TransformData> + Sync,
    {
        let run = || match config.chunk_size {
            Some(chunk_size) => Self::process_chunked(items, &operation, chunk_size),
            None => Self::process(items, &operation),
        };
        match config.thread_count {
            Some(threads) => {
                tracing::debug!(threads, items = items.len(), "processing on a dedicated pool");
                build_pool(Some(threads))?.install(run)
            }
            None => run(),
        }
    }
}

fn build_pool(thread_count: Option<usize>) -> TransformResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = thread_count {
        builder = builder.num_threads(threads);
    }
    builder
        .build()
        .map_err(|e| TransformError::parallel_error(format!("Thread pool creation failed: {e}")))
}

fn collect_in_order(results: Vec<TransformResult<TransformData>>) -> TransformResult<Vec<TransformData>> {
    results
        .into_iter()
        .enumerate()
        .map(|(index, result)| result.map_err(|e| TransformError::batch_item(index, e)))
        .collect()
}
