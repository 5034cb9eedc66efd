//! Row-aligned parallel iteration over equally sized mutable slices.
//!
//! Raster buffers are flat `width * height` sequences. These helpers split
//! three such buffers into matching chunks of whole rows and yield the linear
//! pixel index of each chunk's first element, so a per-pixel pass can
//! recover `(x, y)` for every element it writes.

use std::marker::PhantomData;

use rayon::prelude::*;


/// Number of chunks scheduled per rayon thread.
const CHUNKS_PER_THREAD: usize = 3;

/// Rows per chunk for a raster of `height` rows.
#[inline]
fn rows_per_chunk(height: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (height / num_chunks).max(1)
}

/// Indexed parallel iterator yielding `(first_pixel_index, item)` pairs.
pub struct WithPixelOffset<I, T, F> {
    inner: I,
    pixels_per_chunk: usize,
    transform: F,
    _phantom: PhantomData<T>,
}

impl<I, T, F> WithPixelOffset<I, T, F> {
    fn new(inner: I, pixels_per_chunk: usize, transform: F) -> Self {
        Self {
            inner,
            pixels_per_chunk,
            transform,
            _phantom: PhantomData,
        }
    }
}

impl<I, T, F> ParallelIterator for WithPixelOffset<I, T, F>
where
    I: IndexedParallelIterator,
    T: Send,
    F: Fn(I::Item) -> T + Send + Sync,
{
    type Item = (usize, T);

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::UnindexedConsumer<Self::Item>,
    {
        let step = self.pixels_per_chunk;
        let transform = self.transform;
        self.inner
            .enumerate()
            .map(move |(chunk, item)| (chunk * step, transform(item)))
            .drive_unindexed(consumer)
    }
}

impl<I, T, F> IndexedParallelIterator for WithPixelOffset<I, T, F>
where
    I: IndexedParallelIterator,
    T: Send,
    F: Fn(I::Item) -> T + Send + Sync,
{
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn drive<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::Consumer<Self::Item>,
    {
        let step = self.pixels_per_chunk;
        let transform = self.transform;
        self.inner
            .enumerate()
            .map(move |(chunk, item)| (chunk * step, transform(item)))
            .drive(consumer)
    }

    fn with_producer<CB>(self, callback: CB) -> CB::Output
    where
        CB: rayon::iter::plumbing::ProducerCallback<Self::Item>,
    {
        let step = self.pixels_per_chunk;
        let transform = self.transform;
        self.inner
            .enumerate()
            .map(move |(chunk, item)| (chunk * step, transform(item)))
            .with_producer(callback)
    }
}

pub type ParRows3Mut<'a, A, B, C> = WithPixelOffset<
    rayon::iter::Zip<
        rayon::iter::Zip<rayon::slice::ChunksMut<'a, A>, rayon::slice::ChunksMut<'a, B>>,
        rayon::slice::ChunksMut<'a, C>,
    >,
    (&'a mut [A], &'a mut [B], &'a mut [C]),
    fn(((&'a mut [A], &'a mut [B]), &'a mut [C])) -> (&'a mut [A], &'a mut [B], &'a mut [C]),
>;

/// Chunk length in elements for a buffer of `len` elements laid out in rows of `width`.
///
/// # Panics
/// Panics if `width` is zero.
fn chunk_len(len: usize, width: usize) -> usize {
    assert!(width > 0, "row width must be > 0");
    width * rows_per_chunk(len / width)
}

/// Starts a zip of several mutable buffers that will be split on the same row boundaries.
pub trait ParZipMut<'a, T: Send + 'a> {
    fn par_zip<U: Send + 'a>(self, other: &'a mut [U]) -> Zipped2<'a, T, U>;
}

impl<'a, T: Send + 'a> ParZipMut<'a, T> for &'a mut [T] {
    fn par_zip<U: Send + 'a>(self, other: &'a mut [U]) -> Zipped2<'a, T, U> {
        Zipped2(self, other)
    }
}

pub struct Zipped2<'a, A: Send, B: Send>(pub &'a mut [A], pub &'a mut [B]);

impl<'a, A: Send + 'a, B: Send + 'a> Zipped2<'a, A, B> {
    pub fn par_zip<C: Send + 'a>(self, other: &'a mut [C]) -> Zipped3<'a, A, B, C> {
        Zipped3(self.0, self.1, other)
    }
}

pub struct Zipped3<'a, A: Send, B: Send, C: Send>(
    pub &'a mut [A],
    pub &'a mut [B],
    pub &'a mut [C],
);

impl<'a, A: Send + 'a, B: Send + 'a, C: Send + 'a> Zipped3<'a, A, B, C> {
    /// Yields `(first_pixel_index, (a, b, c))` with matching row-aligned chunks.
    pub fn par_rows_mut(self, width: usize) -> ParRows3Mut<'a, A, B, C> {
        assert!(
            self.0.len() == self.1.len() && self.0.len() == self.2.len(),
            "Zipped slices must have equal length"
        );
        let chunk = chunk_len(self.0.len(), width);
        WithPixelOffset::new(
            self.0
                .par_chunks_mut(chunk)
                .zip(self.1.par_chunks_mut(chunk))
                .zip(self.2.par_chunks_mut(chunk)),
            chunk,
            flatten_zip3
                as fn(
                    ((&'a mut [A], &'a mut [B]), &'a mut [C]),
                ) -> (&'a mut [A], &'a mut [B], &'a mut [C]),
        )
    }
}

fn flatten_zip3<A, B, C>(((a, b), c): ((A, B), C)) -> (A, B, C) {
    (a, b, c)
}
