//! Dense 3D arrays shared by every pipeline stage.
//!
//! A [`Volume`] stores its samples x-major (`(i*ny + j)*nz + k`), matching
//! meshgrid `ij` ordering: axis `i` is x, `j` is y, `k` is z.

use std::ops::{Index, IndexMut};

/// A dense, owned 3D array of shape `(nx, ny, nz)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume<T> {
    data: Vec<T>,
    nx: usize,
    ny: usize,
    nz: usize,
}

impl<T> Volume<T> {
    /// Build a volume by evaluating `f(i, j, k)` at every lattice point.
    pub fn from_fn<F>(nx: usize, ny: usize, nz: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> T,
    {
        let mut data = Vec::with_capacity(nx * ny * nz);
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    data.push(f(i, j, k));
                }
            }
        }
        Volume { data, nx, ny, nz }
    }

    /// Wrap an x-major flat buffer of exactly `nx * ny * nz` samples.
    ///
    /// # Panics
    /// Panics when the buffer length does not match the shape.
    pub fn from_vec(nx: usize, ny: usize, nz: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), nx * ny * nz, "buffer length must match shape");
        Volume { data, nx, ny, nz }
    }

    /// Shape as `(nx, ny, nz)`.
    pub const fn shape(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// Total number of samples.
    pub const fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// `true` when the volume holds no samples.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    const fn linearize(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.ny + j) * self.nz + k
    }

    /// Flat view of the samples in x-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over samples in x-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Elementwise transform into a new volume of the same shape.
    pub fn map<U, F>(&self, f: F) -> Volume<U>
    where
        F: FnMut(&T) -> U,
    {
        Volume {
            data: self.data.iter().map(f).collect(),
            nx: self.nx,
            ny: self.ny,
            nz: self.nz,
        }
    }

    /// Combine two same-shaped volumes elementwise.
    ///
    /// # Panics
    /// Panics when the shapes differ; callers pass volumes built from the
    /// same grid.
    pub fn zip_map<U, V, F>(&self, other: &Volume<U>, mut f: F) -> Volume<V>
    where
        F: FnMut(&T, &U) -> V,
    {
        assert_eq!(self.shape(), other.shape(), "volume shapes must match");
        Volume {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
            nx: self.nx,
            ny: self.ny,
            nz: self.nz,
        }
    }
}

impl<T: Clone> Volume<T> {
    /// Build a volume filled with one value.
    pub fn filled(nx: usize, ny: usize, nz: usize, value: T) -> Self {
        Volume {
            data: vec![value; nx * ny * nz],
            nx,
            ny,
            nz,
        }
    }
}

impl Volume<bool> {
    /// Count of `true` samples.
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }
}

impl<T> Index<(usize, usize, usize)> for Volume<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &T {
        &self.data[self.linearize(i, j, k)]
    }
}

impl<T> IndexMut<(usize, usize, usize)> for Volume<T> {
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut T {
        let idx = self.linearize(i, j, k);
        &mut self.data[idx]
    }
}
