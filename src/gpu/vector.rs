//! Host mirror of a growable device buffer.

use std::ops::Range;

use bytemuck::Pod;

/// Smallest capacity (elements) a device buffer is created with.
pub const MIN_CAPACITY: usize = 64;

/// What a backend has to do to bring its device buffer in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// Recreate the device buffer with `capacity` elements and write all of `len`.
    Realloc { capacity: usize, len: usize },
    /// Write `range` (elements) into the existing buffer.
    Write(Range<usize>),
}

/// Append-style host array paired with a device buffer.
///
/// Capacity grows to the next power of two (at least [`MIN_CAPACITY`]) and
/// never shrinks, so clearing and refilling with a smaller scene reuses the
/// device allocation. Mutations record a dirty range; [`take_upload`]
/// hands the backend the minimal plan and resets the tracking.
///
/// [`take_upload`]: GpuVector::take_upload
#[derive(Debug, Clone)]
pub struct GpuVector<T: Pod> {
    data: Vec<T>,
    capacity: usize,
    dirty: Option<Range<usize>>,
    realloc: bool,
}

impl<T: Pod> Default for GpuVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod> GpuVector<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            capacity: MIN_CAPACITY,
            dirty: None,
            realloc: true,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Device capacity in elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Device capacity in bytes (never zero).
    pub fn byte_capacity(&self) -> u64 {
        (self.capacity * std::mem::size_of::<T>()) as u64
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Ensure room for `count` elements on the device.
    pub fn reserve(&mut self, count: usize) {
        if count > self.capacity {
            self.capacity = count.next_power_of_two().max(MIN_CAPACITY);
            self.realloc = true;
        }
    }

    pub fn push(&mut self, value: T) {
        self.reserve(self.data.len() + 1);
        self.data.push(value);
        let i = self.data.len() - 1;
        self.mark_dirty(i..i + 1);
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        if values.is_empty() {
            return;
        }
        let start = self.data.len();
        self.reserve(start + values.len());
        self.data.extend_from_slice(values);
        self.mark_dirty(start..self.data.len());
    }

    /// Overwrite element `i`. Returns false when out of range.
    pub fn set(&mut self, i: usize, value: T) -> bool {
        let Some(slot) = self.data.get_mut(i) else {
            return false;
        };
        *slot = value;
        self.mark_dirty(i..i + 1);
        true
    }

    /// Drop all elements. Capacity is kept.
    pub fn clear(&mut self) {
        self.data.clear();
        self.dirty = None;
    }

    /// Replace the contents with `values`.
    pub fn assign(&mut self, values: &[T]) {
        self.clear();
        self.extend_from_slice(values);
    }

    /// Whether the next upload has to recreate the device buffer.
    pub fn needs_realloc(&self) -> bool {
        self.realloc
    }

    pub fn is_dirty(&self) -> bool {
        self.realloc || self.dirty.is_some()
    }

    /// Pending upload, if any, and reset dirty tracking.
    pub fn take_upload(&mut self) -> Option<UploadPlan> {
        let dirty = self.dirty.take();
        if std::mem::take(&mut self.realloc) {
            return Some(UploadPlan::Realloc { capacity: self.capacity, len: self.data.len() });
        }
        dirty.map(UploadPlan::Write)
    }

    fn mark_dirty(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            Some(d) => d.start.min(range.start)..d.end.max(range.end),
            None => range,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_growth() {
        let mut v: GpuVector<u32> = GpuVector::new();
        assert_eq!(v.capacity(), 64);
        assert_eq!(v.byte_capacity(), 256);
        v.extend_from_slice(&[0; 64]);
        assert_eq!(v.capacity(), 64);
        v.push(1);
        assert_eq!(v.capacity(), 128);
        v.extend_from_slice(&[0; 100]);
        assert_eq!(v.capacity(), 256);
    }

    #[test]
    fn test_never_shrinks() {
        let mut v: GpuVector<u32> = GpuVector::new();
        v.extend_from_slice(&[7; 300]);
        assert_eq!(v.capacity(), 512);
        v.take_upload();

        v.assign(&[1, 2, 3]);
        assert_eq!(v.capacity(), 512);
        assert_eq!(v.take_upload(), Some(UploadPlan::Write(0..3)));
    }

    #[test]
    fn test_staged_copy_leaves_original() {
        let mut v: GpuVector<u32> = GpuVector::new();
        v.extend_from_slice(&[1, 2, 3]);
        v.take_upload();

        let mut staged = v.clone();
        staged.assign(&[9; 1000]);
        assert!(staged.needs_realloc());
        assert_eq!(staged.byte_capacity(), 1024 * 4);

        assert_eq!(v.as_slice(), &[1, 2, 3]);
        assert_eq!(v.capacity(), 64);
        assert!(!v.is_dirty());
    }

    #[test]
    fn test_upload_plan() {
        let mut v: GpuVector<f32> = GpuVector::new();
        assert_eq!(v.take_upload(), Some(UploadPlan::Realloc { capacity: 64, len: 0 }));
        assert_eq!(v.take_upload(), None);

        v.extend_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert!(v.set(1, 5.0));
        assert!(!v.set(10, 5.0));
        assert_eq!(v.take_upload(), Some(UploadPlan::Write(0..4)));

        v.set(3, 0.0);
        v.set(2, 0.0);
        assert_eq!(v.take_upload(), Some(UploadPlan::Write(2..4)));
        assert!(!v.is_dirty());
        assert_eq!(v.as_slice(), &[1.0, 5.0, 0.0, 0.0]);
    }
}
