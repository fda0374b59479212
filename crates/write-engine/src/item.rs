//! The two write-item variants the engine schedules: in-memory buffers and
//! zero-copy file regions.

use bytes::{Buf, Bytes};

/// An opaque file descriptor handle.
///
/// The file itself, and what it means to read a byte range out of it, are
/// external collaborators; the engine only ever forwards this value
/// unchanged to the caller-supplied `fileOp` closure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Descriptor(i64);

impl Descriptor {
    /// Wraps a raw platform descriptor/handle value.
    #[must_use]
    pub const fn from_raw(value: i64) -> Self {
        Self(value)
    }

    /// Returns the wrapped raw value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }
}

#[cfg(unix)]
impl From<std::os::fd::RawFd> for Descriptor {
    fn from(fd: std::os::fd::RawFd) -> Self {
        Self(i64::from(fd))
    }
}

/// A `[begin, end)` byte range of a file, eligible for zero-copy transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileRegion {
    descriptor: Descriptor,
    reader: u64,
    end: u64,
}

impl FileRegion {
    /// Creates a file region covering `[reader, end)` of `descriptor`.
    ///
    /// # Panics
    ///
    /// Panics if `reader > end`; an inverted range cannot represent a
    /// sensible transfer and indicates a caller bug.
    #[must_use]
    pub fn new(descriptor: Descriptor, reader: u64, end: u64) -> Self {
        assert!(reader <= end, "file region reader cursor past its end");
        Self {
            descriptor,
            reader,
            end,
        }
    }

    /// The descriptor to transfer from.
    #[must_use]
    pub const fn descriptor(self) -> Descriptor {
        self.descriptor
    }

    /// The current read position.
    #[must_use]
    pub const fn reader(self) -> u64 {
        self.reader
    }

    /// The exclusive end of the region.
    #[must_use]
    pub const fn end(self) -> u64 {
        self.end
    }

    /// Bytes not yet transferred.
    #[must_use]
    pub const fn remaining(self) -> u64 {
        self.end - self.reader
    }

    /// Advances the read cursor by `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` would advance past `end`.
    pub fn advance(&mut self, n: u64) {
        assert!(n <= self.remaining(), "file region advance past its end");
        self.reader += n;
    }
}

/// A single heterogeneous write item: either an in-memory byte buffer or a
/// zero-copy file region.
///
/// [`Bytes`] already supplies everything the buffer variant needs: a
/// reference-counted, cheaply-cloneable backing allocation (the "storage
/// retention" the spec calls for) and an advanceable read cursor via
/// [`Buf::advance`].
#[derive(Debug)]
pub enum WriteItem {
    /// An in-memory byte buffer with an advanceable read cursor.
    Buffer(Bytes),
    /// A file-backed byte range eligible for zero-copy transfer.
    File(FileRegion),
}

impl WriteItem {
    /// Bytes not yet written for this item.
    #[must_use]
    pub fn remaining(&self) -> usize {
        match self {
            Self::Buffer(bytes) => bytes.remaining(),
            Self::File(region) => usize::try_from(region.remaining()).unwrap_or(usize::MAX),
        }
    }

    /// True once every byte of this item has been consumed.
    #[must_use]
    pub fn is_fully_consumed(&self) -> bool {
        self.remaining() == 0
    }

    /// Advances the item's read cursor by `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the item's remaining bytes.
    pub fn advance(&mut self, n: usize) {
        match self {
            Self::Buffer(bytes) => bytes.advance(n),
            Self::File(region) => region.advance(n as u64),
        }
    }

    /// Returns `true` if this item is an in-memory buffer.
    #[must_use]
    pub const fn is_buffer(&self) -> bool {
        matches!(self, Self::Buffer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_remaining_tracks_cursor() {
        let mut item = WriteItem::Buffer(Bytes::from_static(b"hello"));
        assert_eq!(item.remaining(), 5);
        item.advance(2);
        assert_eq!(item.remaining(), 3);
        assert!(!item.is_fully_consumed());
        item.advance(3);
        assert!(item.is_fully_consumed());
    }

    #[test]
    fn file_region_remaining_and_advance() {
        let descriptor = Descriptor::from_raw(7);
        let mut region = FileRegion::new(descriptor, 10, 20);
        assert_eq!(region.remaining(), 10);
        region.advance(4);
        assert_eq!(region.reader(), 14);
        assert_eq!(region.remaining(), 6);
    }

    #[test]
    #[should_panic(expected = "past its end")]
    fn file_region_rejects_inverted_range() {
        let _ = FileRegion::new(Descriptor::from_raw(0), 5, 1);
    }

    #[test]
    #[should_panic(expected = "past its end")]
    fn file_region_advance_past_end_panics() {
        let mut region = FileRegion::new(Descriptor::from_raw(0), 0, 4);
        region.advance(5);
    }

    #[test]
    fn is_buffer_distinguishes_variants() {
        let buffer = WriteItem::Buffer(Bytes::from_static(b"x"));
        let file = WriteItem::File(FileRegion::new(Descriptor::from_raw(1), 0, 1));
        assert!(buffer.is_buffer());
        assert!(!file.is_buffer());
    }
}
