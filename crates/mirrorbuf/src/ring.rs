// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::num::NonZero;

use crate::{ConfigError, Fault, RingLayout, telemetry};

/// Memory that can back a [`MirroredRingBuffer`].
///
/// Implemented for anything that exposes a fixed byte slice: `&mut [u8]`, `[u8; N]`,
/// `Vec<u8>`, `Box<[u8]>` and so on. The slice must keep the same length for as long as the
/// buffer owns the storage.
pub trait ByteStorage: AsRef<[u8]> + AsMut<[u8]> {}

impl<T: AsRef<[u8]> + AsMut<[u8]> + ?Sized> ByteStorage for T {}

/// A fixed-capacity byte FIFO over caller-provided storage whose trailing mirror region lets
/// every span of up to `mirror_size` bytes be handed out as one contiguous slice, even when it
/// crosses the wrap point.
///
/// # Access modes
///
/// * [`push_byte()`] and [`pop_byte()`] move one byte at a time. They are O(1), never allocate,
///   never log and never panic, so they can be called from interrupt handlers.
/// * [`bulk_write()`] and [`bulk_read()`] copy slices in and out.
/// * [`alloc_write_span()`]/[`commit_write_span()`] and
///   [`alloc_read_span()`]/[`commit_read_span()`] lend a contiguous region of the storage to
///   the caller (for example a DMA engine or a parser) and move the cursor afterwards. The
///   guard-based [`grant_write()`][Self::grant_write] and [`grant_read()`][Self::grant_read]
///   wrap the same protocol in RAII types.
///
/// # Mirror invariant
///
/// The storage is laid out as described on [`RingLayout`]: `capacity` ring slots followed by
/// `mirror_size` bytes that duplicate ring slots `[0, mirror_size)`. Every write-side
/// operation keeps the duplicate in sync, so that a read span starting near the end of the
/// ring can simply run on into the mirror region. A write span may land in the mirror
/// region, in which case [`commit_write_span()`] copies the spilled bytes back to the head of
/// the ring.
///
/// # Faults
///
/// No operation fails because of a full or empty buffer. Instead, they do as much as they can,
/// report how much that was and record a sticky [`Fault`] that the caller polls via
/// [`fault()`][Self::fault].
///
/// # Single producer, single consumer
///
/// One execution context may use the write side and one the read side. The buffer does not
/// synchronize them: every mutating method takes `&mut self`, so sharing one buffer between an
/// interrupt handler and a main loop requires the caller's own critical section.
///
/// # Examples
///
/// ```
/// use mirrorbuf::MirroredRingBuffer;
///
/// let mut storage = [0_u8; 16];
/// let mut ring = MirroredRingBuffer::from_storage(&mut storage[..], 4).unwrap();
///
/// ring.push_byte(b'a');
/// ring.bulk_write(b"bcd");
///
/// let mut out = [0_u8; 4];
/// assert_eq!(ring.bulk_read(&mut out), 4);
/// assert_eq!(&out, b"abcd");
/// assert!(ring.fault().is_none());
/// ```
///
/// [`push_byte()`]: Self::push_byte
/// [`pop_byte()`]: Self::pop_byte
/// [`bulk_write()`]: Self::bulk_write
/// [`bulk_read()`]: Self::bulk_read
/// [`alloc_write_span()`]: Self::alloc_write_span
/// [`commit_write_span()`]: Self::commit_write_span
/// [`alloc_read_span()`]: Self::alloc_read_span
/// [`commit_read_span()`]: Self::commit_read_span
pub struct MirroredRingBuffer<S> {
    storage: S,
    layout: RingLayout,

    // Both cursors are always in `[0, capacity)`.
    pub(crate) write_index: usize,
    pub(crate) read_index: usize,

    fault: Option<Fault>,

    // Length of the outstanding span on each side. Zero-length grants are never outstanding.
    pub(crate) write_grant: Option<NonZero<usize>>,
    pub(crate) read_grant: Option<NonZero<usize>>,
}

impl<S: ByteStorage> MirroredRingBuffer<S> {
    /// Creates a buffer over `storage`, reserving its last `mirror_size` bytes as the mirror
    /// region.
    ///
    /// The head of the storage is copied into the mirror region, so whatever the storage
    /// contained before does not break the mirror invariant.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the storage length and `mirror_size` do not form a valid
    /// [`RingLayout`].
    pub fn from_storage(storage: S, mirror_size: usize) -> Result<Self, ConfigError> {
        let layout = RingLayout::new(storage.as_ref().len(), mirror_size)?;

        Ok(Self::new_validated(storage, layout))
    }

    /// Creates a buffer over `storage` using a precomputed layout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::StorageSizeMismatch`] if the storage is not exactly
    /// `layout.total_size()` bytes long.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::{MirroredRingBuffer, RingLayout};
    ///
    /// let layout = RingLayout::for_capacity(1000, 64).unwrap();
    /// let ring = MirroredRingBuffer::with_layout(vec![0; layout.total_size()], layout).unwrap();
    ///
    /// assert_eq!(ring.capacity(), 1000);
    /// ```
    pub fn with_layout(storage: S, layout: RingLayout) -> Result<Self, ConfigError> {
        let actual = storage.as_ref().len();

        if actual != layout.total_size() {
            return Err(ConfigError::StorageSizeMismatch {
                expected: layout.total_size(),
                actual,
            });
        }

        Ok(Self::new_validated(storage, layout))
    }

    fn new_validated(mut storage: S, layout: RingLayout) -> Self {
        storage.as_mut().copy_within(..layout.mirror_size(), layout.capacity());

        telemetry::created(&layout);

        Self {
            storage,
            layout,
            write_index: 0,
            read_index: 0,
            fault: None,
            write_grant: None,
            read_grant: None,
        }
    }

    /// The geometry of the buffer.
    #[must_use]
    pub const fn layout(&self) -> &RingLayout {
        &self.layout
    }

    /// Maximum number of bytes the buffer holds at once.
    ///
    /// This is one less than the number of ring slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.layout.usable_capacity()
    }

    /// Length of the mirror region, which bounds the longest contiguous span.
    #[must_use]
    pub const fn mirror_size(&self) -> usize {
        self.layout.mirror_size()
    }

    /// Number of bytes written and not yet read.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        if self.write_index >= self.read_index {
            self.write_index - self.read_index
        } else {
            self.write_index + self.layout.capacity() - self.read_index
        }
    }

    /// Whether there is at least one byte to read.
    #[must_use]
    #[inline]
    pub const fn has_data(&self) -> bool {
        self.write_index != self.read_index
    }

    /// Whether there is nothing to read.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        !self.has_data()
    }

    /// Whether the next write would overflow.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.free_space() == 0
    }

    /// Number of bytes that can be written before the buffer is full.
    #[must_use]
    #[inline]
    pub const fn free_space(&self) -> usize {
        self.layout.usable_capacity() - self.len()
    }

    /// The most recent fault, if it has not been cleared.
    #[must_use]
    pub const fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Forgets the recorded fault.
    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// Returns the recorded fault and clears it.
    pub fn take_fault(&mut self) -> Option<Fault> {
        self.fault.take()
    }

    /// The whole backing storage, mirror region included.
    ///
    /// Meant for inspection; the order of the bytes is physical, not logical.
    #[must_use]
    pub fn storage(&self) -> &[u8] {
        self.storage.as_ref()
    }

    /// Releases the backing storage. Unread bytes stay in it but are no longer tracked.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Appends one byte.
    ///
    /// If the buffer is full, the byte is stored into the spare slot but the write cursor does
    /// not advance past it, so it is not published, and [`Fault::Overflow`] is recorded.
    ///
    /// Cancels an outstanding write span.
    #[inline]
    pub fn push_byte(&mut self, value: u8) {
        self.cancel_write_span();

        let capacity = self.layout.capacity();
        let index = self.write_index;
        let bytes = self.storage.as_mut();

        bytes[index] = value;
        if index < self.layout.mirror_size() {
            bytes[index + capacity] = value;
        }

        let next = if index == self.layout.last_limit() { 0 } else { index + 1 };

        if next == self.read_index {
            self.fault = Some(Fault::Overflow);
        } else {
            self.write_index = next;
        }
    }

    /// Removes and returns the oldest byte.
    ///
    /// On an empty buffer, records [`Fault::Underflow`] and returns whatever stale byte sits
    /// under the read cursor. Check [`has_data()`][Self::has_data] first, or use
    /// [`try_pop_byte()`][Self::try_pop_byte].
    ///
    /// Cancels an outstanding read span.
    #[inline]
    pub fn pop_byte(&mut self) -> u8 {
        self.read_grant = None;

        let index = self.read_index;
        let value = self.storage.as_ref()[index];

        if index == self.write_index {
            self.fault = Some(Fault::Underflow);
        } else {
            self.read_index = if index == self.layout.last_limit() { 0 } else { index + 1 };
        }

        value
    }

    /// Removes and returns the oldest byte, or `None` (recording [`Fault::Underflow`]) if the
    /// buffer is empty.
    ///
    /// Cancels an outstanding read span.
    #[inline]
    pub fn try_pop_byte(&mut self) -> Option<u8> {
        if self.has_data() {
            Some(self.pop_byte())
        } else {
            self.read_grant = None;
            self.fault = Some(Fault::Underflow);
            None
        }
    }

    /// Copies as much of `data` as fits into the buffer and returns the number of bytes written.
    ///
    /// Writing fewer bytes than `data.len()` records [`Fault::Overflow`].
    ///
    /// Cancels an outstanding write span.
    pub fn bulk_write(&mut self, data: &[u8]) -> usize {
        self.cancel_write_span();

        let written = self.copy_in(data);

        if written < data.len() {
            self.raise(Fault::Overflow, data.len(), written);
        }

        written
    }

    /// Moves up to `out.len()` of the oldest bytes into `out` and returns how many were moved.
    ///
    /// Reading from an empty buffer into a non-empty `out` records [`Fault::Underflow`]. A
    /// short read from a non-empty buffer is not a fault.
    ///
    /// Cancels an outstanding read span.
    pub fn bulk_read(&mut self, out: &mut [u8]) -> usize {
        self.read_grant = None;

        if self.is_empty() && !out.is_empty() {
            self.raise(Fault::Underflow, out.len(), 0);
            return 0;
        }

        self.copy_out(out)
    }

    /// Copies up to `free_space()` bytes of `data` in without touching faults or spans.
    pub(crate) fn copy_in(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.free_space());
        if count == 0 {
            return 0;
        }

        let capacity = self.layout.capacity();
        let mirror_size = self.layout.mirror_size();
        let start = self.write_index;

        let (up_to_wrap, after_wrap) = data[..count].split_at(count.min(capacity - start));
        let bytes = self.storage.as_mut();

        bytes[start..start + up_to_wrap.len()].copy_from_slice(up_to_wrap);
        bytes[..after_wrap.len()].copy_from_slice(after_wrap);

        // Duplicate whatever landed in the head into the mirror region.
        if start < mirror_size {
            let end = (start + up_to_wrap.len()).min(mirror_size);
            bytes.copy_within(start..end, start + capacity);
        }
        bytes.copy_within(..after_wrap.len().min(mirror_size), capacity);

        self.write_index = self.layout.wrap(start + count);

        count
    }

    /// Copies up to `out.len()` bytes out without touching faults or spans.
    pub(crate) fn copy_out(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.len());
        if count == 0 {
            return 0;
        }

        let capacity = self.layout.capacity();
        let start = self.read_index;
        let bytes = self.storage.as_ref();

        // The mirror region extends the run past the wrap point, so this usually is one copy.
        let contiguous = count.min(bytes.len() - start);
        out[..contiguous].copy_from_slice(&bytes[start..start + contiguous]);

        // Anything beyond the mirror region continues right after the mirrored head bytes.
        if contiguous < count {
            let rest_start = start + contiguous - capacity;
            out[contiguous..count].copy_from_slice(&bytes[rest_start..rest_start + count - contiguous]);
        }

        self.read_index = self.layout.wrap(start + count);

        count
    }

    /// The longest run of unread bytes that is contiguous in storage, starting at the read cursor.
    pub(crate) fn readable_run(&self) -> &[u8] {
        let start = self.read_index;
        let bytes = self.storage.as_ref();
        let len = self.len().min(bytes.len() - start);

        &bytes[start..start + len]
    }

    /// The longest free region that is contiguous in storage, starting at the write cursor.
    ///
    /// The region may extend into the mirror region, in which case it must be published via
    /// [`publish_written()`][Self::publish_written] to reach the head of the ring.
    pub(crate) fn writable_run_len(&self) -> usize {
        self.free_space().min(self.layout.total_size() - self.write_index)
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        self.storage.as_ref()
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        self.storage.as_mut()
    }

    /// Advances the write cursor over `len` bytes that were written in place at the write
    /// cursor, restoring the mirror invariant on the way.
    ///
    /// `touched` is how many bytes at the write cursor were lent out for writing. Bytes past
    /// `len` are not published but may have been overwritten, so the mirror is re-synced over
    /// all of them.
    ///
    /// `len <= touched` and `touched` must not exceed
    /// [`writable_run_len()`][Self::writable_run_len].
    pub(crate) fn publish_written(&mut self, len: usize, touched: usize) {
        debug_assert!(len <= touched);

        let capacity = self.layout.capacity();
        let mirror_size = self.layout.mirror_size();
        let start = self.write_index;
        let end = start + len;
        let touched_end = start + touched;
        let bytes = self.storage.as_mut();

        if start < mirror_size {
            bytes.copy_within(start..touched_end.min(mirror_size), start + capacity);
        }

        // Unpublished bytes in the mirror region go back to what the head holds.
        if touched_end > capacity {
            let kept = end.max(capacity);
            bytes.copy_within(kept - capacity..touched_end - capacity, kept);
        }

        if end >= capacity {
            // The span ran into the mirror region. Those bytes belong at the head of the ring.
            let spilled = end - capacity;
            bytes.copy_within(capacity..end, 0);
            self.write_index = spilled;

            if spilled > 0 {
                telemetry::write_wrapped(spilled);
            }
        } else {
            self.write_index = end;
        }
    }

    /// Advances the read cursor over `len` bytes. `len` must not exceed [`len()`][Self::len].
    pub(crate) fn release_read(&mut self, len: usize) {
        self.read_index = self.layout.wrap(self.read_index + len);
    }

    pub(crate) fn raise(&mut self, fault: Fault, requested: usize, granted: usize) {
        self.fault = Some(fault);
        telemetry::fault(fault, requested, granted);
    }
}

impl<S> fmt::Debug for MirroredRingBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirroredRingBuffer")
            .field("layout", &self.layout)
            .field("write_index", &self.write_index)
            .field("read_index", &self.read_index)
            .field("fault", &self.fault)
            .field("write_grant", &self.write_grant)
            .field("read_grant", &self.read_grant)
            .finish_non_exhaustive()
    }
}
