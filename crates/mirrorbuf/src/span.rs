// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;
use std::ops::{Deref, DerefMut};

use crate::{ByteStorage, Fault, MirroredRingBuffer, Side, SpanError, telemetry};

impl<S: ByteStorage> MirroredRingBuffer<S> {
    /// Lends out up to `max_len` bytes of free space at the write cursor as one contiguous slice.
    ///
    /// The slice is `min(max_len, free_space())` bytes long, further limited so that it ends
    /// within the mirror region. Any request of up to `mirror_size()` bytes is therefore
    /// granted in full when there is enough free space. The slice may run past the last ring
    /// slot into the mirror region; [`commit_write_span()`][Self::commit_write_span] moves
    /// such bytes to where they belong.
    ///
    /// Nothing is published until the span is committed. An empty slice records
    /// [`Fault::Overflow`] and does not count as an outstanding span.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError::AlreadyOutstanding`] if a write span has been allocated and not yet
    /// committed or canceled.
    pub fn alloc_write_span(&mut self, max_len: usize) -> Result<&mut [u8], SpanError> {
        if self.write_grant.is_some() {
            return Err(reject(SpanError::AlreadyOutstanding(Side::Write)));
        }

        let granted = max_len.min(self.writable_run_len());
        telemetry::write_span_granted(granted);

        self.write_grant = NonZero::new(granted);
        if granted == 0 {
            self.raise(Fault::Overflow, max_len, 0);
        }

        let start = self.write_index;
        Ok(&mut self.bytes_mut()[start..start + granted])
    }

    /// Publishes the first `len` bytes of the outstanding write span and advances the write
    /// cursor past them.
    ///
    /// Bytes written into the head of the ring are copied into the mirror region and bytes that
    /// landed in the mirror region are copied to the head of the ring. Committing fewer bytes
    /// than were granted is allowed; committing zero bytes cancels the span.
    ///
    /// # Errors
    ///
    /// * [`SpanError::NotOutstanding`] if no write span is outstanding.
    /// * [`SpanError::ExceedsGrant`] if `len` is longer than the span. The span stays
    ///   outstanding.
    pub fn commit_write_span(&mut self, len: usize) -> Result<(), SpanError> {
        let granted = self.take_grant(Side::Write, len)?;

        self.publish_written(len, granted);
        Ok(())
    }

    /// Drops the outstanding write span without publishing anything. Whatever was written into
    /// the span is discarded, and the mirror region is brought back in sync with it.
    ///
    /// Returns whether a span was outstanding.
    pub fn cancel_write_span(&mut self) -> bool {
        match self.write_grant.take() {
            Some(granted) => {
                self.publish_written(0, granted.get());
                true
            }
            None => false,
        }
    }

    /// Lends out up to `max_len` unread bytes at the read cursor as one contiguous slice.
    ///
    /// The slice is `min(max_len, len())` bytes long, further limited so that it ends within
    /// the mirror region. Unread bytes past the last ring slot are read from the mirror
    /// region, so a span that crosses the wrap point needs no special handling by the caller.
    ///
    /// The caller may inspect more bytes than it eventually releases. This supports parsing
    /// ahead for a frame delimiter and releasing only the complete frame.
    ///
    /// On an empty buffer the slice is empty and [`Fault::Underflow`] is recorded. An empty
    /// slice does not count as an outstanding span.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError::AlreadyOutstanding`] if a read span has been allocated and not yet
    /// committed or canceled.
    pub fn alloc_read_span(&mut self, max_len: usize) -> Result<&[u8], SpanError> {
        if self.read_grant.is_some() {
            return Err(reject(SpanError::AlreadyOutstanding(Side::Read)));
        }

        if self.is_empty() {
            self.raise(Fault::Underflow, max_len, 0);
            return Ok(&[]);
        }

        let granted = max_len.min(self.readable_run().len());
        telemetry::read_span_granted(granted);

        self.read_grant = NonZero::new(granted);

        let start = self.read_index;
        Ok(&self.bytes()[start..start + granted])
    }

    /// Releases the first `len` bytes of the outstanding read span, advancing the read cursor.
    ///
    /// Releasing fewer bytes than were granted leaves the rest unread, in order. Releasing zero
    /// bytes cancels the span.
    ///
    /// # Errors
    ///
    /// * [`SpanError::NotOutstanding`] if no read span is outstanding.
    /// * [`SpanError::ExceedsGrant`] if `len` is longer than the span. The span stays
    ///   outstanding.
    pub fn commit_read_span(&mut self, len: usize) -> Result<(), SpanError> {
        let granted = self.take_grant(Side::Read, len)?;
        debug_assert!(len <= granted);

        self.release_read(len);
        Ok(())
    }

    /// Drops the outstanding read span without releasing anything.
    ///
    /// Returns whether a span was outstanding.
    pub fn cancel_read_span(&mut self) -> bool {
        self.read_grant.take().is_some()
    }

    /// Lends out free space like [`alloc_write_span()`][Self::alloc_write_span], wrapped in a
    /// guard that cancels the span if it is dropped without being committed.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError::AlreadyOutstanding`] if a write span allocated through
    /// [`alloc_write_span()`][Self::alloc_write_span] is still outstanding.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::MirroredRingBuffer;
    ///
    /// let mut ring = MirroredRingBuffer::from_storage(vec![0; 64], 16).unwrap();
    ///
    /// let mut grant = ring.grant_write(5).unwrap();
    /// grant.copy_from_slice(b"hello");
    /// grant.commit(5).unwrap();
    ///
    /// assert_eq!(ring.len(), 5);
    /// ```
    pub fn grant_write(&mut self, max_len: usize) -> Result<WriteGrant<'_, S>, SpanError> {
        let len = self.alloc_write_span(max_len)?.len();

        Ok(WriteGrant { ring: self, len })
    }

    /// Lends out unread bytes like [`alloc_read_span()`][Self::alloc_read_span], wrapped in a
    /// guard that cancels the span if it is dropped without being committed.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError::AlreadyOutstanding`] if a read span allocated through
    /// [`alloc_read_span()`][Self::alloc_read_span] is still outstanding.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::MirroredRingBuffer;
    ///
    /// let mut ring = MirroredRingBuffer::from_storage(vec![0; 64], 16).unwrap();
    /// ring.bulk_write(b"ping\npong\n");
    ///
    /// let grant = ring.grant_read(16).unwrap();
    /// let frame_len = grant.iter().position(|&b| b == b'\n').unwrap() + 1;
    /// assert_eq!(&grant[..frame_len], b"ping\n");
    /// grant.commit(frame_len).unwrap();
    ///
    /// assert_eq!(ring.len(), 5);
    /// ```
    pub fn grant_read(&mut self, max_len: usize) -> Result<ReadGrant<'_, S>, SpanError> {
        let len = self.alloc_read_span(max_len)?.len();

        Ok(ReadGrant { ring: self, len })
    }

    fn take_grant(&mut self, side: Side, len: usize) -> Result<usize, SpanError> {
        let slot = match side {
            Side::Write => &mut self.write_grant,
            Side::Read => &mut self.read_grant,
        };

        let Some(granted) = *slot else {
            return Err(reject(SpanError::NotOutstanding(side)));
        };

        if len > granted.get() {
            return Err(reject(SpanError::ExceedsGrant {
                side,
                len,
                granted: granted.get(),
            }));
        }

        *slot = None;
        Ok(granted.get())
    }
}

fn reject(error: SpanError) -> SpanError {
    telemetry::span_rejected(&error);
    error
}

/// Free space lent out by [`MirroredRingBuffer::grant_write()`].
///
/// Dereferences to the granted slice. Write into it, then call [`commit()`][Self::commit]
/// with the number of bytes written. Dropping the guard without committing publishes nothing.
#[derive(Debug)]
pub struct WriteGrant<'r, S: ByteStorage> {
    ring: &'r mut MirroredRingBuffer<S>,
    len: usize,
}

impl<S: ByteStorage> WriteGrant<'_, S> {
    /// Publishes the first `len` bytes of the grant.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError::ExceedsGrant`] if `len` is longer than the grant. Nothing is
    /// published in that case.
    pub fn commit(self, len: usize) -> Result<(), SpanError> {
        if len > self.len {
            return Err(reject(SpanError::ExceedsGrant {
                side: Side::Write,
                len,
                granted: self.len,
            }));
        }

        if len == 0 {
            return Ok(());
        }

        self.ring.commit_write_span(len)
    }
}

impl<S: ByteStorage> Deref for WriteGrant<'_, S> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        let start = self.ring.write_index;
        &self.ring.bytes()[start..start + self.len]
    }
}

impl<S: ByteStorage> DerefMut for WriteGrant<'_, S> {
    fn deref_mut(&mut self) -> &mut [u8] {
        let start = self.ring.write_index;
        let len = self.len;
        &mut self.ring.bytes_mut()[start..start + len]
    }
}

impl<S: ByteStorage> Drop for WriteGrant<'_, S> {
    fn drop(&mut self) {
        self.ring.cancel_write_span();
    }
}

/// Unread bytes lent out by [`MirroredRingBuffer::grant_read()`].
///
/// Dereferences to the granted slice. Call [`commit()`][Self::commit] with the number of bytes
/// consumed. Dropping the guard without committing leaves every byte unread.
#[derive(Debug)]
pub struct ReadGrant<'r, S: ByteStorage> {
    ring: &'r mut MirroredRingBuffer<S>,
    len: usize,
}

impl<S: ByteStorage> ReadGrant<'_, S> {
    /// Releases the first `len` bytes of the grant.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError::ExceedsGrant`] if `len` is longer than the grant. Nothing is
    /// released in that case.
    pub fn commit(self, len: usize) -> Result<(), SpanError> {
        if len > self.len {
            return Err(reject(SpanError::ExceedsGrant {
                side: Side::Read,
                len,
                granted: self.len,
            }));
        }

        if len == 0 {
            return Ok(());
        }

        self.ring.commit_read_span(len)
    }
}

impl<S: ByteStorage> Deref for ReadGrant<'_, S> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        let start = self.ring.read_index;
        &self.ring.bytes()[start..start + self.len]
    }
}

impl<S: ByteStorage> Drop for ReadGrant<'_, S> {
    fn drop(&mut self) {
        self.ring.cancel_read_span();
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use testing_aids::{LogCapture, assert_mirrored};
    use tracing_subscriber::util::SubscriberInitExt;

    use super::*;

    fn ring(total_size: usize, mirror_size: usize) -> MirroredRingBuffer<Vec<u8>> {
        MirroredRingBuffer::from_storage(vec![0; total_size], mirror_size).unwrap()
    }

    /// Moves both cursors to `index` on an empty ring.
    fn park_at(ring: &mut MirroredRingBuffer<Vec<u8>>, index: usize) {
        let filler = vec![0; index];
        assert_eq!(ring.bulk_write(&filler), index);
        assert_eq!(ring.bulk_read(&mut vec![0; index]), index);
    }

    #[test]
    fn write_span_across_wrap() {
        let mut ring = ring(16, 4);

        for value in 0..11 {
            ring.push_byte(value);
        }
        ring.push_byte(11);
        assert_eq!(ring.take_fault(), Some(Fault::Overflow));
        assert_eq!(ring.len(), 11);

        for expected in 0..5 {
            assert_eq!(ring.pop_byte(), expected);
        }

        // The write cursor sits on the last ring slot, so the span runs into the mirror.
        // Only five bytes are free, which caps the grant below the six requested.
        assert_eq!(ring.write_index, 11);
        let span = ring.alloc_write_span(6).unwrap();
        assert_eq!(span.len(), 5);
        span.copy_from_slice(&[20, 21, 22, 23, 24]);

        ring.commit_write_span(5).unwrap();

        assert_eq!(ring.write_index, 4);
        assert_eq!(&ring.storage()[..4], &[21, 22, 23, 24]);
        assert_mirrored(ring.storage(), 4);
        assert!(ring.fault().is_none());
        assert!(ring.is_full());

        let mut out = [0; 11];
        assert_eq!(ring.bulk_read(&mut out), 11);
        assert_eq!(out, [5, 6, 7, 8, 9, 10, 20, 21, 22, 23, 24]);
    }

    #[test]
    fn mirror_sized_write_span_is_always_granted_in_full() {
        let mut ring = ring(16, 4);

        for start in 0..12 {
            park_at(&mut ring, start);

            let span = ring.alloc_write_span(4).unwrap();
            assert_eq!(span.len(), 4, "write span at slot {start}");
            span.copy_from_slice(b"spam");
            ring.commit_write_span(4).unwrap();
            assert_mirrored(ring.storage(), 4);

            assert_eq!(ring.alloc_read_span(4).unwrap(), b"spam", "read span at slot {start}");
            ring.commit_read_span(4).unwrap();

            // Return both cursors to zero for the next round.
            let back = (12 - ring.write_index) % 12;
            park_at(&mut ring, back);
            assert_eq!(ring.write_index, 0);
        }
    }

    #[test]
    fn write_span_in_head_updates_mirror() {
        let mut ring = ring(16, 4);

        ring.alloc_write_span(3).unwrap().copy_from_slice(b"abc");
        ring.commit_write_span(3).unwrap();

        assert_eq!(&ring.storage()[12..15], b"abc");
        assert_mirrored(ring.storage(), 4);
    }

    #[test]
    fn write_span_from_head_past_mirror() {
        let mut ring = ring(16, 4);
        park_at(&mut ring, 2);

        let span = ring.alloc_write_span(8).unwrap();
        assert_eq!(span.len(), 8);
        span.copy_from_slice(b"01234567");
        ring.commit_write_span(8).unwrap();

        assert_eq!(&ring.storage()[12..], b"\0\x0001");
        assert_mirrored(ring.storage(), 4);
        assert_eq!(ring.write_index, 10);
    }

    #[test]
    fn write_span_ending_exactly_at_wrap() {
        let mut ring = ring(16, 4);
        park_at(&mut ring, 8);

        ring.alloc_write_span(4).unwrap().copy_from_slice(b"wxyz");
        ring.commit_write_span(4).unwrap();

        assert_eq!(ring.write_index, 0);
        assert_eq!(ring.len(), 4);
        assert_mirrored(ring.storage(), 4);
    }

    #[test]
    fn write_span_is_limited_by_free_space() {
        let mut ring = ring(16, 4);
        ring.bulk_write(&[1; 9]);

        assert_eq!(ring.alloc_write_span(4).unwrap().len(), 2);
    }

    #[test]
    fn write_span_never_leaves_the_storage() {
        let mut ring = ring(16, 4);
        park_at(&mut ring, 10);

        // Eleven bytes are free, but only six fit before the end of the mirror region.
        assert_eq!(ring.free_space(), 11);
        assert_eq!(ring.alloc_write_span(10).unwrap().len(), 6);
    }

    #[test]
    fn partial_write_commit_in_head_keeps_mirror() {
        let mut ring = ring(16, 4);

        ring.alloc_write_span(4).unwrap().copy_from_slice(b"abcd");
        ring.commit_write_span(2).unwrap();

        assert_mirrored(ring.storage(), 4);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.alloc_read_span(4).unwrap(), b"ab");
    }

    #[test]
    fn partial_write_commit_across_wrap_keeps_mirror() {
        let mut ring = ring(16, 4);
        park_at(&mut ring, 10);

        let span = ring.alloc_write_span(6).unwrap();
        assert_eq!(span.len(), 6);
        span.copy_from_slice(b"uvwxyz");
        ring.commit_write_span(3).unwrap();

        assert_eq!(ring.write_index, 1);
        assert_eq!(ring.storage()[0], b'w');
        assert_mirrored(ring.storage(), 4);

        let mut out = [0; 3];
        assert_eq!(ring.bulk_read(&mut out), 3);
        assert_eq!(&out, b"uvw");
    }

    #[test]
    fn canceled_write_span_keeps_mirror() {
        let mut ring = ring(16, 4);

        ring.alloc_write_span(4).unwrap().copy_from_slice(b"gone");
        assert!(ring.cancel_write_span());
        assert_mirrored(ring.storage(), 4);

        park_at(&mut ring, 9);
        ring.alloc_write_span(5).unwrap().copy_from_slice(b"spill");
        assert!(ring.cancel_write_span());

        assert!(ring.is_empty());
        assert_mirrored(ring.storage(), 4);
    }

    #[test]
    fn write_span_canceled_by_copying_write_keeps_mirror() {
        let mut ring = ring(16, 4);
        park_at(&mut ring, 10);

        ring.alloc_write_span(6).unwrap().copy_from_slice(b"junk!!");
        ring.push_byte(b'a');
        ring.bulk_write(b"bc");

        assert_mirrored(ring.storage(), 4);
        assert_eq!(ring.alloc_read_span(4).unwrap(), b"abc");
    }

    #[test]
    fn empty_write_span_is_overflow() {
        let mut ring = ring(8, 2);
        ring.bulk_write(&[1; 5]);

        assert!(ring.alloc_write_span(1).unwrap().is_empty());
        assert_eq!(ring.fault(), Some(Fault::Overflow));

        // Not outstanding, so another allocation is fine.
        assert!(ring.alloc_write_span(1).unwrap().is_empty());
        assert_eq!(ring.commit_write_span(0), Err(SpanError::NotOutstanding(Side::Write)));
    }

    #[test]
    fn one_outstanding_write_span() {
        let mut ring = ring(16, 4);

        ring.alloc_write_span(2).unwrap();

        assert_eq!(
            ring.alloc_write_span(2).unwrap_err(),
            SpanError::AlreadyOutstanding(Side::Write)
        );

        // The read side is independent.
        ring.alloc_read_span(1).unwrap();
        assert!(ring.cancel_write_span());
        assert!(!ring.cancel_write_span());
        ring.alloc_write_span(2).unwrap();
    }

    #[test]
    fn commit_without_span() {
        let mut ring = ring(16, 4);

        assert_eq!(ring.commit_write_span(1), Err(SpanError::NotOutstanding(Side::Write)));
        assert_eq!(ring.commit_read_span(1), Err(SpanError::NotOutstanding(Side::Read)));
    }

    #[test]
    fn commit_longer_than_grant_keeps_span() {
        let mut ring = ring(16, 4);

        ring.alloc_write_span(3).unwrap();

        assert_eq!(
            ring.commit_write_span(4),
            Err(SpanError::ExceedsGrant {
                side: Side::Write,
                len: 4,
                granted: 3,
            })
        );

        ring.commit_write_span(3).unwrap();
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn copying_writes_cancel_write_span() {
        let mut ring = ring(16, 4);

        ring.alloc_write_span(3).unwrap();
        ring.push_byte(1);

        assert_eq!(ring.commit_write_span(3), Err(SpanError::NotOutstanding(Side::Write)));

        ring.alloc_write_span(3).unwrap();
        ring.bulk_write(&[2]);

        assert_eq!(ring.commit_write_span(3), Err(SpanError::NotOutstanding(Side::Write)));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn read_span_across_wrap_uses_mirror() {
        let mut ring = ring(16, 4);
        park_at(&mut ring, 9);
        ring.bulk_write(b"abcdef");

        let span = ring.alloc_read_span(6).unwrap();

        assert_eq!(span, b"abcdef");
        ring.commit_read_span(6).unwrap();
        assert!(ring.is_empty());
        assert_eq!(ring.read_index, 3);
    }

    #[test]
    fn partial_release_keeps_remainder() {
        let mut ring = ring(16, 4);
        ring.bulk_write(b"frame1;fr");

        let span = ring.alloc_read_span(16).unwrap();
        let frame_end = span.iter().position(|&b| b == b';').unwrap() + 1;
        ring.commit_read_span(frame_end).unwrap();

        assert_eq!(ring.alloc_read_span(16).unwrap(), b"fr");
    }

    #[test]
    fn read_span_is_limited_by_data() {
        let mut ring = ring(16, 4);
        ring.bulk_write(b"ab");

        assert_eq!(ring.alloc_read_span(4).unwrap(), b"ab");
    }

    #[test]
    fn empty_read_span_is_underflow() {
        let mut ring = ring(16, 4);

        assert!(ring.alloc_read_span(4).unwrap().is_empty());
        assert_eq!(ring.fault(), Some(Fault::Underflow));
        assert!(!ring.cancel_read_span());
    }

    #[test]
    fn one_outstanding_read_span() {
        let mut ring = ring(16, 4);
        ring.bulk_write(b"abc");

        ring.alloc_read_span(2).unwrap();

        assert_eq!(ring.alloc_read_span(2).unwrap_err(), SpanError::AlreadyOutstanding(Side::Read));

        ring.commit_read_span(0).unwrap();
        assert_eq!(ring.alloc_read_span(3).unwrap(), b"abc");
    }

    #[test]
    fn copying_reads_cancel_read_span() {
        let mut ring = ring(16, 4);
        ring.bulk_write(b"abc");

        ring.alloc_read_span(3).unwrap();
        assert_eq!(ring.pop_byte(), b'a');

        assert_eq!(ring.commit_read_span(1), Err(SpanError::NotOutstanding(Side::Read)));
    }

    #[test]
    fn write_grant_commit() {
        let mut ring = ring(16, 4);
        park_at(&mut ring, 10);

        let mut grant = ring.grant_write(4).unwrap();
        assert_eq!(grant.len(), 4);
        grant.copy_from_slice(b"wrap");
        grant.commit(4).unwrap();

        assert_mirrored(ring.storage(), 4);
        assert_eq!(&*ring.grant_read(4).unwrap(), b"wrap");
    }

    #[test]
    fn write_grant_dropped_publishes_nothing() {
        let mut ring = ring(16, 4);

        {
            let mut grant = ring.grant_write(4).unwrap();
            grant.copy_from_slice(b"lost");
        }

        assert!(ring.is_empty());
        assert_mirrored(ring.storage(), 4);
        assert!(!ring.cancel_write_span());
        ring.grant_write(4).unwrap();
    }

    #[test]
    fn write_grant_partial_commit_across_wrap_keeps_mirror() {
        let mut ring = ring(16, 4);
        park_at(&mut ring, 11);

        let mut grant = ring.grant_write(4).unwrap();
        grant.copy_from_slice(b"tail");
        grant.commit(1).unwrap();

        assert_mirrored(ring.storage(), 4);
        assert_eq!(ring.write_index, 0);
        assert_eq!(ring.pop_byte(), b't');
    }

    #[test]
    fn write_grant_commit_too_long() {
        let mut ring = ring(16, 4);

        let grant = ring.grant_write(2).unwrap();

        assert_eq!(
            grant.commit(3),
            Err(SpanError::ExceedsGrant {
                side: Side::Write,
                len: 3,
                granted: 2,
            })
        );
        assert!(ring.is_empty());
        assert!(!ring.cancel_write_span());
    }

    #[test]
    fn empty_write_grant_commits_nothing() {
        let mut ring = ring(8, 2);
        ring.bulk_write(&[0; 5]);

        let grant = ring.grant_write(4).unwrap();
        assert!(grant.is_empty());
        grant.commit(0).unwrap();

        assert_eq!(ring.len(), 5);
    }

    #[test]
    fn read_grant_partial_commit() {
        let mut ring = ring(16, 4);
        ring.bulk_write(b"hello");

        let grant = ring.grant_read(5).unwrap();
        assert_eq!(&*grant, b"hello");
        grant.commit(2).unwrap();

        assert_eq!(ring.len(), 3);
        assert_eq!(&*ring.grant_read(5).unwrap(), b"llo");
    }

    #[test]
    fn read_grant_dropped_releases_nothing() {
        let mut ring = ring(16, 4);
        ring.bulk_write(b"hello");

        drop(ring.grant_read(5).unwrap());

        assert_eq!(ring.len(), 5);
        assert!(!ring.cancel_read_span());
    }

    #[test]
    fn grant_after_raw_alloc_is_rejected() {
        let mut ring = ring(16, 4);
        ring.bulk_write(b"hello");

        ring.alloc_write_span(1).unwrap();
        ring.alloc_read_span(1).unwrap();

        assert_eq!(ring.grant_write(1).unwrap_err(), SpanError::AlreadyOutstanding(Side::Write));
        assert_eq!(ring.grant_read(1).unwrap_err(), SpanError::AlreadyOutstanding(Side::Read));
    }

    #[test]
    fn rejected_span_emits_log() {
        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        let mut ring = ring(16, 4);
        ring.alloc_write_span(1).unwrap();
        _ = ring.alloc_write_span(1);

        log_capture.assert_contains("span rejected");
        log_capture.assert_contains("side=write");
        log_capture.assert_contains("a write span is already outstanding");
    }

    #[test]
    fn wrapped_commit_emits_log() {
        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        let mut ring = ring(16, 4);
        park_at(&mut ring, 10);
        ring.alloc_write_span(4).unwrap();
        ring.commit_write_span(4).unwrap();

        log_capture.assert_contains("write span wrapped");
        log_capture.assert_contains("spilled=2");
    }
}
