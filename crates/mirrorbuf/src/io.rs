// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, BufRead, Read, Write};

use crate::{ByteStorage, MirroredRingBuffer};

/// Writes as much as fits. A full buffer accepts nothing and returns `Ok(0)`.
///
/// A short write is ordinary for [`Write`], so unlike
/// [`bulk_write()`][MirroredRingBuffer::bulk_write] this does not record
/// [`Fault::Overflow`][crate::Fault::Overflow]. It does cancel an outstanding write span.
impl<S: ByteStorage> Write for MirroredRingBuffer<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cancel_write_span();

        Ok(self.copy_in(buf))
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reads as much as is buffered. An empty buffer returns `Ok(0)` without recording
/// [`Fault::Underflow`][crate::Fault::Underflow]. Cancels an outstanding read span.
impl<S: ByteStorage> Read for MirroredRingBuffer<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_grant = None;

        if self.is_empty() {
            return Ok(0);
        }

        Ok(self.copy_out(buf))
    }
}

/// The ring is already a buffer, so it implements [`BufRead`] directly. Prefer this over
/// wrapping it in [`std::io::BufReader`].
///
/// [`fill_buf()`][BufRead::fill_buf] returns the longest run of unread bytes that is contiguous
/// in storage, which thanks to the mirror region is usually everything that is buffered.
impl<S: ByteStorage> BufRead for MirroredRingBuffer<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.read_grant = None;

        Ok(self.readable_run())
    }

    fn consume(&mut self, amt: usize) {
        self.read_grant = None;

        self.release_read(amt.min(self.len()));
    }
}
