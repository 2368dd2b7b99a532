// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compatibility with the traits of the `bytes` crate.

use bytes::buf::UninitSlice;
use bytes::{Buf, BufMut};

use crate::{ByteStorage, MirroredRingBuffer};

/// Reads the unread bytes in FIFO order. [`chunk()`][Buf::chunk] is the longest contiguous run,
/// which thanks to the mirror region usually covers everything that is buffered.
impl<S: ByteStorage> Buf for MirroredRingBuffer<S> {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn remaining(&self) -> usize {
        self.len()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn chunk(&self) -> &[u8] {
        self.readable_run()
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.len(),
            "cannot advance past the {} unread bytes (requested {cnt})",
            self.len()
        );

        self.read_grant = None;
        self.release_read(cnt);
    }
}

// SAFETY: The trait documentation does not define any safety requirements we need to fulfill.
// The chunk we hand out is always initialized memory of the backing storage.
unsafe impl<S: ByteStorage> BufMut for MirroredRingBuffer<S> {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    #[inline]
    fn remaining_mut(&self) -> usize {
        self.free_space()
    }

    unsafe fn advance_mut(&mut self, cnt: usize) {
        assert!(
            cnt <= self.writable_run_len(),
            "cannot advance past the {}-byte writable chunk (requested {cnt})",
            self.writable_run_len()
        );

        self.cancel_write_span();

        // The whole chunk was lent out, not just the advanced part.
        let touched = self.writable_run_len();
        self.publish_written(cnt, touched);
    }

    #[inline]
    fn chunk_mut(&mut self) -> &mut UninitSlice {
        let start = self.write_index;
        let len = self.writable_run_len();

        UninitSlice::new(&mut self.bytes_mut()[start..start + len])
    }
}
