// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! A fixed-capacity byte FIFO whose trailing mirror region makes every span up to a chosen size
//! contiguous in memory, even when it crosses the wrap point.
//!
//! Ring buffers are the usual glue between a byte producer that runs in an interrupt handler or
//! a DMA engine and a consumer that parses frames in a main loop. Their weak spot is the wrap
//! point: a frame that straddles it arrives in two pieces, so either the parser handles two
//! slices or the data is copied into a scratch buffer first.
//!
//! [`MirroredRingBuffer`] removes the wrap point for spans of up to `mirror_size` bytes. The
//! backing storage carries `mirror_size` extra bytes after the ring slots that always duplicate
//! the head of the ring:
//!
//! ```text
//! 0                    capacity           total_size
//! |--------------------|------------------|
//!  ring slots           mirror region
//! ```
//!
//! A reader that starts near the end of the ring simply keeps reading into the mirror region
//! and sees the same bytes as if the ring had no end. A writer may likewise be handed a region
//! that runs into the mirror region; committing the write copies the spilled bytes back to the
//! head of the ring.
//!
//! # Access modes
//!
//! * Byte at a time: [`push_byte()`] and [`pop_byte()`] are O(1) and never allocate, log or
//!   panic, so they fit interrupt handlers.
//! * Copying: [`bulk_write()`] and [`bulk_read()`], plus the [`std::io::Write`],
//!   [`std::io::Read`] and [`std::io::BufRead`] implementations.
//! * Zero-copy: [`alloc_write_span()`] lends free space to a writer (for example a DMA engine)
//!   and [`alloc_read_span()`] lends unread bytes to a parser. A matching commit moves the
//!   cursor afterwards. [`grant_write()`] and [`grant_read()`] do the same through guards that
//!   cancel the span when dropped.
//!
//! With the `bytes-compat` feature, the buffer also implements `bytes::Buf` and
//! `bytes::BufMut`.
//!
//! # Faults
//!
//! A full or empty buffer is not an error. Operations do as much as they can, return how much
//! that was, and record a sticky [`Fault`] that stays until the caller inspects and clears it.
//! Only misuse of the span protocol returns a [`SpanError`], and only an unusable layout
//! returns a [`ConfigError`].
//!
//! # Example
//!
//! ```
//! use mirrorbuf::MirroredRingBuffer;
//!
//! let mut storage = [0_u8; 32];
//! let mut ring = MirroredRingBuffer::from_storage(&mut storage[..], 8).unwrap();
//!
//! // An interrupt handler pushes bytes as they arrive.
//! for &byte in b"$GPGLL,4916.45,N*2D\n" {
//!     ring.push_byte(byte);
//! }
//!
//! // The main loop looks at what is there without copying it out.
//! let span = ring.alloc_read_span(usize::MAX).unwrap();
//! let frame_len = span.iter().position(|&b| b == b'\n').unwrap() + 1;
//! assert!(span[..frame_len].starts_with(b"$GPGLL"));
//! ring.commit_read_span(frame_len).unwrap();
//!
//! assert!(ring.is_empty());
//! ```
//!
//! # Observability
//!
//! With the `logs` feature, construction, faults on the bulk and span paths, rejected span
//! operations and wrapped write commits emit `tracing` events. Granted span lengths and fault
//! counts are always recorded as `nm` metrics. Neither happens on the byte-at-a-time path.
//!
//! [`push_byte()`]: MirroredRingBuffer::push_byte
//! [`pop_byte()`]: MirroredRingBuffer::pop_byte
//! [`bulk_write()`]: MirroredRingBuffer::bulk_write
//! [`bulk_read()`]: MirroredRingBuffer::bulk_read
//! [`alloc_write_span()`]: MirroredRingBuffer::alloc_write_span
//! [`alloc_read_span()`]: MirroredRingBuffer::alloc_read_span
//! [`grant_write()`]: MirroredRingBuffer::grant_write
//! [`grant_read()`]: MirroredRingBuffer::grant_read

#[cfg(feature = "bytes-compat")]
mod bytes_compat;
mod error;
mod io;
mod layout;
mod ring;
mod span;
mod telemetry;

pub use error::{ConfigError, Fault, Side, SpanError};
pub use layout::{MIRROR_ALIGNMENT, RingLayout};
pub use ring::{ByteStorage, MirroredRingBuffer};
pub use span::{ReadGrant, WriteGrant};
