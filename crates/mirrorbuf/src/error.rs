// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

/// A sticky fault recorded by a [`MirroredRingBuffer`][crate::MirroredRingBuffer].
///
/// Faults are not errors in the `Result` sense. Operations report partial success through
/// their return values and additionally record the most recent fault on the buffer, where it
/// stays until the caller inspects it via [`fault()`][crate::MirroredRingBuffer::fault] and
/// clears it via [`clear_fault()`][crate::MirroredRingBuffer::clear_fault] or
/// [`take_fault()`][crate::MirroredRingBuffer::take_fault].
///
/// A newer fault replaces an older one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Fault {
    /// A write found less free space than it asked for (possibly none at all).
    Overflow,

    /// A read found the buffer empty.
    Underflow,
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => f.write_str("overflow"),
            Self::Underflow => f.write_str("underflow"),
        }
    }
}

/// The side of the buffer an operation belongs to.
///
/// Exactly one execution context may use each side.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Side {
    /// `push_byte()`, `bulk_write()` and write spans.
    Write,

    /// `pop_byte()`, `bulk_read()` and read spans.
    Read,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => f.write_str("write"),
            Self::Read => f.write_str("read"),
        }
    }
}

/// The storage and mirror size do not describe a usable buffer.
///
/// Returned when creating a [`RingLayout`][crate::RingLayout] or a
/// [`MirroredRingBuffer`][crate::MirroredRingBuffer].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The storage has no bytes at all.
    #[error("storage is empty")]
    EmptyStorage,

    /// The mirror region must hold at least one byte.
    #[error("mirror size must not be zero")]
    ZeroMirror,

    /// The mirror region may occupy at most half of the storage.
    #[error("mirror size {mirror_size} exceeds half of the {total_size}-byte storage")]
    MirrorTooLarge {
        /// Length of the storage.
        total_size: usize,
        /// Requested mirror size.
        mirror_size: usize,
    },

    /// The layout leaves no slot for data, as one slot is always kept empty.
    #[error("a {total_size}-byte storage with a {mirror_size}-byte mirror has no usable capacity")]
    NoUsableCapacity {
        /// Length of the storage.
        total_size: usize,
        /// Requested mirror size.
        mirror_size: usize,
    },

    /// The storage does not have the length the layout was computed for.
    #[error("layout expects {expected} bytes of storage but {actual} were provided")]
    StorageSizeMismatch {
        /// `RingLayout::total_size()` of the layout.
        expected: usize,
        /// Length of the storage that was provided.
        actual: usize,
    },
}

/// A span was allocated or committed out of order.
///
/// At most one span may be outstanding per side. A second allocation before the first one is
/// committed or canceled would let the two commits disagree about where the data landed, so it
/// is rejected instead.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum SpanError {
    /// A span on this side has been allocated and not yet committed or canceled.
    #[error("a {0} span is already outstanding")]
    AlreadyOutstanding(Side),

    /// There is no span on this side to commit.
    #[error("no {0} span is outstanding")]
    NotOutstanding(Side),

    /// The commit covers more bytes than the span granted.
    #[error("cannot commit {len} bytes of a {granted}-byte {side} span")]
    ExceedsGrant {
        /// Side of the span.
        side: Side,
        /// Length passed to the commit.
        len: usize,
        /// Length of the outstanding span.
        granted: usize,
    },
}

impl SpanError {
    /// The side of the buffer the rejected operation belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        match self {
            Self::AlreadyOutstanding(side) | Self::NotOutstanding(side) | Self::ExceedsGrant { side, .. } => *side,
        }
    }
}

/// Usage errors surface as `InvalidInput` when the buffer is driven through `std::io` code.
impl From<SpanError> for std::io::Error {
    fn from(value: SpanError) -> Self {
        Self::new(std::io::ErrorKind::InvalidInput, value)
    }
}

impl From<ConfigError> for std::io::Error {
    fn from(value: ConfigError) -> Self {
        Self::new(std::io::ErrorKind::InvalidInput, value)
    }
}
