// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ConfigError;

/// Mirror sizes that are a multiple of this many bytes keep the mirror copies word-aligned.
pub const MIRROR_ALIGNMENT: usize = 4;

/// The validated geometry of a mirrored ring buffer.
///
/// The backing storage of `total_size` bytes is split into two regions:
///
/// ```text
/// 0                    capacity           total_size
/// |--------------------|------------------|
///  ring slots           mirror region
///  ^ head (mirror_size bytes) is duplicated into the mirror region
/// ```
///
/// The cursors only ever address the ring slots `[0, capacity)`. The mirror region exists so
/// that a span starting near the end of the ring can run past `capacity` and still be
/// contiguous in memory, which is why `mirror_size` bounds the longest span that can cross the
/// wrap point.
///
/// One ring slot is always kept empty to tell a full buffer from an empty one, so at most
/// [`usable_capacity()`][Self::usable_capacity] bytes are stored at any time.
///
/// # Examples
///
/// ```
/// use mirrorbuf::RingLayout;
///
/// let layout = RingLayout::new(16, 4).unwrap();
///
/// assert_eq!(layout.capacity(), 12);
/// assert_eq!(layout.usable_capacity(), 11);
/// assert_eq!(layout.last_limit(), 11);
/// assert_eq!(layout.begin_limit(), 3);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RingLayout {
    total_size: usize,
    mirror_size: usize,
}

impl RingLayout {
    /// Validates a storage length and mirror size.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::EmptyStorage`] if `total_size` is zero.
    /// * [`ConfigError::ZeroMirror`] if `mirror_size` is zero.
    /// * [`ConfigError::MirrorTooLarge`] if `mirror_size` exceeds `total_size / 2`.
    /// * [`ConfigError::NoUsableCapacity`] if no byte of data would fit.
    pub const fn new(total_size: usize, mirror_size: usize) -> Result<Self, ConfigError> {
        if total_size == 0 {
            return Err(ConfigError::EmptyStorage);
        }

        if mirror_size == 0 {
            return Err(ConfigError::ZeroMirror);
        }

        if mirror_size > total_size / 2 {
            return Err(ConfigError::MirrorTooLarge { total_size, mirror_size });
        }

        // One slot always stays empty, so a single ring slot holds nothing.
        if total_size - mirror_size < 2 {
            return Err(ConfigError::NoUsableCapacity { total_size, mirror_size });
        }

        Ok(Self { total_size, mirror_size })
    }

    /// Computes the smallest layout that stores `usable_capacity` bytes and hands out
    /// contiguous spans of up to `max_span` bytes anywhere in the ring.
    ///
    /// Allocate `total_size()` bytes of storage for the returned layout.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`new()`][Self::new] for the resulting geometry. In
    /// particular, `max_span` may not exceed `usable_capacity + 1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingLayout;
    ///
    /// let layout = RingLayout::for_capacity(255, 64).unwrap();
    ///
    /// assert_eq!(layout.usable_capacity(), 255);
    /// assert_eq!(layout.mirror_size(), 64);
    /// assert_eq!(layout.total_size(), 320);
    /// ```
    pub const fn for_capacity(usable_capacity: usize, max_span: usize) -> Result<Self, ConfigError> {
        let total_size = usable_capacity.saturating_add(1).saturating_add(max_span);
        Self::new(total_size, max_span)
    }

    /// Length of the backing storage, mirror region included.
    #[must_use]
    pub const fn total_size(&self) -> usize {
        self.total_size
    }

    /// Length of the mirror region, which is also the longest span guaranteed to be contiguous.
    #[must_use]
    pub const fn mirror_size(&self) -> usize {
        self.mirror_size
    }

    /// Number of ring slots, excluding the mirror region.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.total_size - self.mirror_size
    }

    /// Maximum number of bytes stored at once.
    #[must_use]
    pub const fn usable_capacity(&self) -> usize {
        self.capacity() - 1
    }

    /// The last ring index whose contents are duplicated into the mirror region.
    #[must_use]
    pub const fn begin_limit(&self) -> usize {
        self.mirror_size - 1
    }

    /// The last ring index before the cursors wrap to zero.
    #[must_use]
    pub const fn last_limit(&self) -> usize {
        self.capacity() - 1
    }

    /// Whether the mirror size is a multiple of [`MIRROR_ALIGNMENT`].
    ///
    /// Unaligned mirrors work correctly but make the mirror copies slower.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.mirror_size % MIRROR_ALIGNMENT == 0
    }

    /// Wraps an index in `[0, 2 * capacity)` into the ring slots.
    #[inline]
    pub(crate) const fn wrap(&self, index: usize) -> usize {
        let capacity = self.capacity();

        if index >= capacity { index - capacity } else { index }
    }
}
