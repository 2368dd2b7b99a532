// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Asserts that the last `mirror_size` bytes of a mirrored ring buffer's storage duplicate its
/// first `mirror_size` bytes.
///
/// Pass the whole backing storage, mirror region included.
///
/// # Panics
///
/// Panics if the mirror region is out of sync, or if `mirror_size` does not fit in the
/// storage.
#[track_caller]
pub fn assert_mirrored(storage: &[u8], mirror_size: usize) {
    assert!(
        mirror_size <= storage.len() / 2,
        "mirror size {mirror_size} does not fit in {} bytes of storage",
        storage.len()
    );

    let capacity = storage.len() - mirror_size;
    let head = &storage[..mirror_size];
    let mirror = &storage[capacity..];

    assert_eq!(
        head, mirror,
        "mirror region out of sync: head vs mirror of a storage with {capacity} ring slots"
    );
}
