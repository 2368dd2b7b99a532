// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lends free space of the ring to a (simulated) DMA engine and lets the application read
//! through the `std::io::BufRead` implementation.
//!
//! Run with the `logs` feature to see the events the ring emits, including the reconciliation
//! that happens whenever a DMA transfer runs past the last ring slot into the mirror region.

use std::error::Error;
use std::io::BufRead;

use mirrorbuf::MirroredRingBuffer;
use tracing::Level;

// One DMA transfer never exceeds this many bytes.
const DMA_CHUNK: usize = 16;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(Level::TRACE).init();

    let mut ring = MirroredRingBuffer::from_storage(vec![0_u8; 64], DMA_CHUNK)?;

    let payload = b"the quick brown fox jumps over the lazy dog\n".repeat(4);
    let mut pending = &payload[..];
    let mut received = Vec::new();

    while !pending.is_empty() || ring.has_data() {
        if !pending.is_empty() {
            // The DMA engine writes straight into the ring.
            let mut grant = ring.grant_write(DMA_CHUNK.min(pending.len()))?;
            let transferred = grant.len();
            grant.copy_from_slice(&pending[..transferred]);
            grant.commit(transferred)?;
            pending = &pending[transferred..];
        }

        // The application takes whatever is contiguous, which is usually everything.
        let available = ring.fill_buf()?;
        let len = available.len();
        received.extend_from_slice(available);
        ring.consume(len);
    }

    assert_eq!(received, payload);
    println!("received {} bytes intact", received.len());

    Ok(())
}
