// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Parses newline-delimited frames from a ring that a (simulated) UART interrupt handler fills
//! one byte at a time.
//!
//! The ring is deliberately small, so frames regularly straddle the wrap point. Thanks to the
//! mirror region, the parser still sees every frame as one slice and never copies it out.

use mirrorbuf::{Fault, MirroredRingBuffer, RingLayout};
use nm::Report;

const SENTENCES: &[&[u8]] = &[
    b"$GPGGA,123519,4807.038,N,01131.000,E*47\n",
    b"$GPGLL,4916.45,N,12311.12,W*31\n",
    b"$GPVTG,054.7,T,034.4,M*48\n",
    b"$GPZDA,201530.00,04,07,2002*52\n",
];

// Longest frame we expect to parse in one piece.
const MAX_FRAME: usize = 48;

fn main() {
    let layout = RingLayout::for_capacity(96, MAX_FRAME).unwrap();
    let mut storage = vec![0_u8; layout.total_size()];
    let mut ring = MirroredRingBuffer::with_layout(&mut storage[..], layout).unwrap();

    let mut frames = 0;

    for round in 0..5 {
        for sentence in SENTENCES {
            // This loop stands in for the receive interrupt.
            for &byte in *sentence {
                ring.push_byte(byte);
            }

            if ring.take_fault() == Some(Fault::Overflow) {
                println!("receive overflow, some bytes were dropped");
            }

            frames += parse_frames(&mut ring, round);
        }
    }

    println!("parsed {frames} frames");

    // Dump metrics to stdout.
    println!("{}", Report::collect());
}

fn parse_frames(ring: &mut MirroredRingBuffer<&mut [u8]>, round: usize) -> usize {
    let mut parsed = 0;

    while ring.has_data() {
        let span = ring.alloc_read_span(MAX_FRAME).unwrap();

        let Some(end) = span.iter().position(|&b| b == b'\n') else {
            // Incomplete frame, wait for more bytes. Releasing nothing keeps them all.
            ring.commit_read_span(0).unwrap();
            break;
        };

        let frame = &span[..end];
        println!("round {round}: {}", String::from_utf8_lossy(frame));
        parsed += 1;

        ring.commit_read_span(end + 1).unwrap();
    }

    parsed
}
