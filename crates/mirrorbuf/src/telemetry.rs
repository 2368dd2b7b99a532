// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Metrics and log events.
//!
//! Nothing in here is reachable from `push_byte()` or `pop_byte()`, which must stay usable
//! from interrupt handlers.

use nm::{Event, Magnitude};

use crate::{Fault, RingLayout, SpanError};

// Histogram buckets for granted span lengths, in bytes.
const SPAN_LEN_BUCKETS: &[Magnitude] = &[0, 1, 4, 16, 64, 256, 1024, 4096];

thread_local! {
    static WRITE_SPAN_GRANTED: Event = Event::builder()
        .name("mirrorbuf_write_span_granted")
        .histogram(SPAN_LEN_BUCKETS)
        .build();

    static READ_SPAN_GRANTED: Event = Event::builder()
        .name("mirrorbuf_read_span_granted")
        .histogram(SPAN_LEN_BUCKETS)
        .build();

    static OVERFLOW: Event = Event::builder()
        .name("mirrorbuf_overflow")
        .build();

    static UNDERFLOW: Event = Event::builder()
        .name("mirrorbuf_underflow")
        .build();
}

pub(crate) fn created(layout: &RingLayout) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: "mirrorbuf.created",
        tracing::Level::DEBUG,
        message = "created",
        total_size = layout.total_size(),
        mirror_size = layout.mirror_size(),
        capacity = layout.capacity(),
        aligned = layout.is_aligned(),
    );

    #[cfg(not(any(feature = "logs", test)))]
    let _ = layout;
}

/// Records a fault raised on a bulk or span path. `requested` is what the caller asked for
/// and `granted` is what it got.
pub(crate) fn fault(fault: Fault, requested: usize, granted: usize) {
    match fault {
        Fault::Overflow => {
            OVERFLOW.with(|e| e.observe(requested));

            #[cfg(any(feature = "logs", test))]
            tracing::event!(name: "mirrorbuf.overflow", tracing::Level::DEBUG, message = "overflow", requested, granted);
        }
        Fault::Underflow => {
            UNDERFLOW.with(|e| e.observe(requested));

            #[cfg(any(feature = "logs", test))]
            tracing::event!(name: "mirrorbuf.underflow", tracing::Level::DEBUG, message = "underflow", requested, granted);
        }
    }

    #[cfg(not(any(feature = "logs", test)))]
    let _ = granted;
}

pub(crate) fn write_span_granted(len: usize) {
    WRITE_SPAN_GRANTED.with(|e| e.observe(len));
}

pub(crate) fn read_span_granted(len: usize) {
    READ_SPAN_GRANTED.with(|e| e.observe(len));
}

pub(crate) fn span_rejected(error: &SpanError) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: "mirrorbuf.span_rejected",
        tracing::Level::WARN,
        message = "span rejected",
        side = %error.side(),
        error = %error,
    );

    #[cfg(not(any(feature = "logs", test)))]
    let _ = error;
}

/// A committed write span ran past the last ring slot and `spilled` bytes were copied from the
/// mirror region back to the head.
pub(crate) fn write_wrapped(spilled: usize) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(name: "mirrorbuf.write_wrapped", tracing::Level::TRACE, message = "write span wrapped", spilled);

    #[cfg(not(any(feature = "logs", test)))]
    let _ = spilled;
}
