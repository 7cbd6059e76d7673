// THEORY:
// This file is the main entry point for the `spot_vision` library crate.
// It exposes the spot detection engine: a grayscale intensity matrix goes in,
// dark spots, proximity groups and threshold choices come out.
//
// The layers, leaves first:
// 1.  `core_modules` holds the pure algorithmic pieces (masking, labeling,
//     spot extraction, proximity clustering, threshold sweeps). Every function
//     there is a pure function of its explicit inputs.
// 2.  `pipeline` wraps them behind a configured `SpotPipeline`, the single
//     high-level interface a UI or CLI talks to.
// 3.  `parallel_sweep` is an async variant of the sweeps that fans thresholds
//     out over a tokio runtime and returns exactly the same results.

pub mod core_modules;
pub mod error;
pub mod parallel_sweep;
pub mod pipeline;

pub use error::{Result, SpotError};
