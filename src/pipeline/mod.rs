//! Pipeline stages for the stencil workflow.
//!
//! Each submodule implements exactly one step of the linear chain. Keeping
//! stages separate makes each independently testable and lets us swap an
//! implementation (e.g. a different storage scheme) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ submit ──▶ poll ──▶ download
//! (PUT to     (POST      (status  (fallback
//!  storage)    job)       loop)    cascade)
//! ```
//!
//! 1. [`upload`]   — derive a storage key, fetch a write target, PUT the bytes
//! 2. [`submit`]   — POST the fixed transformation profile; no retry
//! 3. [`poll`]     — bounded status loop with a passive inter-attempt wait
//! 4. [`download`] — retrieve the result through the strategy cascade
//!
//! There is no concurrency across stages: each run is one suspend-point
//! chain, and data flows strictly left to right.

pub mod download;
pub mod poll;
pub mod submit;
pub mod upload;
