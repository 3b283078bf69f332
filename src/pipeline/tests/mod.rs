//! Integration tests for the pipeline engine
//!
//! Exercises the complete stage sequence over in-memory partition sources.

pub mod end_to_end;
