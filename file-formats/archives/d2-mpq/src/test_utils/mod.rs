//! Test utilities for MPQ archives
//!
//! The [`mpq_builder`] module writes small synthetic archives covering every
//! storage variant the reader handles, plus deliberately broken ones. It is
//! compiled for the crate's own tests and behind the `test-utils` feature.

pub mod mpq_builder;

pub use mpq_builder::{
    FixtureFile, MpqBuilder, Placement, Storage, compressible_data, home_slot, pcm_tone,
    random_data,
};
