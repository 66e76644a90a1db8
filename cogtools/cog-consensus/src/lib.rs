//! Consensus engine for multi-tool genome annotation
//!
//! Given up to three normalized per-tool annotation tables, this crate
//! aligns the records that describe the same genomic feature, votes on the
//! authoritative source per feature, remaps ortholog-mapper vocabulary
//! through the canonical group table, and reduces ambiguous category sets to
//! a single functional letter. The output is one ordered consensus table.

pub mod cli;
pub mod core;
pub mod utils;
