//! CLI subcommand implementations.

pub mod build_index;
pub mod canonical_terms;
pub mod fetch_build;
pub mod validate;
