//! idxbench - before/after index performance experiments.
//!
//! Glue around [`idxbench_core`]: the CLI surface, a seeded in-memory
//! listings store used as the experiment target, the operation catalogue,
//! and report rendering/export.

pub mod cli;
pub mod ops;
pub mod report;
pub mod store;
