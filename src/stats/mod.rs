//! Pure derivations over GraphQL rows.
//!
//! Every function here takes rows already fetched by [`crate::dashboard`] and
//! returns a derived view. Empty or partially-null input degrades to an empty
//! or zero result; nothing in this module performs I/O or panics on data.

pub mod audits;
pub mod games;
pub mod heatmap;
pub mod participants;
pub mod programs;
pub mod progress;
pub mod projects;
pub mod skills;
pub mod teamwork;
