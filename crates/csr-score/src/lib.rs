//! Corporate Social Responsibility scoring: indicator normalization, pillar
//! aggregation, filtering, grouping and radar comparisons over an immutable dataset.

pub mod config;
pub mod error;
pub mod ingest;
pub mod scoring;
pub mod telemetry;
