//! Application layer: enrichment, rendering, delivery and the per-stream
//! pipeline that ties them together.

pub mod audit;
pub mod builder;
pub mod enrichment;
pub mod notifier;
pub mod pipeline;
