//! Domain layer: notification kinds, record field vocabulary and event
//! classification.

pub mod classify;
pub mod kind;
pub mod record;
