//! Outbound delivery adapters.

pub mod kavenegar;
pub mod smtp;
