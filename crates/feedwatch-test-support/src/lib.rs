//! Shared test doubles and utilities for feedwatch.

mod checkpoint;
mod clock;
mod feed;
mod repository;
mod transport;

pub use checkpoint::InMemoryCheckpointStore;
pub use clock::{FixedClock, ManualClock};
pub use feed::ScriptedChangeFeed;
pub use repository::{
    FailingAccountRepository, FailingInstrumentRepository, InMemoryAccountRepository,
    InMemoryInstrumentRepository,
};
pub use transport::{
    FailingEmailTransport, FailingSmsTransport, RecordingEmailTransport, RecordingSmsTransport,
    SentEmail, SentSms,
};
