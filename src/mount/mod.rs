//! Async mount control: transport, GoTo sequencing, tracking and the
//! [`Mount`] facade.

mod builder;
mod controller;
mod goto;
mod shared;
mod tracking;
mod transport;

pub use builder::MountBuilder;
pub use controller::{CoordSetOutcome, Mount, MountStatus};
pub use transport::{MountTransport, StreamTransport};
