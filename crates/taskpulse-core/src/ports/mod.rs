//! Ports - 外部コラボレーターとの境界
//!
//! The aggregator never does I/O. Anything that does sits behind a trait
//! here, with implementations in `impls`.

pub mod clock;
pub mod routing_source;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::routing_source::RoutingSource;
