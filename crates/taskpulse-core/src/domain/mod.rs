//! Domain model (events, task states, task records, worker events, errors).

pub mod errors;
pub mod event;
pub mod record;
pub mod state;
pub mod worker;

pub use self::errors::{ConfigError, DecodeError, RoutingError};
pub use self::event::{Event, EventSubject};
pub use self::record::TaskRecord;
pub use self::state::TaskState;
pub use self::worker::{WorkerEvent, WorkerEventKind};
