//! Impls - ポートの実装
//!
//! - **StaticRoutingSource**: fixed worker configurations (tests, demos)
//! - **JsonFileRoutingSource**: worker configurations from a JSON file

pub mod file_routing;
pub mod static_routing;

pub use self::file_routing::JsonFileRoutingSource;
pub use self::static_routing::StaticRoutingSource;
