pub mod config_service;
pub mod fixture;
pub mod memory_gateway;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::fixture::GatewayFixture;
pub use crate::memory_gateway::{GatewayOperation, MemoryGateway};
pub use crate::paths::PushboxPaths;
