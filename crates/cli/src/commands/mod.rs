//! CLI Commands

pub mod init;
pub mod mission;
pub mod route;
pub mod types;
pub mod vehicle;

pub use init::InitCommand;
pub use mission::MissionCommand;
pub use route::RouteCommand;
pub use types::TypesCommand;
pub use vehicle::VehicleCommand;
