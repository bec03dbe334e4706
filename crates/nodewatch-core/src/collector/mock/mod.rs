//! In-memory stand-ins for [`FileSystem`](super::FileSystem) and
//! [`CommandRunner`](super::CommandRunner), plus ready-made host scenarios.

mod commands;
mod filesystem;
mod scenarios;

pub use commands::MockCommands;
pub use filesystem::MockFs;
