pub mod git;

pub mod system;

pub use git::configure_git_routes;
pub use system::configure_system_routes;
