pub mod git;
pub mod grading;
pub mod system;

pub use git::GitService;
pub use grading::GradingExecutor;
pub use system::SystemService;
