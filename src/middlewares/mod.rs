pub mod require_git_auth;

pub use require_git_auth::RequireGitAuth;
