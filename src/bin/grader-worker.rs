//! 评分任务入口：由任务队列为每个提交调用一次

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use human_panic::setup_panic;
use tracing::{error, info};

use rust_grader_next::config::AppConfig;
use rust_grader_next::errors::{GraderError, Result};
use rust_grader_next::runtime::lifetime;
use rust_grader_next::services::GradingExecutor;
use rust_grader_next::services::grading::ExecutorMode;
use rust_grader_next::storage::{Storage, create_storage};

#[derive(Parser)]
#[command(name = "grader-worker")]
#[command(version, about = "Run one grading job for a submission")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Autograde a submission and push the result to its autograde repository
    Autograde {
        #[arg(long, env = "GRADER_SUBMISSION_ID")]
        submission: i64,
    },
    /// Generate feedback from an autograded submission
    Feedback {
        #[arg(long, env = "GRADER_SUBMISSION_ID")]
        submission: i64,
    },
}

impl Commands {
    fn job(&self) -> (ExecutorMode, i64) {
        match self {
            Commands::Autograde { submission } => (ExecutorMode::Autograde, *submission),
            Commands::Feedback { submission } => (ExecutorMode::Feedback, *submission),
        }
    }
}

async fn run(config: &AppConfig, mode: ExecutorMode, submission_id: i64) -> Result<()> {
    let storage = create_storage(&config.database).await?;
    // 外部转换程序以子进程方式调用，不提供进程内转换器
    let executor = GradingExecutor::from_config(storage.clone(), &config.git, &config.grader, None)?;

    let submission = storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| GraderError::not_found(format!("Submission {submission_id} not found")))?;

    executor.start(mode, &submission).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    setup_panic!();
    let cli = Cli::parse();

    if let Err(e) = AppConfig::init() {
        eprintln!("Failed to initialize configuration: {e}");
        return ExitCode::FAILURE;
    }
    let config = AppConfig::get();
    let _guard = lifetime::logging::init_tracing(config);

    let (mode, submission_id) = cli.command.job();
    info!("Running {:?} for submission {}", mode, submission_id);

    match run(config, mode, submission_id).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e.format_simple());
            ExitCode::FAILURE
        }
    }
}
