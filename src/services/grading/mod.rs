//! 提交评分执行器
//!
//! 一次运行：清理工作区 → 拉取 → 写入 gradebook → 转换 → 白名单过滤 →
//! 读取分数 → 推送 → 落库。拉取、转换、推送失败只会把状态置为失败，
//! 只有清理失败和落库失败会作为错误返回。

pub mod converter;
pub mod gradebook;
pub mod late_submission;
pub mod log_capture;
pub mod timeouts;
pub mod whitelist;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::{ExecutorStrategy, GitConfig, GraderConfig};
use crate::errors::{GraderError, Result};
use crate::git::workspace::recreate_dir;
use crate::git::{
    FileSelection, RepoPathResolver, RepoType, SubmissionWorkspaceManager, autograde_branch,
    feedback_branch, submission_branch,
};
use crate::models::assignments::entities::Assignment;
use crate::models::lectures::entities::Lecture;
use crate::models::submissions::entities::{
    AutoStatus, FeedbackStatus, Submission, SubmissionResultUpdate,
};
use crate::models::users::entities::User;
use crate::storage::Storage;

pub use converter::{
    ConvertJob, ConvertOutcome, Converter, ConverterStrategy, InProcessStrategy,
    SubprocessStrategy,
};
pub use late_submission::late_submission_scaling;
pub use timeouts::CellTimeouts;
pub use whitelist::{compute_whitelist, files_to_commit};

/// 执行器的两种用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorMode {
    Autograde,
    Feedback,
}

impl ExecutorMode {
    /// 转换程序的子命令
    pub fn converter_command(&self) -> &'static str {
        match self {
            ExecutorMode::Autograde => "autograde",
            ExecutorMode::Feedback => "generate_feedback",
        }
    }

    /// 工作区目录名
    pub fn workspace_key(&self, submission_id: i64) -> String {
        match self {
            ExecutorMode::Autograde => format!("submission_{submission_id}"),
            ExecutorMode::Feedback => format!("feedback_{submission_id}"),
        }
    }

    fn failed_update(&self, logs: String) -> SubmissionResultUpdate {
        match self {
            ExecutorMode::Autograde => SubmissionResultUpdate {
                auto_status: Some(AutoStatus::GradingFailed),
                grading_logs: Some(logs),
                ..Default::default()
            },
            ExecutorMode::Feedback => SubmissionResultUpdate {
                feedback_status: Some(FeedbackStatus::GenerationFailed),
                grading_logs: Some(logs),
                ..Default::default()
            },
        }
    }
}

/// 一次运行所需的关联数据
struct RunContext {
    lecture: Lecture,
    assignment: Assignment,
    owner: User,
}

/// 输入/输出工作区
#[derive(Debug, Clone)]
pub struct Workspace {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

pub struct GradingExecutor {
    storage: Arc<dyn Storage>,
    resolver: RepoPathResolver,
    workspace: SubmissionWorkspaceManager,
    strategy: Arc<dyn ConverterStrategy>,
    timeouts: CellTimeouts,
    tmp_root: PathBuf,
}

impl GradingExecutor {
    pub fn new(
        storage: Arc<dyn Storage>,
        resolver: RepoPathResolver,
        workspace: SubmissionWorkspaceManager,
        strategy: Arc<dyn ConverterStrategy>,
        timeouts: CellTimeouts,
        tmp_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            storage,
            resolver,
            workspace,
            strategy,
            timeouts,
            tmp_root: tmp_root.into(),
        }
    }

    /// 按配置构造；`local` 策略需要调用方提供进程内转换器
    pub fn from_config(
        storage: Arc<dyn Storage>,
        git: &GitConfig,
        grader: &GraderConfig,
        local_converter: Option<Arc<dyn Converter>>,
    ) -> Result<Self> {
        let timeouts = CellTimeouts::from_config(grader)?;
        let strategy: Arc<dyn ConverterStrategy> = match (grader.executor, local_converter) {
            (ExecutorStrategy::Process, _) => {
                Arc::new(SubprocessStrategy::new(grader.convert_executable.clone()))
            }
            (ExecutorStrategy::Local, Some(converter)) => {
                Arc::new(InProcessStrategy::new(converter))
            }
            (ExecutorStrategy::Local, None) => {
                return Err(GraderError::configuration(
                    "executor strategy 'local' requires an in-process converter",
                ));
            }
        };

        Ok(Self::new(
            storage,
            RepoPathResolver::new(&git.root),
            SubmissionWorkspaceManager::new(git),
            strategy,
            timeouts,
            &grader.tmp_root,
        ))
    }

    pub fn workspace_for(&self, mode: ExecutorMode, submission_id: i64) -> Workspace {
        let key = mode.workspace_key(submission_id);
        Workspace {
            input_dir: self.tmp_root.join("convert_in").join(&key),
            output_dir: self.tmp_root.join("convert_out").join(key),
        }
    }

    /// 运行到结束
    pub async fn start(&self, mode: ExecutorMode, submission: &Submission) -> Result<()> {
        info!(
            "Starting {:?} for submission {} (commit {})",
            mode, submission.id, submission.commit_hash
        );
        let ctx = self.load_context(submission).await?;

        let workspace = self.workspace_for(mode, submission.id);
        recreate_dir(&workspace.input_dir).await?;
        recreate_dir(&workspace.output_dir).await?;

        let mut logs = String::new();
        let outcome = match mode {
            ExecutorMode::Autograde => {
                self.run_autograde(submission, &ctx, &workspace, &mut logs)
                    .await
            }
            ExecutorMode::Feedback => {
                self.run_feedback(submission, &ctx, &workspace, &mut logs)
                    .await
            }
        };

        match outcome {
            Ok(update) => {
                self.storage
                    .save_submission_result(submission.id, update)
                    .await?;
                // 结果已落库，清理失败不影响本次运行
                for dir in [&workspace.input_dir, &workspace.output_dir] {
                    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
                        warn!("Failed to remove workspace {}: {}", dir.display(), e);
                    }
                }
                info!("{:?} finished for submission {}", mode, submission.id);
                Ok(())
            }
            Err(e) => {
                if e.is_run_failure() {
                    warn!("{:?} failed for submission {}: {}", mode, submission.id, e);
                } else {
                    error!("{:?} failed for submission {}: {}", mode, submission.id, e);
                }
                // 转换失败时日志已经是转换器的输出
                if !matches!(e, GraderError::ConvertFailure(_)) {
                    append_log(&mut logs, e.message());
                }
                self.storage
                    .save_submission_result(submission.id, mode.failed_update(logs))
                    .await
            }
        }
    }

    async fn load_context(&self, submission: &Submission) -> Result<RunContext> {
        let assignment = self
            .storage
            .get_assignment_by_id(submission.assignment_id)
            .await?
            .ok_or_else(|| {
                GraderError::not_found(format!("Assignment {} not found", submission.assignment_id))
            })?;
        let lecture = self
            .storage
            .get_lecture_by_id(assignment.lecture_id)
            .await?
            .ok_or_else(|| {
                GraderError::not_found(format!("Lecture {} not found", assignment.lecture_id))
            })?;
        let owner = self
            .storage
            .get_user_by_id(submission.user_id)
            .await?
            .ok_or_else(|| GraderError::not_found(format!("User {} not found", submission.user_id)))?;
        Ok(RunContext {
            lecture,
            assignment,
            owner,
        })
    }

    fn repo(&self, ctx: &RunContext, repo_type: RepoType, extra: &str) -> Result<PathBuf> {
        self.resolver
            .resolve(&ctx.lecture.code, ctx.assignment.id, repo_type, &[extra])
    }

    async fn run_autograde(
        &self,
        submission: &Submission,
        ctx: &RunContext,
        workspace: &Workspace,
        logs: &mut String,
    ) -> Result<SubmissionResultUpdate> {
        let origin = if submission.edited {
            self.repo(ctx, RepoType::Edit, &submission.id.to_string())
        } else {
            self.repo(ctx, RepoType::User, &ctx.owner.username)
        }
        .map_err(|e| GraderError::pull_failure(e.message().to_string()))?;
        self.workspace
            .pull_submission(
                &workspace.input_dir,
                &origin,
                &submission_branch(&submission.commit_hash),
            )
            .await?;

        gradebook::write_gradebook(&workspace.output_dir, submission.properties.as_deref())
            .await?;

        let settings = &ctx.assignment.settings;
        let job = ConvertJob {
            mode: ExecutorMode::Autograde,
            input_dir: workspace.input_dir.clone(),
            output_dir: workspace.output_dir.clone(),
            file_pattern: whitelist::NOTEBOOK_PATTERN.to_string(),
            settings: settings.clone(),
            cell_timeout: Some(self.timeouts.effective(settings.cell_timeout)),
        };
        self.convert(job, logs).await?;

        let files = files_to_commit(&workspace.output_dir, &compute_whitelist(settings))?;

        let book = gradebook::read_gradebook(&workspace.output_dir).await?;
        let grading_score = gradebook::total_score(&book);
        let score = grading_score * submission.score_scaling;

        let destination = self
            .repo(ctx, RepoType::Autograde, &ctx.owner.username)
            .map_err(|e| GraderError::push_failure(e.message().to_string()))?;
        self.workspace
            .push_results(
                &workspace.output_dir,
                &destination,
                &autograde_branch(&submission.commit_hash),
                &submission.commit_hash,
                &FileSelection::Only(files),
            )
            .await?;

        Ok(SubmissionResultUpdate {
            auto_status: Some(AutoStatus::AutomaticallyGraded),
            grading_logs: Some(logs.clone()),
            score: Some(score),
            grading_score: Some(grading_score),
            properties: Some(book.to_string()),
            ..Default::default()
        })
    }

    async fn run_feedback(
        &self,
        submission: &Submission,
        ctx: &RunContext,
        workspace: &Workspace,
        logs: &mut String,
    ) -> Result<SubmissionResultUpdate> {
        let origin = self
            .repo(ctx, RepoType::Autograde, &ctx.owner.username)
            .map_err(|e| GraderError::pull_failure(e.message().to_string()))?;
        self.workspace
            .pull_submission(
                &workspace.input_dir,
                &origin,
                &autograde_branch(&submission.commit_hash),
            )
            .await?;

        gradebook::write_gradebook(&workspace.output_dir, submission.properties.as_deref())
            .await?;

        let job = ConvertJob {
            mode: ExecutorMode::Feedback,
            input_dir: workspace.input_dir.clone(),
            output_dir: workspace.output_dir.clone(),
            file_pattern: whitelist::NOTEBOOK_PATTERN.to_string(),
            settings: ctx.assignment.settings.clone(),
            cell_timeout: None,
        };
        self.convert(job, logs).await?;

        gradebook::remove_gradebook(&workspace.output_dir).await?;

        let destination = self
            .repo(ctx, RepoType::Feedback, &ctx.owner.username)
            .map_err(|e| GraderError::push_failure(e.message().to_string()))?;
        self.workspace
            .push_results(
                &workspace.output_dir,
                &destination,
                &feedback_branch(&submission.commit_hash),
                &submission.commit_hash,
                &FileSelection::All,
            )
            .await?;

        Ok(SubmissionResultUpdate {
            feedback_status: Some(FeedbackStatus::Generated),
            grading_logs: Some(logs.clone()),
            ..Default::default()
        })
    }

    async fn convert(&self, job: ConvertJob, logs: &mut String) -> Result<()> {
        let ConvertOutcome {
            logs: captured,
            result,
        } = self.strategy.convert(job).await;
        logs.push_str(&captured);
        result
    }
}

fn append_log(logs: &mut String, message: &str) {
    if !logs.is_empty() && !logs.ends_with('\n') {
        logs.push('\n');
    }
    logs.push_str(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::workspace::tests::{git_config, snapshot};
    use crate::models::assignments::entities::AssignmentSettings;
    use crate::models::submissions::entities::ManualStatus;
    use crate::storage::memory::MemoryStorage;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    const COMMIT: &str = "abc123";

    struct FnConverter<F>(F);

    impl<F> Converter for FnConverter<F>
    where
        F: Fn(&ConvertJob) -> Result<()> + Send + Sync,
    {
        fn convert(&self, job: &ConvertJob) -> Result<()> {
            (self.0)(job)
        }
    }

    struct Fixture {
        tmp: TempDir,
        storage: Arc<MemoryStorage>,
        resolver: RepoPathResolver,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let storage = Arc::new(MemoryStorage::new());
            storage.add_user(1, "alice");
            storage.add_lecture(10, "lec");
            storage.add_assignment(Assignment {
                id: 5,
                lecture_id: 10,
                name: "a1".to_string(),
                settings: AssignmentSettings {
                    allowed_files: vec!["*.py".to_string()],
                    ..Default::default()
                },
            });
            storage.add_submission(submission(false));
            let resolver = RepoPathResolver::new(tmp.path().join("git"));
            Self {
                tmp,
                storage,
                resolver,
            }
        }

        fn executor(&self, strategy: Arc<dyn ConverterStrategy>) -> GradingExecutor {
            GradingExecutor::new(
                self.storage.clone(),
                self.resolver.clone(),
                SubmissionWorkspaceManager::new(&git_config()),
                strategy,
                CellTimeouts::new(300, 10, 3600).unwrap(),
                self.tmp.path().join("service"),
            )
        }

        fn repo(&self, repo_type: RepoType, extra: &str) -> PathBuf {
            self.resolver.resolve("lec", 5, repo_type, &[extra]).unwrap()
        }

        /// 模拟学生推送到 USER（或教师推送到 EDIT）仓库
        async fn seed_repo(&self, repo: &Path, branch: &str) {
            let src = self.tmp.path().join(format!("seed_{branch}"));
            std::fs::create_dir_all(&src).unwrap();
            std::fs::write(src.join("a.ipynb"), "{\"cells\": []}").unwrap();
            std::fs::write(src.join("helper.py"), "print(1)").unwrap();
            std::fs::write(src.join("notes.txt"), "not allowed").unwrap();
            SubmissionWorkspaceManager::new(&git_config())
                .push_results(&src, repo, branch, COMMIT, &FileSelection::All)
                .await
                .unwrap();
        }

        async fn checkout(&self, repo: &Path, branch: &str) -> std::collections::BTreeMap<String, String> {
            let dir = self.tmp.path().join(format!("check_{branch}"));
            SubmissionWorkspaceManager::new(&git_config())
                .pull_submission(&dir, repo, branch)
                .await
                .unwrap();
            snapshot(&dir)
        }

        fn stored(&self) -> Submission {
            self.storage.submissions.lock().unwrap()[&100].clone()
        }
    }

    fn submission(edited: bool) -> Submission {
        Submission {
            id: 100,
            assignment_id: 5,
            user_id: 1,
            commit_hash: COMMIT.to_string(),
            auto_status: AutoStatus::NotGraded,
            feedback_status: FeedbackStatus::NotGenerated,
            manual_status: ManualStatus::NotGraded,
            score: None,
            grading_score: None,
            score_scaling: 0.5,
            grading_logs: None,
            properties: Some(r#"{"notebooks": {}}"#.to_string()),
            edited,
            submitted_at: chrono::Utc::now(),
        }
    }

    /// 把输入复制到输出，并写入每个 notebook 的分数
    fn scoring_converter() -> Arc<dyn ConverterStrategy> {
        Arc::new(InProcessStrategy::new(Arc::new(FnConverter(|job: &ConvertJob| -> Result<()> {
            tracing::info!("Grading {}", job.input_dir.display());
            copy_tree(&job.input_dir, &job.output_dir);
            let path = job.output_dir.join("gradebook.json");
            let mut book: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&path)?)?;
            book["notebooks"] = json!({"a": {"score": 1.0}, "b": {"score": 2.0}});
            std::fs::write(path, book.to_string())?;
            Ok(())
        }))))
    }

    fn feedback_converter() -> Arc<dyn ConverterStrategy> {
        Arc::new(InProcessStrategy::new(Arc::new(FnConverter(|job: &ConvertJob| -> Result<()> {
            assert_eq!(job.mode, ExecutorMode::Feedback);
            assert!(job.cell_timeout.is_none());
            copy_tree(&job.input_dir, &job.output_dir);
            std::fs::write(job.output_dir.join("a.html"), "<html>feedback</html>")?;
            Ok(())
        }))))
    }

    fn copy_tree(from: &Path, to: &Path) {
        for entry in WalkDir::new(from)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let target = to.join(entry.path().strip_prefix(from).unwrap());
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::copy(entry.path(), target).unwrap();
        }
    }

    #[tokio::test]
    async fn test_autograde_success() {
        let fx = Fixture::new();
        fx.seed_repo(&fx.repo(RepoType::User, "alice"), "submission_abc123")
            .await;
        let executor = fx.executor(scoring_converter());

        executor
            .start(ExecutorMode::Autograde, &submission(false))
            .await
            .unwrap();

        let stored = fx.stored();
        assert_eq!(stored.auto_status, AutoStatus::AutomaticallyGraded);
        assert_eq!(stored.grading_score, Some(3.0));
        assert_eq!(stored.score, Some(1.5));
        assert!(stored.grading_logs.unwrap().contains("[INFO] Grading"));
        let props: serde_json::Value =
            serde_json::from_str(stored.properties.as_deref().unwrap()).unwrap();
        assert_eq!(props["notebooks"]["b"]["score"], 2.0);

        // 只推送白名单内的文件
        let pushed = fx
            .checkout(&fx.repo(RepoType::Autograde, "alice"), "autograde_abc123")
            .await;
        let names: Vec<&str> = pushed.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a.ipynb", "helper.py"]);

        // 成功后删除工作区
        let ws = executor.workspace_for(ExecutorMode::Autograde, 100);
        assert!(!ws.input_dir.exists());
        assert!(!ws.output_dir.exists());
    }

    #[tokio::test]
    async fn test_workspace_cleanup_error_keeps_result() {
        let fx = Fixture::new();
        fx.seed_repo(&fx.repo(RepoType::User, "alice"), "submission_abc123")
            .await;
        // 转换器自行删掉输入目录，之后的清理会失败
        let strategy: Arc<dyn ConverterStrategy> =
            Arc::new(InProcessStrategy::new(Arc::new(FnConverter(|job: &ConvertJob| -> Result<()> {
                copy_tree(&job.input_dir, &job.output_dir);
                std::fs::remove_dir_all(&job.input_dir)?;
                Ok(())
            }))));
        let executor = fx.executor(strategy);

        executor
            .start(ExecutorMode::Autograde, &submission(false))
            .await
            .unwrap();

        assert_eq!(fx.stored().auto_status, AutoStatus::AutomaticallyGraded);
        let ws = executor.workspace_for(ExecutorMode::Autograde, 100);
        assert!(!ws.output_dir.exists());
    }

    #[tokio::test]
    async fn test_autograde_pulls_edited_submission_from_edit_repo() {
        let fx = Fixture::new();
        fx.seed_repo(&fx.repo(RepoType::Edit, "100"), "submission_abc123")
            .await;
        let executor = fx.executor(scoring_converter());

        executor
            .start(ExecutorMode::Autograde, &submission(true))
            .await
            .unwrap();
        assert_eq!(fx.stored().auto_status, AutoStatus::AutomaticallyGraded);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_autograde_subprocess_failure() {
        let fx = Fixture::new();
        fx.seed_repo(&fx.repo(RepoType::User, "alice"), "submission_abc123")
            .await;
        let exe = converter::tests::script(fx.tmp.path(), "convert.sh", "printf boom >&2\nexit 1");
        let executor = fx.executor(Arc::new(SubprocessStrategy::new(exe)));

        executor
            .start(ExecutorMode::Autograde, &submission(false))
            .await
            .unwrap();

        let stored = fx.stored();
        assert_eq!(stored.auto_status, AutoStatus::GradingFailed);
        assert_eq!(stored.grading_logs.as_deref(), Some("boom"));
        assert!(stored.grading_score.is_none());
        // 失败后保留工作区，且没有推送
        assert!(executor.workspace_for(ExecutorMode::Autograde, 100).input_dir.exists());
        assert!(!fx.repo(RepoType::Autograde, "alice").exists());
    }

    #[tokio::test]
    async fn test_autograde_pull_failure() {
        let fx = Fixture::new();
        let executor = fx.executor(scoring_converter());

        executor
            .start(ExecutorMode::Autograde, &submission(false))
            .await
            .unwrap();

        let stored = fx.stored();
        assert_eq!(stored.auto_status, AutoStatus::GradingFailed);
        assert!(!stored.grading_logs.unwrap_or_default().is_empty());
        assert!(!fx.repo(RepoType::Autograde, "alice").exists());
        assert_eq!(fx.storage.saved_updates().len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_removes_stale_workspace() {
        let fx = Fixture::new();
        fx.seed_repo(&fx.repo(RepoType::User, "alice"), "submission_abc123")
            .await;
        let executor = fx.executor(Arc::new(InProcessStrategy::new(Arc::new(FnConverter(
            |job: &ConvertJob| -> Result<()> {
                let stale = job.output_dir.join("stale.txt").exists()
                    || job.input_dir.join("stale.txt").exists();
                tracing::info!("stale files present: {}", stale);
                Err(GraderError::convert_failure("stop here"))
            },
        )))));

        let ws = executor.workspace_for(ExecutorMode::Autograde, 100);
        for dir in [&ws.input_dir, &ws.output_dir] {
            std::fs::create_dir_all(dir).unwrap();
            std::fs::write(dir.join("stale.txt"), "old").unwrap();
        }

        executor
            .start(ExecutorMode::Autograde, &submission(false))
            .await
            .unwrap();
        let stored = fx.stored();
        assert_eq!(stored.auto_status, AutoStatus::GradingFailed);
        assert!(stored.grading_logs.unwrap().contains("stale files present: false"));
        // gradebook 已在转换前写入
        assert!(ws.output_dir.join("gradebook.json").exists());
    }

    #[tokio::test]
    async fn test_autograde_uses_effective_cell_timeout() {
        let fx = Fixture::new();
        fx.seed_repo(&fx.repo(RepoType::User, "alice"), "submission_abc123")
            .await;
        {
            let mut assignments = fx.storage.assignments.lock().unwrap();
            assignments.get_mut(&5).unwrap().settings.cell_timeout = Some(5);
        }
        let executor = fx.executor(Arc::new(InProcessStrategy::new(Arc::new(FnConverter(
            |job: &ConvertJob| -> Result<()> {
                tracing::info!("cell timeout {:?}", job.cell_timeout);
                Err(GraderError::convert_failure("checked"))
            },
        )))));

        executor
            .start(ExecutorMode::Autograde, &submission(false))
            .await
            .unwrap();
        // 5 不在 [10, 3600] 内，使用默认值
        let logs = fx.stored().grading_logs.unwrap();
        assert!(logs.ends_with("[INFO] cell timeout Some(300)\n"), "{logs}");
    }

    #[tokio::test]
    async fn test_feedback_after_autograde() {
        let fx = Fixture::new();
        fx.seed_repo(&fx.repo(RepoType::User, "alice"), "submission_abc123")
            .await;
        fx.executor(scoring_converter())
            .start(ExecutorMode::Autograde, &submission(false))
            .await
            .unwrap();

        let graded = fx.stored();
        let executor = fx.executor(feedback_converter());
        executor
            .start(ExecutorMode::Feedback, &graded)
            .await
            .unwrap();

        let stored = fx.stored();
        assert_eq!(stored.feedback_status, FeedbackStatus::Generated);
        assert_eq!(stored.auto_status, AutoStatus::AutomaticallyGraded);

        let pushed = fx
            .checkout(&fx.repo(RepoType::Feedback, "alice"), "feedback_abc123")
            .await;
        assert!(pushed.contains_key("a.html"));
        assert!(pushed.contains_key("a.ipynb"));
        assert!(!pushed.contains_key("gradebook.json"));
    }

    #[tokio::test]
    async fn test_feedback_without_autograde_output_fails() {
        let fx = Fixture::new();
        let executor = fx.executor(feedback_converter());
        executor
            .start(ExecutorMode::Feedback, &submission(false))
            .await
            .unwrap();
        let stored = fx.stored();
        assert_eq!(stored.feedback_status, FeedbackStatus::GenerationFailed);
        assert_eq!(stored.auto_status, AutoStatus::NotGraded);
    }

    #[tokio::test]
    async fn test_missing_assignment_propagates() {
        let fx = Fixture::new();
        fx.storage.assignments.lock().unwrap().clear();
        let err = fx
            .executor(scoring_converter())
            .start(ExecutorMode::Autograde, &submission(false))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E003");
        assert!(fx.storage.saved_updates().is_empty());
    }

    #[test]
    fn test_from_config_strategy_selection() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut grader = GraderConfig {
            tmp_root: "service_dir".to_string(),
            executor: ExecutorStrategy::Local,
            convert_executable: "grader-convert".to_string(),
            default_cell_timeout: 300,
            min_cell_timeout: 10,
            max_cell_timeout: 86_400,
        };
        let err = GradingExecutor::from_config(storage.clone(), &git_config(), &grader, None)
            .err()
            .unwrap();
        assert_eq!(err.code(), "E004");

        grader.executor = ExecutorStrategy::Process;
        assert!(GradingExecutor::from_config(storage.clone(), &git_config(), &grader, None).is_ok());

        grader.min_cell_timeout = 0;
        assert!(GradingExecutor::from_config(storage, &git_config(), &grader, None).is_err());
    }

    #[test]
    fn test_workspace_keys() {
        assert_eq!(ExecutorMode::Autograde.workspace_key(7), "submission_7");
        assert_eq!(ExecutorMode::Feedback.workspace_key(7), "feedback_7");
    }
}
