//! git 可执行文件的封装
//!
//! 所有参数都以 argv 形式传递，不经过 shell。

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{GraderError, Result};

#[derive(Debug, Clone)]
pub struct GitCli {
    executable: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn command<I, S>(&self, cwd: Option<&Path>, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.executable);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 服务端没有终端，禁止凭据提示
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// 运行命令并返回原始输出，只有无法启动时才返回错误
    pub async fn output<I, S>(&self, cwd: Option<&Path>, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(cwd, args);
        debug!("Running {:?}", cmd.as_std());
        cmd.output()
            .await
            .map_err(|e| GraderError::git_operation(format!("Failed to run {}: {e}", self.executable)))
    }

    /// 运行命令，非零退出码时返回带 stderr 的错误
    pub async fn run<I, S>(&self, cwd: Option<&Path>, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.output(cwd, args).await?;
        ensure_success(output)
    }

    /// 把 `input` 写入 stdin 的同时收集 stdout/stderr，直到进程退出
    pub async fn output_with_input<I, S>(
        &self,
        args: I,
        envs: &[(&str, String)],
        input: Vec<u8>,
    ) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(None, args);
        cmd.stdin(Stdio::piped());
        for (key, value) in envs {
            cmd.env(key, value);
        }
        debug!("Running {:?} with {} bytes of input", cmd.as_std(), input.len());

        let mut child = cmd
            .spawn()
            .map_err(|e| GraderError::git_operation(format!("Failed to run {}: {e}", self.executable)))?;

        // 单独的任务写 stdin，避免输出管道写满时互相等待
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                let result = stdin.write_all(&input).await;
                drop(stdin);
                result
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| GraderError::git_operation(format!("Failed to wait for git: {e}")))?;

        if let Some(handle) = writer {
            // 进程提前退出时写入会失败，以退出码为准
            if let Ok(Err(e)) = handle.await {
                debug!("Writing git stdin failed: {}", e);
            }
        }
        Ok(output)
    }

    /// 目录下没有裸仓库时执行 `git init --bare`
    pub async fn ensure_bare_repo(&self, path: &Path) -> Result<bool> {
        if is_bare_repo(path) {
            return Ok(false);
        }
        tokio::fs::create_dir_all(path).await?;
        self.run(None, [OsStr::new("init"), OsStr::new("--bare"), path.as_os_str()])
            .await?;
        Ok(true)
    }
}

/// 裸仓库至少包含 HEAD 与 objects 目录
pub fn is_bare_repo(path: &Path) -> bool {
    path.join("HEAD").is_file() && path.join("objects").is_dir()
}

pub fn ensure_success(output: Output) -> Result<Vec<u8>> {
    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(GraderError::git_operation(stderr_text(&output)))
    }
}

pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim_end().to_string()
}
