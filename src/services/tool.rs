use std::ffi::OsString;

use async_trait::async_trait;
use tokio::process::Command;

/// Captured result of one external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Narrow seam around process spawning so the pipeline can be exercised
/// with canned output instead of real ffmpeg/ffprobe binaries.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<ToolOutput>;
}

/// Runs the real program and waits for it to exit.
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<ToolOutput> {
        let output = Command::new(program).args(args).output().await?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
