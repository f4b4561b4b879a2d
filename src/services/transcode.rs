use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AppError;
use crate::services::staging::{StagedFile, StagedFiles};
use crate::services::tool::ToolRunner;

/// Rewrites a container so its metadata index sits at the head of the file,
/// letting playback begin before the whole file has downloaded. Streams are
/// copied verbatim; nothing is re-encoded.
pub struct FastStartRewriter {
    runner: Arc<dyn ToolRunner>,
}

impl FastStartRewriter {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    pub async fn rewrite(
        &self,
        input: &StagedFile,
        staged: &mut StagedFiles,
    ) -> Result<StagedFile, AppError> {
        let mut out = input.path().as_os_str().to_os_string();
        out.push(".processing");
        let out_path = PathBuf::from(out);

        // Tracked before the process runs so a partial output never leaks
        staged.track(&out_path);

        let args: Vec<OsString> = vec![
            "-i".into(),
            input.path().into(),
            "-c".into(),
            "copy".into(),
            "-movflags".into(),
            "faststart".into(),
            "-f".into(),
            "mp4".into(),
            out_path.clone().into(),
        ];

        let output = self
            .runner
            .run("ffmpeg", &args)
            .await
            .map_err(|e| AppError::RewriteFailure(format!("failed to run ffmpeg: {}", e)))?;

        if !output.success {
            return Err(AppError::RewriteFailure(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let meta = tokio::fs::metadata(&out_path).await.map_err(|e| {
            AppError::RewriteFailure(format!("could not stat processed file: {}", e))
        })?;
        if meta.len() == 0 {
            // An empty file is never a valid rewrite, even on a zero exit
            return Err(AppError::EmptyOutput);
        }

        Ok(StagedFile::new(out_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tool::ToolOutput;
    use async_trait::async_trait;

    /// Pretends to be ffmpeg: writes the given bytes to the output path
    /// (the last argument) and reports the given exit state.
    struct FakeFfmpeg {
        output_bytes: Option<Vec<u8>>,
        success: bool,
    }

    #[async_trait]
    impl ToolRunner for FakeFfmpeg {
        async fn run(&self, _program: &str, args: &[OsString]) -> std::io::Result<ToolOutput> {
            if let Some(bytes) = &self.output_bytes {
                tokio::fs::write(args.last().unwrap(), bytes).await?;
            }
            Ok(ToolOutput {
                success: self.success,
                stdout: Vec::new(),
                stderr: b"ffmpeg says no".to_vec(),
            })
        }
    }

    async fn staged_input(dir: &std::path::Path) -> StagedFile {
        let path = dir.join("upload-in.mp4");
        tokio::fs::write(&path, b"input").await.unwrap();
        StagedFile::new(path)
    }

    #[tokio::test]
    async fn rewrite_produces_a_sibling_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged_input(dir.path()).await;
        let rewriter = FastStartRewriter::new(Arc::new(FakeFfmpeg {
            output_bytes: Some(b"processed".to_vec()),
            success: true,
        }));
        let mut staged = StagedFiles::new();

        let out = rewriter.rewrite(&input, &mut staged).await.unwrap();

        assert_eq!(
            out.path(),
            dir.path().join("upload-in.mp4.processing").as_path()
        );
        assert_eq!(std::fs::read(out.path()).unwrap(), b"processed");
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_rewrite_failure_and_partial_output_is_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged_input(dir.path()).await;
        let rewriter = FastStartRewriter::new(Arc::new(FakeFfmpeg {
            output_bytes: Some(b"partial".to_vec()),
            success: false,
        }));
        let mut staged = StagedFiles::new();

        let err = rewriter.rewrite(&input, &mut staged).await.unwrap_err();
        assert!(matches!(err, AppError::RewriteFailure(_)));

        // Draining the tracker removes the partial output
        staged.cleanup().await;
        assert!(!dir.path().join("upload-in.mp4.processing").exists());
    }

    #[tokio::test]
    async fn zero_length_output_is_rejected_even_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged_input(dir.path()).await;
        let rewriter = FastStartRewriter::new(Arc::new(FakeFfmpeg {
            output_bytes: Some(Vec::new()),
            success: true,
        }));
        let mut staged = StagedFiles::new();

        let err = rewriter.rewrite(&input, &mut staged).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyOutput));
    }

    #[tokio::test]
    async fn missing_output_is_a_rewrite_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged_input(dir.path()).await;
        let rewriter = FastStartRewriter::new(Arc::new(FakeFfmpeg {
            output_bytes: None,
            success: true,
        }));
        let mut staged = StagedFiles::new();

        let err = rewriter.rewrite(&input, &mut staged).await.unwrap_err();
        assert!(matches!(err, AppError::RewriteFailure(_)));
    }
}
