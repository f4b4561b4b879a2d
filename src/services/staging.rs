use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::AppError;

/// A request-scoped temporary file produced by one pipeline stage and
/// consumed by the next.
#[derive(Debug, Clone)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Every staged path created for a request, drained exactly once at the end
/// of the request regardless of which stage failed.
#[derive(Debug, Default)]
pub struct StagedFiles {
    paths: Vec<PathBuf>,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: &Path) {
        self.paths.push(path.to_path_buf());
    }

    /// Removes every tracked file. Already-gone files are fine; any other
    /// removal failure is logged, never escalated over the original error.
    pub async fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => eprintln!("Staging | Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Materializes uploaded bytes to uniquely named local files under a
/// configured temp directory.
pub struct StagingStore {
    temp_dir: PathBuf,
}

impl StagingStore {
    pub fn new(temp_dir: PathBuf) -> Self {
        Self { temp_dir }
    }

    /// Writes the upload to a fresh file and hands the path forward. The
    /// path is tracked before the write, so a partially written file never
    /// outlives the request.
    pub async fn stage(
        &self,
        data: &[u8],
        staged: &mut StagedFiles,
    ) -> Result<StagedFile, AppError> {
        let path = self.temp_dir.join(format!("upload-{}.mp4", Uuid::new_v4()));
        staged.track(&path);

        if let Err(e) = tokio::fs::write(&path, data).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(AppError::IoFailure(format!(
                "could not write {}: {}",
                path.display(),
                e
            )));
        }

        Ok(StagedFile::new(path))
    }
}
