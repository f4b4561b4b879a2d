use std::ffi::OsString;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::AppError;
use crate::services::staging::StagedFile;
use crate::services::tool::ToolRunner;

/// Coarse orientation bucket derived from a stream's width/height ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<i64>,
    height: Option<i64>,
}

/// Classifies a width/height pair against 16:9 and 9:16 with 3% tolerance.
/// Landscape is checked first, so a ratio somehow within tolerance of both
/// resolves to landscape.
pub fn classify_dimensions(width: i64, height: i64) -> Orientation {
    let ratio = width as f64 / height as f64;
    const TOLERANCE: f64 = 0.03;

    if (ratio - 16.0 / 9.0).abs() < TOLERANCE {
        Orientation::Landscape
    } else if (ratio - 9.0 / 16.0).abs() < TOLERANCE {
        Orientation::Portrait
    } else {
        Orientation::Other
    }
}

/// Asks ffprobe for the stream list of a staged file and classifies the
/// first stream's geometry.
pub struct GeometryProbe {
    runner: Arc<dyn ToolRunner>,
}

impl GeometryProbe {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    pub async fn probe(&self, file: &StagedFile) -> Result<Orientation, AppError> {
        let mut args: Vec<OsString> = ["-v", "error", "-print_format", "json", "-show_streams"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(file.path().into());

        let output = self
            .runner
            .run("ffprobe", &args)
            .await
            .map_err(|e| AppError::ProbeFailure(format!("failed to run ffprobe: {}", e)))?;

        if !output.success {
            return Err(AppError::ProbeFailure(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::ProbeFailure(format!("unexpected ffprobe output: {}", e)))?;

        let stream = parsed.streams.first().ok_or(AppError::NoStreamData)?;
        match (stream.width, stream.height) {
            (Some(w), Some(h)) if h > 0 => Ok(classify_dimensions(w, h)),
            _ => Err(AppError::NoStreamData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tool::ToolOutput;
    use async_trait::async_trait;

    struct CannedRunner {
        output: ToolOutput,
    }

    #[async_trait]
    impl ToolRunner for CannedRunner {
        async fn run(&self, _program: &str, _args: &[OsString]) -> std::io::Result<ToolOutput> {
            Ok(self.output.clone())
        }
    }

    fn probe_with(output: ToolOutput) -> GeometryProbe {
        GeometryProbe::new(Arc::new(CannedRunner { output }))
    }

    fn staged() -> StagedFile {
        StagedFile::new(std::path::PathBuf::from("/tmp/upload-test.mp4"))
    }

    #[test]
    fn classifies_reference_ratios() {
        assert_eq!(classify_dimensions(16, 9), Orientation::Landscape);
        assert_eq!(classify_dimensions(9, 16), Orientation::Portrait);
        assert_eq!(classify_dimensions(1, 1), Orientation::Other);
    }

    #[test]
    fn classifies_common_resolutions() {
        assert_eq!(classify_dimensions(1920, 1080), Orientation::Landscape);
        assert_eq!(classify_dimensions(1080, 1920), Orientation::Portrait);
        // 1.8 is within 3% of 16/9
        assert_eq!(classify_dimensions(1728, 960), Orientation::Landscape);
        assert_eq!(classify_dimensions(640, 480), Orientation::Other);
    }

    #[test]
    fn tolerance_boundary_is_strict() {
        // 1627/900 sits exactly 0.03 above 16/9, which is outside a strict bound
        assert_eq!(classify_dimensions(1627, 900), Orientation::Other);
    }

    #[tokio::test]
    async fn probe_classifies_first_stream() {
        let probe = probe_with(ToolOutput {
            success: true,
            stdout: br#"{"streams":[{"width":1920,"height":1080},{"width":1,"height":1}]}"#.to_vec(),
            stderr: Vec::new(),
        });

        let orientation = probe.probe(&staged()).await.unwrap();
        assert_eq!(orientation, Orientation::Landscape);
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_probe_failure() {
        let probe = probe_with(ToolOutput {
            success: false,
            stdout: Vec::new(),
            stderr: b"moov atom not found".to_vec(),
        });

        let err = probe.probe(&staged()).await.unwrap_err();
        assert!(matches!(err, AppError::ProbeFailure(_)));
    }

    #[tokio::test]
    async fn unparseable_output_is_a_probe_failure() {
        let probe = probe_with(ToolOutput {
            success: true,
            stdout: b"not json".to_vec(),
            stderr: Vec::new(),
        });

        let err = probe.probe(&staged()).await.unwrap_err();
        assert!(matches!(err, AppError::ProbeFailure(_)));
    }

    #[tokio::test]
    async fn empty_stream_list_has_no_stream_data() {
        let probe = probe_with(ToolOutput {
            success: true,
            stdout: br#"{"streams":[]}"#.to_vec(),
            stderr: Vec::new(),
        });

        let err = probe.probe(&staged()).await.unwrap_err();
        assert!(matches!(err, AppError::NoStreamData));
    }

    #[tokio::test]
    async fn stream_without_dimensions_has_no_stream_data() {
        let probe = probe_with(ToolOutput {
            success: true,
            stdout: br#"{"streams":[{"codec_type":"audio"}]}"#.to_vec(),
            stderr: Vec::new(),
        });

        let err = probe.probe(&staged()).await.unwrap_err();
        assert!(matches!(err, AppError::NoStreamData));
    }
}
