//! Helpers shared by the `preview` and `process` commands: reading the input
//! as an upload, reporting request errors, and writing the encoded result.

use std::io::Write;
use std::path::{Path, PathBuf};

use retouch_core::{MediaType, PipelineError, ProcessedResult, Upload};
use serde::Serialize;

/// Content type declared for files whose extension we do not recognize.
const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type a browser would declare for `path`, judged by extension.
pub fn content_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg" | "jpe" | "jfif") => MediaType::Jpeg.mime().to_string(),
        Some("png") => MediaType::Png.mime().to_string(),
        Some("gif") => "image/gif".to_string(),
        Some("webp") => "image/webp".to_string(),
        Some("bmp") => "image/bmp".to_string(),
        Some("tif" | "tiff") => "image/tiff".to_string(),
        _ => UNKNOWN_CONTENT_TYPE.to_string(),
    }
}

/// Read `path` into an upload.
///
/// A missing input file is reported as an absent upload so the service
/// answers with its own "no file" error.
pub fn read_upload(path: &Path, content_type: Option<&str>) -> anyhow::Result<Option<Upload>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Input {:?} not found", path);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let content_type = content_type
        .map(str::to_string)
        .unwrap_or_else(|| content_type_for(path));
    Ok(Some(Upload::new(bytes, file_name, content_type)))
}

/// Wrap a pipeline error with its response class.
pub fn request_error(err: PipelineError) -> anyhow::Error {
    let reason = if err.is_client_fault() {
        "Bad Request"
    } else {
        "Internal Server Error"
    };
    anyhow::anyhow!("{} {}: {}", err.status_code(), reason, err)
}

/// What was written, printed as JSON after a file write.
#[derive(Debug, Serialize)]
pub struct OutputSummary {
    pub output: PathBuf,
    pub media_type: MediaType,
    pub content_type: &'static str,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

impl OutputSummary {
    pub fn new(output: &Path, result: &ProcessedResult) -> Self {
        Self {
            output: output.to_path_buf(),
            media_type: result.media_type,
            content_type: result.content_type(),
            quality: result.quality,
            width: result.width,
            height: result.height,
            bytes: result.bytes.len(),
        }
    }
}

/// Write the encoded result to `output`, or raw to stdout when absent.
pub fn write_result(result: &ProcessedResult, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &result.bytes)?;
            tracing::info!("Output written to {:?}", path);
            let summary = OutputSummary::new(path, result);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&result.bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
