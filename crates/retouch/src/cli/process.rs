//! The `retouch process` command for brightness/contrast/rotation edits.

use clap::{Args, ValueEnum};
use retouch_core::{Config, EditService, MediaType, TransformRequest};
use std::path::PathBuf;

use super::common::{read_upload, request_error, write_result};

/// Output format override.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Baseline JPEG
    Jpeg,
    /// Lossless PNG (keeps alpha)
    Png,
}

impl From<OutputFormat> for MediaType {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Jpeg => MediaType::Jpeg,
            OutputFormat::Png => MediaType::Png,
        }
    }
}

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image file (JPEG or PNG)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to raw bytes on stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Brightness factor, 0.1 to 2.0
    #[arg(long, default_value_t = 1.0)]
    pub brightness: f32,

    /// Contrast factor around mid-gray, 0.1 to 2.0
    #[arg(long, default_value_t = 1.0)]
    pub contrast: f32,

    /// Clockwise rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rotate: f32,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Encoder quality 1-100 (overrides config)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Declared content type (defaults to one implied by the file extension)
    #[arg(long)]
    pub content_type: Option<String>,
}

impl ProcessArgs {
    /// The edit requested on the command line.
    pub fn transform_request(&self) -> TransformRequest {
        TransformRequest::new(self.brightness, self.contrast, self.rotate)
    }

    /// Config with `--format` / `--quality` applied.
    pub fn effective_config(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(format) = self.format {
            config.output.format = MediaType::from(format).as_str().to_string();
        }
        if let Some(quality) = self.quality {
            config.output.quality = quality;
        }
        config
    }
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, config: &Config) -> anyhow::Result<()> {
    let config = args.effective_config(config);
    let service = EditService::from_config(&config);
    let upload = read_upload(&args.input, args.content_type.as_deref())?;

    tracing::debug!("Processing {:?} with {:?}", args.input, args.transform_request());
    let result = service
        .process(upload, args.transform_request())
        .await
        .map_err(request_error)?;
    write_result(&result, args.output.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ProcessArgs,
    }

    fn parse(argv: &[&str]) -> ProcessArgs {
        let mut full = vec!["retouch"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_process_args_defaults_are_identity() {
        let args = parse(&["in.jpg"]);
        assert_eq!(args.transform_request(), TransformRequest::default());
        assert!(args.output.is_none());
        assert!(args.format.is_none());
        assert!(args.quality.is_none());
    }

    #[test]
    fn test_process_args_accept_negative_rotation() {
        let args = parse(&["in.jpg", "--rotate", "-90", "--brightness", "1.5"]);
        assert_eq!(args.transform_request(), TransformRequest::new(1.5, 1.0, -90.0));
    }

    #[test]
    fn test_process_args_reject_out_of_range_quality() {
        let argv = ["retouch", "in.jpg", "--quality", "0"];
        assert!(Harness::try_parse_from(argv).is_err());
        let argv = ["retouch", "in.jpg", "--quality", "101"];
        assert!(Harness::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = parse(&["in.png", "--format", "png", "--quality", "85"]);
        let config = args.effective_config(&Config::default());
        assert_eq!(config.output.media_type(), MediaType::Png);
        assert_eq!(config.output.quality, 85);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let args = parse(&["in.png"]);
        let config = args.effective_config(&Config::default());
        assert_eq!(config.output.media_type(), MediaType::Jpeg);
        assert_eq!(config.output.quality, 50);
    }
}
