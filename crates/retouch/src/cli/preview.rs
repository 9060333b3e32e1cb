//! The `retouch preview` command.

use clap::Args;
use retouch_core::{Config, EditService};
use std::path::PathBuf;

use super::common::{read_upload, request_error, write_result};

/// Arguments for the `preview` command.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Image file (JPEG or PNG)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to raw bytes on stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Declared content type (defaults to one implied by the file extension)
    #[arg(long)]
    pub content_type: Option<String>,
}

/// Execute the preview command.
pub async fn execute(args: PreviewArgs, config: &Config) -> anyhow::Result<()> {
    let service = EditService::from_config(config);
    let upload = read_upload(&args.input, args.content_type.as_deref())?;

    let result = service.preview(upload).await.map_err(request_error)?;
    write_result(&result, args.output.as_deref())
}
