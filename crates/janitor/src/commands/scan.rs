//! Scan command

use super::Session;
use crate::cli::ScanArgs;
use crate::output;
use anyhow::Result;
use camino::Utf8Path;
use janitor_core::CancelToken;

pub async fn run(
    args: ScanArgs,
    config_path: &Utf8Path,
    region: Option<&str>,
    cancel: CancelToken,
) -> Result<()> {
    let session = Session::open(config_path, region, cancel).await?;
    let live = session.scan().await?;

    let mut out = output::sink(args.output.as_deref())?;
    output::render_live(&live, args.format, &mut out)?;
    if let Some(path) = &args.output {
        output::success(&format!("Wrote {} image references to {}", live.len(), path));
    }
    Ok(())
}
