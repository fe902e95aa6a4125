//! Delete command

use super::Session;
use crate::cli::DeleteArgs;
use crate::confirm::TerminalConfirmer;
use crate::output;
use anyhow::{bail, Result};
use camino::Utf8Path;
use janitor_core::CancelToken;
use janitor_retention::{ExecutionMode, Executor};
use std::sync::Arc;

pub async fn run(
    args: DeleteArgs,
    config_path: &Utf8Path,
    region: Option<&str>,
    cancel: CancelToken,
) -> Result<()> {
    let target = args.target;
    let session = Session::open(config_path, region, cancel.clone()).await?;
    let live = session.live_set(&target).await?;
    let plan = session.plan(&live, target.repository.as_deref()).await?;

    let mut out = output::sink(target.output.as_deref())?;
    output::render_summary(&plan.summary, target.format, &mut out)?;

    let reports = Executor::new(
        session.clients.registry(),
        Arc::new(TerminalConfirmer),
        ExecutionMode::Delete { force: args.force },
        cancel,
    )
    .execute_all(&plan.candidates)
    .await?;

    let deleted: usize = reports.iter().map(|r| r.deleted).sum();
    let failed: usize = reports.iter().map(|r| r.failures.len()).sum();
    if failed > 0 {
        output::warning(&format!("{} images could not be deleted", failed));
        bail!("deleted {} images, {} failed", deleted, failed);
    }
    output::success(&format!("Deleted {} images", deleted));
    Ok(())
}
