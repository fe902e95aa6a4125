//! Plan command

use super::Session;
use crate::cli::PlanArgs;
use crate::confirm::TerminalConfirmer;
use crate::output;
use anyhow::Result;
use camino::Utf8Path;
use janitor_core::CancelToken;
use janitor_retention::{ExecutionMode, Executor};
use std::sync::Arc;

pub async fn run(
    args: PlanArgs,
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

    Executor::new(
        session.clients.registry(),
        Arc::new(TerminalConfirmer),
        ExecutionMode::PlanOnly,
        cancel,
    )
    .execute_all(&plan.candidates)
    .await?;
    Ok(())
}
