//! Version command

use crate::cli::VersionArgs;
use anyhow::Result;
use serde::Serialize;
use std::fmt;

/// Build metadata stamped in by build.rs
#[derive(Debug, Serialize)]
struct BuildInfo {
    version: &'static str,
    commit: Option<&'static str>,
    build_date: Option<&'static str>,
    target: Option<&'static str>,
}

const BUILD: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    commit: option_env!("GIT_SHA"),
    build_date: option_env!("BUILD_DATE"),
    target: option_env!("TARGET"),
};

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ecr-janitor {}", self.version)?;
        if let Some(commit) = self.commit {
            write!(f, " ({})", commit)?;
        }
        if let Some(target) = self.target {
            write!(f, " {}", target)?;
        }
        Ok(())
    }
}

pub fn run(args: VersionArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&BUILD)?);
        return Ok(());
    }
    println!("{}", BUILD);
    if let Some(date) = BUILD.build_date {
        println!("Build date: {}", date);
    }
    Ok(())
}
