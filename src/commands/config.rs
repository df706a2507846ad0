use clap::{Args, Subcommand};
use serde::Serialize;

use guardkit::GuardContext;

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display the effective workspace configuration
    Show,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum ConfigOutput {
    #[serde(rename = "config.show")]
    Show {
        workspace_root: String,
        base: String,
        guard: String,
        namespace: String,
        path: String,
        test: String,
        debug: String,
    },
}

pub fn run(args: ConfigArgs, _global: &super::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show => run_show(),
    }
}

fn run_show() -> CmdResult<ConfigOutput> {
    let ctx = GuardContext::load_from_cwd()?;
    Ok((
        ConfigOutput::Show {
            workspace_root: ctx.workspace_root.display().to_string(),
            base: ctx.base.display().to_string(),
            guard: ctx.config.guard.clone(),
            namespace: ctx.config.namespace.clone(),
            path: ctx.config.path.clone(),
            test: ctx.config.test.clone(),
            debug: ctx.config.debug.clone(),
        },
        0,
    ))
}
