use clap::{ArgGroup, Args};
use serde::Serialize;
use std::path::PathBuf;

use guardkit::guard::{
    self, GuardAction, GuardSummary, LineSink, ResolvedTarget, TargetSpec,
};
use guardkit::log_status;
use guardkit::{Error, GuardContext};

use super::CmdResult;
use crate::tty;

const SEPARATOR: &str = "------------------------------------------------------------";

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).multiple(false)))]
pub struct GuardArgs {
    /// Header to update, by bare name or path
    #[arg(long, value_name = "NAME_OR_PATH", group = "target")]
    file: Option<String>,

    /// Update every header under the configured base
    #[arg(long, group = "target")]
    all: bool,

    /// Directory to update (absolute or workspace-relative)
    #[arg(long, value_name = "PATH", group = "target")]
    dir: Option<PathBuf>,

    /// Directory to update, found by recursive basename search
    #[arg(long = "dir-name", value_name = "NAME", group = "target")]
    dir_name: Option<String>,

    /// 1-based selection among multiple matches
    #[arg(long, value_name = "N")]
    pick: Option<usize>,

    /// Replace the guard prefix, preserving the UUID suffix
    #[arg(long)]
    refresh_prefix: bool,

    /// Regenerate the UUID suffix (wins over --refresh-prefix)
    #[arg(long)]
    regen_uuid: bool,

    /// Write changes (default is plan only)
    #[arg(long)]
    apply: bool,

    /// Skip the confirmation prompt (never skips --pick)
    #[arg(long)]
    force: bool,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum GuardOutput {
    #[serde(rename = "guard")]
    Run {
        prefix: String,
        actions: String,
        mode: String,
        cancelled: bool,
        plan: GuardSummary,
        #[serde(skip_serializing_if = "Option::is_none")]
        applied: Option<GuardSummary>,
    },
}

/// Sink wiring runner/resolver output to stderr, unconditionally visible.
struct StderrSink;

impl LineSink for StderrSink {
    fn info(&mut self, line: &str) {
        tty::line(line);
    }

    fn warn(&mut self, line: &str) {
        tty::line(line);
    }
}

pub fn run(args: GuardArgs, _global: &super::GlobalArgs) -> CmdResult<GuardOutput> {
    if !args.refresh_prefix && !args.regen_uuid {
        return Err(Error::Usage(
            "missing action: use --refresh-prefix and/or --regen-uuid".to_string(),
        ));
    }

    // Fresh context per invocation so config edits are always picked up.
    let ctx = GuardContext::load_from_cwd()?;
    log_status!("guard", "workDir: {}", ctx.workspace_root.display());

    if ctx.prefix().trim().is_empty() {
        return Err(Error::Config(
            "config.guard is empty; cannot run guard".to_string(),
        ));
    }

    let action = GuardAction::new(ctx.prefix(), args.refresh_prefix, args.regen_uuid);
    let rerun = rerun_flags(&args);
    let spec = target_spec(&args)?;
    let mode = if args.apply { "apply" } else { "plan" };

    let mut sink = StderrSink;
    let target = guard::resolve(&ctx, &spec, &rerun, &mut sink)?;

    // Plan pass: counts and per-file diffs, no writes.
    let plan = run_pass(&target, &action, false, &mut sink)?;
    print_summary(&ctx, &action, mode, &plan);

    let output = |cancelled: bool, applied: Option<GuardSummary>| GuardOutput::Run {
        prefix: ctx.prefix().to_string(),
        actions: action.describe().to_string(),
        mode: mode.to_string(),
        cancelled,
        plan,
        applied,
    };

    if !args.apply {
        return Ok((output(false, None), 0));
    }

    if plan.planned == 0 {
        tty::line("[guard] nothing to apply.");
        return Ok((output(false, None), 0));
    }

    if !args.force && !tty::confirm_apply(plan.planned) {
        tty::line("[guard] cancelled.");
        return Ok((output(true, None), 0));
    }

    // Independent apply pass: re-parses and recomputes from scratch.
    let applied = run_pass(&target, &action, true, &mut sink)?;

    tty::line(SEPARATOR);
    tty::line(&format!("[guard] applied: {}", applied.applied));
    tty::line(&format!("[guard] failed: {}", applied.failed));
    tty::line(SEPARATOR);

    let exit_code = if applied.failed > 0 { 1 } else { 0 };
    Ok((output(false, Some(applied)), exit_code))
}

fn run_pass(
    target: &ResolvedTarget,
    action: &GuardAction,
    apply: bool,
    sink: &mut dyn LineSink,
) -> guardkit::Result<GuardSummary> {
    match target {
        ResolvedTarget::File(file) => guard::run_single(file, action, apply, sink),
        ResolvedTarget::Tree(root) => guard::run_tree(root, action, apply, sink),
    }
}

fn target_spec(args: &GuardArgs) -> guardkit::Result<TargetSpec> {
    if let Some(input) = &args.file {
        Ok(TargetSpec::File {
            input: input.clone(),
            pick: args.pick,
        })
    } else if args.all {
        Ok(TargetSpec::All)
    } else if let Some(dir) = &args.dir {
        Ok(TargetSpec::Dir(dir.clone()))
    } else if let Some(name) = &args.dir_name {
        Ok(TargetSpec::DirName {
            name: name.clone(),
            pick: args.pick,
        })
    } else {
        // The arg group makes this unreachable from the CLI.
        Err(Error::Usage(
            "choose exactly one of --file / --all / --dir / --dir-name".to_string(),
        ))
    }
}

fn rerun_flags(args: &GuardArgs) -> String {
    let mut flags = Vec::new();
    if args.refresh_prefix {
        flags.push("--refresh-prefix");
    }
    if args.regen_uuid {
        flags.push("--regen-uuid");
    }
    if args.apply {
        flags.push("--apply");
    }
    if args.force {
        flags.push("--force");
    }
    flags.join(" ")
}

fn print_summary(ctx: &GuardContext, action: &GuardAction, mode: &str, summary: &GuardSummary) {
    tty::line(SEPARATOR);
    tty::line(&format!("[guard] prefix(config.guard): {}", ctx.prefix()));
    tty::line(&format!("[guard] actions: {}", action.describe()));
    tty::line(&format!("[guard] mode: {}", mode));
    tty::line(&format!("[guard] scanned: {}", summary.scanned));
    tty::line(&format!("[guard] planned: {}", summary.planned));
    tty::line(&format!("[guard] applied: {}", summary.applied));
    tty::line(&format!("[guard] failed: {}", summary.failed));
    tty::line(&format!(
        "[guard] skipped(package-info.h): {}",
        summary.skipped_package_info
    ));
    tty::line(&format!(
        "[guard] skipped(no-guard): {}",
        summary.skipped_no_guard
    ));
    tty::line(&format!(
        "[guard] skipped(no-uuid-suffix): {}",
        summary.skipped_no_uuid_suffix
    ));
    tty::line(&format!(
        "[guard] skipped(invalid): {}",
        summary.skipped_invalid
    ));
    tty::line(SEPARATOR);
}
