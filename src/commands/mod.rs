pub mod config;
pub mod guard;

pub type CmdResult<T> = guardkit::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

/// Dispatch a parsed command and serialize its output for the JSON envelope.
pub fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (guardkit::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Guard(args) => {
            crate::output::map_cmd_result_to_json(guard::run(args, global))
        }
        crate::Commands::Config(args) => {
            crate::output::map_cmd_result_to_json(config::run(args, global))
        }
    }
}
