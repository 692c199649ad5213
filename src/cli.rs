//! CLI domain: parse, route, help, output, and presentation only.
//! No pipeline logic; the route table dispatches to the studio and compositor.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{parse_labeled_path, Cli, Commands};
pub use presentation::{
    format_batch_json, format_batch_text, format_classify_result, format_compose_result,
    BatchRow,
};
pub use route::RunContext;
