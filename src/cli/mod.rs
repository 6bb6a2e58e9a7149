pub mod commands;
pub mod output;
pub mod types;

pub use output::progress::{create_progress_bar, create_spinner, ProgressBarExt};
pub use types::{Cli, Commands};

use console::style;

/// Print a command failure and exit with status 1.
///
/// In JSON mode the error chain is emitted as `{"error", "causes"}` on stdout
/// so scripted callers always get a parseable document.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": causes,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {}", style("error:").red().bold(), err);
        for cause in err.chain().skip(1) {
            eprintln!("  {} {}", style("caused by:").dim(), cause);
        }
    }
    std::process::exit(1);
}
