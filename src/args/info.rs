//! `novaflow platform` and `novaflow tools`.

use novaflow::platform::current_platform;
use novaflow::tools::{KNOWN_TOOLS, probe};

use super::{Context, EXIT_FAILURE};

/// Print the detected platform, shell and config directory.
pub fn handle_platform(ctx: &Context) -> i32 {
    let platform = current_platform();
    let runner = ctx.runner();
    println!("Platform:   {platform}");
    println!("Shell:      {}", runner.shell().program().display());
    println!("Config dir: {}", ctx.paths.root().display());
    0
}

/// What: Print the availability of each tool.
///
/// Output:
/// - `0` when every tool named explicitly is installed; the default list
///   never fails.
pub fn handle_tools(names: &[String]) -> i32 {
    let explicit = !names.is_empty();
    let statuses = if explicit {
        probe(names)
    } else {
        probe(KNOWN_TOOLS)
    };
    let width = statuses.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for s in &statuses {
        match &s.path {
            Some(p) => println!("✔ {:width$}  {}", s.name, p.display()),
            None => println!("✖ {:width$}  not found", s.name),
        }
    }
    if explicit && statuses.iter().any(|s| !s.available()) {
        EXIT_FAILURE
    } else {
        0
    }
}
