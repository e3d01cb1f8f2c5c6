//! `novaflow alias`.

use novaflow::aliases::{AliasError, AliasStore};

use super::definition::AliasAction;
use super::{Context, EXIT_CONFIG, EXIT_FAILURE, exit_code};

/// Exit code for an alias error.
const fn error_code(e: &AliasError) -> i32 {
    match e {
        AliasError::MissingField(_) | AliasError::InvalidFormat(_) => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}

/// What: Apply one alias operation to the store in the config directory.
pub async fn handle_alias(action: AliasAction, ctx: &Context) -> i32 {
    let mut store = AliasStore::load(ctx.paths.aliases_file());
    let outcome: Result<i32, AliasError> = match action {
        AliasAction::Add {
            name,
            command,
            description,
        } => store.add(&name, &command, &description).map(|()| {
            println!("Command \"{}\" added successfully!", name.trim());
            0
        }),
        AliasAction::Remove { name } => store.remove(&name).map(|_| {
            println!("Command \"{name}\" removed successfully!");
            0
        }),
        AliasAction::List => {
            print_list(&store);
            Ok(0)
        }
        AliasAction::Search { keyword } => {
            let hits = store.search(&keyword);
            if hits.is_empty() {
                println!("No commands found matching \"{keyword}\"");
            }
            for (name, cmd) in hits {
                println!("{name}:");
                println!("  Command: {}", cmd.command);
                println!("  Description: {}", describe(&cmd.description));
            }
            Ok(0)
        }
        AliasAction::Run { name } => match store.command_spec(&name) {
            Ok((spec, label)) => {
                let runner = ctx.runner();
                match runner.run_spec(&spec, &label).await {
                    Ok(result) => Ok(exit_code(&result)),
                    Err(e) => {
                        eprintln!("{e}");
                        Ok(EXIT_CONFIG)
                    }
                }
            }
            Err(e) => Err(e),
        },
        AliasAction::Export { path } => store.export_to(&path).map(|n| {
            println!("Exported {n} command(s) to {}", path.display());
            0
        }),
        AliasAction::Import { path } => store.import_from(&path).map(|n| {
            println!("Imported {n} command(s) from {}", path.display());
            0
        }),
        AliasAction::Clear => store.clear().map(|n| {
            if n == 0 {
                println!("No commands to clear.");
            } else {
                println!("Cleared all {n} custom command(s).");
            }
            0
        }),
    };
    outcome.unwrap_or_else(|e| {
        tracing::error!(error = %e, "[CLI] Alias operation failed");
        eprintln!("{e}");
        error_code(&e)
    })
}

/// Description or placeholder.
fn describe(text: &str) -> &str {
    if text.is_empty() { "No description" } else { text }
}

/// Print the aliases as an aligned table.
fn print_list(store: &AliasStore) {
    if store.is_empty() {
        println!("No custom commands defined.");
        return;
    }
    let name_w = store.list().map(|(n, _)| n.len()).max().unwrap_or(4).max(4);
    let cmd_w = store
        .list()
        .map(|(_, c)| c.command.len())
        .max()
        .unwrap_or(7)
        .max(7);
    println!("{:name_w$}  {:cmd_w$}  Description", "Name", "Command");
    for (name, cmd) in store.list() {
        println!(
            "{name:name_w$}  {:cmd_w$}  {}",
            cmd.command,
            describe(&cmd.description)
        );
    }
    println!();
    println!("Total: {} command(s)", store.len());
}
