use anyhow::{Context, Result, bail};
use evcal::context::{AppContext, StandardContext};
use evcal::storage::{self, FileSlot, PersistentSlot};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let mut data_dir: Option<PathBuf> = None;
    let mut command: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            "--data-dir" => {
                let Some(path) = args.next() else {
                    bail!("--data-dir needs a path");
                };
                data_dir = Some(PathBuf::from(path));
            }
            "export" if command.is_none() => command = Some("export".to_string()),
            other => bail!("Unknown argument '{}'. Try 'evcal --help'.", other),
        }
    }

    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(data_dir));

    // CLI Command: evcal export
    if command.as_deref() == Some("export") {
        let slot = FileSlot::from_context(ctx.as_ref())?;
        let events = match slot.read()? {
            Some(raw) => storage::decode_events(&raw)
                .with_context(|| format!("Stored events in {} are unreadable", slot.name()))?,
            None => Vec::new(),
        };
        println!("{}", storage::encode_events(&events)?);
        return Ok(());
    }

    evcal::tui::run(ctx)
}

fn print_help() {
    println!(
        "evcal v{} - Month-view event calendar (TUI)",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    evcal [--data-dir <path>]            Start interactive calendar");
    println!("    evcal [--data-dir <path>] export     Print stored events as JSON to stdout");
    println!("    evcal --help                         Show this help message");
    println!();
    println!("OPTIONS:");
    println!("    --data-dir <path>   Keep events, config and log under <path>/data and <path>/config");
    println!();
    println!("KEYBINDINGS:");
    println!("    Press '?' inside the app for full interactive help");
    println!("    n/p        Next/previous month      t      Today");
    println!("    arrows     Move between days        Tab    Select an event");
    println!("    Enter/a    Add (or open) an event   d      Delete selected event");
    println!("    /          Search                   c      Cycle category filter");
    println!();
    println!("CONFIG (config.toml):");
    println!("    week_start = \"sunday\" | \"monday\"");
    println!("    log_level = \"off\" | \"error\" | \"warn\" | \"info\" | \"debug\" | \"trace\"");
    println!("    max_chips_per_cell = 3");
    println!("    default_color = \"pink\" | \"indigo\" | \"green\" | \"yellow\" | \"red\"");
}
