//! `busbuddy` - CLI for the school bus tracking demo
//!
//! This binary runs the interactive shell and the scripted demo, and manages
//! the stored schools registry and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use busbuddy::cli::{Cli, Command, ConfigCommand, DemoCommand, RoutesCommand, SchoolsCommand};
use busbuddy::map::{MapBinding, MapOptions, TracingMap};
use busbuddy::shell::{Outcome, ShellCommand, HELP};
use busbuddy::{init_logging, render, Config, Controller, Role, Tab, Theme};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validation reports its own errors
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        let path = file
            .clone()
            .or_else(|| cli.config.clone())
            .unwrap_or_else(Config::default_config_path);
        println!("Validating configuration: {}", path.display());
        match Config::load_from(Some(path)) {
            Ok(_) => println!("Configuration is valid."),
            Err(e) => println!("Configuration error: {e}"),
        }
        return Ok(());
    }

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    // Execute the command
    match cli.command {
        Command::Shell(cmd) => run_shell(config, !cmd.no_redraw).await,
        Command::Demo(cmd) => run_demo(config, &cmd).await,
        Command::Schools(cmd) => handle_schools(config, cmd),
        Command::Routes(cmd) => handle_routes(config, cmd),
        Command::Config(cmd) => handle_config(&config, &cmd),
    }
}

/// Follow the controller's location feed on a terminal map.
async fn spawn_map(app: &Controller) -> anyhow::Result<JoinHandle<()>> {
    let config = app.config();
    let mut binding =
        MapBinding::connect(TracingMap::new(), &MapOptions::from(config), config).await?;
    let rx = app.subscribe_location();
    Ok(tokio::spawn(async move {
        binding.follow(rx).await;
    }))
}

async fn run_shell(config: Config, redraw: bool) -> anyhow::Result<()> {
    let theme = Theme::from_config(&config.theme);
    let mut app = Controller::open(config)?;
    let map = spawn_map(&app).await?;

    println!("{}", render(&app, &theme));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        match command.execute(&mut app)? {
            Outcome::Quit => break,
            Outcome::Help => println!("{HELP}"),
            Outcome::Continue(note) => {
                if let Some(note) = note {
                    println!("{note}");
                }
                if redraw {
                    println!("\n{}", render(&app, &theme));
                }
            }
        }
    }

    app.stop_tracking();
    map.abort();
    info!("shell closed");
    Ok(())
}

/// Walk through every role against an in-memory registry.
async fn run_demo(config: Config, cmd: &DemoCommand) -> anyhow::Result<()> {
    let theme = Theme::from_config(&config.theme);
    let wait = config.tick_interval() * cmd.ticks + Duration::from_millis(50);
    let sos_wait = config.sos_reset_after() + Duration::from_millis(50);
    let mut app = Controller::in_memory(config)?;
    let map = spawn_map(&app).await?;
    let show = |app: &Controller, caption: &str| {
        println!("\n--- {caption} ---\n{}", render(app, &theme));
    };

    show(&app, "start");

    // Driver runs a shift
    app.choose_role(Role::Driver);
    app.verify_code("sel999")?;
    app.choose_route("Gangnam Line");
    app.start_tracking();
    tokio::time::sleep(wait).await;
    show(&app, "driver on shift");
    app.send_quick_reply(0);
    app.trigger_sos();
    app.set_tab(Tab::Chat);
    show(&app, "driver raised SOS");
    tokio::time::sleep(sos_wait).await;
    app.stop_tracking();
    app.switch_route();
    app.back();
    app.back();

    // Parent checks in
    app.choose_role(Role::Parent);
    if let Err(e) = app.verify_code("NOPE") {
        warn!(%e, "demo access code rejected");
    }
    show(&app, "parent typo");
    app.verify_code("PAE101")?;
    app.choose_route("Route Gold");
    app.cycle_boarding_status();
    show(&app, "parent on map");
    app.set_tab(Tab::Chat);
    app.send_message("Running late!");
    show(&app, "parent chat");
    app.switch_route();
    app.back();
    app.back();

    // Admin edits routes
    app.choose_role(Role::Admin);
    app.verify_code("PAE101")?;
    app.add_route("Route Bronze")?;
    show(&app, "admin added a route");
    app.remove_route("Route Bronze")?;
    show(&app, "admin removed it again");

    map.abort();
    Ok(())
}

fn handle_schools(config: Config, cmd: SchoolsCommand) -> anyhow::Result<()> {
    let mut app = Controller::open(config)?;
    match cmd {
        SchoolsCommand::List { json } => {
            if json {
                println!("{}", app.registry().to_json()?);
            } else {
                for (code, school) in app.registry().iter() {
                    println!(
                        "{code}  {} {}  (driver {})",
                        school.logo, school.name, school.driver_name
                    );
                    for route in &school.routes {
                        println!("        - {route}");
                    }
                }
                let stats = app.storage().stats()?;
                println!();
                println!(
                    "Database: {} ({} stored keys, {} bytes)",
                    app.storage().path().display(),
                    stats.entries,
                    stats.db_size_bytes
                );
            }
        }
        SchoolsCommand::Reset { yes } => {
            if yes {
                app.reset_registry()?;
                println!("Schools registry reset to the built-in schools.");
            } else {
                println!("This will discard every route edit.");
                println!("Use --yes to confirm.");
            }
        }
    }
    Ok(())
}

fn handle_routes(config: Config, cmd: RoutesCommand) -> anyhow::Result<()> {
    let mut app = Controller::open(config)?;
    match cmd {
        RoutesCommand::Add { code, name } => {
            if app.add_route_to(&code, &name)? {
                println!("Added {name:?} to {}.", code.trim().to_uppercase());
            } else {
                println!("Nothing added: unknown school {code:?} or blank route name.");
            }
        }
        RoutesCommand::Remove { code, name } => {
            if app.remove_route_from(&code, &name)? {
                println!("Removed {name:?} from {}.", code.trim().to_uppercase());
            } else {
                println!("Nothing removed: unknown school {code:?}.");
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Registry key:       {}", config.storage.registry_key);
                println!();
                println!("[Tracking]");
                println!("  Tick interval (ms): {}", config.tracking.tick_interval_ms);
                println!("  Delta:              {}", config.tracking.delta);
                println!("  Reference point:    {}", config.reference_point());
                println!();
                println!("[SOS]");
                println!("  Reset after (ms):   {}", config.sos.reset_after_ms);
                println!();
                println!("[Map]");
                println!("  Zoom:               {}", config.map.zoom);
                println!("  Marker icon:        {}", config.map.marker_icon);
                println!();
                println!("[Chat]");
                println!("  Parent name:        {}", config.chat.parent_display_name);
                println!();
                println!("[Theme]");
                println!("  Variant:            {}", config.theme.variant);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { .. } => {}
    }
    Ok(())
}
