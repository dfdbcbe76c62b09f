//! gitpm - install git-hosted packages into a project manifest
//!
//! The CLI loads the package catalog, starts a tracker over the project's
//! manifest and drives it with a tick loop until the requested operation
//! settles.

mod cli;
mod display;
mod error;
mod events;

use crate::cli::{Cli, Commands};
use crate::display::{CommandResult, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use gitpm_client::{ManifestClient, PackageClient};
use gitpm_config::{Catalog, Config};
use gitpm_events::EventReceiver;
use gitpm_tracker::{Completion, ListOptions, PackageTracker, RecordId};
use gitpm_types::{ColorChoice, InstallStatus, OperationKind, OutputFormat};
use std::process;
use std::time::Duration;
use tokio::select;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting gitpm v{}", env!("CARGO_PKG_VERSION"));

    // Precedence: defaults < file < environment < CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);

    let catalog = Catalog::load(&config).await?;
    info!(
        packages = catalog.len(),
        manifest = %config.manifest_path().display(),
        "catalog loaded"
    );

    let (event_sender, event_receiver) = gitpm_events::channel();
    let client = ManifestClient::new(
        config.manifest_path(),
        config.lock_path(),
        config.tracker.built_in_prefixes.clone(),
    )?;
    let tracker = PackageTracker::new(client, catalog)
        .with_event_sender(event_sender)
        .with_list_options(ListOptions {
            include_indirect: config.tracker.include_indirect,
            include_built_in: config.tracker.include_built_in,
        });

    let json_output = cli.global.json || config.general.default_output == OutputFormat::Json;
    let renderer = OutputRenderer::new(json_output, config.general.color);

    let colors_enabled = match config.general.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, json_output);

    let pacing = Pacing {
        tick_interval: config.tick_interval(),
        wait_timeout: config.wait_timeout(),
    };
    let result = execute_command_with_events(
        cli.command,
        tracker,
        pacing,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// How often the tracker is ticked and how long a command may wait
#[derive(Debug, Clone, Copy)]
struct Pacing {
    tick_interval: Duration,
    /// Zero waits forever
    wait_timeout: Duration,
}

/// Execute command with concurrent event handling
async fn execute_command_with_events<C: PackageClient>(
    command: Commands,
    tracker: PackageTracker<C>,
    pacing: Pacing,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, tracker, pacing));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command<C: PackageClient>(
    command: Commands,
    mut tracker: PackageTracker<C>,
    pacing: Pacing,
) -> Result<CommandResult, CliError> {
    let operation = command.name();
    match command {
        Commands::List => {
            refresh(&mut tracker, pacing).await?;
            Ok(CommandResult::Packages {
                packages: tracker.records().to_vec(),
            })
        }

        Commands::Source { package } => {
            let id = resolve(&tracker, &package)?;
            Ok(CommandResult::Source {
                package: record(&tracker, id)?,
            })
        }

        Commands::Install { package } => {
            let id = resolve(&tracker, &package)?;
            refresh(&mut tracker, pacing).await?;
            ensure_idle(&tracker, &package)?;
            if record(&tracker, id)?.status() == InstallStatus::Installed {
                return Ok(CommandResult::Unchanged {
                    package: record(&tracker, id)?,
                });
            }

            tracker.request_install(id)?;
            let completion = settle_request(&mut tracker, pacing, operation).await?;
            Ok(CommandResult::Completed {
                package: record(&tracker, id)?,
                completion,
            })
        }

        Commands::Uninstall { package } => {
            let id = resolve(&tracker, &package)?;
            refresh(&mut tracker, pacing).await?;
            ensure_idle(&tracker, &package)?;
            if record(&tracker, id)?.status() == InstallStatus::NotInstalled {
                return Ok(CommandResult::Unchanged {
                    package: record(&tracker, id)?,
                });
            }

            tracker.request_uninstall(id)?;
            let completion = settle_request(&mut tracker, pacing, operation).await?;
            Ok(CommandResult::Completed {
                package: record(&tracker, id)?,
                completion,
            })
        }
    }
}

fn resolve<C: PackageClient>(tracker: &PackageTracker<C>, query: &str) -> Result<RecordId, CliError> {
    if query.trim().is_empty() {
        return Err(CliError::InvalidArguments(
            "a package name or id is required".to_string(),
        ));
    }
    tracker
        .find(query)
        .ok_or_else(|| CliError::UnknownPackage(query.to_string()))
}

fn record<C: PackageClient>(
    tracker: &PackageTracker<C>,
    id: RecordId,
) -> Result<gitpm_tracker::PackageRecord, CliError> {
    tracker
        .record(id)
        .cloned()
        .ok_or_else(|| CliError::UnknownPackage(id.to_string()))
}

/// Refuse to start while any record has a request in flight
fn ensure_idle<C: PackageClient>(tracker: &PackageTracker<C>, query: &str) -> Result<(), CliError> {
    match tracker.records().iter().find(|r| r.status().is_busy()) {
        Some(busy) => Err(CliError::Busy(busy.display_name().to_string())),
        None => {
            tracing::debug!(package = query, "tracker idle");
            Ok(())
        }
    }
}

/// Refresh installed statuses and wait for the listing
async fn refresh<C: PackageClient>(
    tracker: &mut PackageTracker<C>,
    pacing: Pacing,
) -> Result<(), CliError> {
    tracker.refresh_list()?;
    let completions = run_until_idle(tracker, pacing, "list").await?;
    match completions
        .into_iter()
        .find(|c| c.kind == OperationKind::List && !c.succeeded)
    {
        Some(failed) => Err(CliError::Failed {
            operation: "list".to_string(),
            message: failed.error.unwrap_or_default(),
        }),
        None => Ok(()),
    }
}

/// Tick until the single outstanding request resolves
async fn settle_request<C: PackageClient>(
    tracker: &mut PackageTracker<C>,
    pacing: Pacing,
    operation: &str,
) -> Result<Completion, CliError> {
    let completion = run_until_idle(tracker, pacing, operation)
        .await?
        .into_iter()
        .find(|c| c.kind != OperationKind::List)
        .ok_or_else(|| CliError::Failed {
            operation: operation.to_string(),
            message: "request finished without a result".to_string(),
        })?;

    if completion.succeeded {
        Ok(completion)
    } else {
        Err(CliError::Failed {
            operation: operation.to_string(),
            message: completion.error.unwrap_or_default(),
        })
    }
}

/// Tick the tracker at the configured interval until nothing is pending
async fn run_until_idle<C: PackageClient>(
    tracker: &mut PackageTracker<C>,
    pacing: Pacing,
    operation: &str,
) -> Result<Vec<Completion>, CliError> {
    let started = Instant::now();
    let mut interval = tokio::time::interval(pacing.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut completions = Vec::new();
    while tracker.has_pending() {
        interval.tick().await;
        completions.extend(tracker.tick());

        if tracker.has_pending()
            && !pacing.wait_timeout.is_zero()
            && started.elapsed() >= pacing.wait_timeout
        {
            return Err(CliError::Timeout {
                operation: operation.to_string(),
                waited: pacing.wait_timeout,
            });
        }
    }
    Ok(completions)
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        if let Some(file) = create_log_file(json_mode) {
            tracing_subscriber::fmt()
                .json()
                .with_writer(file)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(
                            "info,gitpm=debug,gitpm_tracker=debug,gitpm_client=debug",
                        )
                    }),
                )
                .init();
            return;
        }
    }

    if json_mode {
        // Keep stdout and stderr clean for JSON consumers
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,gitpm=warn,gitpm_tracker=warn")
                }),
            )
            .init();
    }
}

fn create_log_file(json_mode: bool) -> Option<std::fs::File> {
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(gitpm_config::constants::APP_DIR)
        .join("logs");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        if !json_mode {
            eprintln!("Warning: Failed to create log directory: {e}");
        }
        return None;
    }

    let log_file = log_dir.join(format!(
        "gitpm-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    match std::fs::File::create(&log_file) {
        Ok(file) => {
            if !json_mode {
                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            Some(file)
        }
        Err(e) => {
            if !json_mode {
                eprintln!("Warning: Failed to create log file: {e}");
            }
            None
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if global.json {
        config.general.default_output = OutputFormat::Json;
    }
    if let Some(project) = &global.project {
        config.project.root = Some(project.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpm_client::{Completer, Request};
    use gitpm_types::{PackageDescriptor, PackageInfo};
    use std::cell::RefCell;

    /// Client that lists nothing and never answers add or remove
    #[derive(Default)]
    struct Unresponsive {
        adds: RefCell<Vec<Completer<PackageInfo>>>,
        removes: RefCell<Vec<Completer<()>>>,
    }

    impl PackageClient for Unresponsive {
        fn add(&self, source_uri: &str) -> Request<PackageInfo> {
            let (completer, request) = Request::channel(OperationKind::Add, source_uri);
            self.adds.borrow_mut().push(completer);
            request
        }

        fn remove(&self, package_id: &str) -> Request<()> {
            let (completer, request) = Request::channel(OperationKind::Remove, package_id);
            self.removes.borrow_mut().push(completer);
            request
        }

        fn list(&self, _: bool, _: bool) -> Request<Vec<PackageInfo>> {
            Request::ready(OperationKind::List, "installed", Ok(Vec::new()))
        }
    }

    fn tracker() -> PackageTracker<Unresponsive> {
        PackageTracker::new(
            Unresponsive::default(),
            vec![PackageDescriptor::new(
                "Foo",
                "com.foo",
                "ssh://git@example.invalid/foo.git",
            )],
        )
    }

    fn pacing() -> Pacing {
        Pacing {
            tick_interval: Duration::from_millis(5),
            wait_timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_install_reports_timeout() {
        let err = execute_command(
            Commands::Install {
                package: "Foo".to_string(),
            },
            tracker(),
            pacing(),
        )
        .await
        .unwrap_err();

        match &err {
            CliError::Timeout { operation, waited } => {
                assert_eq!(operation, "install");
                assert_eq!(*waited, Duration::from_millis(50));
            }
            other => panic!("expected a timeout, got {other}"),
        }
        assert!(err.to_string().contains("wait_timeout_secs"));
    }

    #[tokio::test]
    async fn test_timeout_leaves_request_outstanding() {
        let mut tracker = tracker();
        let foo = tracker.find("com.foo").unwrap();
        tracker.request_install(foo).unwrap();

        let err = run_until_idle(&mut tracker, pacing(), "install")
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Timeout { .. }));
        assert!(tracker.has_pending());
        assert_eq!(
            tracker.record(foo).unwrap().status(),
            InstallStatus::CurrentlyInstalling
        );
    }

    #[tokio::test]
    async fn test_settled_list_does_not_time_out() {
        let mut tracker = tracker();
        tracker.refresh_list().unwrap();

        let completions = run_until_idle(&mut tracker, pacing(), "list").await.unwrap();
        assert_eq!(completions.len(), 1);
        assert!(completions[0].succeeded);
    }
}
