//! # fleetctl
//!
//! Command-line control for a local proof-of-authority devnet fleet.
//!
//! A thin layer over `fleet-core`: each subcommand maps to exactly one
//! `FleetService` operation and renders its report. All fleet state lives
//! in the files under `--root`, so the tool itself is stateless between
//! invocations.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fleet_core::adapters::OsProcessRunner;
use fleet_core::service::{FleetService, GroupOutcome, GroupStop, StopOutcome};
use fleet_core::FleetConfig;

#[derive(Parser, Debug)]
#[command(name = "fleetctl", version)]
#[command(about = "Drive a local proof-of-authority devnet fleet")]
struct Cli {
    /// Directory holding genesis.json, fleet.json, bin/ and the devnet
    /// workspace
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Node binary to drive instead of <root>/bin/geth
    #[arg(long, value_name = "PATH")]
    geth_bin: Option<PathBuf>,

    /// Bootnode binary to drive instead of <root>/bin/bootnode
    #[arg(long, value_name = "PATH")]
    bootnode_bin: Option<PathBuf>,

    /// Genesis document instead of <root>/genesis.json
    #[arg(long, value_name = "PATH")]
    genesis: Option<PathBuf>,

    /// Roster file instead of <root>/fleet.json
    #[arg(long, value_name = "PATH")]
    roster: Option<PathBuf>,

    /// Sealer workspace instead of <root>/devnet
    #[arg(long, value_name = "PATH")]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn config(&self) -> FleetConfig {
        let mut config = FleetConfig::rooted_at(&self.root);
        if let Some(path) = &self.geth_bin {
            config.node_binary = path.clone();
        }
        if let Some(path) = &self.bootnode_bin {
            config.bootnode_binary = path.clone();
        }
        if let Some(path) = &self.genesis {
            config.genesis_path = path.clone();
        }
        if let Some(path) = &self.roster {
            config.roster_path = path.clone();
        }
        if let Some(path) = &self.workspace {
            config.workspace_dir = path.clone();
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision, launch and stop sealers
    #[command(subcommand)]
    Sealer(SealerCommand),
    /// Launch and stop the discovery bootnode
    #[command(subcommand)]
    Bootnode(BootnodeCommand),
    /// Show the roster: addresses, ports, running state
    Status,
    /// Stop everything and dismantle the workspace
    Clean,
}

#[derive(Subcommand, Debug)]
enum SealerCommand {
    /// Provision a new sealer and register it as a signer
    Init { name: String },
    /// Duplicate an existing sealer under a new name
    Clone { source: String, target: String },
    /// Provision node1..nodeN in one sweep
    BatchInit { count: u32 },
    /// Launch one sealer detached
    Start { name: String },
    /// Stop one sealer's process group
    Stop { name: String },
    /// Launch every roster sealer
    StartAll,
    /// Signal every tracked process group once
    StopAll,
}

#[derive(Subcommand, Debug)]
enum BootnodeCommand {
    /// Launch the bootnode detached, parking its group id in the pidfile
    Start,
    /// Stop the bootnode named by the pidfile
    Stop,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let service = FleetService::new(cli.config(), OsProcessRunner);
    match cli.command {
        Command::Sealer(command) => sealer(&service, command),
        Command::Bootnode(command) => bootnode(&service, command),
        Command::Status => status(&service),
        Command::Clean => clean(&service),
    }
}

fn sealer(service: &FleetService<OsProcessRunner>, command: SealerCommand) -> Result<()> {
    match command {
        SealerCommand::Init { name } => {
            let created = service
                .init_sealer(&name)
                .with_context(|| format!("initialize sealer `{name}`"))?;
            println!(
                "sealer {} ready: address {}, p2p {}, rpc {}",
                created.name,
                created.address.prefixed_hex(),
                created.p2p_port,
                created.rpc_port
            );
            Ok(())
        }
        SealerCommand::Clone { source, target } => {
            let created = service
                .clone_sealer(&source, &target)
                .with_context(|| format!("clone sealer `{source}` into `{target}`"))?;
            println!(
                "sealer {} cloned from {source}: address {}, p2p {}, rpc {}",
                created.name,
                created.address.prefixed_hex(),
                created.p2p_port,
                created.rpc_port
            );
            Ok(())
        }
        SealerCommand::BatchInit { count } => {
            let report = service.batch_init(count);
            for outcome in &report.outcomes {
                match &outcome.result {
                    Ok(created) => println!(
                        "sealer {} ready: address {}, p2p {}, rpc {}",
                        created.name,
                        created.address.prefixed_hex(),
                        created.p2p_port,
                        created.rpc_port
                    ),
                    Err(err) => eprintln!("sealer {} failed: {err}", outcome.name),
                }
            }
            if !report.is_clean() {
                bail!(
                    "{} of {} sealers failed to initialize",
                    report.failed(),
                    report.outcomes.len()
                );
            }
            Ok(())
        }
        SealerCommand::Start { name } => {
            let started = service
                .start_sealer(&name)
                .with_context(|| format!("start sealer `{name}`"))?;
            println!(
                "sealer {} running as group {} (p2p {}, rpc {})",
                started.name, started.pgid, started.p2p_port, started.rpc_port
            );
            Ok(())
        }
        SealerCommand::Stop { name } => {
            let report = service
                .stop_sealer(&name)
                .with_context(|| format!("stop sealer `{name}`"))?;
            match report.outcome {
                StopOutcome::Terminated(pgid) => {
                    println!("stopped sealer {} (group {pgid})", report.name);
                }
                StopOutcome::AlreadyGone(pgid) => {
                    println!(
                        "sealer {}'s group {pgid} was already gone; cleared",
                        report.name
                    );
                }
                StopOutcome::NotRunning => println!("sealer {} is not running", report.name),
                StopOutcome::Failed(reason) => bail!("stop sealer `{name}`: {reason}"),
            }
            Ok(())
        }
        SealerCommand::StartAll => {
            let report = service.start_all().context("start fleet")?;
            if report.outcomes.is_empty() {
                println!("no sealers provisioned");
                return Ok(());
            }
            for outcome in &report.outcomes {
                match &outcome.result {
                    Ok(started) => println!(
                        "sealer {} running as group {} (p2p {}, rpc {})",
                        started.name, started.pgid, started.p2p_port, started.rpc_port
                    ),
                    Err(err) => eprintln!("sealer {} failed: {err}", outcome.name),
                }
            }
            if !report.is_clean() {
                bail!(
                    "{} of {} sealers failed to start",
                    report.failed(),
                    report.outcomes.len()
                );
            }
            Ok(())
        }
        SealerCommand::StopAll => {
            let stops = service.stop_all();
            if stops.is_empty() {
                println!("nothing to stop");
                return Ok(());
            }
            let failures = print_group_stops(&stops);
            if failures > 0 {
                bail!("{failures} process group(s) could not be signalled");
            }
            Ok(())
        }
    }
}

fn bootnode(service: &FleetService<OsProcessRunner>, command: BootnodeCommand) -> Result<()> {
    match command {
        BootnodeCommand::Start => {
            let started = service.start_bootnode().context("start bootnode")?;
            println!("bootnode running as group {}", started.pgid);
            Ok(())
        }
        BootnodeCommand::Stop => {
            match service.stop_bootnode().context("stop bootnode")? {
                StopOutcome::Terminated(pgid) => println!("stopped bootnode (group {pgid})"),
                StopOutcome::AlreadyGone(pgid) => {
                    println!("bootnode group {pgid} was already gone; cleared");
                }
                StopOutcome::NotRunning => println!("bootnode is not running"),
                StopOutcome::Failed(reason) => bail!("stop bootnode: {reason}"),
            }
            Ok(())
        }
    }
}

fn status(service: &FleetService<OsProcessRunner>) -> Result<()> {
    let roster = service.roster().context("read roster")?;
    if roster.is_empty() {
        println!("no sealers provisioned");
        return Ok(());
    }
    println!(
        "{:<12} {:<42} {:>6} {:>6}  STATE",
        "NAME", "ADDRESS", "P2P", "RPC"
    );
    for (name, record) in roster.iter() {
        let state = match record.pgid {
            Some(pgid) => format!("running (pgid {pgid})"),
            None => "stopped".to_string(),
        };
        println!(
            "{:<12} {:<42} {:>6} {:>6}  {}",
            name,
            record.address.prefixed_hex(),
            record.p2p_port,
            record.rpc_port,
            state
        );
    }
    Ok(())
}

fn clean(service: &FleetService<OsProcessRunner>) -> Result<()> {
    let report = service.teardown().context("dismantle workspace")?;
    match report.bootnode {
        StopOutcome::Terminated(pgid) => println!("stopped bootnode (group {pgid})"),
        StopOutcome::AlreadyGone(pgid) => println!("bootnode group {pgid} was already gone"),
        StopOutcome::NotRunning => {}
        StopOutcome::Failed(reason) => eprintln!("bootnode stop failed: {reason}"),
    }
    if !report.group_stops.is_empty() {
        print_group_stops(&report.group_stops);
    }
    println!("workspace dismantled");
    Ok(())
}

/// Print one line per group stop; returns how many could not be
/// signalled.
fn print_group_stops(stops: &[GroupStop]) -> usize {
    let mut failures = 0;
    for stop in stops {
        match &stop.outcome {
            GroupOutcome::Terminated => println!("terminated group {}", stop.pgid),
            GroupOutcome::AlreadyGone => println!("group {} was already gone", stop.pgid),
            GroupOutcome::Failed(reason) => {
                failures += 1;
                eprintln!("group {}: {reason}", stop.pgid);
            }
        }
    }
    failures
}
