//! gtpctl - provision and inspect the GTP datapath of a gateway

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use gtp_tunnel::{
    BpfMapStore, Config, DatapathPortProvisioner, DualStackAddr, EndMarkerEmulator,
    FastPathMirror, Imsi, ProcessRunner, probe_gtp_type,
};
use slog::{Drain, Logger, o};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gateway GTP configuration file (TOML).  Settings not in the file take their defaults.
    #[arg(long, default_value = "gtp.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the GTP interface type supported by the local OVS.
    Probe,

    /// Create (if needed) the GTP port for an eNB or PGW and print its OpenFlow port number.
    /// Prints 0 if multi tunnel mode is off or the port could not be created.
    ResolvePort {
        #[arg(long)]
        ipv4: Option<Ipv4Addr>,
        #[arg(long)]
        ipv6: Option<Ipv6Addr>,
        /// The peer is a roaming PGW (S8 interface).
        #[arg(long)]
        roaming: bool,
    },

    /// Send a GTP end marker for a tunnel to an eNB.
    EndMarker {
        #[arg(long)]
        enb: Ipv4Addr,
        #[arg(long)]
        tei: u32,
    },

    /// Inspect or modify the eBPF downlink map.
    DlMap {
        #[command(subcommand)]
        op: DlMapOp,
    },
}

#[derive(Subcommand, Debug)]
enum DlMapOp {
    Get {
        #[arg(long)]
        ue: Ipv4Addr,
    },
    Add {
        #[arg(long)]
        ue: Ipv4Addr,
        #[arg(long)]
        enb: Ipv4Addr,
        #[arg(long)]
        tei: u32,
        #[arg(long)]
        imsi: Imsi,
    },
    Del {
        #[arg(long)]
        ue: Ipv4Addr,
    },
}

#[async_std::main]
async fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();

    let args = Args::parse();
    let config = Config::load(&args.config, &logger)?;
    let runner = Arc::new(ProcessRunner::from_config(&config, &logger));

    match args.command {
        Command::Probe => {
            let gtp_type = probe_gtp_type(runner.as_ref(), &logger).await;
            println!("{gtp_type}");
        }
        Command::ResolvePort {
            ipv4,
            ipv6,
            roaming,
        } => {
            let peer = DualStackAddr::new(ipv4, ipv6);
            if peer.is_unspecified() {
                bail!("Specify --ipv4 or --ipv6");
            }
            let ports = DatapathPortProvisioner::new(&config, runner, &logger).await;
            println!("{}", ports.resolve(&peer, roaming).await);
        }
        Command::EndMarker { enb, tei } => {
            let end_marker = EndMarkerEmulator::new(&config, runner, &logger);
            end_marker.send(enb, tei).await?;
        }
        Command::DlMap { op } => {
            let dl_map = FastPathMirror::try_open(
                Arc::new(BpfMapStore::new()),
                &config.ebpf_dl_map_path,
                &logger,
            )?;
            dl_map_command(&dl_map, op)?;
        }
    }

    Ok(())
}

fn dl_map_command(dl_map: &FastPathMirror, op: DlMapOp) -> Result<()> {
    match op {
        DlMapOp::Get { ue } => match dl_map.lookup(ue)? {
            Some(entry) => println!(
                "{ue} -> enb {} tei {:#x} imsi {}",
                entry.enb, entry.o_tei, entry.imsi
            ),
            None => println!("{ue} not found"),
        },
        DlMapOp::Add { ue, enb, tei, imsi } => {
            dl_map.add_entry(&ue.into(), &enb.into(), tei, &imsi)?;
        }
        DlMapOp::Del { ue } => {
            // The eNB only gates whether an entry is expected; any IPv4 address will do.
            dl_map.delete_entry(&ue.into(), &Ipv4Addr::BROADCAST.into())?;
        }
    }
    Ok(())
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}
