//! The command-line surface: one `Command` tree with a subcommand per
//! long-running or administrative facility, dispatched by
//! [`run`]. Parameterized over the argument list so integration tests
//! can drive it without going through `std::env::args`.

use std::ffi::OsString;
use std::net::SocketAddr;

use clap::{Arg, ArgAction, ArgMatches, Command};

use gsd_protocol::Address;
use gsd_sync::Region;

use crate::commands::cache::CacheCommand;
use crate::commands::{cache, poller, sync, ui, websocket};
use crate::exit::CliError;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

fn validate_address(value: &str) -> Result<Address, String> {
    value.parse().map_err(|_| format!("invalid address {value:?}, expected <ip>:<port>"))
}

fn validate_region(value: &str) -> Result<Region, String> {
    sync::parse_region(value)
}

fn validate_socket_addr(value: &str) -> Result<SocketAddr, String> {
    value.parse().map_err(|_| format!("invalid bind address {value:?}, expected <ip>:<port>"))
}

fn redis_url_arg() -> Arg {
    Arg::new("redis_url")
        .long("redis-url")
        .help("Redis connection URL")
        .default_value(DEFAULT_REDIS_URL)
}

fn command() -> Command {
    Command::new("gsd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Discovers, polls, caches and distributes live status for a population of Source-engine game servers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("cache")
                .about("Inspect and administer the state cache directly")
                .arg(redis_url_arg())
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("get")
                        .about("Print the cached status of one address")
                        .arg(
                            Arg::new("address")
                                .help("Server address, e.g. 192.0.2.1:27015")
                                .value_parser(validate_address)
                                .required(true),
                        ),
                )
                .subcommand(
                    Command::new("ensure")
                        .about("Add an address to the cache if it isn't already known")
                        .arg(
                            Arg::new("address")
                                .help("Server address, e.g. 192.0.2.1:27015")
                                .value_parser(validate_address)
                                .required(true),
                        ),
                )
                .subcommand(
                    Command::new("search")
                        .about("List addresses matching a tag filter")
                        .arg(
                            Arg::new("include")
                                .help("Tag that a result must have")
                                .short('i')
                                .long("include")
                                .action(ArgAction::Append),
                        )
                        .arg(
                            Arg::new("exclude")
                                .help("Tag that a result must not have")
                                .short('x')
                                .long("exclude")
                                .action(ArgAction::Append),
                        ),
                ),
        )
        .subcommand(
            Command::new("poller")
                .about("Run the poller pool against the state cache")
                .arg(redis_url_arg())
                .arg(
                    Arg::new("workers")
                        .help("Number of independent cache handles (and worker tasks) to run")
                        .short('w')
                        .long("workers")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    Arg::new("passive")
                        .help("Only poll addresses already in the cache; never drain the interest queue")
                        .long("passive")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Synchronise known addresses from the upstream master server")
                .arg(redis_url_arg())
                .arg(
                    Arg::new("master_addr")
                        .help("Master server host:port")
                        .long("master-addr")
                        .default_value(gsd_sync::DEFAULT_MASTER_SERVER),
                )
                .arg(
                    Arg::new("region")
                        .help("Region(s) to sync; may be given more than once")
                        .short('r')
                        .long("region")
                        .value_parser(validate_region)
                        .action(ArgAction::Append)
                        .default_value("all"),
                )
                .arg(
                    Arg::new("filter")
                        .help("Source engine filter string, e.g. \\gamedir\\tf")
                        .short('f')
                        .long("filter")
                        .default_value(""),
                )
                .arg(
                    Arg::new("forever")
                        .help("Loop indefinitely instead of running one pass")
                        .long("forever")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("websocket")
                .about("Serve the WebSocket fan-out gateway")
                .arg(redis_url_arg())
                .arg(
                    Arg::new("bind")
                        .help("Address to bind the gateway to")
                        .short('b')
                        .long("bind")
                        .value_parser(validate_socket_addr)
                        .default_value("0.0.0.0:8080"),
                ),
        )
        .subcommand(Command::new("ui").about("Run the dashboard UI (out of scope for this build)"))
}

/// Parse `args` and dispatch to the matched subcommand. `args` mirrors
/// `std::env::args_os`: the first element is the program name and is
/// ignored by clap's matcher, matching `get_matches_from`'s contract.
pub async fn run<I, T>(args: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match command().try_get_matches_from(args) {
        Ok(matches) => matches,
        // clap's own formatted usage/help/error message, then exit —
        // never returns.
        Err(error) => error.exit(),
    };
    dispatch(&matches).await
}

async fn dispatch(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some(("cache", sub)) => dispatch_cache(sub).await,
        Some(("poller", sub)) => {
            let redis_url = sub.get_one::<String>("redis_url").expect("has a default");
            let workers = *sub.get_one::<usize>("workers").expect("has a default");
            let passive = sub.get_flag("passive");
            poller::run(redis_url, workers, passive).await
        }
        Some(("sync", sub)) => {
            let redis_url = sub.get_one::<String>("redis_url").expect("has a default");
            let master_addr = sub.get_one::<String>("master_addr").expect("has a default");
            let regions: Vec<Region> = sub
                .get_many::<Region>("region")
                .expect("has a default")
                .copied()
                .collect();
            let filter = sub.get_one::<String>("filter").expect("has a default");
            let forever = sub.get_flag("forever");
            sync::run(redis_url, master_addr, regions, filter, forever).await
        }
        Some(("websocket", sub)) => {
            let redis_url = sub.get_one::<String>("redis_url").expect("has a default");
            let bind = *sub.get_one::<SocketAddr>("bind").expect("has a default");
            websocket::run(redis_url, bind).await
        }
        Some(("ui", _)) => {
            ui::run();
            Ok(())
        }
        _ => unreachable!("clap enforces subcommand_required"),
    }
}

async fn dispatch_cache(sub: &ArgMatches) -> Result<(), CliError> {
    let redis_url = sub.get_one::<String>("redis_url").expect("has a default");
    match sub.subcommand() {
        Some(("get", inner)) => {
            let address = *inner.get_one::<Address>("address").expect("required");
            cache::run(redis_url, CacheCommand::Get { address }).await
        }
        Some(("ensure", inner)) => {
            let address = *inner.get_one::<Address>("address").expect("required");
            cache::run(redis_url, CacheCommand::Ensure { address }).await
        }
        Some(("search", inner)) => {
            let include = inner
                .get_many::<String>("include")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let exclude = inner
                .get_many::<String>("exclude")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            cache::run(redis_url, CacheCommand::Search { include, exclude }).await
        }
        _ => unreachable!("clap enforces subcommand_required"),
    }
}
