//! Multiverse Console CLI

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use console_app::{
    logging, Assistant, Console, ConsoleConfig, CredentialStore, LoginGate, ASSISTANT_KEY,
};
use console_security::{sanitize, FetchOptions, Frozen, SecureClient, SessionStore};
use reqwest::Method;
use std::path::PathBuf;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("mk-console")
        .version(console_app::VERSION)
        .about("Multiverse Console - unified cloud access gate")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("login")
                .about("Authenticate against the access gate")
                .arg(Arg::new("user").long("user").required(true).help("Identity UID"))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .required(true)
                        .help("Access cipher"),
                ),
        )
        .subcommand(
            Command::new("fetch")
                .about("Perform one secured request as the demo administrator")
                .arg(Arg::new("url").required(true).help("Absolute URL or path under api.base_url"))
                .arg(
                    Arg::new("method")
                        .long("method")
                        .default_value("GET")
                        .help("HTTP method"),
                )
                .arg(
                    Arg::new("timeout-ms")
                        .long("timeout-ms")
                        .value_parser(value_parser!(u64))
                        .help("Deadline in milliseconds (default from config)"),
                )
                .arg(
                    Arg::new("header")
                        .long("header")
                        .short('H')
                        .action(ArgAction::Append)
                        .help("Extra header as NAME:VALUE"),
                )
                .arg(Arg::new("body").long("body").help("Request body")),
        )
        .subcommand(
            Command::new("sanitize")
                .about("Escape text for markup interpolation")
                .arg(Arg::new("text").required(true)),
        )
        .subcommand(
            Command::new("monitor")
                .about("Watch the live metrics window")
                .arg(
                    Arg::new("ticks")
                        .long("ticks")
                        .default_value("5")
                        .value_parser(value_parser!(u32))
                        .help("Number of ticks to print"),
                ),
        )
        .subcommand(
            Command::new("credential")
                .about("Manage the assistant credential")
                .subcommand_required(true)
                .subcommand(Command::new("set").arg(Arg::new("value").required(true)))
                .subcommand(Command::new("show"))
                .subcommand(Command::new("clear")),
        )
        .subcommand(
            Command::new("brief")
                .about("Ask the assistant for flavor text")
                .arg(Arg::new("prompt").required(true)),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let config = ConsoleConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;
    logging::init(matches.get_flag("verbose"), &config.logging.filter);

    match matches.subcommand() {
        Some(("login", args)) => login(&config, args).await,
        Some(("fetch", args)) => fetch(&config, args).await,
        Some(("sanitize", args)) => {
            let text = args.get_one::<String>("text").map_or("", String::as_str);
            println!("{}", sanitize(text));
            Ok(())
        }
        Some(("monitor", args)) => monitor(&config, args).await,
        Some(("credential", args)) => credential(&config, args),
        Some(("brief", args)) => brief(&config, args).await,
        _ => bail!("unknown command"),
    }
}

async fn login(config: &Frozen<ConsoleConfig>, args: &ArgMatches) -> anyhow::Result<()> {
    let user = args.get_one::<String>("user").map_or("", String::as_str);
    let password = args.get_one::<String>("password").map_or("", String::as_str);

    println!("ESTABLISHING SECURE LINK...");
    let session = Arc::new(SessionStore::new());
    let identity = LoginGate::new(config.login.clone(), session)
        .authenticate(user, password)
        .await?;

    println!("{}", serde_json::to_string_pretty(&identity)?);
    Ok(())
}

async fn fetch(config: &Frozen<ConsoleConfig>, args: &ArgMatches) -> anyhow::Result<()> {
    let target = args.get_one::<String>("url").map_or("", String::as_str);
    let url = config.api.resolve(target);

    let method = args.get_one::<String>("method").map_or("GET", String::as_str);
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method {method}"))?;

    let timeout_ms = args
        .get_one::<u64>("timeout-ms")
        .copied()
        .unwrap_or(config.api.timeout_ms);
    let mut options = FetchOptions::method(method).with_timeout_ms(timeout_ms);
    for header in args.get_many::<String>("header").into_iter().flatten() {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header {header:?} is not NAME:VALUE");
        };
        options = options.with_raw_header(name, value)?;
    }
    if let Some(body) = args.get_one::<String>("body") {
        options = options.with_body(body.clone().into_bytes());
    }

    let session = Arc::new(SessionStore::demo());
    let client = SecureClient::new(Arc::clone(&session));
    match client.fetch_json(&url, options).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(err) => {
            if err.is_session_expired() {
                eprintln!("session ended; please log in again");
            }
            Err(anyhow::Error::new(err).context(format!("secured request to {url}")))
        }
    }
}

async fn monitor(config: &Frozen<ConsoleConfig>, args: &ArgMatches) -> anyhow::Result<()> {
    let ticks = args.get_one::<u32>("ticks").copied().unwrap_or(5);
    let session = Arc::new(SessionStore::demo());
    let console = Console::open(session, config.dashboard)?;

    let mut interval = tokio::time::interval(config.dashboard.tick_interval());
    for _ in 0..ticks {
        interval.tick().await;
        if let Some(sample) = console.metrics().latest() {
            println!(
                "t={:>4}  load={:>5.1}%  traffic={:>5.1}",
                sample.time, sample.load, sample.traffic
            );
        }
    }
    Ok(())
}

fn credential(config: &Frozen<ConsoleConfig>, args: &ArgMatches) -> anyhow::Result<()> {
    let store = CredentialStore::new(&config.storage.credential_path);
    match args.subcommand() {
        Some(("set", sub)) => {
            let value = sub.get_one::<String>("value").map_or("", String::as_str);
            store.set(ASSISTANT_KEY, value)?;
            println!("credential stored in {}", store.path().display());
        }
        Some(("show", _)) => match store.get(ASSISTANT_KEY)? {
            Some(value) => println!("{}", mask(&value)),
            None => println!("not configured"),
        },
        Some(("clear", _)) => {
            if store.remove(ASSISTANT_KEY)? {
                println!("credential removed");
            } else {
                println!("not configured");
            }
        }
        _ => bail!("unknown credential command"),
    }
    Ok(())
}

async fn brief(config: &Frozen<ConsoleConfig>, args: &ArgMatches) -> anyhow::Result<()> {
    let prompt = args.get_one::<String>("prompt").map_or("", String::as_str);
    let store = CredentialStore::new(&config.storage.credential_path);
    let assistant = Assistant::from_config(&config.assistant, store);

    let text = assistant.brief(prompt).await?;
    println!("{text}");
    Ok(())
}

const MASK_PREFIX: usize = 4;

fn mask(value: &str) -> String {
    if value.chars().count() <= MASK_PREFIX * 2 {
        return "***".to_string();
    }
    let visible: String = value.chars().take(MASK_PREFIX).collect();
    format!("{visible}***")
}
