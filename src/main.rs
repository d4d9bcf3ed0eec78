use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::{Input, Password};
use sshrun_core::exit_error;
use sshrun_core::features::config::settings::{Settings, SettingsStore};
use sshrun_core::features::{fanout, run};
use sshrun_core::tools::macros::{print_error, print_header, print_info, print_success, print_warning};
use sshrun_core::tools::validation::parse_port;
use sshrun_core::{ArgumentMode, CommandLine, ConnectionParameters, ExecOptions, HostKeyPolicy, StderrMode};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sshrun")]
#[command(about = "Run a command on remote hosts over password-authenticated SSH", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a command on one or more hosts
    Run(RunArgs),
    /// List preset commands
    Presets,
}

#[derive(Args)]
struct RunArgs {
    /// Remote host (repeat to run on several hosts at once)
    #[arg(short = 'H', long = "host", required = true)]
    hosts: Vec<String>,
    /// SSH port (default from settings, otherwise 22)
    #[arg(short, long)]
    port: Option<String>,
    /// Login user (prompted when not given here or in settings)
    #[arg(short, long)]
    user: Option<String>,
    /// Login password (prompted when omitted)
    #[arg(long)]
    password: Option<String>,
    /// Accept any host key without verification (insecure)
    #[arg(long, conflicts_with_all = ["pin", "known_hosts"])]
    accept_any_host_key: bool,
    /// Only accept a host key with this SHA256 fingerprint
    #[arg(long, value_name = "FINGERPRINT", conflicts_with = "known_hosts")]
    pin: Option<String>,
    /// known_hosts file to verify against (default ~/.ssh/known_hosts)
    #[arg(long, value_name = "PATH")]
    known_hosts: Option<PathBuf>,
    /// Give up dialing/handshaking after this many seconds
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,
    /// Give up on the remote command after this many seconds
    #[arg(long, value_name = "SECS")]
    command_timeout: Option<u64>,
    /// Print the remote command's stderr as well
    #[arg(long)]
    capture_stderr: bool,
    /// Single-quote each argument so the remote shell takes it literally
    #[arg(long)]
    quote_args: bool,
    /// Use preset N (see `sshrun presets`) as the base command
    #[arg(long, value_name = "N")]
    preset: Option<usize>,
    /// Command followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => execute(args).await,
        Commands::Presets => list_presets(),
    };

    if let Err(e) = result {
        exit_error!("{}", e);
    }
}

fn list_presets() -> Result<()> {
    let settings = SettingsStore::load().context("Failed to load settings")?;
    for (index, preset) in settings.presets.iter().enumerate() {
        println!("{}: {}", index, preset);
    }
    Ok(())
}

async fn execute(args: RunArgs) -> Result<()> {
    let settings = SettingsStore::load().context("Failed to load settings")?;
    debug!(?settings, "settings loaded");

    let command = build_command(&args, &settings)?;
    let options = build_options(&args, &settings);
    if options.host_key_policy == HostKeyPolicy::AcceptAny {
        print_warning("host keys will not be verified");
    }
    let port = match &args.port {
        Some(port) => parse_port(port)?,
        None => settings.port,
    };

    let username = match args.user.clone().or_else(|| settings.username.clone()) {
        Some(user) => user,
        None => Input::<String>::new().with_prompt("Username").interact_text()?,
    };
    let password = match &args.password {
        Some(password) => password.clone(),
        None => Password::new()
            .with_prompt(format!("Password for {}", username))
            .allow_empty_password(true)
            .interact()?,
    };

    let targets: Vec<ConnectionParameters> = args
        .hosts
        .iter()
        .map(|host| ConnectionParameters::new(host, port, &username, password.as_str()))
        .collect();

    if let [target] = targets.as_slice() {
        let output = run::execute(target.clone(), &command, options).await?;
        print_output(&output.stdout, &output.stderr)?;
        return Ok(());
    }

    let total = targets.len();
    print_info(format!("Running `{}` on {} hosts", command.render(), total));
    let results = fanout::execute_all(targets, &command, &options).await;
    let mut failed = 0;
    for target in results {
        print_header(&target.label);
        match target.result {
            Ok(output) => print_output(&output.stdout, &output.stderr)?,
            Err(e) => {
                failed += 1;
                print_error(e.to_string());
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} hosts failed", failed, total));
    }
    print_success(format!("{} hosts succeeded", total));
    Ok(())
}

/// Base command from a preset or the first word, the rest as arguments
fn build_command(args: &RunArgs, settings: &Settings) -> Result<CommandLine> {
    let (base, rest) = match args.preset {
        Some(index) => {
            let preset = settings
                .preset(index)
                .ok_or_else(|| anyhow!("Preset {} not found. See: sshrun presets", index))?;
            (preset.to_string(), args.command.as_slice())
        }
        None => match args.command.split_first() {
            Some((base, rest)) => (base.clone(), rest),
            None => return Err(anyhow!("Command required. Usage: sshrun run --host <HOST> <command>")),
        },
    };

    let mode = if args.quote_args {
        ArgumentMode::Quoted
    } else {
        ArgumentMode::Raw
    };

    Ok(CommandLine::new(base).with_args(rest.iter().cloned()).with_mode(mode))
}

/// Settings first, command-line flags on top
fn build_options(args: &RunArgs, settings: &Settings) -> ExecOptions {
    let mut options = settings.exec_options();

    if args.accept_any_host_key {
        options.host_key_policy = HostKeyPolicy::AcceptAny;
    } else if let Some(fingerprint) = &args.pin {
        options.host_key_policy = HostKeyPolicy::Pinned(fingerprint.clone());
    } else if let Some(path) = &args.known_hosts {
        options.host_key_policy = HostKeyPolicy::KnownHosts(path.clone());
    }

    if let Some(secs) = args.connect_timeout {
        options.connect_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(secs) = args.command_timeout {
        options.command_timeout = Some(Duration::from_secs(secs));
    }
    if args.capture_stderr {
        options.stderr = StderrMode::Capture;
    }
    options
}

fn print_output(stdout: &str, stderr: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(stdout.as_bytes())?;
    out.flush()?;

    if !stderr.is_empty() {
        let mut err = std::io::stderr().lock();
        err.write_all(stderr.as_bytes())?;
        err.flush()?;
    }
    Ok(())
}
