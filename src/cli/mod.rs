use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::{self, ConnectionFlags, ConnectionSettings, EnvSource, ProcessEnv, Profile};
use crate::diagnostics::{self, DiagnosticsOutcome};
use crate::engine::{Engine, EngineOptions};
use crate::exit::ExitCode;
use crate::remote::SshExecutor;
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "clustercheck",
    version,
    about = "Check a remote microk8s cluster over SSH and recommend a deployment strategy",
    disable_help_flag = true
)]
pub struct Cli {
    /// SSH host (env: SSH_HOST, REMOTE_SSH_HOST)
    #[arg(short = 'h', long, global = true)]
    pub host: Option<String>,
    /// SSH user (env: SSH_USER, REMOTE_SSH_USER)
    #[arg(short = 'u', long, global = true)]
    pub user: Option<String>,
    /// SSH port (env: SSH_PORT, default 22)
    #[arg(short = 'p', long, global = true)]
    pub port: Option<u16>,
    /// Private key file (env: SSH_KEY)
    #[arg(short = 'k', long, global = true)]
    pub key: Option<PathBuf>,
    /// Report file (env: CONFIG_OUTPUT_FILE, default cluster-config.json)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<PathBuf>,
    /// Cluster profile (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    /// Print help
    #[arg(long, action = ArgAction::Help, global = true)]
    pub help: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

// `-h` is the global host option, so subcommands must not add their own help flag.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every probe and write the report (default)
    #[command(disable_help_flag = true)]
    Check,
    /// Wait for the runtime, restarting it once if needed
    #[command(disable_help_flag = true)]
    Diagnose,
    /// Show the effective cluster profile
    #[command(disable_help_flag = true)]
    Config(ConfigArgs),
    /// Print a shell completion script
    #[command(disable_help_flag = true)]
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

impl Cli {
    fn connection_flags(&self) -> ConnectionFlags {
        ConnectionFlags {
            host: self.host.clone(),
            user: self.user.clone(),
            port: self.port,
            key: self.key.clone(),
            output: self.output.clone(),
        }
    }
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => err.exit(),
        Err(err) => {
            // clap's own message is already the diagnostic.
            let _ = err.print();
            std::process::exit(ExitCode::InvalidArgs.as_i32());
        }
    };

    init_tracing(cli.verbose);
    install_interrupt_handler();

    let env = ProcessEnv;
    let profile = config::load(cli.config.as_deref(), &env).map_err(crate::exit::invalid_args_err)?;

    let ui_cfg = UiConfig {
        color: color_enabled(io::stdout().is_terminal(), cli.no_color, &env),
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    match cli.command {
        None | Some(Commands::Check) => {
            let settings = config::resolve_connection(&cli.connection_flags(), &env)?;
            run_check(&settings, &profile, &ui_cfg, cli.json)
        }
        Some(Commands::Diagnose) => {
            let settings = config::resolve_connection(&cli.connection_flags(), &env)?;
            run_diagnose(&settings, &profile, &ui_cfg)
        }
        Some(Commands::Config(ref args)) => {
            if args.show {
                if cli.json {
                    serde_json::to_writer_pretty(io::stdout().lock(), &profile)?;
                    println!();
                } else {
                    print!("{}", toml::to_string_pretty(&profile)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: use `clustercheck config --show`");
            }
            Ok(())
        }
        Some(Commands::Completion(ref args)) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "clustercheck", &mut out);
            Ok(())
        }
    }
}

fn run_check(settings: &ConnectionSettings, profile: &Profile, ui_cfg: &UiConfig, json: bool) -> Result<()> {
    let target = settings.target.display();
    if !json {
        crate::ui::print_target(ui_cfg, &target, settings.target.key_path.as_deref(), &settings.output);
    }

    let exec = SshExecutor::new(settings.target.clone(), profile.timeouts.connectivity());
    let engine = Engine::new(
        &exec,
        profile,
        target,
        EngineOptions {
            show_progress: io::stderr().is_terminal() && !ui_cfg.quiet && !json,
        },
    );
    let outcome = engine.check();

    crate::report::save(&outcome.report, &settings.output)?;

    if json {
        crate::report::write_json(&outcome.report)?;
        if let Some(reason) = &outcome.connectivity_error {
            eprintln!("SSH connection failed: {reason}");
        }
    } else {
        crate::ui::print_summary(
            &outcome.report,
            ui_cfg,
            &settings.output,
            outcome.connectivity_error.as_deref(),
        );
    }

    if outcome.report.cluster_ready {
        Ok(())
    } else {
        Err(crate::exit::not_ready("cluster is not ready for deployment"))
    }
}

fn run_diagnose(settings: &ConnectionSettings, profile: &Profile, ui_cfg: &UiConfig) -> Result<()> {
    let exec = SshExecutor::new(settings.target.clone(), profile.timeouts.connectivity());
    let runtime = profile.runtime.name.as_str();

    say(ui_cfg, "Running quick diagnostics...");
    let outcome = diagnostics::run_quick_diagnostics(&exec, profile);
    match outcome {
        DiagnosticsOutcome::Ready => say(ui_cfg, &format!("{runtime} is ready")),
        DiagnosticsOutcome::Recovered => say(ui_cfg, &format!("{runtime} restarted successfully")),
        DiagnosticsOutcome::Failed => eprintln!("{runtime} failed to start"),
    }

    if outcome.is_ready() {
        Ok(())
    } else {
        Err(crate::exit::not_ready(format!("{runtime} failed to start")))
    }
}

/// `NO_COLOR` disables color whenever it is set, even to an empty value.
fn color_enabled(stdout_is_tty: bool, no_color_flag: bool, env: &dyn EnvSource) -> bool {
    stdout_is_tty && !no_color_flag && env.var("NO_COLOR").is_none()
}

fn say(ui_cfg: &UiConfig, line: &str) {
    if !ui_cfg.quiet {
        println!("{line}");
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn install_interrupt_handler() {
    let installed = ctrlc::set_handler(|| {
        crate::ui::eprintln_cancelled();
        std::process::exit(ExitCode::Cancelled.as_i32());
    })
    .context("failed to install Ctrl-C handler");
    if let Err(err) = installed {
        warn!("{err:#}");
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        other => Err(crate::exit::invalid_args(format!(
            "unsupported shell: {other} (expected bash|zsh|fish)"
        ))),
    }
}
