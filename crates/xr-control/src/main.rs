//! XR driver control plane: command-line entry point.
//!
//! Reads and writes the driver's config file, sends control flags, reports
//! the driver's live state and license, and manages the driver install.
//! Every command prints one JSON [`CommandResult`] on stdout; logs go to
//! stderr.
//!
//! # Usage
//!
//! ```text
//! xr-control [OPTIONS] <COMMAND>
//!
//! Commands:
//!   config show | set [--mode M] [--joystick] [--field key=value]...
//!   flags     [--recenter] [--recalibrate] [--refresh-license]
//!             [--sbs-mode V] [--request-feature F]...
//!   state     current driver state (license only when stale)
//!   license   license summary
//!   driver    status | ready | install | uninstall | startup
//!   tutorials list | hide KEY | reset
//!   token     request EMAIL | verify TOKEN
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable           | Default                                   |
//! |--------------------|-------------------------------------------|
//! | `XR_CONFIG_FILE`   | `$XDG_CONFIG_HOME/xr_driver/config.ini`   |
//! | `XR_CONTROL_FILE`  | `/dev/shm/xr_driver_control`              |
//! | `XR_STATE_FILE`    | `/dev/shm/xr_driver_state`                |
//! | `XR_SETTINGS_FILE` | `$XDG_CONFIG_HOME/xr_control/settings.toml` |
//! | `XR_BIN_DIR`       | `~/.local/bin`                            |
//! | `XR_SETUP_SCRIPT`  | `~/.local/bin/xr_driver_setup`            |
//! | `XR_LOG_LEVEL`     | `RUST_LOG`, else `info`                   |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use xr_control::infrastructure::storage::paths::ServiceConfig;
use xr_control::infrastructure::ui_bridge::{self, AppState, CommandResult};
use xr_core::domain::control::{
    FLAG_RECALIBRATE, FLAG_RECENTER_SCREEN, FLAG_REFRESH_DEVICE_LICENSE, FLAG_REQUEST_FEATURES,
    FLAG_SBS_MODE,
};
use xr_core::{HeadsetMode, ViewModel};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// XR driver control plane.
#[derive(Debug, Parser)]
#[command(name = "xr-control", about = "Configure and control the XR headset driver", version)]
struct Cli {
    /// Driver config file.
    #[arg(long, env = "XR_CONFIG_FILE", global = true)]
    config_file: Option<PathBuf>,

    /// Control-flag channel the driver polls.
    #[arg(long, env = "XR_CONTROL_FILE", global = true)]
    control_file: Option<PathBuf>,

    /// State channel the driver publishes.
    #[arg(long, env = "XR_STATE_FILE", global = true)]
    state_file: Option<PathBuf>,

    /// This tool's preferences file.
    #[arg(long, env = "XR_SETTINGS_FILE", global = true)]
    settings_file: Option<PathBuf>,

    /// Directory with the driver's user binaries.
    #[arg(long, env = "XR_BIN_DIR", global = true)]
    bin_dir: Option<PathBuf>,

    /// Driver installer script.
    #[arg(long, env = "XR_SETUP_SCRIPT", global = true)]
    setup_script: Option<PathBuf>,

    /// Log filter (`error`, `warn`, `info`, `debug`, `trace` or a full
    /// `EnvFilter` directive).  Overrides `RUST_LOG`.
    #[arg(long, env = "XR_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read or update the driver config.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Send control flags to the driver.
    Flags(FlagArgs),
    /// Show the driver state.
    State,
    /// Show the license summary.
    License,
    /// Manage the driver installation.
    #[command(subcommand)]
    Driver(DriverCommand),
    /// Manage dismissed UI hints.
    #[command(subcommand)]
    Tutorials(TutorialsCommand),
    /// License token exchange.
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the config with its headset-mode view.
    Show,
    /// Change fields and/or the headset mode.
    Set {
        /// Headset mode: disabled, vr_lite, virtual_display or sideview.
        #[arg(long)]
        mode: Option<HeadsetMode>,
        /// Use joystick output in vr_lite mode.
        #[arg(long)]
        joystick: bool,
        /// Raw field assignment, e.g. `--field display_zoom=1.5`.
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct FlagArgs {
    #[arg(long)]
    recenter: bool,
    #[arg(long)]
    recalibrate: bool,
    #[arg(long)]
    refresh_license: bool,
    /// unset, enable or disable.
    #[arg(long)]
    sbs_mode: Option<String>,
    #[arg(long = "request-feature", value_name = "FEATURE")]
    request_features: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum DriverCommand {
    /// Is the driver service active?
    Status,
    /// Is the driver installed for this version and running?
    Ready,
    /// Install the driver unless it is current.
    Install,
    /// Remove the driver.
    Uninstall,
    /// Request supporter features, then install if needed.
    Startup,
}

#[derive(Debug, Subcommand)]
enum TutorialsCommand {
    List,
    Hide { key: String },
    Reset,
}

#[derive(Debug, Subcommand)]
enum TokenCommand {
    Request { email: String },
    Verify { token: String },
}

impl Cli {
    /// Applies path overrides on top of the environment defaults.
    fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        let mut config = ServiceConfig::from_env().context("could not resolve default paths")?;
        if let Some(path) = &self.config_file {
            config.channels.config_file = path.clone();
        }
        if let Some(path) = &self.control_file {
            config.channels.control_flags = path.clone();
        }
        if let Some(path) = &self.state_file {
            config.channels.driver_state = path.clone();
        }
        if let Some(path) = &self.settings_file {
            config.settings_file = path.clone();
        }
        if let Some(path) = &self.bin_dir {
            config.bin_dir = path.clone();
        }
        if let Some(path) = &self.setup_script {
            config.setup_script = path.clone();
        }
        Ok(config)
    }
}

impl FlagArgs {
    /// Builds the loosely-typed flag map; validation happens in the bridge.
    fn to_payload(&self) -> Value {
        let mut flags = Map::new();
        if self.recenter {
            flags.insert(FLAG_RECENTER_SCREEN.into(), Value::Bool(true));
        }
        if self.recalibrate {
            flags.insert(FLAG_RECALIBRATE.into(), Value::Bool(true));
        }
        if self.refresh_license {
            flags.insert(FLAG_REFRESH_DEVICE_LICENSE.into(), Value::Bool(true));
        }
        if let Some(mode) = &self.sbs_mode {
            flags.insert(FLAG_SBS_MODE.into(), Value::String(mode.clone()));
        }
        if !self.request_features.is_empty() {
            flags.insert(FLAG_REQUEST_FEATURES.into(), json!(self.request_features));
        }
        Value::Object(flags)
    }
}

// ── Command dispatch ──────────────────────────────────────────────────────────

/// Prints the result as JSON and turns a failed command into an error exit.
fn emit<T: Serialize>(result: CommandResult<T>) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(&result).context("could not render result")?;
    println!("{text}");
    if !result.success {
        bail!(result.error.unwrap_or_else(|| "command failed".to_string()));
    }
    Ok(())
}

async fn set_config(
    state: Arc<AppState>,
    mode: Option<HeadsetMode>,
    joystick: bool,
    fields: &[String],
) -> anyhow::Result<()> {
    let current = state.config_store.read();
    let mut config = current.config;
    for field in fields {
        if let Err(e) = config.apply_assignment(field) {
            bail!("invalid --field {field}: {e}");
        }
    }

    let view = match (mode, joystick) {
        (Some(headset_mode), is_joystick_mode) => Some(ViewModel { headset_mode, is_joystick_mode }),
        (None, true) => Some(ViewModel {
            headset_mode: current.ui_view.headset_mode,
            is_joystick_mode: true,
        }),
        (None, false) => None,
    };

    let mut payload = serde_json::to_value(&config).context("could not encode config")?;
    if let (Some(view), Value::Object(map)) = (view, &mut payload) {
        map.insert("ui_view".into(), serde_json::to_value(view)?);
    }
    debug!("submitting config payload {payload}");
    emit(ui_bridge::write_config(state, payload).await)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.service_config()?;
    let state = AppState::new(&config);

    match cli.command {
        Command::Config(ConfigCommand::Show) => emit(ui_bridge::retrieve_config(state).await),
        Command::Config(ConfigCommand::Set { mode, joystick, fields }) => {
            set_config(state, mode, joystick, &fields).await
        }
        Command::Flags(args) => {
            emit(ui_bridge::write_control_flags(state, args.to_payload()).await)
        }
        Command::State => emit(ui_bridge::retrieve_driver_state(state).await),
        Command::License => emit(ui_bridge::retrieve_license(state).await),
        Command::Driver(DriverCommand::Status) => emit(ui_bridge::is_driver_running(state).await),
        Command::Driver(DriverCommand::Ready) => emit(ui_bridge::is_driver_ready(state).await),
        Command::Driver(DriverCommand::Install) => emit(ui_bridge::install_driver(state).await),
        Command::Driver(DriverCommand::Uninstall) => {
            emit(ui_bridge::uninstall_driver(state).await)
        }
        Command::Driver(DriverCommand::Startup) => emit(ui_bridge::startup(state).await),
        Command::Tutorials(TutorialsCommand::List) => {
            emit(ui_bridge::retrieve_dont_show_again_keys(state).await)
        }
        Command::Tutorials(TutorialsCommand::Hide { key }) => {
            emit(ui_bridge::set_dont_show_again(state, key).await)
        }
        Command::Tutorials(TutorialsCommand::Reset) => {
            emit(ui_bridge::reset_dont_show_again(state).await)
        }
        Command::Token(TokenCommand::Request { email }) => {
            emit(ui_bridge::request_token(state, email).await)
        }
        Command::Token(TokenCommand::Verify { token }) => {
            emit(ui_bridge::verify_token(state, token).await)
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `--log-level` wins over `RUST_LOG`; both fall back to `info`.
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(cli).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_set_parses_mode_and_fields() {
        // Arrange / Act
        let cli = Cli::parse_from([
            "xr-control",
            "config",
            "set",
            "--mode",
            "vr_lite",
            "--joystick",
            "--field",
            "display_zoom=1.5",
        ]);

        // Assert
        match cli.command {
            Command::Config(ConfigCommand::Set { mode, joystick, fields }) => {
                assert_eq!(mode, Some(HeadsetMode::VrLite));
                assert!(joystick);
                assert_eq!(fields, vec!["display_zoom=1.5".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_mode_is_a_parse_error() {
        let result = Cli::try_parse_from(["xr-control", "config", "set", "--mode", "hologram"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_args_build_payload() {
        let cli = Cli::parse_from([
            "xr-control",
            "flags",
            "--recenter",
            "--sbs-mode",
            "enable",
            "--request-feature",
            "sbs",
        ]);
        let Command::Flags(args) = cli.command else {
            panic!("expected flags command");
        };

        assert_eq!(
            args.to_payload(),
            json!({ "recenter_screen": true, "sbs_mode": "enable", "request_features": ["sbs"] })
        );
    }

    #[test]
    fn test_path_flags_override_defaults() {
        let cli = Cli::parse_from([
            "xr-control",
            "--state-file",
            "/tmp/xr_state",
            "state",
        ]);
        if let Ok(config) = cli.service_config() {
            assert_eq!(config.channels.driver_state, PathBuf::from("/tmp/xr_state"));
        }
    }
}
