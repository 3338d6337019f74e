//! luahost - run Lua chat filters and tick hooks outside the viewer
//!
//! Starts one engine per invocation, runs the requested command, then
//! prints every queued bridge notice to stderr as `[LuaHost] <text>`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use luahost_core::config::{Config, LogFormat};
use luahost_core::logging::init_logging;
use luahost_core::{CallStatus, ChatRecord, LuaHost, NotificationChannel};
use luahost_llsd::Value;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "luahost", version)]
#[command(about = "Embedded Lua bridge for chat filters and tick hooks")]
struct Cli {
    /// Path to a luahost.toml configuration file
    #[arg(long, global = true, env = "LUAHOST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG still wins
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format (pretty or json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a Lua chunk
    Eval {
        /// Lua source code
        code: String,
    },

    /// Load a script and drive its `advance` hook
    Run {
        /// Lua script to load
        script: PathBuf,

        /// Number of ticks to run after loading
        #[arg(long, default_value_t = 1)]
        ticks: u64,
    },

    /// Load a script and pass a chat record through its `filter_chat` hook
    Filter {
        /// Lua script defining `filter_chat`
        script: PathBuf,

        /// JSON file holding the incoming chat record
        #[arg(long)]
        chat: Option<PathBuf>,

        /// JSON value passed as the hook's second argument
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(level) = &cli.log_level {
        config.general.log_level.clone_from(level);
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    init_logging(&config.log_config()).context("initializing logging")?;

    let channel = NotificationChannel::new();
    let mut host = LuaHost::from_config(&config, channel.sink());
    let outcome = host
        .start()
        .context("starting Lua host")
        .and_then(|()| run_command(&host, &cli.command));

    print_notices(&channel);
    host.stop();
    outcome
}

fn run_command(host: &LuaHost, command: &Command) -> Result<()> {
    match command {
        Command::Eval { code } => {
            let status = host.eval(code);
            tracing::debug!(?status, "eval finished");
        }
        Command::Run { script, ticks } => {
            if load_script(host, script)?.is_completed() {
                for _ in 0..*ticks {
                    host.tick();
                }
            }
        }
        Command::Filter { script, chat, args } => {
            load_script(host, script)?;
            let incoming = match chat {
                Some(path) => read_chat(path)?,
                None => ChatRecord::default(),
            };
            let args: serde_json::Value =
                serde_json::from_str(args).context("parsing --args as JSON")?;
            let filtered = host.filter_chat(&incoming, &Value::from_json(&args));
            let json = serde_json::to_string_pretty(&filtered.to_value().to_json())?;
            println!("{json}");
        }
    }
    Ok(())
}

fn load_script(host: &LuaHost, path: &Path) -> Result<CallStatus> {
    host.eval_file(path)
        .with_context(|| format!("loading script {}", path.display()))
}

fn read_chat(path: &Path) -> Result<ChatRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading chat record {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing chat record {}", path.display()))?;
    Ok(ChatRecord::from_value(&Value::from_json(&json)))
}

fn print_notices(channel: &NotificationChannel) {
    for notice in channel.drain() {
        eprintln!("[{}] {}", notice.chat.from_name, notice.chat.text);
    }
}
