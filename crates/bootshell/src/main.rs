mod exit;
mod logging;
mod shell;

use std::path::PathBuf;
use std::time::Duration;

use bootshell_session::{SessionConfig, TimeoutPolicy};
use bootshell_transport::{RetryConfig, Target};
use clap::Parser;

use crate::exit::{CliError, CliResult, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "bootshell", version, about = "Interactive bootrom control shell")]
struct Cli {
    /// Host of the remote console bridge.
    #[arg(long, env = "BOOTSHELL_HOST", default_value = "localhost")]
    host: String,

    /// TCP port of the remote console bridge.
    #[arg(long, env = "BOOTSHELL_PORT", default_value_t = 31415)]
    port: u16,

    /// Use a local character device (e.g. /tmp/uart) instead of TCP.
    #[arg(long, env = "BOOTSHELL_DEVICE", value_name = "PATH")]
    device: Option<PathBuf>,

    /// Connection attempts, one per second, before giving up.
    #[arg(long, env = "BOOTSHELL_RETRIES", default_value_t = 60)]
    retries: u32,

    /// How long a command may stay silent (e.g. 100s, 500ms).
    #[arg(
        long,
        env = "BOOTSHELL_COMMAND_TIMEOUT",
        value_name = "DURATION",
        default_value = "100s",
        value_parser = parse_duration
    )]
    command_timeout: Duration,

    /// Prompt pings sent after connecting, one per second.
    #[arg(long, env = "BOOTSHELL_PROMPT_ATTEMPTS", default_value_t = 180)]
    prompt_attempts: u32,

    /// Keep uploading when a chunk is not acknowledged in time.
    #[arg(long, env = "BOOTSHELL_CONTINUE_ON_TIMEOUT")]
    continue_on_timeout: bool,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

impl Cli {
    fn target(&self) -> Target {
        match &self.device {
            Some(path) => Target::Device(path.clone()),
            None => Target::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }

    fn retry(&self) -> RetryConfig {
        RetryConfig {
            attempts: self.retries,
            ..RetryConfig::default()
        }
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            command_timeout: self.command_timeout,
            response_timeout: self.command_timeout,
            prompt_attempts: self.prompt_attempts,
            timeout_policy: if self.continue_on_timeout {
                TimeoutPolicy::Continue
            } else {
                TimeoutPolicy::Abort
            },
            ..SessionConfig::default()
        }
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    println!("Welcome to Bootrom Shell");
    let mut shell = Shell::new(cli.target(), cli.retry(), cli.session_config());
    if let Err(err) = shell.connect() {
        eprintln!("error: {err}");
    }

    let code = shell.run(std::io::stdin().lock());
    std::process::exit(code);
}
