use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use bootshell_session::{ElfImage, Session, SessionConfig, SessionError, UploadReport};
use bootshell_transport::{Connection, RetryConfig, Target};
use tracing::{debug, info};

use crate::exit::{io_error, session_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub const PROMPT: &str = "BOOTROM> ";

/// Local commands and their one-line help, in display order.
pub const LOCAL_COMMANDS: &[(&str, &str)] = &[
    ("connect", "Connect to the remote console and wait for its prompt"),
    ("disconnect", "Close the connection"),
    ("reconnect", "Disconnect, then connect again"),
    ("boot_elf <path>", "Upload a local ELF file and boot it"),
    ("load_elf <path>", "Upload the loadable segments of a local ELF file"),
    ("load_file_at <path> <addr>", "Upload a binary file to a hex address"),
    ("load_xflash <path>", "Upload a binary file to external flash"),
    ("boot_sec <entry>", "Boot an app on SEC (ends the console session)"),
    ("boot_smc <entry>", "Boot an app on SMC; entry 0 stops it"),
    ("help", "Show local and remote commands"),
    ("exit", "Disconnect and leave the shell"),
];

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Connect,
    Disconnect,
    Reconnect,
    BootElf(PathBuf),
    LoadElf(PathBuf),
    LoadFileAt { path: PathBuf, address: u64 },
    LoadXflash(PathBuf),
    BootSec(String),
    BootSmc(String),
    Help,
    Exit,
    /// Anything else, sent to the remote as is.
    Remote(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> CliResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "reconnect" => Self::Reconnect,
            "boot_elf" => Self::BootElf(required(word, rest, "<path>")?.into()),
            "load_elf" => Self::LoadElf(required(word, rest, "<path>")?.into()),
            "load_xflash" => Self::LoadXflash(required(word, rest, "<path>")?.into()),
            "boot_sec" => Self::BootSec(required(word, rest, "<entry>")?.to_string()),
            "boot_smc" => Self::BootSmc(required(word, rest, "<entry>")?.to_string()),
            "load_file_at" => {
                let mut args = rest.split_whitespace();
                match (args.next(), args.next(), args.next()) {
                    (Some(path), Some(address), None) => Self::LoadFileAt {
                        path: path.into(),
                        address: parse_address(address)?,
                    },
                    _ => return Err(CliError::usage("usage: load_file_at <path> <addr>")),
                }
            }
            "help" => Self::Help,
            "exit" | "quit" => Self::Exit,
            _ => Self::Remote(line.to_string()),
        };
        Ok(command)
    }
}

fn required<'a>(word: &str, rest: &'a str, what: &str) -> CliResult<&'a str> {
    if rest.is_empty() {
        Err(CliError::usage(format!("usage: {word} {what}")))
    } else {
        Ok(rest)
    }
}

/// Parse a hex address, with or without a `0x` prefix.
pub fn parse_address(input: &str) -> CliResult<u64> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    u64::from_str_radix(digits, 16)
        .map_err(|_| CliError::usage(format!("invalid hex address: {input}")))
}

pub fn local_help() -> String {
    let width = LOCAL_COMMANDS
        .iter()
        .map(|(usage, _)| usage.len())
        .max()
        .unwrap_or(0);
    let mut text = String::from("Local commands\n==============\n\n");
    for (usage, about) in LOCAL_COMMANDS {
        text.push_str(&format!("  {usage:<width$}  {about}\n"));
    }
    text
}

/// Whether the shell keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The interactive shell: one session, one remote target.
pub struct Shell {
    session: Session<Connection>,
    target: Target,
    retry: RetryConfig,
}

impl Shell {
    pub fn new(target: Target, retry: RetryConfig, config: SessionConfig) -> Self {
        Self {
            session: Session::new(Connection::new(), config),
            target,
            retry,
        }
    }

    pub fn connect(&mut self) -> CliResult<()> {
        info!(target_addr = %self.target, "waiting for prompt");
        self.session
            .connect(&self.target, &self.retry)
            .map_err(|err| session_error(&format!("could not connect to {}", self.target), err))
    }

    pub fn execute(&mut self, command: ShellCommand) -> CliResult<Flow> {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Connect => self.connect()?,
            ShellCommand::Disconnect => self.session.disconnect(),
            ShellCommand::Reconnect => {
                self.session.disconnect();
                self.connect()?;
            }
            ShellCommand::BootElf(path) => {
                let report = self
                    .session
                    .boot_elf(&path)
                    .map_err(|err| image_error(&path, "boot failed", err))?;
                log_report(&report);
                return Ok(Flow::Exit);
            }
            ShellCommand::LoadElf(path) => {
                let image = open_image(&path)?;
                let report = self
                    .session
                    .upload_elf(&image)
                    .map_err(|err| session_error("upload failed", err))?;
                log_report(&report);
            }
            ShellCommand::LoadFileAt { path, address } => {
                let report = self
                    .session
                    .load_file_at(&path, address)
                    .map_err(|err| session_error("upload failed", err))?;
                log_report(&report);
            }
            ShellCommand::LoadXflash(path) => {
                let report = self
                    .session
                    .load_xflash(&path)
                    .map_err(|err| session_error("upload failed", err))?;
                log_report(&report);
            }
            ShellCommand::BootSec(entry) => {
                self.session
                    .boot_sec(&entry)
                    .map_err(|err| session_error("boot_sec failed", err))?;
            }
            ShellCommand::BootSmc(entry) => {
                self.session
                    .boot_smc(&entry)
                    .map_err(|err| session_error("boot_smc failed", err))?;
            }
            ShellCommand::Help => {
                print!("{}", local_help());
                if self.session.is_connected() {
                    println!("\nRemote commands\n===============\n");
                    self.session
                        .remote_help()
                        .map_err(|err| session_error("help failed", err))?;
                }
            }
            ShellCommand::Exit => return Ok(Flow::Exit),
            ShellCommand::Remote(line) => {
                self.session
                    .run_command(&line)
                    .map_err(|err| session_error("command failed", err))?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Read commands from `input` until `exit` or end of input.
    ///
    /// Errors are reported and the loop goes on. Returns the exit code of
    /// the last command run.
    pub fn run(&mut self, input: impl BufRead) -> i32 {
        let mut status = SUCCESS;
        let mut lines = input.lines();
        loop {
            show_prompt(&mut io::stdout());

            let line = match lines.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    let err = io_error("could not read input", &err);
                    eprintln!("error: {err}");
                    status = err.code;
                    break;
                }
                None => {
                    println!();
                    break;
                }
            };

            match ShellCommand::parse(&line).and_then(|command| self.execute(command)) {
                Ok(Flow::Continue) => status = SUCCESS,
                Ok(Flow::Exit) => {
                    status = SUCCESS;
                    break;
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    status = err.code;
                }
            }
        }
        self.session.disconnect();
        status
    }
}

fn show_prompt(out: &mut impl Write) {
    if let Err(err) = write!(out, "{PROMPT}").and_then(|()| out.flush()) {
        debug!(error = %err, "could not show prompt");
    }
}

fn open_image(path: &Path) -> CliResult<ElfImage> {
    ElfImage::open(path).map_err(|err| image_error(path, "load failed", err))
}

/// Report an unreadable or malformed image by path; anything else is a
/// remote failure described by `context`.
fn image_error(path: &Path, context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Io { .. } | SessionError::Elf(_) => CliError::new(
            DATA_INVALID,
            format!("could not open '{}' as an ELF file: {err}", path.display()),
        ),
        other => session_error(context, other),
    }
}

fn log_report(report: &UploadReport) {
    info!(
        chunks = report.chunks,
        bytes = report.bytes,
        timeouts = report.timeouts,
        "upload complete"
    );
}
