#![cfg(all(unix, feature = "cli"))]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};

use base64::{engine::general_purpose::STANDARD, Engine};

#[derive(Debug, Default)]
struct Recorded {
    commands: Vec<String>,
    writes: Vec<(u64, Vec<u8>)>,
}

/// Serve one connection the way the bootrom console does: a prompt for
/// every empty line, `ok` plus a sync marker for `write`, a bare marker
/// after each payload line and `ran <line>` for anything else.
fn spawn_bootrom() -> (u16, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let port = listener.local_addr().expect("listener has address").port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("shell should connect");
        let mut writer = stream.try_clone().expect("stream should clone");
        let mut recorded = Recorded::default();
        let mut awaiting_payload = None;

        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            let reply = if let Some(address) = awaiting_payload.take() {
                let data = STANDARD
                    .decode(line.as_bytes())
                    .expect("payload should be base64");
                recorded.writes.push((address, data));
                b"\x03".to_vec()
            } else if line.is_empty() {
                b"BOOTROM> \x03".to_vec()
            } else if line == "echo off" {
                recorded.commands.push(line);
                b"echo off\r\n".to_vec()
            } else if let Some(hex) = line.strip_prefix("write 0x") {
                let address = u64::from_str_radix(hex, 16).expect("address should be hex");
                awaiting_payload = Some(address);
                recorded.commands.push(line);
                b"ok\x03".to_vec()
            } else {
                let reply = format!("ran {line}\r\n\x03").into_bytes();
                recorded.commands.push(line);
                reply
            };
            if writer.write_all(&reply).is_err() {
                break;
            }
        }
        recorded
    });

    (port, handle)
}

fn run_shell(port: u16, input: &str, extra: &[&str]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bootshell"))
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(["--log-level", "error"])
        .args(extra)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("shell should start");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("input should be written");

    child.wait_with_output().expect("shell should exit")
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn load_file_at_uploads_in_64k_strides() {
    let (port, bootrom) = spawn_bootrom();
    let file = tempfile::NamedTempFile::new().expect("temp file");
    std::fs::write(file.path(), pattern(70_000)).expect("fixture should be written");

    let input = format!("load_file_at {} 0x1000\nexit\n", file.path().display());
    let output = run_shell(port, &input, &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let recorded = bootrom.join().expect("bootrom thread");
    assert_eq!(
        recorded.commands,
        vec!["echo off", "write 0x1000", "write 0x11000"]
    );
    assert_eq!(recorded.writes[0].1.len(), 65_536);
    assert_eq!(recorded.writes[1].1.len(), 4_464);
    let uploaded: Vec<u8> = recorded
        .writes
        .iter()
        .flat_map(|(_, data)| data.iter().copied())
        .collect();
    assert_eq!(uploaded, pattern(70_000));
}

#[test]
fn unknown_lines_are_run_remotely_and_echoed() {
    let (port, bootrom) = spawn_bootrom();

    let output = run_shell(port, "\npeek 0x10 4\n", &[]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome to Bootrom Shell"), "{stdout}");
    assert!(stdout.contains("ran peek 0x10 4"), "{stdout}");
    assert!(!stdout.contains('\x03'));

    let recorded = bootrom.join().expect("bootrom thread");
    assert_eq!(recorded.commands, vec!["echo off", "peek 0x10 4"]);
}

#[test]
fn malformed_command_sets_usage_status() {
    let (port, bootrom) = spawn_bootrom();

    let output = run_shell(port, "load_file_at only-a-path\n", &[]);
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: load_file_at"), "{stderr}");

    let recorded = bootrom.join().expect("bootrom thread");
    assert_eq!(recorded.commands, vec!["echo off"]);
}

#[test]
fn missing_elf_is_reported_and_shell_continues() {
    let (port, bootrom) = spawn_bootrom();

    let output = run_shell(port, "load_elf /nonexistent/app.elf\nversion\n", &[]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("could not open '/nonexistent/app.elf' as an ELF file"),
        "{stderr}"
    );

    let recorded = bootrom.join().expect("bootrom thread");
    assert_eq!(recorded.commands, vec!["echo off", "version"]);
}

#[test]
fn unreachable_remote_fails_fast() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        listener.local_addr().expect("listener has address").port()
    };

    let output = run_shell(port, "peek 0x10\n", &["--retries", "1"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not connect"), "{stderr}");
    assert!(stderr.contains("not connected"), "{stderr}");
}
