//! In-memory bootrom used by the session tests.

use std::collections::HashSet;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bootshell_transport::{Link, TransportError};
use bytes::{Bytes, BytesMut};

use crate::config::SessionConfig;
use crate::session::Session;

pub(crate) const PROMPT: &[u8] = b"BOOTROM> \x03";

/// Answers the bootrom console protocol from memory.
///
/// Output is queued in `pending` and only becomes readable through
/// `poll`/`recv`, so an unanswered request shows up as an immediate poll
/// timeout.
#[derive(Default)]
pub(crate) struct FakeBootrom {
    pub connected: bool,
    pending: BytesMut,
    line: Vec<u8>,
    awaiting_payload: Option<u64>,
    /// Command lines in arrival order (base64 payloads excluded).
    pub commands: Vec<String>,
    /// Decoded uploads as (address, bytes).
    pub writes: Vec<(u64, Vec<u8>)>,
    /// Length of each base64 payload line.
    pub encoded_lens: Vec<usize>,
    pub pings: usize,
    /// Number of pings to ignore before presenting the prompt.
    pub ignore_pings: usize,
    /// `write` commands (by index) that get no reply.
    pub silent_acks: HashSet<usize>,
    /// Payloads (by index) that get no sync marker.
    pub silent_syncs: HashSet<usize>,
    /// Close the stream when a command starting with this arrives.
    pub hang_up_on: Option<String>,
}

impl FakeBootrom {
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// Addresses of every `write` command received.
    pub fn write_addresses(&self) -> Vec<u64> {
        self.commands
            .iter()
            .filter_map(|line| line.strip_prefix("write 0x"))
            .map(|hex| u64::from_str_radix(hex, 16).unwrap())
            .collect()
    }

    fn handle_line(&mut self, line: String) {
        if let Some(address) = self.awaiting_payload.take() {
            let index = self.writes.len();
            self.encoded_lens.push(line.len());
            let data = BASE64.decode(line.as_bytes()).expect("payload should be base64");
            self.writes.push((address, data));
            if !self.silent_syncs.contains(&index) {
                self.pending.extend_from_slice(b"\x03");
            }
            return;
        }

        if line.is_empty() {
            self.pings += 1;
            if self.pings > self.ignore_pings {
                self.pending.extend_from_slice(PROMPT);
            }
            return;
        }

        if let Some(prefix) = &self.hang_up_on {
            if line.starts_with(prefix.as_str()) {
                self.commands.push(line);
                self.connected = false;
                self.pending.clear();
                return;
            }
        }

        if line == "echo off" {
            self.pending.extend_from_slice(b"echo off\r\n");
        } else if let Some(hex) = line.strip_prefix("write 0x") {
            let address = u64::from_str_radix(hex, 16).expect("write address should be hex");
            let index = self.write_addresses().len();
            self.awaiting_payload = Some(address);
            if !self.silent_acks.contains(&index) {
                self.pending.extend_from_slice(b"ok\x03");
            }
        } else {
            self.pending
                .extend_from_slice(format!("ran {line}\r\n\x03").as_bytes());
        }
        self.commands.push(line);
    }
}

impl Link for FakeBootrom {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, data: &[u8]) -> bootshell_transport::Result<usize> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        for &byte in data {
            if byte == b'\n' {
                let line = String::from_utf8(std::mem::take(&mut self.line)).unwrap();
                self.handle_line(line);
            } else {
                self.line.push(byte);
            }
        }
        Ok(data.len())
    }

    fn recv(&mut self, max_size: usize) -> bootshell_transport::Result<Bytes> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        let n = max_size.min(self.pending.len());
        let data = self.pending.split_to(n).freeze();
        if data.is_empty() {
            self.connected = false;
        }
        Ok(data)
    }

    fn poll(&mut self, _timeout: Duration) -> bool {
        self.connected && !self.pending.is_empty()
    }
}

/// A session over a connected fake, echoing into a buffer.
pub(crate) fn session(remote: FakeBootrom) -> Session<FakeBootrom, Vec<u8>> {
    session_with(remote, SessionConfig::default())
}

pub(crate) fn session_with(
    remote: FakeBootrom,
    config: SessionConfig,
) -> Session<FakeBootrom, Vec<u8>> {
    Session::with_echo(remote, Vec::new(), config)
}

/// Build a little-endian ELF64 executable with one program header per
/// `(p_type, paddr, data)` entry. Each segment's memory size exceeds its
/// file size by 16 bytes.
pub(crate) fn build_elf(entry: u64, segments: &[(u32, u64, &[u8])]) -> Vec<u8> {
    const EHDR_SIZE: usize = 64;
    const PHDR_SIZE: usize = 56;

    let mut image = Vec::new();
    image.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    image.extend_from_slice(&[0; 8]);
    image.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    image.extend_from_slice(&0xf3u16.to_le_bytes()); // EM_RISCV
    image.extend_from_slice(&1u32.to_le_bytes());
    image.extend_from_slice(&entry.to_le_bytes());
    image.extend_from_slice(&(EHDR_SIZE as u64).to_le_bytes());
    image.extend_from_slice(&0u64.to_le_bytes());
    image.extend_from_slice(&0u32.to_le_bytes());
    image.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
    image.extend_from_slice(&(PHDR_SIZE as u16).to_le_bytes());
    image.extend_from_slice(&(segments.len() as u16).to_le_bytes());
    image.extend_from_slice(&64u16.to_le_bytes());
    image.extend_from_slice(&0u16.to_le_bytes());
    image.extend_from_slice(&0u16.to_le_bytes());
    assert_eq!(image.len(), EHDR_SIZE);

    let mut offset = EHDR_SIZE + PHDR_SIZE * segments.len();
    for (p_type, paddr, data) in segments {
        image.extend_from_slice(&p_type.to_le_bytes());
        image.extend_from_slice(&5u32.to_le_bytes()); // R+X
        image.extend_from_slice(&(offset as u64).to_le_bytes());
        image.extend_from_slice(&paddr.to_le_bytes());
        image.extend_from_slice(&paddr.to_le_bytes());
        image.extend_from_slice(&(data.len() as u64).to_le_bytes());
        image.extend_from_slice(&(data.len() as u64 + 16).to_le_bytes());
        image.extend_from_slice(&0x1000u64.to_le_bytes());
        offset += data.len();
    }
    for (_, _, data) in segments {
        image.extend_from_slice(data);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_bootrom_round_trips_a_write() {
        let mut remote = FakeBootrom::connected();
        remote.send(b"write 0x10\n").unwrap();
        assert!(remote.poll(Duration::ZERO));
        assert_eq!(remote.recv(16).unwrap().as_ref(), b"ok\x03");

        remote.send(b"aGk=\n").unwrap();
        assert_eq!(remote.writes, vec![(0x10, b"hi".to_vec())]);
        assert_eq!(remote.recv(16).unwrap().as_ref(), b"\x03");
        assert!(!remote.poll(Duration::ZERO));
    }
}
