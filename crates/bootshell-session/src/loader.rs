use std::io::Write;
use std::path::Path;

use bootshell_transport::Link;
use bytes::Bytes;
use elf::abi::PT_LOAD;
use elf::endian::AnyEndian;
use elf::ElfBytes;
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::session::Session;
use crate::upload::UploadReport;

/// One program segment as it appears in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub p_type: u32,
    /// Physical load address.
    pub paddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    /// The `filesz` bytes stored in the file. Empty unless loadable.
    pub data: Bytes,
}

impl Segment {
    pub fn is_loadable(&self) -> bool {
        self.p_type == PT_LOAD
    }

    /// Address just past the file-backed bytes.
    pub fn end(&self) -> u64 {
        self.paddr.wrapping_add(self.filesz)
    }
}

/// An ELF executable reduced to its entry point and program segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfImage {
    pub entry: u64,
    /// Every program header, in file order.
    pub segments: Vec<Segment>,
}

impl ElfImage {
    /// Read and parse the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Self::parse(&data)?;
        info!(?path, entry = %format_args!("{:#x}", image.entry), "loaded ELF image");
        Ok(image)
    }

    /// Parse an in-memory ELF file of either class and byte order.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let file = ElfBytes::<AnyEndian>::minimal_parse(data)?;
        let mut segments = Vec::new();
        if let Some(table) = file.segments() {
            for phdr in table.iter() {
                // Non-loadable segments are skipped without touching their bytes.
                let data = if phdr.p_type == PT_LOAD {
                    Bytes::copy_from_slice(file.segment_data(&phdr)?)
                } else {
                    Bytes::new()
                };
                segments.push(Segment {
                    p_type: phdr.p_type,
                    paddr: phdr.p_paddr,
                    filesz: phdr.p_filesz,
                    memsz: phdr.p_memsz,
                    data,
                });
            }
        }
        debug!(segments = segments.len(), "parsed program headers");

        Ok(Self {
            entry: file.ehdr.e_entry,
            segments,
        })
    }

    /// The `PT_LOAD` segments, in file order.
    pub fn loadable(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|segment| segment.is_loadable())
    }
}

impl<L: Link, W: Write> Session<L, W> {
    /// Upload every loadable segment of `image` to its physical address.
    ///
    /// Only the file-backed bytes are sent; the remainder up to `memsz`
    /// is left as the remote finds it.
    pub fn upload_elf(&mut self, image: &ElfImage) -> Result<UploadReport> {
        self.ensure_connected()?;
        let mut report = UploadReport::default();
        for segment in image.loadable() {
            info!(
                "Loading seg: {:#x}:{:#x} ({} bytes)...",
                segment.paddr,
                segment.end(),
                segment.filesz
            );
            report += self.load_blob_at(&segment.data, segment.paddr)?;
        }
        Ok(report)
    }

    /// Upload the ELF file at `path` and start it at its entry point.
    pub fn boot_elf(&mut self, path: impl AsRef<Path>) -> Result<UploadReport> {
        let image = ElfImage::open(path)?;
        let report = self.upload_elf(&image)?;
        self.run_command(&format!("boot {:#x}", image.entry))?;
        Ok(report)
    }
}
