//! Where template bytes come from.
//!
//! A [`ByteSource`] hides whether the template is a file on disk, a base64
//! text blob next to the program, or bytes already in memory. Every
//! [`ByteSource::load`] returns a fresh, independent copy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, RxOrderError};

/// Environment flag selecting the packaged-executable base directory.
pub const PACKAGED_ENV: &str = "RXORDER_PACKAGED";

/// Base directory relative template paths resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseDir {
    /// Directory holding the running executable (installed/packaged build).
    Executable(PathBuf),
    /// The crate source directory (development checkout).
    Source(PathBuf),
}

impl BaseDir {
    /// Pick the base directory from [`PACKAGED_ENV`].
    pub fn detect() -> Self {
        let packaged = std::env::var(PACKAGED_ENV)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        if packaged {
            if let Some(dir) = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
            {
                return Self::Executable(dir);
            }
            log::warn!("{PACKAGED_ENV} is set but the executable directory is unknown");
        }
        Self::Source(PathBuf::from(env!("CARGO_MANIFEST_DIR")))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Executable(p) | Self::Source(p) => p,
        }
    }

    /// Resolve `file` against this directory; absolute paths pass through.
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.path().join(file)
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// A template byte source.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// Spreadsheet file on disk.
    File(PathBuf),
    /// Text file holding the spreadsheet as base64.
    Embedded(PathBuf),
    /// Bytes already in memory (tests, WebAssembly).
    Memory(Arc<[u8]>),
}

impl ByteSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn embedded(path: impl Into<PathBuf>) -> Self {
        Self::Embedded(path.into())
    }

    pub fn memory(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory(bytes.into())
    }

    /// Read (and decode, for blobs) a fresh copy of the template.
    pub fn load(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => read_existing(path),
            Self::Embedded(path) => {
                let text = read_existing(path)?;
                decode_blob(&text)
            }
            Self::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Embedded(path) => format!("{} (embedded)", path.display()),
            Self::Memory(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

fn read_existing(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RxOrderError::TemplateNotFound(path.to_path_buf())
        } else {
            RxOrderError::Io(e)
        }
    })
}

/// Decode a base64 template blob. Whitespace and line breaks are ignored.
pub fn decode_blob(text: &[u8]) -> Result<Vec<u8>> {
    let compact: Vec<u8> = text
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

/// Encode template bytes as a base64 blob, wrapped at 76 columns.
pub fn encode_blob(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 76 + 1);
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(76));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out
}
