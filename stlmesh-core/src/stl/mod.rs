/// STL file loading for binary and ASCII formats
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Result, StlError};
use crate::geometry::{FlatMesh, Mesh};

pub mod ascii;
pub mod binary;

pub use ascii::{parse_ascii, read_ascii, INITIAL_CAPACITY};
pub use binary::{expected_len, parse_binary, read_binary, read_binary_from, HEADER_LEN, RECORD_LEN};

/// STL encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    Binary,
    Ascii,
}

impl StlFormat {
    /// Guess the encoding of a whole file.
    ///
    /// Binary headers are free-form and often start with `solid` too, so a
    /// size that holds the declared triangle count wins over the prefix.
    /// Extra bytes after the records are allowed unless the body reads as
    /// ASCII STL text.
    pub fn detect(data: &[u8]) -> Self {
        if let Some(declared) = binary::declared_count(data) {
            let len = data.len() as u64;
            let expected = expected_len(declared);
            let body = &data[HEADER_LEN + binary::COUNT_LEN..];
            if len == expected || (len > expected && !looks_like_text(body)) {
                return StlFormat::Binary;
            }
        }

        let start = data
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(data.len());
        if data[start..].starts_with(b"solid") {
            StlFormat::Ascii
        } else {
            StlFormat::Binary
        }
    }
}

/// Printable ASCII with at least one facet-level keyword
fn looks_like_text(body: &[u8]) -> bool {
    let contains = |keyword: &[u8]| body.windows(keyword.len()).any(|w| w == keyword);

    body.iter().all(|&b| b != 0 && b.is_ascii())
        && (contains(b"facet") || contains(b"endsolid"))
}

impl fmt::Display for StlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StlFormat::Binary => f.write_str("binary"),
            StlFormat::Ascii => f.write_str("ascii"),
        }
    }
}

impl FromStr for StlFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(StlFormat::Binary),
            "ascii" | "text" => Ok(StlFormat::Ascii),
            other => Err(format!("unknown STL format '{}' (expected binary or ascii)", other)),
        }
    }
}

/// Load a mesh as triangle records. `None` detects the format from the file contents.
pub fn load<P: AsRef<Path>>(path: P, format: Option<StlFormat>) -> Result<Mesh> {
    load_detected(path, format).map(|(_, mesh)| mesh)
}

/// Like [`load`], also returning the format that was used
pub fn load_detected<P: AsRef<Path>>(
    path: P,
    format: Option<StlFormat>,
) -> Result<(StlFormat, Mesh)> {
    let path = path.as_ref();
    match format {
        Some(StlFormat::Binary) => Ok((StlFormat::Binary, read_binary(path)?.into())),
        Some(StlFormat::Ascii) => Ok((StlFormat::Ascii, read_ascii(path)?)),
        None => {
            let (format, data) = read_detect(path)?;
            let mesh: Mesh = match format {
                StlFormat::Binary => parse_binary(&data)?.into(),
                StlFormat::Ascii => parse_ascii(&data)?,
            };
            Ok((format, mesh))
        }
    }
}

/// Load a mesh as flat normal/vertex buffers. `None` detects the format.
pub fn load_flat<P: AsRef<Path>>(path: P, format: Option<StlFormat>) -> Result<FlatMesh> {
    let path = path.as_ref();
    match format {
        Some(StlFormat::Binary) => read_binary(path),
        Some(StlFormat::Ascii) => read_ascii(path).map(FlatMesh::from),
        None => {
            let (format, data) = read_detect(path)?;
            match format {
                StlFormat::Binary => parse_binary(&data),
                StlFormat::Ascii => parse_ascii(&data).map(FlatMesh::from),
            }
        }
    }
}

fn read_detect(path: &Path) -> Result<(StlFormat, Vec<u8>)> {
    let data = fs::read(path).map_err(|source| StlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = StlFormat::detect(&data);
    debug!(path = %path.display(), %format, bytes = data.len(), "detected STL format");

    Ok((format, data))
}
