/// Binary STL reader: an 80-byte header, a little-endian `u32` triangle
/// count `N`, then exactly `N` records of 50 bytes.
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use nom::{
    number::complete::{le_f32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};
use tracing::debug;

use crate::error::{Result, Section, StlError};
use crate::geometry::FlatMesh;

/// Size of the free-form header
pub const HEADER_LEN: usize = 80;

/// Size of one facet record
pub const RECORD_LEN: usize = 50;

pub(crate) const COUNT_LEN: usize = 4;

/// File size implied by a declared triangle count
pub fn expected_len(declared: u32) -> u64 {
    (HEADER_LEN + COUNT_LEN) as u64 + RECORD_LEN as u64 * u64::from(declared)
}

/// Read a binary STL file into the flat buffer view
pub fn read_binary<P: AsRef<Path>>(path: P) -> Result<FlatMesh> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading binary STL");

    let io_error = |source| StlError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let metadata = file.metadata().map_err(io_error)?;
    // FIFOs and device files report a length of 0
    let available = metadata.is_file().then(|| metadata.len());

    let mesh = decode(BufReader::new(file), available).map_err(|e| e.with_path(path))?;

    debug!(path = %path.display(), triangles = mesh.len(), "binary STL loaded");
    Ok(mesh)
}

/// Decode binary STL from any byte source
pub fn read_binary_from<R: Read>(reader: R) -> Result<FlatMesh> {
    decode(reader, None)
}

/// Decode binary STL held in memory
pub fn parse_binary(data: &[u8]) -> Result<FlatMesh> {
    decode(data, Some(data.len() as u64))
}

/// Reads the header and records; `available` is the total input size when known
fn decode<R: Read>(mut reader: R, available: Option<u64>) -> Result<FlatMesh> {
    let mut header = [0u8; HEADER_LEN];
    read_section(&mut reader, &mut header, Section::Header)?;

    let mut count = [0u8; COUNT_LEN];
    read_section(&mut reader, &mut count, Section::TriangleCount)?;
    let declared = u32::from_le_bytes(count);

    if let Some(available) = available {
        let expected = expected_len(declared);
        if available < expected {
            let complete =
                available.saturating_sub((HEADER_LEN + COUNT_LEN) as u64) / RECORD_LEN as u64;
            return Err(StlError::Truncated {
                section: Section::Record {
                    index: complete as u32,
                    declared,
                },
            });
        }
        if available > expected {
            debug!(
                trailing = available - expected,
                "ignoring bytes after the declared records"
            );
        }
    }

    let mut mesh = FlatMesh::new();
    reserve(&mut mesh, declared as usize)?;

    let mut buffer = [0u8; RECORD_LEN];
    for index in 0..declared {
        let section = Section::Record { index, declared };
        read_section(&mut reader, &mut buffer, section)?;

        let (_, (normal, vertices, attributes)) =
            record(&buffer).map_err(|_| StlError::Truncated { section })?;

        mesh.normals.extend_from_slice(&normal);
        for vertex in &vertices {
            mesh.vertices.extend_from_slice(vertex);
        }
        mesh.attributes.push(attributes);
    }

    Ok(mesh)
}

fn read_section<R: Read>(reader: &mut R, buf: &mut [u8], section: Section) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => StlError::Truncated { section },
        _ => StlError::Read(e),
    })
}

fn reserve(mesh: &mut FlatMesh, triangles: usize) -> Result<()> {
    let failed = |_| StlError::Allocation { triangles };

    mesh.normals
        .try_reserve_exact(triangles.saturating_mul(3))
        .map_err(failed)?;
    mesh.vertices
        .try_reserve_exact(triangles.saturating_mul(9))
        .map_err(failed)?;
    mesh.attributes.try_reserve_exact(triangles).map_err(failed)
}

fn vector3(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

fn record(input: &[u8]) -> IResult<&[u8], ([f32; 3], [[f32; 3]; 3], u16)> {
    let (input, normal) = vector3(input)?;
    let (input, v1) = vector3(input)?;
    let (input, v2) = vector3(input)?;
    let (input, v3) = vector3(input)?;
    let (input, attributes) = le_u16(input)?;

    Ok((input, (normal, [v1, v2, v3], attributes)))
}

/// Triangle count from the fixed header position, if the input is long enough
pub(crate) fn declared_count(data: &[u8]) -> Option<u32> {
    let tail = data.get(HEADER_LEN..)?;
    le_u32::<_, nom::error::Error<&[u8]>>(tail)
        .ok()
        .map(|(_, count)| count)
}
