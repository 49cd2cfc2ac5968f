/// stlmesh core library - STL mesh loading
///
/// Reads binary and ASCII STL files into an owned triangle mesh, either as
/// per-triangle records (`Mesh`) or as flat normal/vertex buffers (`FlatMesh`).

pub mod error;
pub mod geometry;
pub mod stl;

// Re-export commonly used types
pub use error::{ErrorKind, ParseErrorKind, Result, StlError};
pub use geometry::{Bounds, FlatMesh, Mesh, Triangle};
pub use stl::{load, load_detected, load_flat, read_ascii, read_binary, StlFormat};
