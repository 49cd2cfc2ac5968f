/// Terminal summaries of loaded STL meshes
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use nalgebra::Point3;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use stlmesh_core::{stl, Mesh, StlError, StlFormat};
use tracing::warn;

/// Outcome of loading one file
pub struct Summary {
    pub path: PathBuf,
    pub outcome: Result<(StlFormat, Mesh), StlError>,
}

impl Summary {
    pub fn new(path: PathBuf, outcome: Result<(StlFormat, Mesh), StlError>) -> Self {
        Self { path, outcome }
    }

    /// Load a file; a failure is kept in the summary rather than returned
    pub fn load(path: &Path, format: Option<StlFormat>) -> Self {
        let outcome = stl::load_detected(path, format);
        if let Err(err) = &outcome {
            warn!(path = %path.display(), error = %err, "failed to load mesh, treating it as empty");
        }
        Self::new(path.to_path_buf(), outcome)
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        queue!(
            writer,
            SetForegroundColor(Color::Cyan),
            Print(self.path.display()),
            ResetColor
        )?;

        match &self.outcome {
            Ok((format, mesh)) => {
                queue!(
                    writer,
                    Print(format!("  {}  {} triangles", format, mesh.len()))
                )?;

                let degenerate = mesh
                    .iter()
                    .filter(|t| t.computed_normal().is_none())
                    .count();
                if degenerate > 0 {
                    queue!(
                        writer,
                        SetForegroundColor(Color::Yellow),
                        Print(format!("  ({} degenerate)", degenerate)),
                        ResetColor
                    )?;
                }
                queue!(writer, Print('\n'))?;

                if let Some(bounds) = mesh.bounds() {
                    let size = bounds.size();
                    queue!(
                        writer,
                        SetForegroundColor(Color::DarkGrey),
                        Print(format!(
                            "  min {}  max {}  size ({:.3}, {:.3}, {:.3})\n",
                            point(&bounds.min),
                            point(&bounds.max),
                            size.x,
                            size.y,
                            size.z
                        )),
                        ResetColor
                    )?;
                }
            }
            Err(err) => {
                queue!(
                    writer,
                    SetForegroundColor(Color::Red),
                    Print(format!("  error: {}\n", err)),
                    ResetColor
                )?;
            }
        }

        writer.flush()
    }
}

fn point(p: &Point3<f32>) -> String {
    format!("({:.3}, {:.3}, {:.3})", p.x, p.y, p.z)
}
