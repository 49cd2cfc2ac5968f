/// ASCII STL reader
///
/// Reads whitespace-delimited tokens in one forward pass. The first line is
/// discarded unconditionally; lines starting with an unrecognized token, and
/// any `endsolid` line, are skipped rather than rejected, so concatenated
/// solids and stray comment lines still load. A malformed
/// `facet ... endfacet` block aborts the whole read.
use std::fs;
use std::path::Path;

use nom::{
    bytes::complete::{take_till, take_till1, take_while},
    character::complete::char,
    combinator::{all_consuming, opt},
    number::complete::float,
    sequence::{preceded, terminated},
    IResult,
};
use tracing::{debug, trace};

use crate::error::{ParseErrorKind, Result, StlError};
use crate::geometry::{Mesh, Triangle};

/// Triangle storage reserved before the first facet; doubled when full
pub const INITIAL_CAPACITY: usize = 1000;

const NORMAL_FIELDS: [&str; 3] = ["normal x", "normal y", "normal z"];
const VERTEX_FIELDS: [&str; 3] = ["vertex x", "vertex y", "vertex z"];

/// Read an ASCII STL file into triangle records
pub fn read_ascii<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading ASCII STL");

    let data = fs::read(path).map_err(|source| StlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_ascii(&data)?;

    debug!(path = %path.display(), triangles = mesh.len(), "ASCII STL loaded");
    Ok(mesh)
}

/// Parse ASCII STL text. Bytes outside keywords and numbers need not be UTF-8.
pub fn parse_ascii(input: &[u8]) -> Result<Mesh> {
    let mut lexer = Lexer::new(input);

    if !lexer.skip_line() {
        return Err(lexer.error(ParseErrorKind::MissingHeader));
    }

    let mut triangles: Vec<Triangle> = Vec::new();
    grow(&mut triangles, INITIAL_CAPACITY)?;

    while let Some(token) = lexer.next_token() {
        match token {
            b"facet" => {
                let triangle = parse_facet(&mut lexer)?;
                if triangles.len() == triangles.capacity() {
                    let additional = triangles.capacity();
                    grow(&mut triangles, additional)?;
                }
                triangles.push(triangle);
            }
            b"endsolid" => {
                lexer.skip_line();
            }
            other => {
                trace!(
                    line = lexer.line,
                    token = %String::from_utf8_lossy(other),
                    "skipping unrecognized line"
                );
                lexer.skip_line();
            }
        }
    }

    Ok(Mesh { triangles })
}

fn parse_facet(lexer: &mut Lexer<'_>) -> Result<Triangle> {
    lexer.expect("normal")?;
    let normal = lexer.vector3(NORMAL_FIELDS)?;
    lexer.skip_line();

    lexer.expect("outer")?;
    lexer.expect("loop")?;

    let mut vertices = [[0.0f32; 3]; 3];
    for vertex in &mut vertices {
        lexer.expect("vertex")?;
        *vertex = lexer.vector3(VERTEX_FIELDS)?;
        lexer.skip_line();
    }

    lexer.expect("endloop")?;
    lexer.expect("endfacet")?;

    Ok(Triangle::from_components(normal, vertices))
}

fn grow(triangles: &mut Vec<Triangle>, additional: usize) -> Result<()> {
    triangles
        .try_reserve_exact(additional)
        .map_err(|_| StlError::Allocation {
            triangles: triangles.len().saturating_add(additional),
        })
}

fn is_space(b: u8) -> bool {
    // C `isspace` also counts vertical tab
    b.is_ascii_whitespace() || b == 0x0b
}

fn whitespace(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while(is_space)(input)
}

fn token(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(whitespace, take_till1(is_space))(input)
}

fn rest_of_line(input: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_till(|b| b == b'\n'), opt(char('\n')))(input)
}

/// Token cursor that tracks the 1-based line of the last consumed input
struct Lexer<'a> {
    rest: &'a [u8],
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            rest: input,
            line: 1,
        }
    }

    fn advance(&mut self, rest: &'a [u8]) {
        let consumed = &self.rest[..self.rest.len() - rest.len()];
        self.line += consumed.iter().filter(|&&b| b == b'\n').count();
        self.rest = rest;
    }

    /// Next whitespace-delimited token, `None` at end of input
    fn next_token(&mut self) -> Option<&'a [u8]> {
        match token(self.rest) {
            Ok((rest, token)) => {
                self.advance(rest);
                Some(token)
            }
            Err(_) => {
                if let Ok((rest, _)) = whitespace(self.rest) {
                    self.advance(rest);
                }
                None
            }
        }
    }

    /// Discards through the next newline; `false` if already at end of input
    fn skip_line(&mut self) -> bool {
        if self.rest.is_empty() {
            return false;
        }
        if let Ok((rest, _)) = rest_of_line(self.rest) {
            self.advance(rest);
        }
        true
    }

    fn expect(&mut self, keyword: &'static str) -> Result<()> {
        match self.next_token() {
            Some(token) if token == keyword.as_bytes() => Ok(()),
            Some(token) => Err(self.error(ParseErrorKind::UnexpectedToken {
                expected: keyword,
                found: String::from_utf8_lossy(token).into_owned(),
            })),
            None => Err(self.error(ParseErrorKind::UnexpectedEof { expected: keyword })),
        }
    }

    fn number(&mut self, field: &'static str) -> Result<f32> {
        let token = self
            .next_token()
            .ok_or_else(|| self.error(ParseErrorKind::UnexpectedEof { expected: field }))?;

        if let Ok((_, value)) = all_consuming(float::<&[u8], nom::error::Error<&[u8]>>)(token) {
            return Ok(value);
        }

        // nom does not take signed or spelled-out infinities
        std::str::from_utf8(token)
            .ok()
            .and_then(|text| text.parse::<f32>().ok())
            .ok_or_else(|| {
                self.error(ParseErrorKind::InvalidNumber {
                    field,
                    found: String::from_utf8_lossy(token).into_owned(),
                })
            })
    }

    fn vector3(&mut self, fields: [&'static str; 3]) -> Result<[f32; 3]> {
        Ok([
            self.number(fields[0])?,
            self.number(fields[1])?,
            self.number(fields[2])?,
        ])
    }

    fn error(&self, kind: ParseErrorKind) -> StlError {
        StlError::Parse {
            line: self.line,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const FACET: &str = "  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
";

    fn parse(text: &str) -> Result<Mesh> {
        parse_ascii(text.as_bytes())
    }

    fn parse_kind(text: &str) -> (usize, ParseErrorKind) {
        match parse(text).unwrap_err() {
            StlError::Parse { line, kind } => (line, kind),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_single_facet() {
        let mesh = parse(&format!("solid cube\n{FACET}endsolid cube\n")).unwrap();
        assert_eq!(mesh.len(), 1);

        let triangle = mesh.triangles[0];
        assert_eq!(triangle.normal.as_slice(), &[0.0, 0.0, 1.0]);
        assert_eq!(triangle.vertices[1].coords.as_slice(), &[1.0, 0.0, 0.0]);
        assert_eq!(triangle.vertices[2].coords.as_slice(), &[0.0, 1.0, 0.0]);
        assert_eq!(triangle.attribute_byte_count, 0);
    }

    #[test]
    fn test_number_forms() {
        let text = "solid n
facet normal -1.5e-3 +2 .25
outer loop
vertex 1E2 -0 3.
vertex inf -infinity 1e+1
vertex 0.000001 -7 8
endloop
endfacet
endsolid n
";
        let mesh = parse(text).unwrap();
        let t = mesh.triangles[0];
        assert_eq!(t.normal.x, -1.5e-3);
        assert_eq!(t.normal.y, 2.0);
        assert_eq!(t.normal.z, 0.25);
        assert_eq!(t.vertices[0].x, 100.0);
        assert_eq!(t.vertices[0].y.to_bits(), (-0.0f32).to_bits());
        assert_eq!(t.vertices[1].x, f32::INFINITY);
        assert_eq!(t.vertices[1].y, f32::NEG_INFINITY);
        assert_eq!(t.vertices[1].z, 10.0);
        assert_eq!(t.vertices[2].x, 0.000001);
    }

    #[test]
    fn test_free_form_whitespace() {
        let text = "solid\r\nfacet\tnormal 0 0 1\r\n outer   loop vertex 1 2 3\r\n\
                    vertex 4 5 6\r\nvertex 7 8 9\r\n\r\n endloop endfacet\r\nendsolid\r\n";
        let mesh = parse(text).unwrap();
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh.triangles[0].vertices[2].coords.as_slice(), &[7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_empty_solid_and_missing_header() {
        assert!(parse("solid empty\nendsolid empty\n").unwrap().is_empty());
        assert!(parse("solid").unwrap().is_empty());

        let (line, kind) = parse_kind("");
        assert_eq!(line, 1);
        assert_eq!(kind, ParseErrorKind::MissingHeader);
    }

    #[test]
    fn test_unknown_lines_and_repeated_endsolid_are_skipped() {
        let text = format!(
            "solid a\n{FACET}; exported by some tool\nendsolid a\nsolid b\n{FACET}color 1 0 0\nendsolid b\nendsolid\n"
        );
        let mesh = parse(&text).unwrap();
        assert_eq!(mesh.len(), 2);
    }

    #[test]
    fn test_missing_normal_keyword() {
        let (line, kind) = parse_kind("solid x\nfacet 0 0 1\n");
        assert_eq!(line, 2);
        assert_eq!(
            kind,
            ParseErrorKind::UnexpectedToken {
                expected: "normal",
                found: "0".to_string()
            }
        );
    }

    #[test]
    fn test_bad_normal_component() {
        let (_, kind) = parse_kind("solid x\nfacet normal 0 zero 1\n");
        assert_eq!(
            kind,
            ParseErrorKind::InvalidNumber {
                field: "normal y",
                found: "zero".to_string()
            }
        );
    }

    #[test]
    fn test_missing_outer_loop() {
        let (_, kind) = parse_kind("solid x\nfacet normal 0 0 1\nloop\n");
        assert_eq!(
            kind,
            ParseErrorKind::UnexpectedToken {
                expected: "outer",
                found: "loop".to_string()
            }
        );

        let (_, kind) = parse_kind("solid x\nfacet normal 0 0 1\nouter\nvertex 0 0 0\n");
        assert_eq!(
            kind,
            ParseErrorKind::UnexpectedToken {
                expected: "loop",
                found: "vertex".to_string()
            }
        );
    }

    #[test]
    fn test_too_few_vertices() {
        let text = "solid x
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
endloop
endfacet
";
        let (line, kind) = parse_kind(text);
        assert_eq!(line, 6);
        assert_eq!(
            kind,
            ParseErrorKind::UnexpectedToken {
                expected: "vertex",
                found: "endloop".to_string()
            }
        );
    }

    #[test]
    fn test_truncated_vertex() {
        let (_, kind) = parse_kind("solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0");
        assert_eq!(kind, ParseErrorKind::UnexpectedEof { expected: "vertex z" });
    }

    #[test]
    fn test_missing_endloop_discards_everything() {
        let text = format!(
            "solid x\n{FACET}facet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendfacet\nendsolid x\n"
        );
        let err = parse(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(
            err,
            StlError::Parse {
                line: 14,
                kind: ParseErrorKind::UnexpectedToken {
                    expected: "endloop",
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_missing_endfacet_at_eof() {
        let (_, kind) = parse_kind(
            "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\n",
        );
        assert_eq!(kind, ParseErrorKind::UnexpectedEof { expected: "endfacet" });
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        // Every line of an uppercase block is an unknown line
        let text = format!("solid x\n{}endsolid x\n", FACET.to_uppercase());
        assert!(parse(&text).unwrap().is_empty());
    }

    #[test]
    fn test_growth_past_initial_capacity() {
        let count = INITIAL_CAPACITY * 2 + 1;
        let mut text = String::from("solid big\n");
        for i in 0..count {
            text.push_str(&format!(
                "facet normal 0 0 1\nouter loop\nvertex {i} 0 0\nvertex 0 {i} 0\nvertex 0 0 {i}\nendloop\nendfacet\n"
            ));
        }
        text.push_str("endsolid big\n");

        let mesh = parse(&text).unwrap();
        assert_eq!(mesh.len(), count);
        for (i, triangle) in mesh.iter().enumerate() {
            assert_eq!(triangle.vertices[0].x, i as f32);
            assert_eq!(triangle.vertices[1].y, i as f32);
            assert_eq!(triangle.vertices[2].z, i as f32);
        }
    }
}
