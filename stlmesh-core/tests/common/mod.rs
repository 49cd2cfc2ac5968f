//! Fixture writers for STL integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Normal followed by three vertices
pub type Facet = ([f32; 3], [[f32; 3]; 3]);

/// Deterministic facets with distinct, non-round coordinates
pub fn facets(count: usize) -> Vec<Facet> {
    (0..count)
        .map(|i| {
            let f = i as f32;
            (
                [0.0, -1.0, f * 0.5],
                [
                    [f, f * 1.25 - 3.0, -f / 7.0],
                    [f + 0.125, 2.5e-4 * f, 1e6 - f],
                    [-f, f * f, 0.1 * f],
                ],
            )
        })
        .collect()
}

pub fn encode_binary(facets: &[Facet], declared: u32) -> Vec<u8> {
    let mut data = b"solid binary-fixture".to_vec();
    data.resize(80, 0);
    data.extend_from_slice(&declared.to_le_bytes());
    for (normal, vertices) in facets {
        for value in normal.iter().chain(vertices.iter().flatten()) {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&0u16.to_le_bytes());
    }
    data
}

/// `{:?}` prints the shortest text that parses back to the same `f32`
pub fn encode_ascii(facets: &[Facet]) -> String {
    let mut text = String::from("solid fixture\n");
    for (normal, vertices) in facets {
        text.push_str(&format!(
            "  facet normal {:?} {:?} {:?}\n    outer loop\n",
            normal[0], normal[1], normal[2]
        ));
        for v in vertices {
            text.push_str(&format!("      vertex {:?} {:?} {:?}\n", v[0], v[1], v[2]));
        }
        text.push_str("    endloop\n  endfacet\n");
    }
    text.push_str("endsolid fixture\n");
    text
}

pub fn write(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
