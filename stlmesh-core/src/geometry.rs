/// Triangle mesh data model shared by the STL readers
use nalgebra::{Point3, Vector3};

/// One facet: a normal and three vertices, copied as-is from the file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub normal: Vector3<f32>,
    pub vertices: [Point3<f32>; 3],
    /// Binary-only trailer, conventionally zero
    pub attribute_byte_count: u16,
}

impl Triangle {
    pub fn new(normal: Vector3<f32>, v1: Point3<f32>, v2: Point3<f32>, v3: Point3<f32>) -> Self {
        Self {
            normal,
            vertices: [v1, v2, v3],
            attribute_byte_count: 0,
        }
    }

    pub fn from_components(normal: [f32; 3], vertices: [[f32; 3]; 3]) -> Self {
        Self {
            normal: Vector3::from(normal),
            vertices: vertices.map(Point3::from),
            attribute_byte_count: 0,
        }
    }

    /// Face normal from the winding of the vertices, `None` for degenerate triangles
    pub fn computed_normal(&self) -> Option<Vector3<f32>> {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).try_normalize(f32::EPSILON)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// A mesh as a sequence of triangle records, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triangle> {
        self.triangles.iter()
    }

    /// Bounding box over all vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.triangles.iter().flat_map(|t| t.vertices.iter());
        let first = *points.next()?;

        Some(points.fold(Bounds { min: first, max: first }, |b, p| Bounds {
            min: b.min.inf(p),
            max: b.max.sup(p),
        }))
    }

    pub fn to_flat(&self) -> FlatMesh {
        let mut flat = FlatMesh::with_capacity(self.len());
        for triangle in &self.triangles {
            flat.push(triangle);
        }
        flat
    }
}

impl<'a> IntoIterator for &'a Mesh {
    type Item = &'a Triangle;
    type IntoIter = std::slice::Iter<'a, Triangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.triangles.iter()
    }
}

/// Parallel flat buffers for bulk upload.
///
/// Triangle `i` owns `normals[i * 3..i * 3 + 3]` and
/// `vertices[i * 9..i * 9 + 9]` (vertex1, vertex2, vertex3, each xyz).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMesh {
    pub normals: Vec<f32>,
    pub vertices: Vec<f32>,
    pub attributes: Vec<u16>,
}

impl FlatMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            normals: Vec::with_capacity(triangles * 3),
            vertices: Vec::with_capacity(triangles * 9),
            attributes: Vec::with_capacity(triangles),
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn normal(&self, index: usize) -> Option<&[f32]> {
        self.normals.get(index * 3..index * 3 + 3)
    }

    pub fn triangle_vertices(&self, index: usize) -> Option<&[f32]> {
        self.vertices.get(index * 9..index * 9 + 9)
    }

    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let n = self.normal(index)?;
        let v = self.triangle_vertices(index)?;
        let attribute_byte_count = *self.attributes.get(index)?;

        let mut triangle = Triangle::new(
            Vector3::new(n[0], n[1], n[2]),
            Point3::new(v[0], v[1], v[2]),
            Point3::new(v[3], v[4], v[5]),
            Point3::new(v[6], v[7], v[8]),
        );
        triangle.attribute_byte_count = attribute_byte_count;
        Some(triangle)
    }

    pub fn push(&mut self, triangle: &Triangle) {
        self.normals.extend_from_slice(triangle.normal.as_slice());
        for vertex in &triangle.vertices {
            self.vertices.extend_from_slice(vertex.coords.as_slice());
        }
        self.attributes.push(triangle.attribute_byte_count);
    }

    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.len());
        for triangle in (0..self.len()).filter_map(|i| self.triangle(i)) {
            mesh.add_triangle(triangle);
        }
        mesh
    }
}

impl From<Mesh> for FlatMesh {
    fn from(mesh: Mesh) -> Self {
        mesh.to_flat()
    }
}

impl From<FlatMesh> for Mesh {
    fn from(flat: FlatMesh) -> Self {
        flat.to_mesh()
    }
}
