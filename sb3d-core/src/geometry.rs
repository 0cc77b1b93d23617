/// Geometry primitives: vertex snapshots and the topology drawn over them
use std::ops::Index;

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, MeshResult};

/// A 3D vertex position
pub type Vertex = Point3<f64>;

/// An ordered, index-stable snapshot of vertex positions.
///
/// A `VertexSet` has no mutating API: every deformation stage produces a new
/// set, so a snapshot handed to a renderer never changes underneath it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexSet {
    vertices: Vec<Vertex>,
}

impl VertexSet {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vertex> {
        self.vertices.iter()
    }

    pub fn as_slice(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Produce a new set by mapping every vertex, keeping order and length
    pub fn map(&self, f: impl FnMut(&Vertex) -> Vertex) -> Self {
        Self {
            vertices: self.vertices.iter().map(f).collect(),
        }
    }

    /// Fail with `ShapeMismatch` unless this set has exactly `expected` vertices
    pub fn expect_len(&self, expected: usize) -> MeshResult<()> {
        if self.len() == expected {
            Ok(())
        } else {
            Err(MeshError::ShapeMismatch {
                expected,
                found: self.len(),
            })
        }
    }

    /// Largest per-coordinate distance between two sets of the same shape
    pub fn max_displacement(&self, other: &VertexSet) -> MeshResult<f64> {
        other.expect_len(self.len())?;
        Ok(self
            .iter()
            .zip(other.iter())
            .map(|(a, b)| (a - b).amax())
            .fold(0.0, f64::max))
    }
}

impl Index<usize> for VertexSet {
    type Output = Vertex;

    fn index(&self, index: usize) -> &Vertex {
        &self.vertices[index]
    }
}

impl From<Vec<Vertex>> for VertexSet {
    fn from(vertices: Vec<Vertex>) -> Self {
        Self::new(vertices)
    }
}

impl FromIterator<Vertex> for VertexSet {
    fn from_iter<I: IntoIterator<Item = Vertex>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a VertexSet {
    type Item = &'a Vertex;
    type IntoIter = std::slice::Iter<'a, Vertex>;

    fn into_iter(self) -> Self::IntoIter {
        self.vertices.iter()
    }
}

/// An unordered pair of distinct vertex indices, stored as `(low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    a: usize,
    b: usize,
}

impl Edge {
    pub fn new(i: usize, j: usize) -> MeshResult<Self> {
        if i == j {
            return Err(MeshError::invalid(format!("edge ({i}, {j}) joins a vertex to itself")));
        }
        Ok(Self {
            a: i.min(j),
            b: i.max(j),
        })
    }

    pub fn indices(&self) -> (usize, usize) {
        (self.a, self.b)
    }
}

/// Insertion-ordered set of edges
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EdgeSet {
    edges: Vec<Edge>,
}

impl EdgeSet {
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    /// Build from index pairs; `(i, j)` and `(j, i)` collapse to one edge
    pub fn from_pairs(pairs: &[(usize, usize)]) -> MeshResult<Self> {
        let mut set = Self::new();
        for &(i, j) in pairs {
            set.insert(Edge::new(i, j)?);
        }
        Ok(set)
    }

    /// Returns false if the edge was already present
    pub fn insert(&mut self, edge: Edge) -> bool {
        if self.edges.contains(&edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn contains(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.edges.iter()
    }

    fn max_index(&self) -> Option<usize> {
        self.edges.iter().map(|e| e.b).max()
    }
}

/// A triangle over three vertex indices; the order gives the winding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face(pub [usize; 3]);

impl Face {
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self([a, b, c])
    }

    pub fn indices(&self) -> [usize; 3] {
        self.0
    }

    /// The three edges bounding this face
    pub fn edges(&self) -> MeshResult<[Edge; 3]> {
        let [a, b, c] = self.0;
        Ok([Edge::new(a, b)?, Edge::new(b, c)?, Edge::new(c, a)?])
    }
}

/// Ordered list of triangular faces
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FaceSet {
    faces: Vec<Face>,
}

impl FaceSet {
    pub fn new(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    pub fn from_triples(triples: &[[usize; 3]]) -> Self {
        Self::new(triples.iter().copied().map(Face).collect())
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Face> {
        self.faces.iter()
    }

    /// Every distinct edge used by the faces, in first-seen order
    pub fn edges(&self) -> MeshResult<EdgeSet> {
        let mut set = EdgeSet::new();
        for face in &self.faces {
            for edge in face.edges()? {
                set.insert(edge);
            }
        }
        Ok(set)
    }

    fn max_index(&self) -> Option<usize> {
        self.faces.iter().flat_map(|f| f.0).max()
    }
}

/// Connectivity of a mesh: springs between vertices, or triangulated surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    Edges(EdgeSet),
    Faces(FaceSet),
}

impl Topology {
    /// Check that every index refers to one of `vertex_count` vertices
    pub fn validate(&self, vertex_count: usize) -> MeshResult<()> {
        let max_index = match self {
            Topology::Edges(edges) => edges.max_index(),
            Topology::Faces(faces) => {
                if let Some(face) = faces.iter().find(|f| {
                    let [a, b, c] = f.0;
                    a == b || b == c || a == c
                }) {
                    return Err(MeshError::invalid(format!("face {:?} repeats a vertex", face.0)));
                }
                faces.max_index()
            }
        };
        match max_index {
            Some(max) if max >= vertex_count => Err(MeshError::ShapeMismatch {
                expected: max + 1,
                found: vertex_count,
            }),
            _ => Ok(()),
        }
    }

    /// Edges for wireframe drawing; faces contribute their boundary edges
    pub fn edges(&self) -> MeshResult<EdgeSet> {
        match self {
            Topology::Edges(edges) => Ok(edges.clone()),
            Topology::Faces(faces) => faces.edges(),
        }
    }

    pub fn faces(&self) -> Option<&FaceSet> {
        match self {
            Topology::Edges(_) => None,
            Topology::Faces(faces) => Some(faces),
        }
    }
}

impl From<EdgeSet> for Topology {
    fn from(edges: EdgeSet) -> Self {
        Topology::Edges(edges)
    }
}

impl From<FaceSet> for Topology {
    fn from(faces: FaceSet) -> Self {
        Topology::Faces(faces)
    }
}

/// A rest-shape vertex set together with the topology drawn over it
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: VertexSet,
    topology: Topology,
}

impl Mesh {
    pub fn new(vertices: VertexSet, topology: impl Into<Topology>) -> MeshResult<Self> {
        let topology = topology.into();
        topology.validate(vertices.len())?;
        Ok(Self { vertices, topology })
    }

    pub fn vertices(&self) -> &VertexSet {
        &self.vertices
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }
}

/// Look up the current endpoints of every edge
pub fn edge_endpoints(vertices: &VertexSet, edges: &EdgeSet) -> MeshResult<Vec<(Vertex, Vertex)>> {
    edges
        .iter()
        .map(|edge| {
            let (a, b) = edge.indices();
            Ok((lookup(vertices, a)?, lookup(vertices, b)?))
        })
        .collect()
}

/// Look up the current corners of every face
pub fn face_vertices(vertices: &VertexSet, faces: &FaceSet) -> MeshResult<Vec<[Vertex; 3]>> {
    faces
        .iter()
        .map(|face| {
            let [a, b, c] = face.indices();
            Ok([lookup(vertices, a)?, lookup(vertices, b)?, lookup(vertices, c)?])
        })
        .collect()
}

/// Calculate the unit normal of a triangle from its winding.
///
/// Returns `None` for degenerate (collinear) triangles.
pub fn face_normal(corners: &[Vertex; 3]) -> Option<Vector3<f64>> {
    let edge1 = corners[1] - corners[0];
    let edge2 = corners[2] - corners[0];
    edge1.cross(&edge2).try_normalize(crate::config::EPSILON)
}

fn lookup(vertices: &VertexSet, index: usize) -> MeshResult<Vertex> {
    vertices.get(index).copied().ok_or(MeshError::ShapeMismatch {
        expected: index + 1,
        found: vertices.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> VertexSet {
        VertexSet::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn test_edge_normalizes_order() {
        let edge = Edge::new(3, 1).unwrap();
        assert_eq!(edge.indices(), (1, 3));
        assert_eq!(edge, Edge::new(1, 3).unwrap());
        assert!(Edge::new(2, 2).is_err());
    }

    #[test]
    fn test_edge_set_deduplicates() {
        let edges = EdgeSet::from_pairs(&[(0, 1), (1, 0), (1, 2), (2, 1)]).unwrap();
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_face_set_edges() {
        let faces = FaceSet::from_triples(&[[0, 1, 2], [0, 2, 3]]);
        let edges = faces.edges().unwrap();
        // The shared diagonal is only counted once
        assert_eq!(edges.len(), 5);
        assert!(edges.contains(&Edge::new(2, 0).unwrap()));
    }

    #[test]
    fn test_topology_rejects_out_of_range() {
        let edges = EdgeSet::from_pairs(&[(0, 4)]).unwrap();
        let err = Mesh::new(square(), edges).unwrap_err();
        assert_eq!(err, MeshError::ShapeMismatch { expected: 5, found: 4 });
    }

    #[test]
    fn test_topology_rejects_repeated_face_vertex() {
        let faces = FaceSet::from_triples(&[[0, 1, 1]]);
        assert!(matches!(
            Mesh::new(square(), faces),
            Err(MeshError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_edge_endpoints_follow_vertices() {
        let edges = EdgeSet::from_pairs(&[(0, 2)]).unwrap();
        let endpoints = edge_endpoints(&square(), &edges).unwrap();
        assert_eq!(endpoints, vec![(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0))]);

        let shifted = square().map(|v| v + Vector3::new(0.0, 0.0, 2.0));
        let endpoints = edge_endpoints(&shifted, &edges).unwrap();
        assert_eq!(endpoints[0].1, Point3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn test_face_vertices_short_set() {
        let faces = FaceSet::from_triples(&[[0, 1, 7]]);
        assert!(face_vertices(&square(), &faces).is_err());
    }

    #[test]
    fn test_face_normal() {
        let vs = square();
        let normal = face_normal(&[vs[0], vs[1], vs[2]]).unwrap();
        assert!((normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);

        let collinear = [vs[0], vs[1], Point3::new(2.0, 0.0, 0.0)];
        assert!(face_normal(&collinear).is_none());
    }

    #[test]
    fn test_max_displacement() {
        let a = square();
        let b = a.map(|v| Point3::new(v.x, v.y, v.z - 0.5));
        assert_eq!(a.max_displacement(&b).unwrap(), 0.5);
        assert!(a.max_displacement(&VertexSet::default()).is_err());
    }
}
