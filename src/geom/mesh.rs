//! Indexed triangle mesh geometry.
//!
//! A mesh stores a shared vertex buffer plus index lists for its edges
//! and faces. Queries materialize primitives on demand, so the three
//! primitive lists never duplicate positions. Vertex positions may be
//! mutated in place between queries; `mark_bounds_dirty` tells the mesh
//! to recompute its box lazily on the next `bounds` call.

use std::cell::Cell;
use std::collections::HashSet;
use std::path::Path;

use ::cgmath::Vector3;
use ::cgmath::prelude::*;
use ::tobj;

use super::aabb::Aabb;
use super::prim::{Edge3, Tri3};
use super::query::{Geometry, Isect, Query, Ray, Sweep};
use super::raycast::raycast;
use super::shape::ConvexShape;
use super::tri;

const MIN_FACE_AREA: f32 = 0.0001;

pub struct GeoMesh {
    pub verts: Vec<Vector3<f32>>,
    /// Deduplicated undirected edges as index pairs into `verts`.
    pub edges: Vec<[usize; 2]>,
    /// Faces as index triples into `verts`, counter-clockwise winding.
    pub faces: Vec<[usize; 3]>,
    bounds: Cell<Aabb>,
    bounds_dirty: Cell<bool>
}

impl GeoMesh {
    /// Builds a mesh from a vertex buffer and face index triples. Edges
    /// are derived from the faces, shared edges appearing only once.
    ///
    /// Panics if a face indexes past the vertex buffer.
    pub fn from_indexed(verts: Vec<Vector3<f32>>, faces: Vec<[usize; 3]>) -> GeoMesh {
        for face in &faces {
            for &i in face {
                assert!(i < verts.len(),
                    "Face index {} out of bounds for {} vertices", i, verts.len());
            }
        }

        let mut edges = Vec::with_capacity(faces.len()*3);
        let mut seen = HashSet::new();
        for face in &faces {
            for &(a, b) in &[(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                let key = if a < b { (a, b) } else { (b, a) };
                if seen.insert(key) {
                    edges.push([a, b]);
                }
            }
        }

        GeoMesh {
            verts,
            edges,
            faces,
            bounds: Cell::new(Aabb::empty()),
            bounds_dirty: Cell::new(true)
        }
    }

    /// Loads all models in the OBJ file at the given path, merged into
    /// a single mesh.
    pub fn load_obj(obj_file_path: &str) -> Result<GeoMesh, tobj::LoadError> {
        let (models, _materials) = tobj::load_obj(&Path::new(obj_file_path))?;

        let mut verts = Vec::new();
        let mut faces = Vec::new();
        for model in &models {
            let mesh = &model.mesh;
            let base = verts.len();

            for position in mesh.positions.chunks(3) {
                verts.push(Vector3::new(position[0], position[1], position[2]));
            }
            for face in mesh.indices.chunks(3) {
                faces.push([
                    base + face[0] as usize,
                    base + face[1] as usize,
                    base + face[2] as usize
                ]);
            }
        }

        let mesh = GeoMesh::from_indexed(verts, faces);
        info!("Loaded {} with {} vertices, {} edges and {} faces",
            obj_file_path, mesh.verts.len(), mesh.edges.len(), mesh.faces.len());
        Ok(mesh)
    }

    /// Moves every vertex by the given offset.
    pub fn translate(&mut self, dp: Vector3<f32>) {
        for vert in self.verts.iter_mut() {
            *vert += dp;
        }
        self.bounds_dirty.set(true);
    }

    /// Materializes the edge at the given index.
    pub fn edge(&self, i: usize) -> Edge3 {
        let [a, b] = self.edges[i];
        Edge3::new(self.verts[a], self.verts[b])
    }

    /// Materializes the face at the given index.
    pub fn tri(&self, i: usize) -> Tri3 {
        let [a, b, c] = self.faces[i];
        Tri3::new(self.verts[a], self.verts[b], self.verts[c])
    }

    /// Cleans up the mesh: welds vertices closer than `weld_dist`
    /// together at their average position, then drops zero-length
    /// edges, near-zero-area faces and duplicate edges the welding
    /// may have produced.
    pub fn optimize(&mut self, weld_dist: f32) {
        let verts_before = self.verts.len();
        let edges_before = self.edges.len();
        let faces_before = self.faces.len();

        let sq_weld_dist = weld_dist*weld_dist;

        let mut welded = Vec::with_capacity(self.verts.len());
        let mut remap = vec![0; self.verts.len()];
        let mut consumed = vec![false; self.verts.len()];
        for i in 0..self.verts.len() {
            if consumed[i] {
                continue;
            }

            //Running average over every vertex welded into this one.
            let mut pos = self.verts[i];
            let mut count = 1.0;
            for j in (i + 1)..self.verts.len() {
                if consumed[j] {
                    continue;
                }
                if (self.verts[j] - pos).magnitude2() <= sq_weld_dist {
                    pos = (pos*count + self.verts[j])/(count + 1.0);
                    count += 1.0;
                    consumed[j] = true;
                    remap[j] = welded.len();
                }
            }

            remap[i] = welded.len();
            welded.push(pos);
        }
        self.verts = welded;

        for edge in self.edges.iter_mut() {
            edge[0] = remap[edge[0]];
            edge[1] = remap[edge[1]];
        }
        for face in self.faces.iter_mut() {
            face[0] = remap[face[0]];
            face[1] = remap[face[1]];
            face[2] = remap[face[2]];
        }

        self.edges.retain(|e| e[0] != e[1]);

        let verts = &self.verts;
        self.faces.retain(|f| {
            let t = Tri3::new(verts[f[0]], verts[f[1]], verts[f[2]]);
            tri::area(&t) >= MIN_FACE_AREA
        });

        let mut seen = HashSet::new();
        self.edges.retain(|e| {
            let key = if e[0] < e[1] { (e[0], e[1]) } else { (e[1], e[0]) };
            seen.insert(key)
        });

        self.bounds_dirty.set(true);

        let faces_removed = faces_before - self.faces.len();
        if faces_removed > 0 {
            warn!("Discarded {} degenerate faces", faces_removed);
        }
        info!("Optimized mesh down to {} vertices, {} edges and {} faces (from {}, {} and {})",
            self.verts.len(), self.edges.len(), self.faces.len(),
            verts_before, edges_before, faces_before);
    }
}

impl Geometry for GeoMesh {
    fn ray<'a>(&'a self, p0: Vector3<f32>, dp: Vector3<f32>, terminated: bool) -> Box<Query<Ray> + 'a> {
        Box::new(MeshRayQuery {
            mesh: self,
            p0,
            dp,
            terminated,
            index: 0
        })
    }

    fn isect<'a>(&'a self, shape: &'a ConvexShape) -> Box<Query<Isect> + 'a> {
        Box::new(MeshIsectQuery {
            mesh: self,
            shape,
            index: 0
        })
    }

    fn sweep<'a>(&'a self, shape: &'a ConvexShape, dp: Vector3<f32>) -> Box<Query<Sweep> + 'a> {
        let mut swept_bounds = shape.bounds();
        swept_bounds.sweep(dp);
        Box::new(MeshSweepQuery {
            mesh: self,
            shape,
            dp,
            swept_bounds,
            index: 0
        })
    }

    fn bounds(&self) -> Aabb {
        if self.bounds_dirty.get() {
            self.update_bounds();
        }
        self.bounds.get()
    }

    fn are_bounds_dirty(&self) -> bool {
        self.bounds_dirty.get()
    }

    fn mark_bounds_dirty(&self) {
        self.bounds_dirty.set(true);
    }

    fn update_bounds(&self) {
        let mut bounds = Aabb::empty();
        for vert in &self.verts {
            bounds.expand_point(*vert);
        }
        self.bounds.set(bounds);
        self.bounds_dirty.set(false);
    }
}

struct MeshRayQuery<'a> {
    mesh: &'a GeoMesh,
    p0: Vector3<f32>,
    dp: Vector3<f32>,
    terminated: bool,
    index: usize
}

impl<'a> Query<Ray> for MeshRayQuery<'a> {
    fn has_next(&self) -> bool {
        self.index < self.mesh.faces.len()
    }

    fn next(&mut self, result: &mut Ray) -> bool {
        let face = self.mesh.tri(self.index);
        self.index += 1;
        raycast(&face, self.p0, self.dp, self.terminated, result)
    }
}

/// Tests faces, then edges, then vertices, so containers accumulating
/// the deepest result prefer faces on equal depth.
struct MeshIsectQuery<'a> {
    mesh: &'a GeoMesh,
    shape: &'a ConvexShape,
    index: usize
}

impl<'a> Query<Isect> for MeshIsectQuery<'a> {
    fn has_next(&self) -> bool {
        self.index < self.mesh.faces.len() + self.mesh.edges.len() + self.mesh.verts.len()
    }

    fn next(&mut self, result: &mut Isect) -> bool {
        let i = self.index;
        self.index += 1;

        let faces = self.mesh.faces.len();
        let edges = self.mesh.edges.len();
        if i < faces {
            self.shape.isect_tri(&self.mesh.tri(i), result)
        } else if i < faces + edges {
            self.shape.isect_edge(&self.mesh.edge(i - faces), result)
        } else {
            self.shape.isect_vertex(self.mesh.verts[i - faces - edges], result)
        }
    }
}

/// Like the intersection query, but each primitive is cheaply culled
/// against the box swept out by the moving shape before the analytic
/// test runs.
struct MeshSweepQuery<'a> {
    mesh: &'a GeoMesh,
    shape: &'a ConvexShape,
    dp: Vector3<f32>,
    swept_bounds: Aabb,
    index: usize
}

impl<'a> Query<Sweep> for MeshSweepQuery<'a> {
    fn has_next(&self) -> bool {
        self.index < self.mesh.faces.len() + self.mesh.edges.len() + self.mesh.verts.len()
    }

    fn next(&mut self, result: &mut Sweep) -> bool {
        let i = self.index;
        self.index += 1;

        let faces = self.mesh.faces.len();
        let edges = self.mesh.edges.len();
        if i < faces {
            let face = self.mesh.tri(i);
            Aabb::contain_tri(&face).touching(&self.swept_bounds)
                && self.shape.sweep_tri(self.dp, &face, result)
        } else if i < faces + edges {
            let edge = self.mesh.edge(i - faces);
            Aabb::contain_edge(&edge).touching(&self.swept_bounds)
                && self.shape.sweep_edge(self.dp, &edge, result)
        } else {
            let vert = self.mesh.verts[i - faces - edges];
            self.swept_bounds.touching_point(vert)
                && self.shape.sweep_vertex(self.dp, vert, result)
        }
    }
}
