//! Rendering boundary
//!
//! The engine does not draw anything itself. Objects that want to be seen
//! submit a [`DrawCall`] to a [`RenderSink`] during the scene update, and
//! whoever owns the sink (a GPU renderer, a test, a headless logger) decides
//! what to do with it.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Opaque handle to GPU geometry owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

impl MeshHandle {
    /// Built-in unit sphere
    pub const SPHERE: MeshHandle = MeshHandle(0);
    /// Built-in unit cube
    pub const CUBE: MeshHandle = MeshHandle(1);
}

impl Default for MeshHandle {
    fn default() -> Self {
        Self::SPHERE
    }
}

/// Opaque handle to a material owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct MaterialHandle(pub u32);

impl MaterialHandle {
    /// Renderer's default lit material
    pub const DEFAULT: MaterialHandle = MaterialHandle(0);
}

/// Linear RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const WHITE: Color = Color([1.0, 1.0, 1.0, 1.0]);

    /// Create an opaque color
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b, 1.0])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// CPU-side triangle geometry, used by mesh colliders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Vertex positions in mesh space
    pub vertices: Vec<Vec3>,
    /// Triangle list, three indices per face
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data from positions and a triangle list
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// A flat, upward-facing square of the given size centered on the origin
    pub fn quad(size: f32) -> Self {
        let h = size * 0.5;
        Self {
            vertices: vec![
                Vec3::new(-h, 0.0, -h),
                Vec3::new(h, 0.0, -h),
                Vec3::new(h, 0.0, h),
                Vec3::new(-h, 0.0, h),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    /// Number of complete triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex positions of triangle `face`, skipping faces with bad indices
    pub fn triangle(&self, face: usize) -> Option<[Vec3; 3]> {
        let base = face * 3;
        let idx = self.indices.get(base..base + 3)?;
        Some([
            *self.vertices.get(idx[0] as usize)?,
            *self.vertices.get(idx[1] as usize)?,
            *self.vertices.get(idx[2] as usize)?,
        ])
    }

    /// Iterate over all valid triangles with their face index
    pub fn triangles(&self) -> impl Iterator<Item = (usize, [Vec3; 3])> + '_ {
        (0..self.triangle_count()).filter_map(|face| self.triangle(face).map(|t| (face, t)))
    }
}

/// A request to draw one mesh instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    /// Model matrix of the instance
    pub transform: Mat4,
    pub color: Color,
}

/// Component for objects drawn with a single mesh
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshObject {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub color: Color,
}

impl MeshObject {
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self {
            mesh,
            material,
            color: Color::WHITE,
        }
    }

    /// Draw call for this mesh at `transform`
    pub fn draw_call(&self, transform: Mat4) -> DrawCall {
        DrawCall {
            mesh: self.mesh,
            material: self.material,
            transform,
            color: self.color,
        }
    }
}

/// Receiver of draw calls produced during a scene update
pub trait RenderSink {
    fn submit(&mut self, call: DrawCall);
}

/// Sink that simply collects draw calls, one frame at a time
#[derive(Debug, Default)]
pub struct DrawList {
    calls: Vec<DrawCall>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls submitted since the last [`clear`](Self::clear)
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderSink for DrawList {
    fn submit(&mut self, call: DrawCall) {
        trace!(mesh = ?call.mesh, material = ?call.material, "Draw call submitted");
        self.calls.push(call);
    }
}
