//! Static vertex storage with attribute bindings derived from the vertex
//! record's field layout.

use bytemuck::Pod;

use crate::context::{BufferId, Context, VertexArrayId};
use crate::error::Error;

/// One interleaved float field of a vertex record.
#[derive(Copy, Clone, Debug)]
pub struct VertexAttribute {
    /// Attribute name, matching the shader's `in` declaration. Only used for
    /// logging; attribute indices are assigned by declaration order.
    pub name: &'static str,
    /// Number of f32 components.
    pub components: i32,
}

/// The field layout of one vertex record type.
#[derive(Copy, Clone, Debug)]
pub struct VertexLayout {
    /// The interleaved fields, in declaration order.
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// Size in bytes of one full record.
    pub fn stride(&self) -> i32 {
        self.attributes.iter().map(|a| a.components * 4).sum()
    }

    /// Declares this layout's attributes on the bound vertex array, starting at
    /// attribute `base_index`, with the given instancing divisor. Returns the
    /// next free attribute index.
    fn declare(&self, ctxt: &Context, base_index: u32, divisor: u32) -> u32 {
        let stride = self.stride();
        let mut offset = 0;

        for (i, attribute) in self.attributes.iter().enumerate() {
            ctxt.vertex_attrib_f32(
                base_index + i as u32,
                attribute.components,
                stride,
                offset,
                divisor,
            );
            offset += attribute.components * 4;
        }

        base_index + self.attributes.len() as u32
    }
}

/// An immutable triangle mesh resident on the GPU: one vertex buffer, an
/// optional per-instance buffer, and the vertex-array binding tying them to
/// attribute indices.
///
/// Buffers are upload-once: the data is never mutated after construction.
pub struct GpuMesh {
    ctxt: Context,
    vertex_array: Option<VertexArrayId>,
    vertex_buffer: Option<BufferId>,
    instance_buffer: Option<BufferId>,
    vertex_count: usize,
    instance_count: usize,
}

impl GpuMesh {
    /// Uploads `vertices` as a static mesh.
    pub fn new<V: Pod>(
        ctxt: &Context,
        vertices: &[V],
        layout: &VertexLayout,
    ) -> Result<GpuMesh, Error> {
        GpuMesh::build(ctxt, vertices, layout, None::<(&[V], &VertexLayout)>)
    }

    /// Uploads `vertices` plus a per-instance record buffer. Instance
    /// attributes are numbered after the vertex attributes.
    pub fn with_instances<V: Pod, I: Pod>(
        ctxt: &Context,
        vertices: &[V],
        layout: &VertexLayout,
        instances: &[I],
        instance_layout: &VertexLayout,
    ) -> Result<GpuMesh, Error> {
        GpuMesh::build(ctxt, vertices, layout, Some((instances, instance_layout)))
    }

    fn build<V: Pod, I: Pod>(
        ctxt: &Context,
        vertices: &[V],
        layout: &VertexLayout,
        instances: Option<(&[I], &VertexLayout)>,
    ) -> Result<GpuMesh, Error> {
        let mut result = GpuMesh {
            ctxt: ctxt.clone(),
            vertex_array: None,
            vertex_buffer: None,
            instance_buffer: None,
            vertex_count: vertices.len(),
            instance_count: 0,
        };

        // On failure, dropping `result` releases everything created so far.
        let vertex_array = ctxt.create_vertex_array()?;
        result.vertex_array = Some(vertex_array);
        let vertex_buffer = ctxt.create_buffer()?;
        result.vertex_buffer = Some(vertex_buffer);

        ctxt.bind_vertex_array(Some(vertex_array));

        ctxt.bind_array_buffer(Some(vertex_buffer));
        ctxt.array_buffer_data(bytemuck::cast_slice(vertices));
        let next_index = layout.declare(ctxt, 0, 0);

        if let Some((instances, instance_layout)) = instances {
            let instance_buffer = ctxt.create_buffer()?;
            result.instance_buffer = Some(instance_buffer);
            result.instance_count = instances.len();

            ctxt.bind_array_buffer(Some(instance_buffer));
            ctxt.array_buffer_data(bytemuck::cast_slice(instances));
            instance_layout.declare(ctxt, next_index, 1);
        }

        ctxt.bind_vertex_array(None);
        ctxt.bind_array_buffer(None);

        Ok(result)
    }

    /// Binds the vertex array for drawing.
    pub fn bind(&self) {
        if self.vertex_array.is_some() {
            self.ctxt.bind_vertex_array(self.vertex_array);
        }
    }

    /// Number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of instance records, 0 for non-instanced meshes.
    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Releases the vertex array and buffers. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(vertex_array) = self.vertex_array.take() {
            self.ctxt.delete_vertex_array(vertex_array);
        }

        if let Some(vertex_buffer) = self.vertex_buffer.take() {
            self.ctxt.delete_buffer(vertex_buffer);
        }

        if let Some(instance_buffer) = self.instance_buffer.take() {
            self.ctxt.delete_buffer(instance_buffer);
        }
    }
}

impl Drop for GpuMesh {
    fn drop(&mut self) {
        self.close();
    }
}
