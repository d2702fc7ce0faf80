//! Declarative vertex attribute tables
//!
//! Each pipeline describes its vertex inputs as a table of
//! `(name, components, role, step)` rows. Row `i` is shader location `i` and
//! lives in its own buffer (slot `i`), so one routine builds the buffer
//! layouts and one routine binds the buffers for any table.

/// Scalar type of each attribute component
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Float32,
    Uint32,
}

/// How far an attribute advances per draw element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepMode {
    /// Once per quad corner
    Vertex,
    /// Once per segment
    Instance,
}

impl From<StepMode> for wgpu::VertexStepMode {
    fn from(step: StepMode) -> Self {
        match step {
            StepMode::Vertex => wgpu::VertexStepMode::Vertex,
            StepMode::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}

/// One row of an attribute table
#[derive(Clone, Copy, Debug)]
pub struct AttributeDescriptor<R> {
    /// Shader input name
    pub name: &'static str,
    /// 1 to 4
    pub components: u32,
    pub scalar: ScalarKind,
    /// Which buffer feeds the attribute
    pub role: R,
    pub step: StepMode,
}

impl<R> AttributeDescriptor<R> {
    pub const fn format(&self) -> wgpu::VertexFormat {
        match (self.scalar, self.components) {
            (ScalarKind::Float32, 1) => wgpu::VertexFormat::Float32,
            (ScalarKind::Float32, 2) => wgpu::VertexFormat::Float32x2,
            (ScalarKind::Float32, 3) => wgpu::VertexFormat::Float32x3,
            (ScalarKind::Float32, _) => wgpu::VertexFormat::Float32x4,
            (ScalarKind::Uint32, 1) => wgpu::VertexFormat::Uint32,
            (ScalarKind::Uint32, 2) => wgpu::VertexFormat::Uint32x2,
            (ScalarKind::Uint32, 3) => wgpu::VertexFormat::Uint32x3,
            (ScalarKind::Uint32, _) => wgpu::VertexFormat::Uint32x4,
        }
    }

    /// Bytes per element in the backing buffer
    pub const fn stride(&self) -> u64 {
        self.components as u64 * 4
    }
}

/// Maps an attribute role to the buffer holding its data
pub trait VertexSource<R> {
    fn vertex_buffer(&self, role: R) -> &wgpu::Buffer;
}

/// Vertex attributes for a table, one per shader location
pub fn vertex_attributes<R>(table: &[AttributeDescriptor<R>]) -> Vec<wgpu::VertexAttribute> {
    table
        .iter()
        .enumerate()
        .map(|(location, attr)| wgpu::VertexAttribute {
            format: attr.format(),
            offset: 0,
            shader_location: location as u32,
        })
        .collect()
}

/// Buffer layouts for a table. `attributes` must come from [`vertex_attributes`]
/// on the same table.
pub fn buffer_layouts<'a, R>(
    table: &[AttributeDescriptor<R>],
    attributes: &'a [wgpu::VertexAttribute],
) -> Vec<wgpu::VertexBufferLayout<'a>> {
    table
        .iter()
        .zip(attributes)
        .map(|(attr, vertex_attr)| wgpu::VertexBufferLayout {
            array_stride: attr.stride(),
            step_mode: attr.step.into(),
            attributes: std::slice::from_ref(vertex_attr),
        })
        .collect()
}

/// Bind every buffer of a table to its slot
pub fn bind_attributes<R: Copy>(
    pass: &mut wgpu::RenderPass<'_>,
    table: &[AttributeDescriptor<R>],
    source: &impl VertexSource<R>,
) {
    for (slot, attr) in table.iter().enumerate() {
        pass.set_vertex_buffer(slot as u32, source.vertex_buffer(attr.role).slice(..));
    }
}

/// Buffers behind the stroke pipeline's inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeAttribute {
    Corner,
    StartPos,
    EndPos,
    PrevPos,
    NextPos,
    SegmentType,
    ControlParams,
    Color,
}

/// Stroke pipeline inputs: the shared quad corner plus the seven instance columns
pub const STROKE_ATTRIBUTES: [AttributeDescriptor<StrokeAttribute>; 8] = [
    AttributeDescriptor {
        name: "corner",
        components: 2,
        scalar: ScalarKind::Float32,
        role: StrokeAttribute::Corner,
        step: StepMode::Vertex,
    },
    AttributeDescriptor {
        name: "start_pos",
        components: 2,
        scalar: ScalarKind::Float32,
        role: StrokeAttribute::StartPos,
        step: StepMode::Instance,
    },
    AttributeDescriptor {
        name: "end_pos",
        components: 2,
        scalar: ScalarKind::Float32,
        role: StrokeAttribute::EndPos,
        step: StepMode::Instance,
    },
    AttributeDescriptor {
        name: "prev_pos",
        components: 2,
        scalar: ScalarKind::Float32,
        role: StrokeAttribute::PrevPos,
        step: StepMode::Instance,
    },
    AttributeDescriptor {
        name: "next_pos",
        components: 2,
        scalar: ScalarKind::Float32,
        role: StrokeAttribute::NextPos,
        step: StepMode::Instance,
    },
    AttributeDescriptor {
        name: "kind",
        components: 1,
        scalar: ScalarKind::Uint32,
        role: StrokeAttribute::SegmentType,
        step: StepMode::Instance,
    },
    AttributeDescriptor {
        name: "cp",
        components: 4,
        scalar: ScalarKind::Float32,
        role: StrokeAttribute::ControlParams,
        step: StepMode::Instance,
    },
    AttributeDescriptor {
        name: "color",
        components: 4,
        scalar: ScalarKind::Float32,
        role: StrokeAttribute::Color,
        step: StepMode::Instance,
    },
];

/// Buffers behind the blit pass inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlitAttribute {
    Position,
    TexCoord,
}

pub const BLIT_ATTRIBUTES: [AttributeDescriptor<BlitAttribute>; 2] = [
    AttributeDescriptor {
        name: "position",
        components: 2,
        scalar: ScalarKind::Float32,
        role: BlitAttribute::Position,
        step: StepMode::Vertex,
    },
    AttributeDescriptor {
        name: "tex_coord",
        components: 2,
        scalar: ScalarKind::Float32,
        role: BlitAttribute::TexCoord,
        step: StepMode::Vertex,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_location_per_row() {
        let attrs = vertex_attributes(&STROKE_ATTRIBUTES);
        let locations: Vec<u32> = attrs.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, (0..8).collect::<Vec<_>>());
        assert!(attrs.iter().all(|a| a.offset == 0));
    }

    #[test]
    fn stroke_layouts_step_per_instance_after_the_corner() {
        let attrs = vertex_attributes(&STROKE_ATTRIBUTES);
        let layouts = buffer_layouts(&STROKE_ATTRIBUTES, &attrs);
        assert_eq!(layouts.len(), 8);
        assert_eq!(layouts[0].step_mode, wgpu::VertexStepMode::Vertex);
        assert!(layouts[1..]
            .iter()
            .all(|l| l.step_mode == wgpu::VertexStepMode::Instance));
    }

    #[test]
    fn formats_and_strides() {
        let kind = &STROKE_ATTRIBUTES[5];
        assert_eq!(kind.format(), wgpu::VertexFormat::Uint32);
        assert_eq!(kind.stride(), 4);

        let cp = &STROKE_ATTRIBUTES[6];
        assert_eq!(cp.format(), wgpu::VertexFormat::Float32x4);
        assert_eq!(cp.stride(), 16);

        assert!(BLIT_ATTRIBUTES
            .iter()
            .all(|a| a.format() == wgpu::VertexFormat::Float32x2));
    }

    #[test]
    fn stroke_table_fits_default_vertex_buffer_limit() {
        assert!(STROKE_ATTRIBUTES.len() as u32 <= wgpu::Limits::default().max_vertex_buffers);
    }
}
