use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PortalVertex {
    pub position: [f32; 3],
}

impl PortalVertex {
    pub fn from_world(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<PortalVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Mirrors `PortalParams` in `portal_flat.wgsl`: the combined model-view-projection matrix and a
/// flat colour.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PortalParamsUniform {
    pub mvp: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl PortalParamsUniform {
    pub fn new(mvp: Mat4, color: Vec3) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
        }
    }
}

impl Default for PortalParamsUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Vec3::ONE)
    }
}

/// Render pipelines for a portal's own quad and border.
///
/// The quad is back-face culled so portals are one-sided; the border is drawn with culling off
/// so it reads from both sides. Neither pipeline touches the stencil buffer: callers that clip
/// the destination scene to the portal window wrap these draws in their own stencil passes.
#[derive(Debug)]
pub struct PortalPipeline {
    surface_pipeline: wgpu::RenderPipeline,
    border_pipeline: wgpu::RenderPipeline,
    params_bind_group_layout: wgpu::BindGroupLayout,
}

impl PortalPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Portal Flat Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/../../assets/shaders/portal_flat.wgsl"
                ))
                .into(),
            ),
        });

        let params_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Portal Params Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Portal Pipeline Layout"),
            bind_group_layouts: &[&params_bind_group_layout],
            push_constant_ranges: &[],
        });

        let surface_pipeline = create_pipeline(
            device,
            "Portal Surface Pipeline",
            &pipeline_layout,
            &shader,
            color_format,
            depth_format,
            Some(wgpu::Face::Back),
        );
        let border_pipeline = create_pipeline(
            device,
            "Portal Border Pipeline",
            &pipeline_layout,
            &shader,
            color_format,
            depth_format,
            None,
        );

        Self {
            surface_pipeline,
            border_pipeline,
            params_bind_group_layout,
        }
    }

    pub fn surface_pipeline(&self) -> &wgpu::RenderPipeline {
        &self.surface_pipeline
    }

    pub fn border_pipeline(&self) -> &wgpu::RenderPipeline {
        &self.border_pipeline
    }

    pub fn params_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.params_bind_group_layout
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[PortalVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
