use glam::Mat4;
use portalis_geom::geometry::{BORDER_VERTEX_COUNT, QUAD_VERTEX_COUNT};
use portalis_geom::Portal;
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

use crate::pipeline::{PortalParamsUniform, PortalPipeline, PortalVertex};

struct PortalGpuResources {
    quad_vertex_buffer: wgpu::Buffer,
    border_vertex_buffer: wgpu::Buffer,
    quad_params_buffer: wgpu::Buffer,
    border_params_buffer: wgpu::Buffer,
    quad_params_bind_group: wgpu::BindGroup,
    border_params_bind_group: wgpu::BindGroup,
}

/// GPU copy of one portal's quad and border.
///
/// Buffers only exist between [`initialize`](Self::initialize) and [`cleanup`](Self::cleanup);
/// both are idempotent and must run on the thread that owns the device. Dropping the mesh cleans
/// up as well.
#[derive(Default)]
pub struct PortalMesh {
    gpu: Option<PortalGpuResources>,
}

impl PortalMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    /// Uploads the portal's cached world-space geometry. No-op if already initialized.
    pub fn initialize(&mut self, device: &wgpu::Device, pipeline: &PortalPipeline, portal: &Portal) {
        if self.gpu.is_some() {
            return;
        }

        let quad_vertices = portal.quad_vertices().map(PortalVertex::from_world);
        let border_vertices = portal.border_vertices().map(PortalVertex::from_world);

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Portal Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let border_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Portal Border Vertex Buffer"),
            contents: bytemuck::cast_slice(&border_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let (quad_params_buffer, quad_params_bind_group) =
            create_params(device, pipeline, "Portal Quad Params");
        let (border_params_buffer, border_params_bind_group) =
            create_params(device, pipeline, "Portal Border Params");

        self.gpu = Some(PortalGpuResources {
            quad_vertex_buffer,
            border_vertex_buffer,
            quad_params_buffer,
            border_params_buffer,
            quad_params_bind_group,
            border_params_bind_group,
        });
        debug!("Initialized portal mesh at {}", portal.center());
    }

    /// Releases the GPU buffers. No-op if never initialized.
    pub fn cleanup(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.quad_vertex_buffer.destroy();
            gpu.border_vertex_buffer.destroy();
            gpu.quad_params_buffer.destroy();
            gpu.border_params_buffer.destroy();
            debug!("Released portal mesh buffers");
        }
    }

    /// Draws the portal window with `mvp` and the portal's colour. Returns the number of draw
    /// calls issued.
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        render_pass: &mut wgpu::RenderPass<'_>,
        pipeline: &PortalPipeline,
        portal: &Portal,
        mvp: Mat4,
    ) -> u32 {
        let Some(gpu) = self.gpu.as_ref() else {
            warn!("Portal mesh not initialized, skipping quad draw");
            return 0;
        };

        let params = PortalParamsUniform::new(mvp, portal.color());
        queue.write_buffer(&gpu.quad_params_buffer, 0, bytemuck::bytes_of(&params));

        render_pass.set_pipeline(pipeline.surface_pipeline());
        render_pass.set_bind_group(0, &gpu.quad_params_bind_group, &[]);
        render_pass.set_vertex_buffer(0, gpu.quad_vertex_buffer.slice(..));
        render_pass.draw(0..QUAD_VERTEX_COUNT as u32, 0..1);
        1
    }

    /// Draws the border ring, visible from both sides.
    pub fn render_border(
        &self,
        queue: &wgpu::Queue,
        render_pass: &mut wgpu::RenderPass<'_>,
        pipeline: &PortalPipeline,
        portal: &Portal,
        mvp: Mat4,
    ) -> u32 {
        let Some(gpu) = self.gpu.as_ref() else {
            warn!("Portal mesh not initialized, skipping border draw");
            return 0;
        };

        let params = PortalParamsUniform::new(mvp, portal.color());
        queue.write_buffer(&gpu.border_params_buffer, 0, bytemuck::bytes_of(&params));

        render_pass.set_pipeline(pipeline.border_pipeline());
        render_pass.set_bind_group(0, &gpu.border_params_bind_group, &[]);
        render_pass.set_vertex_buffer(0, gpu.border_vertex_buffer.slice(..));
        render_pass.draw(0..BORDER_VERTEX_COUNT as u32, 0..1);
        1
    }
}

impl Drop for PortalMesh {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn create_params(
    device: &wgpu::Device,
    pipeline: &PortalPipeline,
    label: &str,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer_label = format!("{label} Buffer");
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&buffer_label),
        contents: bytemuck::bytes_of(&PortalParamsUniform::default()),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group_label = format!("{label} Bind Group");
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&bind_group_label),
        layout: pipeline.params_bind_group_layout(),
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });

    (buffer, bind_group)
}
