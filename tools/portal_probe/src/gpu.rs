//! Headless draw of every portal's quad and border, to exercise the wgpu path without a window.

use std::fmt;

use portalis_geom::scene::{BuiltScene, SceneDesc};
use portalis_geom::ClipDepth;
use portalis_render::{PortalMesh, PortalPipeline};
use tracing::info;

const TARGET_SIZE: u32 = 256;
const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug)]
pub enum ProbeGpuError {
    RequestAdapter(wgpu::RequestAdapterError),
    RequestDevice(wgpu::RequestDeviceError),
}

impl fmt::Display for ProbeGpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestAdapter(err) => write!(f, "failed to request adapter: {err}"),
            Self::RequestDevice(err) => write!(f, "failed to request device: {err}"),
        }
    }
}

impl std::error::Error for ProbeGpuError {}

pub fn render_offscreen(scene: &SceneDesc, built: &BuiltScene) -> Result<u32, ProbeGpuError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .map_err(ProbeGpuError::RequestAdapter)?;
    info!("Using adapter {}", adapter.get_info().name);

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Portal Probe Device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_defaults(),
        memory_hints: wgpu::MemoryHints::MemoryUsage,
        trace: wgpu::Trace::Off,
    }))
    .map_err(ProbeGpuError::RequestDevice)?;

    let pipeline = PortalPipeline::new(&device, COLOR_FORMAT, Some(DEPTH_FORMAT));
    let color_view = create_target(&device, "Portal Probe Color Target", COLOR_FORMAT);
    let depth_view = create_target(&device, "Portal Probe Depth Target", DEPTH_FORMAT);

    let registry = &built.registry;
    let mut meshes: Vec<_> = registry
        .iter()
        .map(|(id, portal)| {
            let mut mesh = PortalMesh::new();
            mesh.initialize(&device, &pipeline, portal);
            // A second call must not reallocate.
            mesh.initialize(&device, &pipeline, portal);
            (id, mesh)
        })
        .collect();

    // Portal surfaces are drawn with the viewer's own matrices; the vertices are already in
    // world space, so the model part of the mvp is the identity.
    let view_proj =
        scene.camera.projection_matrix(ClipDepth::ZeroToOne) * scene.camera.view_matrix();

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Portal Probe Encoder"),
    });
    let mut draw_calls = 0;
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Portal Probe Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for (id, mesh) in &meshes {
            let Some(portal) = registry.get(*id) else {
                continue;
            };
            draw_calls += mesh.render(&queue, &mut render_pass, &pipeline, portal, view_proj);
            draw_calls += mesh.render_border(&queue, &mut render_pass, &pipeline, portal, view_proj);
        }
    }
    queue.submit(std::iter::once(encoder.finish()));

    for (_, mesh) in &mut meshes {
        mesh.cleanup();
    }
    info!("Rendered {} portals offscreen", meshes.len());

    Ok(draw_calls)
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: TARGET_SIZE,
            height: TARGET_SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
