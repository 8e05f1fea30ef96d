use bytemuck::{Pod, Zeroable};
use wgpu::{
    BindGroupLayout, CommandEncoder, Device, Queue, RenderPipeline, Sampler, TextureFormat,
    TextureView,
};

use crate::parallax::Transform;

/// Both slot layers in one pass: cover-fit, parallax shift, then
/// `a * opacity_a + b * opacity_b` over black.
const LAYER_SHADER: &str = r#"
struct LayerUniforms {
    opacity: vec2f,
    _pad: vec2f,
    uv_scale: vec2f,
    uv_offset: vec2f,
}

@group(0) @binding(0) var tex_a: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;
@group(0) @binding(2) var tex_b: texture_2d<f32>;
@group(0) @binding(3) var<uniform> u: LayerUniforms;

struct VertexOutput {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VertexOutput {
    let x = f32(i32(vi & 1u) * 4) - 1.0;
    let y = f32(i32(vi & 2u) * 2) - 1.0;
    var out: VertexOutput;
    out.position = vec4f(x, y, 0.0, 1.0);
    out.uv = vec2f((x + 1.0) * 0.5, (1.0 - y) * 0.5);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4f {
    let uv = (in.uv - vec2f(0.5)) * u.uv_scale + vec2f(0.5) + u.uv_offset;
    let a = textureSample(tex_a, samp, uv).rgb;
    let b = textureSample(tex_b, samp, uv).rgb;
    return vec4f(a * u.opacity.x + b * u.opacity.y, 1.0);
}
"#;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LayerUniforms {
    pub opacity: [f32; 2],
    pub _pad: [f32; 2],
    pub uv_scale: [f32; 2],
    pub uv_offset: [f32; 2],
}

/// Cover-fit the media into the viewport, zoomed by the transform's scale
/// plus enough overscan that a shift of `overscan_px` never shows an edge.
pub fn compute_layer_uniforms(
    media: (u32, u32),
    viewport: (u32, u32),
    transform: &Transform,
    overscan_px: f32,
    opacity: (f32, f32),
) -> LayerUniforms {
    let vw = viewport.0.max(1) as f32;
    let vh = viewport.1.max(1) as f32;
    let media_aspect = media.0.max(1) as f32 / media.1.max(1) as f32;
    let viewport_aspect = vw / vh;

    // Fraction of the media visible along each axis at cover fit
    let (cover_x, cover_y) = if media_aspect > viewport_aspect {
        (viewport_aspect / media_aspect, 1.0)
    } else {
        (1.0, media_aspect / viewport_aspect)
    };

    let overscan = 1.0 + 2.0 * overscan_px.max(0.0) / vw.min(vh);
    let zoom = (transform.scale * overscan).max(f32::EPSILON);
    let scale_x = cover_x / zoom;
    let scale_y = cover_y / zoom;

    // Moving the layer right means sampling further left
    let offset_x = -transform.translate_x / vw * scale_x;
    let offset_y = -transform.translate_y / vh * scale_y;

    LayerUniforms {
        opacity: [opacity.0, opacity.1],
        _pad: [0.0; 2],
        uv_scale: [scale_x, scale_y],
        uv_offset: [offset_x, offset_y],
    }
}

/// Draws the two crossfade layers straight to the surface.
pub struct LayerCompositor {
    pipeline: RenderPipeline,
    bgl: BindGroupLayout,
    sampler: Sampler,
    uniform_buffer: wgpu::Buffer,
}

impl LayerCompositor {
    pub fn new(device: &Device, surface_format: TextureFormat) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("layers"),
            source: wgpu::ShaderSource::Wgsl(LAYER_SHADER.into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("layers_bgl"),
            entries: &[
                // binding 0: slot A
                texture_entry(0),
                // binding 1: shared sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // binding 2: slot B
                texture_entry(2),
                // binding 3: opacities + fit
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<LayerUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("layers_layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("layers_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("layers_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("layers_uniform"),
            size: std::mem::size_of::<LayerUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bgl,
            sampler,
            uniform_buffer,
        }
    }

    /// Render both layers into `target`.
    pub fn render(
        &self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        layer_a: &TextureView,
        layer_b: &TextureView,
        uniforms: &LayerUniforms,
    ) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("layers_bg"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(layer_a),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(layer_b),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("layers_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1); // fullscreen triangle
    }
}
