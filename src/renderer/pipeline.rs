//! WebGPU sprite pipeline setup

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;
use wgpu::util::DeviceExt;

use super::hud::HudFrame;
use super::sprites::{SpriteBatch, TextureSlot};
use super::vertex::{Vertex, colors};
use crate::assets::{LoadedAssets, TextureAsset, TextureFilter};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Screen size uniform (must match shader)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ScreenUniform {
    size: [f32; 2],
    _pad: [f32; 2],
}

impl ScreenUniform {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: [width.max(1) as f32, height.max(1) as f32],
            _pad: [0.0; 2],
        }
    }
}

/// Surface extent the device can actually allocate. The screen uniform
/// keeps the requested size, so an oversized window is scaled down.
pub fn clamp_surface_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max = max_dimension.max(1);
    (width.clamp(1, max), height.clamp(1, max))
}

fn filter_mode(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Linear => wgpu::FilterMode::Linear,
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
    }
}

/// Background tiles wrap; sprites clamp so frame edges don't bleed
fn address_mode(slot: TextureSlot) -> wgpu::AddressMode {
    match slot {
        TextureSlot::Tile => wgpu::AddressMode::Repeat,
        _ => wgpu::AddressMode::ClampToEdge,
    }
}

fn egui_filter_mode(filter: egui::TextureFilter) -> wgpu::FilterMode {
    match filter {
        egui::TextureFilter::Linear => wgpu::FilterMode::Linear,
        egui::TextureFilter::Nearest => wgpu::FilterMode::Nearest,
    }
}

/// egui-managed texture (the font atlas), kept for partial updates
struct HudTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Main render state
pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,
    /// Same shader, premultiplied blending for egui output
    hud_pipeline: wgpu::RenderPipeline,
    screen_buffer: wgpu::Buffer,
    screen_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    /// One bind group per `TextureSlot`, indexed by `TextureSlot::index`
    texture_bind_groups: Vec<wgpu::BindGroup>,
    hud_textures: HashMap<egui::TextureId, HudTexture>,
    /// Viewport size in pixels
    pub size: (u32, u32),
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        assets: &LoadedAssets,
    ) -> Result<Self, RenderError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("fireball-dodge-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;
        log::info!("Using surface format: {:?}", surface_format);

        let (surface_width, surface_height) =
            clamp_surface_size(width, height, device.limits().max_texture_dimension_2d);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: surface_width,
            height: surface_height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        // group(0): screen size
        let screen_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen_uniform"),
            contents: bytemuck::bytes_of(&ScreenUniform::new(width, height)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let screen_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("screen_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let screen_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("screen_bind_group"),
            layout: &screen_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_buffer.as_entire_binding(),
            }],
        });

        // group(1): texture + sampler, one per slot
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let white = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let texture_bind_groups = TextureSlot::ALL
            .iter()
            .map(|&slot| {
                let (image, filter) = match slot.asset() {
                    Some(key) => {
                        let TextureAsset { image, filter, .. } = assets.get(key);
                        (image, *filter)
                    }
                    None => (&white, TextureFilter::Nearest),
                };
                let texture = create_texture(&device, image.width(), image.height());
                write_pixels(&queue, &texture, [0, 0], image.width(), image.height(), image);
                texture_bind_group(
                    &device,
                    &texture_layout,
                    &texture,
                    filter_mode(filter),
                    address_mode(slot),
                )
            })
            .collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[&screen_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            wgpu::BlendState::ALPHA_BLENDING,
            "sprite_pipeline",
        );
        let hud_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
            "hud_pipeline",
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            hud_pipeline,
            screen_buffer,
            screen_bind_group,
            texture_layout,
            texture_bind_groups,
            hud_textures: HashMap::new(),
            size: (width, height),
        })
    }

    /// Largest texture side the device accepts
    pub fn max_texture_side(&self) -> usize {
        self.device.limits().max_texture_dimension_2d as usize
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            let (width, height) = clamp_surface_size(
                new_width,
                new_height,
                self.device.limits().max_texture_dimension_2d,
            );
            if (width, height) != (new_width, new_height) {
                log::warn!(
                    "Surface {}x{} exceeds the device limit, using {}x{}",
                    new_width,
                    new_height,
                    width,
                    height
                );
            }
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.queue.write_buffer(
                &self.screen_buffer,
                0,
                bytemuck::bytes_of(&ScreenUniform::new(new_width, new_height)),
            );
        }
    }

    /// Create, replace or patch egui textures
    fn apply_hud_textures(&mut self, hud: &HudFrame) {
        for (id, delta) in &hud.textures.set {
            let egui::ImageData::Color(image) = &delta.image;
            let [w, h] = image.size;
            let (w, h) = (w as u32, h as u32);
            if w == 0 || h == 0 {
                continue;
            }

            match (delta.pos, self.hud_textures.get(id)) {
                (Some([x, y]), Some(existing)) => {
                    write_pixels(&self.queue, &existing.texture, [x as u32, y as u32], w, h, image.as_raw());
                }
                (Some(_), None) => {
                    log::warn!("Patch for unknown HUD texture {:?}", id);
                }
                (None, _) => {
                    let texture = create_texture(&self.device, w, h);
                    write_pixels(&self.queue, &texture, [0, 0], w, h, image.as_raw());
                    let bind_group = texture_bind_group(
                        &self.device,
                        &self.texture_layout,
                        &texture,
                        egui_filter_mode(delta.options.magnification),
                        wgpu::AddressMode::ClampToEdge,
                    );
                    self.hud_textures.insert(*id, HudTexture { texture, bind_group });
                }
            }
        }
    }

    /// Upload the batch and the overlay and draw them
    pub fn render(&mut self, batch: &SpriteBatch, hud: &HudFrame) -> Result<(), wgpu::SurfaceError> {
        self.apply_hud_textures(hud);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        // Recreated each frame; sprite counts are small
        let vertex_buffer = (!batch.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("vertex_buffer"),
                    contents: bytemuck::cast_slice(&batch.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
        let hud_buffer = (!hud.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("hud_vertex_buffer"),
                    contents: bytemuck::cast_slice(&hud.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        {
            let [r, g, b, a] = colors::BACKGROUND.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(vertex_buffer) = &vertex_buffer {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.screen_bind_group, &[]);
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                for draw in &batch.draws {
                    render_pass.set_bind_group(1, &self.texture_bind_groups[draw.slot.index()], &[]);
                    render_pass.draw(draw.vertices.clone(), 0..1);
                }
            }

            if let Some(hud_buffer) = &hud_buffer {
                render_pass.set_pipeline(&self.hud_pipeline);
                render_pass.set_bind_group(0, &self.screen_bind_group, &[]);
                render_pass.set_vertex_buffer(0, hud_buffer.slice(..));
                for draw in &hud.draws {
                    let Some(texture) = self.hud_textures.get(&draw.texture) else {
                        continue;
                    };
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    render_pass.draw(draw.vertices.clone(), 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for id in &hud.textures.free {
            self.hud_textures.remove(id);
        }

        Ok(())
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn create_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("sprite_texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

/// Write tightly packed RGBA8 rows at `origin`
fn write_pixels(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    origin: [u32; 2],
    width: u32,
    height: u32,
    rgba: &[u8],
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: origin[0],
                y: origin[1],
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &wgpu::Texture,
    filter: wgpu::FilterMode,
    wrap: wgpu::AddressMode,
) -> wgpu::BindGroup {
    let view = texture.create_view(&Default::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("sprite_sampler"),
        address_mode_u: wrap,
        address_mode_v: wrap,
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    });

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_size_clamped_to_device_limit() {
        assert_eq!(clamp_surface_size(3840, 2160, 2048), (2048, 2048));
        assert_eq!(clamp_surface_size(2560, 1440, 8192), (2560, 1440));
        assert_eq!(clamp_surface_size(0, 600, 2048), (1, 600));
        assert_eq!(clamp_surface_size(800, 600, 0), (1, 1));
    }

    #[test]
    fn test_screen_uniform_never_zero() {
        let uniform = ScreenUniform::new(0, 0);
        assert_eq!(uniform.size, [1.0, 1.0]);
    }

    #[test]
    fn test_sampler_modes() {
        assert_eq!(filter_mode(TextureFilter::Nearest), wgpu::FilterMode::Nearest);
        assert_eq!(address_mode(TextureSlot::Tile), wgpu::AddressMode::Repeat);
        assert_eq!(
            address_mode(TextureSlot::Player),
            wgpu::AddressMode::ClampToEdge
        );
        assert_eq!(
            egui_filter_mode(egui::TextureFilter::Linear),
            wgpu::FilterMode::Linear
        );
    }
}
