//! Popup overlay drawn on top of the 3D scene.
//!
//! The popup box is a single quad positioned through a uniform. With the `ui`
//! feature the label is rendered into it with glyphon.

use wgpu::util::DeviceExt;

use crate::{pipelines::basic::mk_render_pipeline, viewer::popup::Popup};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayUniform {
    /// left, top, right, bottom in normalized device coordinates
    pub rect: [f32; 4],
    pub color: [f32; 4],
}

/// Converts a popup box in window pixels to normalized device coordinates.
pub fn popup_rect(popup: &Popup, size: (f32, f32), surface: (u32, u32)) -> [f32; 4] {
    let width = surface.0.max(1) as f32;
    let height = surface.1.max(1) as f32;
    let x = |px: f32| px / width * 2.0 - 1.0;
    let y = |px: f32| 1.0 - px / height * 2.0;
    [
        x(popup.left),
        y(popup.top),
        x(popup.left + size.0),
        y(popup.top + size.1),
    ]
}

pub struct OverlayResources {
    pipeline: wgpu::RenderPipeline,
    uniform: OverlayUniform,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    size: (f32, f32),
    visible: bool,
    #[cfg(feature = "ui")]
    text: text::TextOverlay,
}

impl std::fmt::Debug for OverlayResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayResources")
            .field("uniform", &self.uniform)
            .field("visible", &self.visible)
            .finish()
    }
}

impl OverlayResources {
    pub fn new(
        device: &wgpu::Device,
        #[cfg_attr(not(feature = "ui"), allow(unused_variables))] queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
        size: (f32, f32),
        color: [f32; 4],
    ) -> Self {
        let uniform = OverlayUniform {
            rect: [0.0; 4],
            color,
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("overlay_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("overlay_bind_group"),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
        };
        // Drawn in its own pass after the scene, so no depth testing
        let pipeline = mk_render_pipeline(
            device,
            &layout,
            config.format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            None,
            None,
            &[],
            shader,
        );
        Self {
            pipeline,
            uniform,
            buffer,
            bind_group,
            size,
            visible: false,
            #[cfg(feature = "ui")]
            text: text::TextOverlay::new(device, queue, config.format),
        }
    }

    /// Moves the box to `popup`, or hides it.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        popup: Option<&Popup>,
        surface: (u32, u32),
    ) {
        #[cfg(not(feature = "ui"))]
        let _ = device;
        self.visible = popup.is_some();
        let Some(popup) = popup else {
            return;
        };
        self.uniform.rect = popup_rect(popup, self.size, surface);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        #[cfg(feature = "ui")]
        self.text.prepare(device, queue, popup, surface);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if !self.visible {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..6, 0..1);
        #[cfg(feature = "ui")]
        self.text.render(render_pass);
    }
}

#[cfg(feature = "ui")]
mod text {
    use glyphon::{
        Attrs, Buffer, Cache, Color, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache,
        TextArea, TextAtlas, TextBounds, TextRenderer, Viewport,
    };

    use crate::viewer::popup::Popup;

    const FONT_SIZE: f32 = 16.0;
    const PADDING: f32 = 6.0;

    pub struct TextOverlay {
        font_system: FontSystem,
        swash_cache: SwashCache,
        viewport: Viewport,
        atlas: TextAtlas,
        renderer: TextRenderer,
        buffer: Buffer,
    }

    impl TextOverlay {
        pub fn new(
            device: &wgpu::Device,
            queue: &wgpu::Queue,
            format: wgpu::TextureFormat,
        ) -> Self {
            let mut font_system = FontSystem::new();
            let swash_cache = SwashCache::new();
            let cache = Cache::new(device);
            let viewport = Viewport::new(device, &cache);
            let mut atlas = TextAtlas::new(device, queue, &cache, format);
            let renderer =
                TextRenderer::new(&mut atlas, device, wgpu::MultisampleState::default(), None);
            let buffer = Buffer::new(&mut font_system, Metrics::new(FONT_SIZE, FONT_SIZE * 1.2));
            Self {
                font_system,
                swash_cache,
                viewport,
                atlas,
                renderer,
                buffer,
            }
        }

        pub fn prepare(
            &mut self,
            device: &wgpu::Device,
            queue: &wgpu::Queue,
            popup: &Popup,
            surface: (u32, u32),
        ) {
            self.viewport.update(
                queue,
                Resolution {
                    width: surface.0,
                    height: surface.1,
                },
            );
            self.buffer.set_size(
                &mut self.font_system,
                Some(surface.0 as f32),
                Some(surface.1 as f32),
            );
            self.buffer.set_text(
                &mut self.font_system,
                &popup.label,
                &Attrs::new().family(Family::SansSerif),
                Shaping::Advanced,
                None,
            );
            self.buffer.shape_until_scroll(&mut self.font_system, false);
            let area = TextArea {
                buffer: &self.buffer,
                left: popup.left + PADDING,
                top: popup.top + PADDING,
                scale: 1.0,
                bounds: TextBounds {
                    left: 0,
                    top: 0,
                    right: surface.0 as i32,
                    bottom: surface.1 as i32,
                },
                default_color: Color::rgb(20, 20, 20),
                custom_glyphs: &[],
            };
            if let Err(e) = self.renderer.prepare(
                device,
                queue,
                &mut self.font_system,
                &mut self.atlas,
                &self.viewport,
                [area],
                &mut self.swash_cache,
            ) {
                log::warn!("Could not prepare popup text: {}", e);
            }
        }

        pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
            if let Err(e) = self.renderer.render(&self.atlas, &self.viewport, render_pass) {
                log::warn!("Could not render popup text: {}", e);
            }
        }
    }
}
