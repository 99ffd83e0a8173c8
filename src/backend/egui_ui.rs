use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use winit::window::{Window, WindowId};

use crate::traits::ui::{ActivationState, UiDraw, UiInstanceId, UiLibrary};
use crate::traits::windowing::{WindowDimensions, WindowHandle};

use super::desktop::{EventSink, WinitWindowHandle};
use super::gpu_context::GpuContext;

// Style slots carried in the ActivationState color table. egui exposes far
// more style state than this; these are the fields we keep consistent
// across surfaces.
const STYLE_SLOT_PANEL_FILL: usize = 0;
const STYLE_SLOT_WINDOW_FILL: usize = 1;
const STYLE_SLOTS: usize = 2;

struct EguiInstance {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    window: Arc<Window>,
    window_id: WindowId,
    activation: ActivationState,
    frame_size: Option<WindowDimensions>,
}

/// egui-backed UI library.
///
/// egui contexts are independent of each other, but this backend still
/// funnels them through the single-current-instance model the runtime's
/// activation protocol expects, keeping the carried settings consistent
/// across surfaces.
pub struct EguiLibrary {
    gpu: GpuContext,
    events: EventSink,
    instances: HashMap<UiInstanceId, EguiInstance>,
    current: Option<UiInstanceId>,
    next_id: u64,
}

impl EguiLibrary {
    pub fn new(gpu: GpuContext, events: EventSink) -> Self {
        Self {
            gpu,
            events,
            instances: HashMap::new(),
            current: None,
            next_id: 1,
        }
    }

    fn instance_mut(&mut self, id: UiInstanceId) -> Result<&mut EguiInstance> {
        self.instances
            .get_mut(&id)
            .ok_or_else(|| anyhow!("unknown ui instance {id:?}"))
    }

    /// Route buffered window events to the instances they belong to
    fn drain_events(&mut self) {
        let drained: Vec<_> = match self.events.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(_) => return,
        };
        for (window_id, event) in drained {
            for instance in self.instances.values_mut() {
                if instance.window_id == window_id {
                    let _ = instance.state.on_window_event(&instance.window, &event);
                    break;
                }
            }
        }
    }
}

impl UiLibrary for EguiLibrary {
    fn create_instance(&mut self, window: &dyn WindowHandle) -> Result<UiInstanceId> {
        let handle = window
            .as_any()
            .downcast_ref::<WinitWindowHandle>()
            .ok_or_else(|| anyhow!("window is not a desktop window"))?;
        let winit_window = handle
            .window()
            .ok_or_else(|| anyhow!("window already destroyed"))?
            .clone();
        let format = handle
            .surface_format()
            .ok_or_else(|| anyhow!("window surface is not configured"))?;

        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &winit_window,
            Some(winit_window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            self.gpu.device(),
            format,
            egui_wgpu::RendererOptions::default(),
        );

        let activation = ActivationState {
            style: snapshot_style(&ctx),
            ..ActivationState::default()
        };

        let id = UiInstanceId(self.next_id);
        self.next_id += 1;
        let window_id = winit_window.id();
        self.instances.insert(
            id,
            EguiInstance {
                ctx,
                state,
                renderer,
                window: winit_window,
                window_id,
                activation,
                frame_size: None,
            },
        );
        Ok(id)
    }

    fn destroy_instance(&mut self, id: UiInstanceId) {
        self.instances.remove(&id);
        if self.current == Some(id) {
            self.current = None;
        }
    }

    fn current_instance(&self) -> Option<UiInstanceId> {
        self.current
    }

    fn set_current_instance(&mut self, id: UiInstanceId) {
        self.current = Some(id);
    }

    fn activation_state(&self, id: UiInstanceId) -> ActivationState {
        self.instances
            .get(&id)
            .map(|instance| {
                let mut state = instance.activation.clone();
                // carry the context's live style, not the one cached at
                // creation or the last apply
                state.style = snapshot_style(&instance.ctx);
                state
            })
            .unwrap_or_default()
    }

    fn apply_activation_state(&mut self, id: UiInstanceId, state: &ActivationState) {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.activation = state.clone();
            apply_style(&instance.ctx, &state.style);
        }
    }

    fn begin_frame(
        &mut self,
        id: UiInstanceId,
        _window: &mut dyn WindowHandle,
        size: WindowDimensions,
    ) -> Result<()> {
        self.drain_events();
        let instance = self.instance_mut(id)?;
        let raw_input = instance.state.take_egui_input(&instance.window);
        instance.ctx.begin_pass(raw_input);
        instance.activation.initialized = true;
        instance.frame_size = Some(size);
        Ok(())
    }

    fn host_region(
        &mut self,
        id: UiInstanceId,
        label: &str,
        content: &mut dyn FnMut(&mut dyn UiDraw),
    ) -> Result<()> {
        let instance = self.instance_mut(id)?;
        // CentralPanel fills the window with no title bar, resize handles,
        // or scrollbars; the pushed id keeps widget state per surface.
        egui::CentralPanel::default().show(&instance.ctx, |ui| {
            ui.push_id(label, |ui| {
                let mut draw = EguiDraw { ui };
                content(&mut draw);
            });
        });
        Ok(())
    }

    fn end_frame(&mut self, id: UiInstanceId, window: &mut dyn WindowHandle) -> Result<()> {
        let gpu = self.gpu.clone();
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or_else(|| anyhow!("unknown ui instance {id:?}"))?;
        let frame_size = instance
            .frame_size
            .take()
            .ok_or_else(|| anyhow!("end_frame without begin_frame"))?;
        let handle = window
            .as_any_mut()
            .downcast_mut::<WinitWindowHandle>()
            .ok_or_else(|| anyhow!("window is not a desktop window"))?;

        let full_output = instance.ctx.end_pass();
        instance
            .state
            .handle_platform_output(&instance.window, full_output.platform_output);

        let tris = instance
            .ctx
            .tessellate(full_output.shapes, instance.ctx.pixels_per_point());
        for (tex_id, image_delta) in &full_output.textures_delta.set {
            instance
                .renderer
                .update_texture(gpu.device(), gpu.queue(), *tex_id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [frame_size.width.max(1), frame_size.height.max(1)],
            pixels_per_point: instance.window.scale_factor() as f32,
        };

        let surface_frame = handle.acquire_frame()?;
        let view = surface_frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ui encoder"),
        });
        instance.renderer.update_buffers(
            gpu.device(),
            gpu.queue(),
            &mut encoder,
            &tris,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ui pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // SAFETY: the render pass borrows the encoder, but egui-wgpu
            // wants 'static. The pass is dropped before the encoder is used
            // again.
            let render_pass_static = unsafe {
                std::mem::transmute::<&mut wgpu::RenderPass<'_>, &mut wgpu::RenderPass<'static>>(
                    &mut render_pass,
                )
            };
            instance
                .renderer
                .render(render_pass_static, &tris, &screen_descriptor);
        }

        for tex_id in &full_output.textures_delta.free {
            instance.renderer.free_texture(tex_id);
        }

        gpu.queue().submit(std::iter::once(encoder.finish()));
        handle.set_pending_frame(surface_frame);
        Ok(())
    }
}

struct EguiDraw<'a> {
    ui: &'a mut egui::Ui,
}

impl UiDraw for EguiDraw<'_> {
    fn text(&mut self, text: &str) {
        self.ui.label(text);
    }

    fn button(&mut self, label: &str) -> bool {
        self.ui.button(label).clicked()
    }
}

fn snapshot_style(ctx: &egui::Context) -> Vec<[f32; 4]> {
    let visuals = &ctx.style().visuals;
    let mut table = vec![[0.0; 4]; STYLE_SLOTS];
    table[STYLE_SLOT_PANEL_FILL] = color_to_rgba(visuals.panel_fill);
    table[STYLE_SLOT_WINDOW_FILL] = color_to_rgba(visuals.window_fill);
    table
}

fn apply_style(ctx: &egui::Context, table: &[[f32; 4]]) {
    let mut style = (*ctx.style()).clone();
    if let Some(color) = table.get(STYLE_SLOT_PANEL_FILL) {
        style.visuals.panel_fill = rgba_to_color(*color);
    }
    if let Some(color) = table.get(STYLE_SLOT_WINDOW_FILL) {
        style.visuals.window_fill = rgba_to_color(*color);
    }
    ctx.set_style(style);
}

fn color_to_rgba(color: egui::Color32) -> [f32; 4] {
    [
        color.r() as f32 / 255.0,
        color.g() as f32 / 255.0,
        color.b() as f32 / 255.0,
        color.a() as f32 / 255.0,
    ]
}

fn rgba_to_color(rgba: [f32; 4]) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(
        (rgba[0] * 255.0) as u8,
        (rgba[1] * 255.0) as u8,
        (rgba[2] * 255.0) as u8,
        (rgba[3] * 255.0) as u8,
    )
}
