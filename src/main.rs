use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::keyboard::{ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

use wormgrid::camera::{FrameScheduler, ManualFrames, ZoomDirection};
use wormgrid::config::Config;
use wormgrid::feed::{FeedClient, FeedSink, FeedUpdate, spawn_poller};
use wormgrid::panel::PanelRenderer;
use wormgrid::sprite::{SpriteRenderer, load_rgba};
use wormgrid::text::TextRenderer;
use wormgrid::ui;
use wormgrid::viewer::{Effect, Viewer};

/// Convert sRGB component (0-1) to linear for use as wgpu clear color.
fn srgb_to_linear(s: f64) -> f64 {
    if s <= 0.04045 {
        s / 12.92
    } else {
        ((s + 0.055) / 1.055).powf(2.4)
    }
}

/// Events injected into the winit loop from other threads.
#[derive(Debug)]
enum AppEvent {
    Feed(FeedUpdate),
}

/// Delivers poller results to the UI thread as user events.
struct ProxySink(EventLoopProxy<AppEvent>);

impl FeedSink for ProxySink {
    fn deliver(&self, update: FeedUpdate) -> bool {
        self.0.send_event(AppEvent::Feed(update)).is_ok()
    }
}

/// Frame requests go to the window's redraw queue.
struct WindowFrames<'a>(&'a Window);

impl FrameScheduler for WindowFrames<'_> {
    fn request_frame(&self) {
        self.0.request_redraw();
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    window: Arc<Window>,
}

/// Vertex ranges per renderer, in draw order: canvas below, overlay above.
struct FrameLayers {
    canvas_panels: Range<u32>,
    canvas_sprites: Range<u32>,
    canvas_text: Range<u32>,
    ui_panels: Range<u32>,
    ui_sprites: Range<u32>,
    ui_text: Range<u32>,
}

struct Renderers {
    panel: PanelRenderer,
    text: Option<TextRenderer>,
    sprite: Option<SpriteRenderer>,
}

impl GpuState {
    fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("failed to find a suitable GPU adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("wormgrid_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        ))
        .expect("failed to create GPU device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Self {
            surface,
            device,
            queue,
            config,
            window,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn render(&self, renderers: &Renderers, layers: &FrameLayers, clear: [f32; 4]) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                return;
            }
            Err(e) => {
                log::warn!("surface error: {e:?}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grid_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: srgb_to_linear(clear[0] as f64),
                            g: srgb_to_linear(clear[1] as f64),
                            b: srgb_to_linear(clear[2] as f64),
                            a: clear[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            renderers
                .panel
                .render(&mut render_pass, layers.canvas_panels.clone());
            if let Some(sprite) = &renderers.sprite {
                sprite.render(&mut render_pass, layers.canvas_sprites.clone());
            }
            if let Some(text) = &renderers.text {
                text.render(&mut render_pass, layers.canvas_text.clone());
            }
            renderers
                .panel
                .render(&mut render_pass, layers.ui_panels.clone());
            if let Some(sprite) = &renderers.sprite {
                sprite.render(&mut render_pass, layers.ui_sprites.clone());
            }
            if let Some(text) = &renderers.text {
                text.render(&mut render_pass, layers.ui_text.clone());
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Hand a URL to the platform's default handler.
fn open_in_browser(url: &str) {
    let result = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
    } else {
        std::process::Command::new("xdg-open").arg(url).spawn()
    };
    match result {
        Ok(_) => log::info!("opened {url}"),
        Err(e) => log::warn!("failed to open {url}: {e}"),
    }
}

struct App {
    config: Config,
    theme: ui::Theme,
    bindings: ui::KeyBindings,
    viewer: Viewer,
    ui_state: ui::UiState,
    ui_tree: ui::WidgetTree,
    gpu: Option<GpuState>,
    renderers: Option<Renderers>,
    modifiers: ModifiersState,
    /// The finger driving the canvas; other touches are ignored.
    active_touch: Option<u64>,
}

impl App {
    fn request_redraw(&self) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }

    fn apply_effect(&self, effect: Option<Effect>, event_loop: &ActiveEventLoop) {
        match effect {
            Some(Effect::OpenUrl(url)) => open_in_browser(&url),
            Some(Effect::Exit) => event_loop.exit(),
            None => {}
        }
    }

    fn perform(&mut self, action: ui::UiAction, event_loop: &ActiveEventLoop) {
        let effect = match &self.gpu {
            Some(gpu) => self.viewer.perform(action, &WindowFrames(&gpu.window)),
            None => self.viewer.perform(action, &ManualFrames),
        };
        self.apply_effect(effect, event_loop);
    }

    fn redraw(&mut self) {
        let (Some(gpu), Some(renderers)) = (self.gpu.as_ref(), self.renderers.as_mut()) else {
            return;
        };
        let frames = WindowFrames(&gpu.window);
        let now = Instant::now();
        let screen_w = gpu.config.width;
        let screen_h = gpu.config.height;

        // Camera step happens inside `frame`, before anything is drawn.
        let scene = self.viewer.frame(&self.theme, &frames);
        let view = self
            .viewer
            .panels_view(now, unix_millis(), self.ui_state.list_scroll);
        self.ui_tree = ui::build_panels(
            &view,
            &self.theme,
            ui::Size {
                width: screen_w as f32,
                height: screen_h as f32,
            },
        );

        let mut canvas = ui::DrawList::new();
        scene.draw(&mut canvas);
        let mut overlay = ui::DrawList::new();
        self.ui_tree.draw(&mut overlay);

        let panel = &mut renderers.panel;
        panel.begin_frame(&gpu.queue, screen_w, screen_h);
        for cmd in &canvas.panels {
            panel.add_command(cmd);
        }
        let canvas_panels = 0..panel.vertex_count();
        for cmd in &overlay.panels {
            panel.add_command(cmd);
        }
        let ui_panels = canvas_panels.end..panel.vertex_count();
        panel.flush(&gpu.queue, &gpu.device);

        let (canvas_text, ui_text) = match renderers.text.as_mut() {
            Some(text) => {
                text.begin_frame(&gpu.queue, screen_w, screen_h);
                for cmd in &canvas.texts {
                    text.prepare(cmd);
                }
                let canvas_text = 0..text.vertex_count();
                for cmd in &overlay.texts {
                    text.prepare(cmd);
                }
                let ui_text = canvas_text.end..text.vertex_count();
                text.flush(&gpu.queue, &gpu.device);
                (canvas_text, ui_text)
            }
            None => (0..0, 0..0),
        };

        let (canvas_sprites, ui_sprites) = match renderers.sprite.as_mut() {
            Some(sprite) => {
                sprite.begin_frame(&gpu.queue, screen_w, screen_h);
                for cmd in &canvas.sprites {
                    sprite.add_command(cmd);
                }
                let canvas_sprites = 0..sprite.vertex_count();
                for cmd in &overlay.sprites {
                    sprite.add_command(cmd);
                }
                let ui_sprites = canvas_sprites.end..sprite.vertex_count();
                sprite.flush(&gpu.queue, &gpu.device);
                (canvas_sprites, ui_sprites)
            }
            None => (0..0, 0..0),
        };

        let layers = FrameLayers {
            canvas_panels,
            canvas_sprites,
            canvas_text,
            ui_panels,
            ui_sprites,
            ui_text,
        };
        gpu.render(renderers, &layers, scene.clear);

        if self.viewer.needs_frame(now) {
            gpu.window.request_redraw();
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Worm Grid")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        let gpu = GpuState::new(window.clone());

        let panel = PanelRenderer::new(&gpu.device, gpu.surface_format());
        let text = match TextRenderer::new(
            &gpu.device,
            &gpu.queue,
            gpu.surface_format(),
            &self.config.font_path,
        ) {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!("{e}; text will not be drawn");
                None
            }
        };
        let sprite = match load_rgba(&self.config.agent_image_path) {
            Ok(img) => Some(SpriteRenderer::new(
                &gpu.device,
                &gpu.queue,
                gpu.surface_format(),
                &img,
            )),
            Err(e) => {
                log::warn!(
                    "failed to load agent image {}: {e}; using fallback glyph",
                    self.config.agent_image_path
                );
                None
            }
        };
        self.viewer.set_agent_image(sprite.is_some());

        let size = window.inner_size();
        self.viewer.resize(size.width as f32, size.height as f32);

        self.gpu = Some(gpu);
        self.renderers = Some(Renderers {
            panel,
            text,
            sprite,
        });
        window.request_redraw();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Feed(update) => {
                match &self.gpu {
                    Some(gpu) => self.viewer.apply_feed(update, &WindowFrames(&gpu.window)),
                    None => self.viewer.apply_feed(update, &ManualFrames),
                }
                self.request_redraw();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size);
                }
                self.viewer
                    .resize(new_size.width as f32, new_size.height as f32);
                self.request_redraw();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                let over_ui = self.ui_state.handle_cursor_moved(&self.ui_tree, x, y);
                // A drag keeps panning even when it crosses a widget.
                if self.viewer.is_dragging() || !over_ui {
                    self.viewer.pointer_moved(x, y, Instant::now());
                } else {
                    self.viewer.pointer_left();
                }
                self.request_redraw();
            }
            WindowEvent::CursorLeft { .. } => {
                self.viewer.pointer_left();
                self.ui_state.cancel_press();
                self.request_redraw();
            }
            WindowEvent::MouseInput {
                state: btn_state,
                button,
                ..
            } => {
                let (x, y) = self.ui_state.cursor;
                let ui_btn = match button {
                    MouseButton::Left => ui::MouseButton::Left,
                    MouseButton::Right => ui::MouseButton::Right,
                    MouseButton::Middle => ui::MouseButton::Middle,
                    _ => return,
                };
                let pressed = btn_state == ElementState::Pressed;
                let outcome =
                    self.ui_state
                        .handle_mouse_input(&self.ui_tree, ui_btn, pressed, x, y);

                if button == MouseButton::Left && !pressed {
                    self.viewer.pointer_released();
                }
                match outcome {
                    ui::PointerOutcome::Action(action) => self.perform(action, event_loop),
                    ui::PointerOutcome::Consumed => {}
                    ui::PointerOutcome::Ignored => {
                        if button == MouseButton::Left && pressed {
                            self.viewer.pointer_pressed(x, y);
                        }
                    }
                }
                self.request_redraw();
            }
            WindowEvent::Touch(touch) => {
                let (x, y) = (touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => {
                        if self.active_touch.is_some() {
                            return;
                        }
                        self.active_touch = Some(touch.id);
                        let outcome = self.ui_state.handle_mouse_input(
                            &self.ui_tree,
                            ui::MouseButton::Left,
                            true,
                            x,
                            y,
                        );
                        if outcome == ui::PointerOutcome::Ignored {
                            self.viewer.touch_started(x, y);
                        }
                    }
                    TouchPhase::Moved => {
                        if self.active_touch != Some(touch.id) {
                            return;
                        }
                        if self.viewer.is_dragging() {
                            self.viewer.pointer_moved(x, y, Instant::now());
                        }
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        if self.active_touch != Some(touch.id) {
                            return;
                        }
                        self.active_touch = None;
                        self.viewer.pointer_released();
                        if touch.phase == TouchPhase::Cancelled {
                            self.ui_state.cancel_press();
                        } else if let ui::PointerOutcome::Action(action) =
                            self.ui_state.handle_mouse_input(
                                &self.ui_tree,
                                ui::MouseButton::Left,
                                false,
                                x,
                                y,
                            )
                        {
                            self.perform(action, event_loop);
                        }
                    }
                }
                self.request_redraw();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                };
                // winit reports wheel-up as positive; lists scroll down on positive.
                if !self.ui_state.handle_scroll(&mut self.ui_tree, -lines) && lines != 0.0 {
                    let direction = if lines > 0.0 {
                        ZoomDirection::In
                    } else {
                        ZoomDirection::Out
                    };
                    self.viewer.wheel(direction);
                }
                self.request_redraw();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                let combo = ui::KeyCombo {
                    modifiers: ui::ModifierFlags {
                        shift: self.modifiers.shift_key(),
                        ctrl: self.modifiers.control_key(),
                        alt: self.modifiers.alt_key(),
                    },
                    key,
                };
                let Some(action) = self.bindings.lookup(combo) else {
                    return;
                };
                if action == ui::Action::NextTab {
                    self.ui_state.tab_switched();
                }
                let effect = match &self.gpu {
                    Some(gpu) => self.viewer.key_action(action, &WindowFrames(&gpu.window)),
                    None => self.viewer.key_action(action, &ManualFrames),
                };
                self.apply_effect(effect, event_loop);
                self.request_redraw();
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let config = Config::load(&Config::path_from_args(std::env::args()));

    let event_loop = EventLoop::<AppEvent>::with_user_event()
        .build()
        .expect("create event loop");

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let interval = Duration::from_secs(config.poll_interval_secs.max(1));
    match FeedClient::new(config.base_url.clone(), timeout) {
        Ok(client) => {
            if let Err(e) = spawn_poller(client, interval, ProxySink(event_loop.create_proxy())) {
                log::error!("failed to start feed poller: {e}");
            }
        }
        Err(e) => log::error!("{e}"),
    }

    let theme = ui::Theme::default();
    let viewer = Viewer::new(
        &config,
        &theme,
        (config.window_width as f32, config.window_height as f32),
    );
    let mut app = App {
        config,
        theme,
        bindings: ui::KeyBindings::defaults(),
        viewer,
        ui_state: ui::UiState::new(),
        ui_tree: ui::WidgetTree::new(),
        gpu: None,
        renderers: None,
        modifiers: ModifiersState::empty(),
        active_touch: None,
    };
    event_loop.run_app(&mut app).expect("run event loop");
}
