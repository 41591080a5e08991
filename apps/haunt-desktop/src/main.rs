use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use haunt_assembler::{HauntSession, SceneConfig};
use haunt_common::Viewport;
use haunt_input::{Action, DebugPanel, InputEvent, InputMapper};
use haunt_render::{OrbitControls, PerspectiveCamera, extract_frame};
use haunt_render_wgpu::{RenderStats, WgpuRenderer};
use haunt_stream::AssetStreamer;
use haunt_tools::{
    CAMERA_AXIS, CameraTweaks, FLOOR_DISPLACEMENT_BIAS, FLOOR_DISPLACEMENT_SCALE, FloorTweaks,
    FrameTimer, SceneInspector, TweakRange,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::Key;
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "haunt-desktop", about = "Haunted house scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML); defaults apply to anything it omits
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset root directory, overriding the config
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Seed for grave placement
    #[arg(long)]
    seed: Option<u64>,
}

/// Application state.
struct AppState {
    session: HauntSession,
    streamer: AssetStreamer,
    camera: PerspectiveCamera,
    orbit: OrbitControls,
    viewport: Viewport,
    input: InputMapper,
    panel: DebugPanel,
    timer: FrameTimer,
    stats: RenderStats,
}

impl AppState {
    fn new(session: HauntSession, streamer: AssetStreamer) -> Self {
        let viewport = Viewport::default();
        let camera = session.config.camera.camera(viewport.aspect());
        let orbit = session.config.camera.orbit_controls();
        Self {
            session,
            streamer,
            camera,
            orbit,
            viewport,
            input: InputMapper::default(),
            panel: DebugPanel::default(),
            timer: FrameTimer::default(),
            stats: RenderStats::default(),
        }
    }

    /// Drain finished loads, advance the animation, then the controls.
    fn update(&mut self, now: Instant) {
        let events = self.streamer.poll();
        if !events.is_empty() {
            let applied = self.session.apply_all(events);
            tracing::debug!(
                "applied {applied} loads, state {:?}",
                self.session.tracker.state()
            );
        }

        let tick = self.session.tick(now, self.camera.position);
        self.timer.record(tick.delta);
        if self.orbit.is_moving() {
            self.orbit.update(&mut self.camera);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.apply_viewport(&viewport);
        tracing::debug!(
            "viewport {}x{} at ratio {}",
            viewport.width,
            viewport.height,
            viewport.pixel_ratio
        );
    }

    fn handle_input(&mut self, event: &InputEvent, drag_height: f32) {
        match self.input.handle(event) {
            Some(Action::ToggleDebugPanel) => {
                let visible = self.panel.toggle();
                tracing::info!("debug panel {}", if visible { "shown" } else { "hidden" });
            }
            Some(Action::Orbit(delta)) => self.orbit.rotate(delta, drag_height),
            None => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.panel.is_visible() {
            return;
        }

        let floor_material = self.session.handles.floor_material;
        let summary = SceneInspector::summary(
            &self.session.scene,
            &self.session.tracker,
            self.session.frame_loop.ghost(),
        );

        egui::SidePanel::right("debug")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Haunted House");
                ui.separator();

                ui.label("Floor");
                if let Some(mut floor) = FloorTweaks::read(&self.session.scene, floor_material) {
                    let mut changed = slider(ui, &mut floor.displacement_scale, FLOOR_DISPLACEMENT_SCALE);
                    changed |= slider(ui, &mut floor.displacement_bias, FLOOR_DISPLACEMENT_BIAS);
                    if changed {
                        if let Err(e) = floor.apply(&mut self.session.scene, floor_material) {
                            tracing::warn!("floor tweak not applied: {e}");
                        }
                    }
                }

                ui.separator();
                ui.label("Camera");
                let mut camera = CameraTweaks::read(&self.camera);
                let mut changed = false;
                for (axis, value) in [
                    ("x", &mut camera.position.x),
                    ("y", &mut camera.position.y),
                    ("z", &mut camera.position.z),
                ] {
                    changed |= ui
                        .add(
                            egui::Slider::new(value, CAMERA_AXIS.min..=CAMERA_AXIS.max)
                                .step_by(f64::from(CAMERA_AXIS.step))
                                .text(axis),
                        )
                        .changed();
                }
                if changed {
                    camera.apply(&mut self.camera);
                    self.camera.look_at(self.orbit.target);
                }

                ui.separator();
                ui.heading("Scene");
                ui.label(format!("Nodes: {}  Meshes: {}", summary.nodes, summary.mesh_nodes));
                ui.label(format!(
                    "Materials: {}  Textures: {}",
                    summary.materials, summary.textures
                ));
                ui.label(format!("Lights: {}", summary.lights));
                ui.label(format!(
                    "Models: {:?} ({} loaded, {} failed)",
                    summary.load_state, summary.loads.models_loaded, summary.loads.models_failed
                ));
                ui.label(format!(
                    "Textures loaded: {} failed: {}",
                    summary.loads.textures_loaded, summary.loads.textures_failed
                ));
                if let Some(p) = summary.ghost_position {
                    ui.label(format!("Ghost: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                }

                ui.separator();
                ui.label(format!(
                    "{:.0} fps  {} draws  {} shadow draws",
                    self.timer.fps(),
                    self.stats.draw_calls,
                    self.stats.shadow_draw_calls
                ));
                if let Some(worst) = self.timer.worst() {
                    ui.label(format!("Worst frame: {:.1} ms", worst.as_secs_f64() * 1000.0));
                }
                ui.small("h: toggle panel | drag: orbit");
            });
    }
}

fn slider(ui: &mut egui::Ui, value: &mut f32, range: TweakRange) -> bool {
    ui.add(
        egui::Slider::new(value, range.min..=range.max)
            .step_by(f64::from(range.step))
            .text(range.label),
    )
    .changed()
}

/// The character a key press produced, if any.
fn key_text(event: &KeyEvent) -> Option<String> {
    match &event.logical_key {
        Key::Character(c) => Some(c.to_string()),
        _ => event.text.as_ref().map(|t| t.to_string()),
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Haunted House")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("haunt_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        self.state.resize(Viewport::from_physical(
            size.width,
            size.height,
            window.scale_factor(),
        ));
        let (width, height) = self.state.viewport.surface_size();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
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

        let renderer = WgpuRenderer::new(&device, &queue, surface_format, width, height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
        self.state
            .resize(Viewport::from_physical(size.width, size.height, scale));

        if let (Some(surface), Some(device), Some(config)) =
            (&self.surface, &self.device, &mut self.config)
        {
            let (width, height) = self.state.viewport.surface_size();
            config.width = width;
            config.height = height;
            surface.configure(device, config);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(device, width, height);
            }
        }
    }

    fn redraw(&mut self) {
        let Self {
            state,
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_ctx,
            egui_winit,
            egui_renderer,
        } = self;
        let (
            Some(window),
            Some(surface),
            Some(device),
            Some(queue),
            Some(config),
            Some(renderer),
            Some(egui_winit),
            Some(egui_renderer),
        ) = (
            window.as_ref(),
            surface.as_ref(),
            device.as_ref(),
            queue.as_ref(),
            config.as_ref(),
            renderer.as_mut(),
            egui_winit.as_mut(),
            egui_renderer.as_mut(),
        )
        else {
            return;
        };

        state.update(Instant::now());

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let frame = extract_frame(&state.session.scene, &state.camera);
        state.stats = renderer.render(device, queue, &view, &state.session.scene, &frame);

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialize graphics: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            if egui_winit.on_window_event(window, &event).consumed {
                return;
            }
        }

        let drag_height = self
            .window
            .as_ref()
            .map_or(1.0, |w| w.inner_size().height as f32);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.resize(new_size);
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                if let Some(key) = key_text(&event) {
                    self.state
                        .handle_input(&InputEvent::KeyPressed(key), drag_height);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: button_state,
                ..
            } => {
                let pressed = button_state == ElementState::Pressed;
                self.state
                    .handle_input(&InputEvent::PointerButton { pressed }, drag_height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.state
                    .handle_input(&InputEvent::PointerMoved(position), drag_height);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.handle_input(&InputEvent::PointerLeft, drag_height);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("haunt-desktop starting");

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(root) = cli.assets {
        config.assets.root = root;
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let session = HauntSession::new(config, &mut rng, Instant::now())?;
    let mut streamer = AssetStreamer::spawn()?;
    session.request_assets(&mut streamer)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(session, streamer));
    event_loop.run_app(&mut app)?;

    Ok(())
}
