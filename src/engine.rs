//! The engine: one window, one GPU context, two shader programs and a
//! key-binding table.
//!
//! ```no_run
//! use quad_ngin::{Engine, EngineConfig};
//!
//! let mut engine = Engine::initialize(EngineConfig::default())?;
//! loop {
//!     while let Some(polled) = engine.poll_event() {
//!         if polled.is_exit() {
//!             return engine.destroy();
//!         }
//!     }
//!     engine.draw_triangle();
//!     engine.swap_buffers()?;
//! }
//! # Ok::<(), quad_ngin::EngineError>(())
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use cgmath::{Matrix4, SquareMatrix};
use image::RgbaImage;
use winit::window::Window;

use crate::{
    config::EngineConfig,
    context::{Context, GpuObjects, ResourceStats},
    data_structures::{
        texture::{BoundTexture, Texture, TextureHandle, TextureStore},
        vertex::{FULLSCREEN_QUAD, Triangle, quad},
    },
    diagnostics::Diagnostics,
    error::{EngineError, Result},
    input::{InputQueue, KeyBindings, PlatformEvent, Polled},
    pipelines::{
        basic::Layouts,
        shader::{ProgramKind, ProgramTarget, Programs, StageSource},
    },
    render::{FrameRenderer, Globals, animation_time},
    resources::{self, load_string},
    token::EngineToken,
    window::WindowPump,
};

/// Fields drop top to bottom: GPU objects before the device, the surface
/// before the event loop, and the token last.
pub struct Engine {
    renderer: FrameRenderer,
    textures: TextureStore,
    default_texture: BoundTexture,
    programs: Programs,
    layouts: Layouts,
    ctx: Context,
    window: Option<WindowPump>,
    input: InputQueue,
    config: EngineConfig,
    started: Instant,
    frames: u64,
    token: EngineToken,
}

fn program_target<'a>(
    ctx: &'a Context,
    layouts: &'a Layouts,
    config: &EngineConfig,
) -> ProgramTarget<'a> {
    ProgramTarget {
        device: &ctx.device,
        ledger: &ctx.ledger,
        layouts,
        format: ctx.format,
        blend: config.blend_state(),
    }
}

impl Engine {
    /// Opens the window and brings up the GPU context. Fails with
    /// [`EngineError::AlreadyExists`] while another engine is alive.
    pub fn initialize(config: EngineConfig) -> Result<Self> {
        let token = EngineToken::acquire()?;
        let (pump, window) = WindowPump::open(&config)?;
        let ctx = pollster::block_on(Context::new(window, &config, Diagnostics::new()))?;
        Self::assemble(token, ctx, Some(pump), config)
    }

    /// Same as [`Engine::initialize`] but renders into an offscreen texture.
    /// Input only arrives through [`Engine::push_event`].
    pub fn headless(config: EngineConfig) -> Result<Self> {
        let token = EngineToken::acquire()?;
        let ctx = pollster::block_on(Context::headless(&config, Diagnostics::new()))?;
        Self::assemble(token, ctx, None, config)
    }

    fn assemble(
        token: EngineToken,
        ctx: Context,
        window: Option<WindowPump>,
        config: EngineConfig,
    ) -> Result<Self> {
        let layouts = Layouts::new(&ctx.device);
        let programs = Programs::builtin(&program_target(&ctx, &layouts, &config))?;
        let white = Texture::create_white(&ctx.device, &ctx.queue, &ctx.ledger);
        let default_texture = BoundTexture::new(&ctx.device, &ctx.ledger, &layouts.texture, white);
        let renderer = FrameRenderer::new(&ctx, &layouts);

        log::info!(
            "engine initialized: {}x{} on {} ({:?})",
            ctx.size().0,
            ctx.size().1,
            ctx.adapter_info.name,
            ctx.adapter_info.backend
        );

        Ok(Self {
            renderer,
            textures: TextureStore::default(),
            default_texture,
            programs,
            layouts,
            ctx,
            window,
            input: InputQueue::default(),
            config,
            started: Instant::now(),
            frames: 0,
            token,
        })
    }

    /// Releases every GPU resource and the single-instance token.
    pub fn destroy(self) -> Result<()> {
        let Self {
            renderer,
            textures,
            default_texture,
            programs,
            layouts,
            ctx,
            window,
            frames,
            token,
            ..
        } = self;
        drop(renderer);
        drop(textures);
        drop(default_texture);
        drop(programs);
        drop(layouts);
        drop(ctx);
        drop(window);
        log::info!("engine destroyed after {} frames", frames);
        token.release()
    }

    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureHandle> {
        let path = self.config.resolve(path);
        let texture = resources::texture::load_texture(
            &path,
            &self.ctx.device,
            &self.ctx.queue,
            &self.ctx.ledger,
            &self.layouts.texture,
        )?;
        self.textures.insert(texture)
    }

    pub fn unload_texture(&mut self, handle: TextureHandle) -> Result<()> {
        self.textures
            .remove(handle)
            .map(drop)
            .ok_or(EngineError::UnknownTexture(handle))
    }

    /// Replaces the program of `kind` with one built from two WGSL files
    /// (`vs_main` in `vertex`, `fs_main` in `fragment`). On any error the
    /// installed program is left untouched.
    pub fn load_shader(
        &mut self,
        kind: ProgramKind,
        vertex: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
    ) -> Result<()> {
        let vertex_path = self.config.resolve(vertex);
        let fragment_path = self.config.resolve(fragment);
        let vertex_code = load_string(&vertex_path)?;
        let fragment_code = load_string(&fragment_path)?;

        let target = program_target(&self.ctx, &self.layouts, &self.config);
        self.programs.load(
            &target,
            kind,
            StageSource {
                path: &vertex_path,
                code: &vertex_code,
            },
            StageSource {
                path: &fragment_path,
                code: &fragment_code,
            },
        )?;
        Ok(())
    }

    fn globals(&self, transform: Matrix4<f32>) -> Globals {
        let time = animation_time(self.started.elapsed());
        Globals::new(transform, self.ctx.size(), time)
    }

    /// Full-screen quad with the flat program.
    pub fn draw_triangle(&mut self) {
        let globals = self.globals(Matrix4::identity());
        self.renderer
            .batch_mut()
            .push(FULLSCREEN_QUAD, globals, ProgramKind::Flat, None);
    }

    /// Quad from `t1` and the first vertex of `t2`, textured with plain white.
    pub fn draw_triangles(&mut self, t1: &Triangle, t2: &Triangle) -> Result<()> {
        let globals = self.globals(Matrix4::identity());
        self.renderer
            .batch_mut()
            .push(quad(t1, t2), globals, ProgramKind::Textured, None);
        Ok(())
    }

    pub fn draw_texture(
        &mut self,
        t1: &Triangle,
        t2: &Triangle,
        texture: TextureHandle,
        transform: Matrix4<f32>,
    ) -> Result<()> {
        if !self.textures.contains(texture) {
            return Err(EngineError::UnknownTexture(texture));
        }
        let globals = self.globals(transform);
        self.renderer.batch_mut().push(
            quad(t1, t2),
            globals,
            ProgramKind::Textured,
            Some(texture),
        );
        Ok(())
    }

    /// Renders everything drawn since the last swap and presents it.
    pub fn swap_buffers(&mut self) -> Result<()> {
        if let Some(size) = self.window.as_mut().and_then(|pump| pump.take_resize()) {
            self.ctx.resize(size.width, size.height);
        }
        let Some(frame) = self.ctx.acquire()? else {
            self.renderer.batch_mut().clear();
            return Ok(());
        };
        let commands = self.renderer.encode(
            &self.ctx,
            &frame.view,
            &self.layouts,
            &self.programs,
            &self.textures,
            &self.default_texture,
            self.config.clear_colour,
        );
        self.ctx.queue.submit(std::iter::once(commands));
        self.ctx.present(frame);
        self.frames += 1;
        Ok(())
    }

    /// Returns the next input event without blocking, or `None` when nothing
    /// is pending. Closing the window yields `Pressed(Event::Exit)`.
    pub fn poll_event(&mut self) -> Option<Polled> {
        if self.input.is_empty() {
            if let Some(pump) = self.window.as_mut() {
                pump.pump(&mut self.input);
            }
        }
        self.input.poll()
    }

    pub fn push_event(&mut self, event: PlatformEvent) {
        self.input.push(event);
    }

    /// The next key pressed is bound to the binding called `name`.
    pub fn rebind_key(&mut self, name: &str) -> Result<()> {
        self.input.arm_rebind(name)
    }

    pub fn cancel_rebind(&mut self) -> bool {
        self.input.cancel_rebind()
    }

    pub fn bindings(&self) -> &KeyBindings {
        self.input.bindings()
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        self.input.bindings_mut()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> ResourceStats {
        self.ctx.stats()
    }

    /// Live buffers, textures, bind groups and pipelines as wgpu counts them.
    /// Blocks until submitted work has finished.
    pub fn gpu_objects(&self) -> Result<GpuObjects> {
        self.ctx.gpu_objects()
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.ctx.device.limits()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.ctx.diagnostics
    }

    pub fn program_generation(&self, kind: ProgramKind) -> u64 {
        self.programs.generation(kind)
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn pending_draws(&self) -> usize {
        self.renderer.batch().len()
    }

    pub fn last_frame_draws(&self) -> usize {
        self.renderer.last_frame_draws()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Contents of the last headless frame; `None` for windowed engines.
    pub fn read_pixels(&self) -> Result<Option<RgbaImage>> {
        self.ctx.read_pixels()
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.ctx.window()
    }
}

/// Destroys the engine behind an optional handle.
pub fn destroy_engine(engine: Option<Engine>) -> Result<()> {
    match engine {
        Some(engine) => engine.destroy(),
        None => Err(EngineError::NullHandle),
    }
}
