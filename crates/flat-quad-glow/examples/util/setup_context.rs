// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `flat-quad-glow`.
//
// `flat-quad-glow` is free software: you can redistribute it and/or modify it under the terms of
// either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `flat-quad-glow` is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Lesser General Public License or the Mozilla Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `flat-quad-glow`. If not, see <https://www.gnu.org/licenses/>.

// Opens a window with an OpenGL context for the examples and draws the quad whenever the
// window asks to be redrawn.

use flat_quad::{QuadContext, ShaderVariant};
use flat_quad_glow::GlowContext;

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};

use raw_window_handle::HasRawWindowHandle;

use std::error::Error;
use std::num::NonZeroU32;

use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

pub(crate) fn init() {
    tracing_subscriber::fmt::init();
}

/// Everything that exists once the window is on screen.
struct Drawable {
    quad: QuadContext<GlowContext<glow::Context>>,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

impl Drawable {
    fn new<T>(
        target: &EventLoopWindowTarget<T>,
        config: &Config,
        window: Option<Window>,
        context: NotCurrentContext,
        variant: ShaderVariant,
        title: &str,
    ) -> Result<Self, Box<dyn Error>> {
        let window = match window {
            Some(window) => window,
            None => glutin_winit::finalize_window(target, window_builder(title), config)?,
        };

        let attrs = window.build_surface_attributes(<_>::default());
        let surface = unsafe { config.display().create_window_surface(config, &attrs)? };
        let context = context.make_current(&surface)?;

        let display = config.display();
        #[allow(unused_mut)]
        let mut gl = unsafe {
            glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s) as *const _)
        };

        #[cfg(not(target_vendor = "apple"))]
        unsafe {
            use glow::HasContext;

            gl.enable(glow::DEBUG_OUTPUT);
            gl.debug_message_callback(log_gl_message);
        }

        // SAFETY: The context was made current above and stays current.
        let gl = unsafe { GlowContext::new(gl)? };
        let quad = QuadContext::new(gl, variant)?;

        Ok(Self {
            quad,
            surface,
            context,
            window,
        })
    }

    fn resize(&self, width: u32, height: u32) {
        if let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, w, h);
            self.quad.context().set_viewport(width, height);
        }
    }

    fn draw(&self) {
        let size = self.window.inner_size();
        self.quad.render(size.width, size.height);

        if let Err(err) = self.surface.swap_buffers(&self.context) {
            tracing::error!("failed to swap buffers: {err}");
        }
    }
}

fn window_builder(title: &str) -> WindowBuilder {
    WindowBuilder::new()
        .with_title(title)
        .with_inner_size(LogicalSize::new(640, 480))
}

/// Open a window and draw the quad with the given variant until the window is closed.
pub(crate) fn run(variant: ShaderVariant, title: &'static str) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new();

    // WGL needs the window before it can pick a config.
    let window = cfg!(windows).then(|| window_builder(title));
    let (window, config) = DisplayBuilder::new()
        .with_window_builder(window)
        .build(
            &event_loop,
            ConfigTemplateBuilder::new().with_depth_size(24),
            |mut configs| configs.next().unwrap(),
        )?;

    let raw_handle = window.as_ref().map(|w| w.raw_window_handle());
    let attempts = [
        ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(raw_handle),
        ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
            .build(raw_handle),
    ];
    let context = attempts
        .iter()
        .find_map(|attrs| unsafe { config.display().create_context(&config, attrs).ok() })
        .ok_or("could not create an OpenGL 3.3 or GLES 3.0 context")?;

    let mut pending = Some((window, context));
    let mut drawable: Option<Drawable> = None;

    event_loop.run(move |event, target, control_flow| {
        control_flow.set_wait();

        match event {
            Event::Resumed => {
                let Some((window, context)) = pending.take() else {
                    return;
                };

                match Drawable::new(target, &config, window, context, variant, title) {
                    Ok(built) => drawable = Some(built),
                    Err(err) => {
                        tracing::error!("failed to set up the quad: {err}");
                        control_flow.set_exit_with_code(1);
                    }
                }
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::Resized(size) => {
                    if let Some(drawable) = &drawable {
                        drawable.resize(size.width, size.height);
                    }
                }
                WindowEvent::CloseRequested => control_flow.set_exit(),
                _ => (),
            },
            Event::RedrawRequested(_) => {
                if let Some(drawable) = &drawable {
                    drawable.draw();
                }
            }
            _ => (),
        }
    })
}

#[cfg(not(target_vendor = "apple"))]
fn log_gl_message(_source: u32, _ty: u32, id: u32, severity: u32, message: &str) {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => tracing::error!("GL {id}: {message}"),
        glow::DEBUG_SEVERITY_MEDIUM => tracing::warn!("GL {id}: {message}"),
        glow::DEBUG_SEVERITY_LOW => tracing::info!("GL {id}: {message}"),
        _ => tracing::debug!("GL {id}: {message}"),
    }
}
