// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `flat-quad`.
//
// `flat-quad` is free software: you can redistribute it and/or modify it under the terms of
// either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `flat-quad` is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Lesser General Public License or the Mozilla Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `flat-quad`. If not, see <https://www.gnu.org/licenses/>.

//! Draw a flat-colored square with as little machinery as possible.
//!
//! This crate compiles one vertex and one fragment shader, links them into a program, uploads
//! the four corners of a unit square into a static buffer and draws them as a triangle strip.
//! That is the whole pipeline: there is no scene graph, no textures and no frame loop.
//!
//! To use, implement the [`GpuContext`] trait on a type that represents an active GPU context
//! (see `flat-quad-glow` for an OpenGL implementation), hand it to [`QuadContext::new`] and
//! call [`QuadContext::render`] whenever a frame is needed. The [`recording`] module provides
//! a headless context that logs every call, which is what the tests run against.
//!
//! Only shader compilation and program linking are checked for errors. Buffer uploads,
//! uniform uploads and the draw call go through unchecked, the same way they would in GL.

#![forbid(unsafe_code, rust_2018_idioms)]

mod frame;
mod gpu_backend;
mod program;
mod resources;
mod shader;

pub mod recording;

pub use self::frame::{random_color, render_frame, FrameState, RenderConfig};
pub use self::gpu_backend::{
    AttribLayout, BufferUsage, ClearMask, DepthFunc, GpuContext, ShaderStage, Topology,
};
pub use self::program::{Program, Uniforms, VERTEX_POSITION};
pub use self::resources::{Buffers, POSITION_COMPONENTS, SQUARE_POSITIONS, VERTEX_COUNT};
pub use self::shader::{
    compile_shader, ShaderVariant, COLOR_FRAGMENT_SHADER, FLAT_FRAGMENT_SHADER, VERTEX_SHADER,
};

pub use glam;

use rand::Rng;

use std::error::Error as StdError;
use std::fmt;

/// The error type for initializing the renderer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A shader stage failed to compile.
    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile {
        /// The stage that failed.
        stage: ShaderStage,

        /// The compiler's diagnostic output.
        log: String,
    },

    /// The shader pair failed to link.
    #[error("failed to link program: {log}")]
    ProgramLink {
        /// The linker's diagnostic output.
        log: String,
    },

    /// The backend could not create an object.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn StdError + 'static>),
}

/// Owns the GPU context along with the program and buffer used to draw the quad.
///
/// There is exactly one program and one buffer per `QuadContext`. Neither is deleted when
/// the context is dropped; they live as long as the underlying GPU context does.
pub struct QuadContext<C: GpuContext> {
    /// The linked shader program.
    program: Program<C>,

    /// The vertex buffers.
    buffers: Buffers<C>,

    /// Scene parameters.
    config: RenderConfig,

    /// The context to use for drawing.
    context: C,
}

impl<C: GpuContext + fmt::Debug> fmt::Debug for QuadContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadContext")
            .field("context", &self.context)
            .field("program", &self.program)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext> QuadContext<C> {
    /// Compile and link the `variant` program and upload the square, using the default
    /// [`RenderConfig`].
    pub fn new(context: C, variant: ShaderVariant) -> Result<Self, Error> {
        Self::with_config(context, variant, RenderConfig::default())
    }

    /// Like [`QuadContext::new`], with custom scene parameters.
    pub fn with_config(
        context: C,
        variant: ShaderVariant,
        config: RenderConfig,
    ) -> Result<Self, Error> {
        let program = Program::new(&context, variant)?;
        let buffers = Buffers::new(&context)?;

        tracing::debug!("quad context ready");

        Ok(Self {
            program,
            buffers,
            config,
            context,
        })
    }

    /// Draw one frame onto a surface of the given size.
    pub fn render(&self, width: u32, height: u32) -> FrameState {
        self.render_with_rng(width, height, &mut rand::thread_rng())
    }

    /// Draw one frame, taking the color (if any) from `rng`.
    pub fn render_with_rng(&self, width: u32, height: u32, rng: &mut impl Rng) -> FrameState {
        let state = FrameState::new(
            &self.config,
            (width, height),
            self.program.variant().has_color(),
            rng,
        );

        render_frame(
            &self.context,
            &self.program,
            &self.buffers,
            &self.config,
            &state,
        );

        state
    }

    /// Get a reference to the underlying context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// The linked program.
    pub fn program(&self) -> &Program<C> {
        &self.program
    }

    /// The vertex buffers.
    pub fn buffers(&self) -> &Buffers<C> {
        &self.buffers
    }
}

trait ResultExt<T, E> {
    fn backend_err(self) -> Result<T, Error>;
}

impl<T, E: StdError + 'static> ResultExt<T, E> for Result<T, E> {
    fn backend_err(self) -> Result<T, Error> {
        self.map_err(|err| Error::Backend(Box::new(err)))
    }
}

struct CallOnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for CallOnDrop<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}
