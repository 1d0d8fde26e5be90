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

//! Shader sources and compilation.

use crate::gpu_backend::{GpuContext, ShaderStage};
use crate::{CallOnDrop, Error, ResultExt};

use std::mem;

/// Vertex stage shared by every variant.
pub const VERTEX_SHADER: &str = include_str!("./shaders/quad.v.glsl");

/// Fragment stage that paints every fragment white.
pub const FLAT_FRAGMENT_SHADER: &str = include_str!("./shaders/flat.f.glsl");

/// Fragment stage that paints every fragment with the `uColor` uniform.
pub const COLOR_FRAGMENT_SHADER: &str = include_str!("./shaders/color.f.glsl");

/// Which shader pair to build the program from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum ShaderVariant {
    /// A constant white quad.
    #[default]
    Flat,

    /// A quad whose color is re-rolled on every draw.
    RandomColor,
}

impl ShaderVariant {
    /// The source for the given stage of this variant.
    pub fn source(self, stage: ShaderStage) -> &'static str {
        match (self, stage) {
            (_, ShaderStage::Vertex) => VERTEX_SHADER,
            (ShaderVariant::Flat, ShaderStage::Fragment) => FLAT_FRAGMENT_SHADER,
            (ShaderVariant::RandomColor, ShaderStage::Fragment) => COLOR_FRAGMENT_SHADER,
        }
    }

    /// Whether draws with this variant upload a color uniform.
    pub fn has_color(self) -> bool {
        matches!(self, ShaderVariant::RandomColor)
    }
}

/// Compile `source` as a shader of the given stage.
///
/// If compilation fails, the shader object is deleted and the compiler's log is returned
/// inside of [`Error::ShaderCompile`].
pub fn compile_shader<C: GpuContext + ?Sized>(
    context: &C,
    stage: ShaderStage,
    source: &str,
) -> Result<C::Shader, Error> {
    let shader = context.create_shader(stage).backend_err()?;
    let call_on_drop = CallOnDrop(|| context.delete_shader(shader));

    context.shader_source(shader, source);
    context.compile_shader(shader);

    if !context.shader_compile_status(shader) {
        let log = context.shader_info_log(shader);
        tracing::error!("failed to compile {stage} shader: {log}");
        return Err(Error::ShaderCompile { stage, log });
    }

    tracing::debug!("compiled {stage} shader");
    mem::forget(call_on_drop);
    Ok(shader)
}
