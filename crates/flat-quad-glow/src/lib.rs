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

//! An OpenGL backend for [`flat-quad`] that uses the [`glow`] crate.
//!
//! Wrap a current [`glow`] context in a [`GlowContext`] and pass it to
//! [`flat_quad::QuadContext::new`]. OpenGL 3.3 or OpenGL ES 3.0 is required; the matching
//! `#version` line is prepended to every shader source.
//!
//! [`flat-quad`]: https://crates.io/crates/flat-quad
//! [`glow`]: https://crates.io/crates/glow

use flat_quad::{
    AttribLayout, BufferUsage, ClearMask, DepthFunc, GpuContext, ShaderStage, Topology,
};
use glow::HasContext;

use std::fmt;

/// A wrapper around a [`glow`] context.
pub struct GlowContext<H: HasContext> {
    /// The `#version` line for this context's dialect.
    shader_header: &'static str,

    /// The underlying context.
    context: H,
}

impl<H: HasContext> fmt::Debug for GlowContext<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowContext")
            .field("shader_header", &self.shader_header)
            .finish_non_exhaustive()
    }
}

impl<H: HasContext> GlowContext<H> {
    /// Create a new [`GlowContext`] from a [`glow`] context.
    ///
    /// # Safety
    ///
    /// The context must be current while calling `new`, and it must stay current for as long
    /// as this type is used to draw.
    pub unsafe fn new(context: H) -> Result<Self, GlError> {
        let version = context.version();
        tracing::debug!(
            "OpenGL {}{}.{}",
            if version.is_embedded { "ES " } else { "" },
            version.major,
            version.minor
        );

        let has_supported_version = if version.is_embedded {
            version.major >= 3
        } else {
            version.major >= 4 || (version.major >= 3 && version.minor >= 3)
        };
        if !has_supported_version {
            return Err(GlError(
                "OpenGL version 3.3 (or 3.0 ES) or higher is required".into(),
            ));
        }

        let shader_header = if version.is_embedded {
            "#version 300 es"
        } else {
            "#version 330 core"
        };

        // Core profiles refuse attribute setup without a bound vertex array.
        let vao = context.create_vertex_array().gl_err()?;
        context.bind_vertex_array(Some(vao));
        gl_error(&context);

        Ok(Self {
            shader_header,
            context,
        })
    }

    /// Get a reference to the underlying [`glow`] context.
    pub fn context(&self) -> &H {
        &self.context
    }

    /// Map the clip space onto a `width` by `height` region of the surface.
    pub fn set_viewport(&self, width: u32, height: u32) {
        unsafe {
            self.context.viewport(0, 0, width as i32, height as i32);
        }
    }
}

impl<H: HasContext> GpuContext for GlowContext<H> {
    type Shader = H::Shader;
    type Program = H::Program;
    type Buffer = H::Buffer;
    type UniformLocation = H::UniformLocation;
    type Error = GlError;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, Self::Error> {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };

        unsafe { self.context.create_shader(shader_type).gl_err() }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        let source = format!("{}\n{}", self.shader_header, source);

        unsafe {
            self.context.shader_source(shader, &source);
        }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe {
            self.context.compile_shader(shader);
        }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.context.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.context.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe {
            self.context.delete_shader(shader);
        }
    }

    fn create_program(&self) -> Result<Self::Program, Self::Error> {
        unsafe { self.context.create_program().gl_err() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            self.context.attach_shader(program, shader);
        }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe {
            self.context.link_program(program);
        }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.context.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.context.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe {
            self.context.delete_program(program);
        }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.context.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.context.get_uniform_location(program, name) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, Self::Error> {
        unsafe { self.context.create_buffer().gl_err() }
    }

    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>) {
        unsafe {
            self.context.bind_buffer(glow::ARRAY_BUFFER, buffer);
        }
    }

    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
        };

        unsafe {
            self.context
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, usage);
        }
    }

    fn clear_color(&self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            self.context.clear_color(r, g, b, a);
        }
    }

    fn clear_depth(&self, depth: f32) {
        unsafe {
            self.context.clear_depth_f32(depth);
        }
    }

    fn enable_depth_test(&self) {
        unsafe {
            self.context.enable(glow::DEPTH_TEST);
        }
    }

    fn depth_func(&self, func: DepthFunc) {
        let func = match func {
            DepthFunc::LessOrEqual => glow::LEQUAL,
        };

        unsafe {
            self.context.depth_func(func);
        }
    }

    fn clear(&self, mask: ClearMask) {
        let mut bits = 0;
        if mask.color {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.depth {
            bits |= glow::DEPTH_BUFFER_BIT;
        }

        unsafe {
            self.context.clear(bits);
        }
    }

    fn vertex_attrib_pointer(&self, index: u32, layout: AttribLayout) {
        unsafe {
            self.context.vertex_attrib_pointer_f32(
                index,
                layout.components,
                glow::FLOAT,
                layout.normalized,
                layout.stride,
                layout.offset,
            );
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe {
            self.context.enable_vertex_attrib_array(index);
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe {
            self.context.use_program(program);
        }
    }

    fn uniform_matrix_4(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        value: &[f32; 16],
    ) {
        unsafe {
            self.context
                .uniform_matrix_4_f32_slice(location, transpose, value);
        }
    }

    fn uniform_3(&self, location: Option<&Self::UniformLocation>, [x, y, z]: [f32; 3]) {
        unsafe {
            self.context.uniform_3_f32(location, x, y, z);
        }
    }

    fn draw_arrays(&self, mode: Topology, first: i32, count: i32) {
        let mode = match mode {
            Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        };

        unsafe {
            self.context.draw_arrays(mode, first, count);
        }
    }
}

/// An error reported by OpenGL while creating an object.
#[derive(Debug)]
pub struct GlError(String);

impl From<String> for GlError {
    fn from(s: String) -> Self {
        GlError(s)
    }
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gl error: {}", self.0)
    }
}

impl std::error::Error for GlError {}

fn gl_error(h: &(impl HasContext + ?Sized)) {
    let err = unsafe { h.get_error() };

    if err != glow::NO_ERROR {
        let error_str = match err {
            glow::INVALID_ENUM => "GL_INVALID_ENUM",
            glow::INVALID_VALUE => "GL_INVALID_VALUE",
            glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
            glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
            glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
            glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
            _ => "Unknown GL error",
        };

        tracing::error!("GL error: {}", error_str)
    }
}

trait ResultExt<T, E> {
    fn gl_err(self) -> Result<T, GlError>;
}

impl<T, E: Into<GlError>> ResultExt<T, E> for Result<T, E> {
    fn gl_err(self) -> Result<T, GlError> {
        self.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glow_errors_convert() {
        let result: Result<(), String> = Err("no more buffers".to_owned());
        let err = result.gl_err().unwrap_err();
        assert_eq!(err.to_string(), "gl error: no more buffers");
    }
}
