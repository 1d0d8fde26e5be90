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

//! Defines the GPU backend for flat-quad.

use std::error::Error;
use std::fmt;

/// The backend for the quad renderer.
///
/// This is a thin slice of the OpenGL API: exactly the calls needed to compile a shader
/// pair, upload one buffer and issue one draw. Methods mirror their GL counterparts and,
/// like GL, most of them do not report failure.
pub trait GpuContext {
    /// The type associated with a compiled shader object.
    type Shader: Copy;

    /// The type associated with a linked program object.
    type Program: Copy;

    /// The type associated with a GPU buffer.
    type Buffer: Copy;

    /// The location of a uniform inside of a program.
    type UniformLocation;

    /// The error type associated with this GPU context.
    type Error: Error + 'static;

    /// Create a new, empty shader object for the given stage.
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, Self::Error>;

    /// Replace the source code of a shader.
    fn shader_source(&self, shader: Self::Shader, source: &str);

    /// Compile a shader.
    fn compile_shader(&self, shader: Self::Shader);

    /// Whether the last compilation of this shader succeeded.
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;

    /// The diagnostic log of the last compilation.
    fn shader_info_log(&self, shader: Self::Shader) -> String;

    /// Delete a shader object.
    fn delete_shader(&self, shader: Self::Shader);

    /// Create a new, empty program object.
    fn create_program(&self) -> Result<Self::Program, Self::Error>;

    /// Attach a shader to a program.
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Link a program.
    fn link_program(&self, program: Self::Program);

    /// Whether the last link of this program succeeded.
    fn program_link_status(&self, program: Self::Program) -> bool;

    /// The diagnostic log of the last link.
    fn program_info_log(&self, program: Self::Program) -> String;

    /// Delete a program object.
    fn delete_program(&self, program: Self::Program);

    /// Look up the location of a vertex attribute, or `None` if it is not active.
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    /// Look up the location of a uniform, or `None` if it is not active.
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Create a new buffer object.
    fn create_buffer(&self) -> Result<Self::Buffer, Self::Error>;

    /// Bind a buffer to the array buffer target.
    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>);

    /// Upload data into the buffer currently bound to the array buffer target.
    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage);

    /// Set the color used when clearing the color buffer.
    fn clear_color(&self, color: [f32; 4]);

    /// Set the value used when clearing the depth buffer.
    fn clear_depth(&self, depth: f32);

    /// Enable depth testing.
    fn enable_depth_test(&self);

    /// Set the depth comparison function.
    fn depth_func(&self, func: DepthFunc);

    /// Clear the selected buffers.
    fn clear(&self, mask: ClearMask);

    /// Describe how the currently bound array buffer feeds an attribute.
    fn vertex_attrib_pointer(&self, index: u32, layout: AttribLayout);

    /// Enable reading an attribute from its array.
    fn enable_vertex_attrib_array(&self, index: u32);

    /// Set the program used for drawing.
    fn use_program(&self, program: Option<Self::Program>);

    /// Upload a column-major 4x4 matrix into a uniform of the current program.
    fn uniform_matrix_4(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        value: &[f32; 16],
    );

    /// Upload a three-component vector into a uniform of the current program.
    fn uniform_3(&self, location: Option<&Self::UniformLocation>, value: [f32; 3]);

    /// Draw `count` vertices starting at `first`.
    fn draw_arrays(&self, mode: Topology, first: i32, count: i32);
}

impl<C: GpuContext + ?Sized> GpuContext for &C {
    type Shader = C::Shader;
    type Program = C::Program;
    type Buffer = C::Buffer;
    type UniformLocation = C::UniformLocation;
    type Error = C::Error;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, Self::Error> {
        (**self).create_shader(stage)
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        (**self).shader_source(shader, source)
    }

    fn compile_shader(&self, shader: Self::Shader) {
        (**self).compile_shader(shader)
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        (**self).shader_compile_status(shader)
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        (**self).shader_info_log(shader)
    }

    fn delete_shader(&self, shader: Self::Shader) {
        (**self).delete_shader(shader)
    }

    fn create_program(&self) -> Result<Self::Program, Self::Error> {
        (**self).create_program()
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        (**self).attach_shader(program, shader)
    }

    fn link_program(&self, program: Self::Program) {
        (**self).link_program(program)
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        (**self).program_link_status(program)
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        (**self).program_info_log(program)
    }

    fn delete_program(&self, program: Self::Program) {
        (**self).delete_program(program)
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        (**self).attrib_location(program, name)
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        (**self).uniform_location(program, name)
    }

    fn create_buffer(&self) -> Result<Self::Buffer, Self::Error> {
        (**self).create_buffer()
    }

    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>) {
        (**self).bind_array_buffer(buffer)
    }

    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage) {
        (**self).array_buffer_data(data, usage)
    }

    fn clear_color(&self, color: [f32; 4]) {
        (**self).clear_color(color)
    }

    fn clear_depth(&self, depth: f32) {
        (**self).clear_depth(depth)
    }

    fn enable_depth_test(&self) {
        (**self).enable_depth_test()
    }

    fn depth_func(&self, func: DepthFunc) {
        (**self).depth_func(func)
    }

    fn clear(&self, mask: ClearMask) {
        (**self).clear(mask)
    }

    fn vertex_attrib_pointer(&self, index: u32, layout: AttribLayout) {
        (**self).vertex_attrib_pointer(index, layout)
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        (**self).enable_vertex_attrib_array(index)
    }

    fn use_program(&self, program: Option<Self::Program>) {
        (**self).use_program(program)
    }

    fn uniform_matrix_4(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        value: &[f32; 16],
    ) {
        (**self).uniform_matrix_4(location, transpose, value)
    }

    fn uniform_3(&self, location: Option<&Self::UniformLocation>, value: [f32; 3]) {
        (**self).uniform_3(location, value)
    }

    fn draw_arrays(&self, mode: Topology, first: i32, count: i32) {
        (**self).draw_arrays(mode, first, count)
    }
}

/// A programmable pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Runs once per vertex.
    Vertex,

    /// Runs once per fragment.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// A hint for how often the contents of a buffer change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    StaticDraw,
}

/// The comparison used for depth testing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    /// Pass if the incoming depth is less than or equal to the stored depth.
    LessOrEqual,
}

/// The primitive topology for a draw call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Each vertex after the first two forms a triangle with the previous two.
    TriangleStrip,
}

/// The buffers affected by [`GpuContext::clear`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct ClearMask {
    /// Clear the color buffer.
    pub color: bool,

    /// Clear the depth buffer.
    pub depth: bool,
}

impl ClearMask {
    /// Clear both the color and the depth buffer.
    pub const COLOR_AND_DEPTH: ClearMask = ClearMask {
        color: true,
        depth: true,
    };
}

/// The layout of an attribute inside of the bound array buffer.
///
/// Components are always 32-bit floats.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttribLayout {
    /// The number of components per vertex.
    pub components: i32,

    /// Whether integer data is normalized into `[0, 1]`.
    pub normalized: bool,

    /// The number of bytes between consecutive vertices, or zero for tight packing.
    pub stride: i32,

    /// The byte offset of the first component.
    pub offset: i32,
}
