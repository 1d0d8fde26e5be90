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

//! Error paths that the recording backend never takes by itself.

use flat_quad::recording::{Call, RecordingContext, RecordingError};
use flat_quad::{
    AttribLayout, BufferUsage, ClearMask, DepthFunc, Error, GpuContext, Program, QuadContext,
    ShaderStage, ShaderVariant, Topology,
};

/// Forwards to a [`RecordingContext`], but can refuse to link or hide every attribute.
#[derive(Default)]
struct Faulty {
    inner: RecordingContext,
    refuse_link: bool,
    hide_attributes: bool,
}

impl GpuContext for Faulty {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type UniformLocation = u32;
    type Error = RecordingError;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, RecordingError> {
        self.inner.create_shader(stage)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.inner.shader_source(shader, source)
    }

    fn compile_shader(&self, shader: u32) {
        self.inner.compile_shader(shader)
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.inner.shader_compile_status(shader)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.inner.shader_info_log(shader)
    }

    fn delete_shader(&self, shader: u32) {
        self.inner.delete_shader(shader)
    }

    fn create_program(&self) -> Result<u32, RecordingError> {
        self.inner.create_program()
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.inner.attach_shader(program, shader)
    }

    fn link_program(&self, program: u32) {
        self.inner.link_program(program)
    }

    fn program_link_status(&self, program: u32) -> bool {
        !self.refuse_link && self.inner.program_link_status(program)
    }

    fn program_info_log(&self, program: u32) -> String {
        if self.refuse_link {
            "error: varying mismatch".to_owned()
        } else {
            self.inner.program_info_log(program)
        }
    }

    fn delete_program(&self, program: u32) {
        self.inner.delete_program(program)
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        if self.hide_attributes {
            None
        } else {
            self.inner.attrib_location(program, name)
        }
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        self.inner.uniform_location(program, name)
    }

    fn create_buffer(&self) -> Result<u32, RecordingError> {
        self.inner.create_buffer()
    }

    fn bind_array_buffer(&self, buffer: Option<u32>) {
        self.inner.bind_array_buffer(buffer)
    }

    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage) {
        self.inner.array_buffer_data(data, usage)
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.inner.clear_color(color)
    }

    fn clear_depth(&self, depth: f32) {
        self.inner.clear_depth(depth)
    }

    fn enable_depth_test(&self) {
        self.inner.enable_depth_test()
    }

    fn depth_func(&self, func: DepthFunc) {
        self.inner.depth_func(func)
    }

    fn clear(&self, mask: ClearMask) {
        self.inner.clear(mask)
    }

    fn vertex_attrib_pointer(&self, index: u32, layout: AttribLayout) {
        self.inner.vertex_attrib_pointer(index, layout)
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.inner.enable_vertex_attrib_array(index)
    }

    fn use_program(&self, program: Option<u32>) {
        self.inner.use_program(program)
    }

    fn uniform_matrix_4(&self, location: Option<&u32>, transpose: bool, value: &[f32; 16]) {
        self.inner.uniform_matrix_4(location, transpose, value)
    }

    fn uniform_3(&self, location: Option<&u32>, value: [f32; 3]) {
        self.inner.uniform_3(location, value)
    }

    fn draw_arrays(&self, mode: Topology, first: i32, count: i32) {
        self.inner.draw_arrays(mode, first, count)
    }
}

#[test]
fn link_failure_releases_both_shaders() {
    let context = Faulty {
        refuse_link: true,
        ..Faulty::default()
    };

    match Program::new(&context, ShaderVariant::Flat) {
        Err(Error::ProgramLink { log }) => assert_eq!(log, "error: varying mismatch"),
        Err(err) => panic!("unexpected error: {err}"),
        Ok(_) => panic!("linking should have failed"),
    }

    assert_eq!(context.inner.live_shaders(), 0);
    assert_eq!(context.inner.live_programs(), 0);

    let deleted = context
        .inner
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::DeleteShader(_)))
        .count();
    assert_eq!(deleted, 2);
}

#[test]
fn link_failure_stops_initialization() {
    let context = Faulty {
        refuse_link: true,
        ..Faulty::default()
    };

    assert!(QuadContext::new(&context, ShaderVariant::RandomColor).is_err());
    assert_eq!(context.inner.live_buffers(), 0);
}

#[test]
fn missing_position_attribute_still_draws() {
    let context = Faulty {
        hide_attributes: true,
        ..Faulty::default()
    };

    let quad = QuadContext::new(&context, ShaderVariant::Flat).unwrap();
    assert_eq!(quad.program().vertex_position(), None);

    context.inner.clear_calls();
    quad.render(640, 480);
    let calls = context.inner.calls();

    assert!(!calls.iter().any(|call| matches!(
        call,
        Call::VertexAttribPointer { .. } | Call::EnableVertexAttribArray(_)
    )));
    assert_eq!(
        calls
            .iter()
            .filter(|call| matches!(call, Call::UniformMatrix4 { .. }))
            .count(),
        2
    );
    assert_eq!(
        calls.last(),
        Some(&Call::DrawArrays {
            mode: Topology::TriangleStrip,
            first: 0,
            count: 4,
        })
    );
}
