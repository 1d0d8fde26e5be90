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

//! A headless [`GpuContext`] that records what it is asked to do.
//!
//! [`RecordingContext`] never touches a GPU. It keeps just enough state to answer the
//! queries the renderer makes: shader sources get a structural syntax check, linked programs
//! expose the attributes and uniforms their stages declare, and buffers remember the bytes
//! written into them. Every call that changes state is appended to a log of [`Call`]s.

use crate::gpu_backend::{
    AttribLayout, BufferUsage, ClearMask, DepthFunc, GpuContext, ShaderStage, Topology,
};

use hashbrown::HashMap;

use std::cell::{Cell, RefCell};

/// A state-changing call made on a [`RecordingContext`].
///
/// Queries such as compile status or uniform locations are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader { id: u32, stage: ShaderStage },
    ShaderSource(u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    CreateBuffer(u32),
    BindArrayBuffer(Option<u32>),

    /// `buffer` is zero if nothing was bound.
    BufferData {
        buffer: u32,
        len: usize,
        usage: BufferUsage,
    },

    ClearColor([f32; 4]),
    ClearDepth(f32),
    EnableDepthTest,
    DepthFunc(DepthFunc),
    Clear(ClearMask),
    VertexAttribPointer { index: u32, layout: AttribLayout },
    EnableVertexAttribArray(u32),
    UseProgram(Option<u32>),
    UniformMatrix4 {
        location: Option<u32>,
        transpose: bool,
        value: [f32; 16],
    },
    Uniform3 {
        location: Option<u32>,
        value: [f32; 3],
    },
    DrawArrays {
        mode: Topology,
        first: i32,
        count: i32,
    },
}

/// The error returned when object creation is made to fail.
#[derive(Debug, thiserror::Error)]
#[error("out of memory while creating a {0}")]
pub struct RecordingError(&'static str);

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Default)]
struct Objects {
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    buffers: HashMap<u32, Vec<u8>>,
    bound_array_buffer: Option<u32>,
}

/// A [`GpuContext`] that records calls instead of rendering.
#[derive(Default)]
pub struct RecordingContext {
    calls: RefCell<Vec<Call>>,
    objects: RefCell<Objects>,
    next_id: Cell<u32>,
    out_of_memory: Cell<bool>,
}

impl RecordingContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `create_*` call fail.
    pub fn set_out_of_memory(&self, out_of_memory: bool) {
        self.out_of_memory.set(out_of_memory);
    }

    /// Every state-changing call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Forget the calls recorded so far, but keep all objects alive.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Read back the contents of a buffer as 32-bit floats.
    pub fn buffer_contents(&self, buffer: u32) -> Option<Vec<f32>> {
        let objects = self.objects.borrow();
        let bytes = objects.buffers.get(&buffer)?;

        Some(
            bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect(),
        )
    }

    /// The number of shader objects that have not been deleted.
    pub fn live_shaders(&self) -> usize {
        self.objects.borrow().shaders.len()
    }

    /// The number of program objects that have not been deleted.
    pub fn live_programs(&self) -> usize {
        self.objects.borrow().programs.len()
    }

    /// The number of buffer objects created.
    pub fn live_buffers(&self) -> usize {
        self.objects.borrow().buffers.len()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self, kind: &'static str) -> Result<u32, RecordingError> {
        if self.out_of_memory.get() {
            return Err(RecordingError(kind));
        }

        // Zero is never a valid name, as in GL.
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        Ok(id)
    }
}

impl GpuContext for RecordingContext {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type UniformLocation = u32;
    type Error = RecordingError;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, RecordingError> {
        let id = self.allocate("shader")?;
        self.objects.borrow_mut().shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        self.record(Call::CreateShader { id, stage });
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(object) = self.objects.borrow_mut().shaders.get_mut(&shader) {
            object.source = source.to_owned();
        }
        self.record(Call::ShaderSource(shader));
    }

    fn compile_shader(&self, shader: u32) {
        if let Some(object) = self.objects.borrow_mut().shaders.get_mut(&shader) {
            match check_syntax(&object.source) {
                Ok(()) => {
                    object.compiled = true;
                    object.log.clear();
                }
                Err(log) => {
                    object.compiled = false;
                    object.log = log;
                }
            }
        }
        self.record(Call::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.objects
            .borrow()
            .shaders
            .get(&shader)
            .map_or(false, |object| object.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.objects
            .borrow()
            .shaders
            .get(&shader)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        self.objects.borrow_mut().shaders.remove(&shader);
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<u32, RecordingError> {
        let id = self.allocate("program")?;
        self.objects
            .borrow_mut()
            .programs
            .insert(id, ProgramObject::default());
        self.record(Call::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(object) = self.objects.borrow_mut().programs.get_mut(&program) {
            object.attached.push(shader);
        }
        self.record(Call::AttachShader { program, shader });
    }

    fn link_program(&self, program: u32) {
        let mut objects = self.objects.borrow_mut();
        let Objects {
            shaders, programs, ..
        } = &mut *objects;

        if let Some(object) = programs.get_mut(&program) {
            match link(shaders, &object.attached) {
                Ok((attributes, uniforms)) => {
                    object.linked = true;
                    object.log.clear();
                    object.attributes = attributes;
                    object.uniforms = uniforms;
                }
                Err(log) => {
                    object.linked = false;
                    object.log = log;
                    object.attributes.clear();
                    object.uniforms.clear();
                }
            }
        }

        drop(objects);
        self.record(Call::LinkProgram(program));
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.objects
            .borrow()
            .programs
            .get(&program)
            .map_or(false, |object| object.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.objects
            .borrow()
            .programs
            .get(&program)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        self.objects.borrow_mut().programs.remove(&program);
        self.record(Call::DeleteProgram(program));
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let objects = self.objects.borrow();
        let object = objects.programs.get(&program).filter(|p| p.linked)?;
        let index = object.attributes.iter().position(|attr| attr == name)?;
        Some(index as u32)
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let objects = self.objects.borrow();
        let object = objects.programs.get(&program).filter(|p| p.linked)?;
        let index = object.uniforms.iter().position(|uniform| uniform == name)?;
        Some(index as u32)
    }

    fn create_buffer(&self) -> Result<u32, RecordingError> {
        let id = self.allocate("buffer")?;
        self.objects.borrow_mut().buffers.insert(id, Vec::new());
        self.record(Call::CreateBuffer(id));
        Ok(id)
    }

    fn bind_array_buffer(&self, buffer: Option<u32>) {
        self.objects.borrow_mut().bound_array_buffer = buffer;
        self.record(Call::BindArrayBuffer(buffer));
    }

    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage) {
        let mut objects = self.objects.borrow_mut();
        let bound = objects.bound_array_buffer;
        if let Some(contents) = bound.and_then(|buffer| objects.buffers.get_mut(&buffer)) {
            *contents = data.to_vec();
        }
        drop(objects);

        self.record(Call::BufferData {
            buffer: bound.unwrap_or(0),
            len: data.len(),
            usage,
        });
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.record(Call::ClearColor(color));
    }

    fn clear_depth(&self, depth: f32) {
        self.record(Call::ClearDepth(depth));
    }

    fn enable_depth_test(&self) {
        self.record(Call::EnableDepthTest);
    }

    fn depth_func(&self, func: DepthFunc) {
        self.record(Call::DepthFunc(func));
    }

    fn clear(&self, mask: ClearMask) {
        self.record(Call::Clear(mask));
    }

    fn vertex_attrib_pointer(&self, index: u32, layout: AttribLayout) {
        self.record(Call::VertexAttribPointer { index, layout });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(Call::EnableVertexAttribArray(index));
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn uniform_matrix_4(&self, location: Option<&u32>, transpose: bool, value: &[f32; 16]) {
        self.record(Call::UniformMatrix4 {
            location: location.copied(),
            transpose,
            value: *value,
        });
    }

    fn uniform_3(&self, location: Option<&u32>, value: [f32; 3]) {
        self.record(Call::Uniform3 {
            location: location.copied(),
            value,
        });
    }

    fn draw_arrays(&self, mode: Topology, first: i32, count: i32) {
        self.record(Call::DrawArrays { mode, first, count });
    }
}

/// Check that delimiters balance and that there is a `main` function.
fn check_syntax(source: &str) -> Result<(), String> {
    let mut open = Vec::new();
    let mut last_line = 1;

    for (line_no, line) in source.lines().enumerate() {
        let line_no = line_no + 1;
        last_line = line_no;
        let code = line.split("//").next().unwrap_or_default();

        for c in code.chars() {
            match c {
                '(' | '[' | '{' => open.push(c),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };

                    if open.pop() != Some(expected) {
                        return Err(format!("ERROR: 0:{line_no}: '{c}' : syntax error"));
                    }
                }
                _ => {}
            }
        }
    }

    if !open.is_empty() {
        return Err(format!(
            "ERROR: 0:{last_line}: '' : syntax error: unexpected end of file"
        ));
    }

    if !source.contains("main") {
        return Err("ERROR: 0:0: '' : missing main()".to_owned());
    }

    Ok(())
}

/// Names declared at the top level with the given storage qualifiers.
fn declarations(source: &str, qualifiers: &[&str]) -> Vec<String> {
    let code: String = source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    code.split(|c: char| c == ';' || c == '{' || c == '}')
        .filter_map(|statement| {
            let mut tokens = statement.split_whitespace();
            let qualifier = tokens.next()?;
            if !qualifiers.contains(&qualifier) {
                return None;
            }

            let name = tokens.last()?;
            let name = name.split('[').next().unwrap_or(name);
            Some(name.to_owned())
        })
        .collect()
}

/// Link the attached shaders, returning the active attributes and uniforms.
#[allow(clippy::type_complexity)]
fn link(
    shaders: &HashMap<u32, ShaderObject>,
    attached: &[u32],
) -> Result<(Vec<String>, Vec<String>), String> {
    let mut vertex = None;
    let mut fragment = None;

    for id in attached {
        let shader = shaders
            .get(id)
            .ok_or_else(|| format!("error: attached shader {id} does not exist"))?;

        if !shader.compiled {
            return Err("error: linking with uncompiled shader".to_owned());
        }

        match shader.stage {
            ShaderStage::Vertex => vertex = Some(shader),
            ShaderStage::Fragment => fragment = Some(shader),
        }
    }

    let vertex = vertex.ok_or("error: no vertex shader attached")?;
    let fragment = fragment.ok_or("error: no fragment shader attached")?;

    let attributes = declarations(&vertex.source, &["in", "attribute"]);

    let mut uniforms = declarations(&vertex.source, &["uniform"]);
    for uniform in declarations(&fragment.source, &["uniform"]) {
        if !uniforms.contains(&uniform) {
            uniforms.push(uniform);
        }
    }

    Ok((attributes, uniforms))
}
