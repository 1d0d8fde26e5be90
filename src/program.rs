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

//! Linking the shader pair into a program.

use crate::gpu_backend::{GpuContext, ShaderStage};
use crate::shader::{compile_shader, ShaderVariant};
use crate::{CallOnDrop, Error, ResultExt};

use std::fmt;
use std::mem;

/// Name of the per-vertex position input.
pub const VERTEX_POSITION: &str = "aVertexPosition";

/// The uniforms a program may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniforms {
    /// The perspective projection.
    ProjectionMatrix = 0,

    /// The model-view transform.
    ModelViewMatrix = 1,

    /// The quad color, in the random color variant only.
    Color = 2,
}

const UNIFORM_COUNT: usize = 3;

impl Uniforms {
    fn as_index(self) -> usize {
        self as usize
    }

    /// The name of the uniform in GLSL.
    pub fn as_name(self) -> &'static str {
        match self {
            Uniforms::ProjectionMatrix => "uProjectionMatrix",
            Uniforms::ModelViewMatrix => "uModelViewMatrix",
            Uniforms::Color => "uColor",
        }
    }

    /// The key this uniform is known by on the host side.
    pub fn as_key(self) -> &'static str {
        match self {
            Uniforms::ProjectionMatrix => "projectionMatrix",
            Uniforms::ModelViewMatrix => "modelViewMatrix",
            Uniforms::Color => "colorMatrix",
        }
    }

    /// The uniforms declared by the given variant.
    pub fn for_variant(variant: ShaderVariant) -> &'static [Uniforms] {
        match variant {
            ShaderVariant::Flat => &[Uniforms::ProjectionMatrix, Uniforms::ModelViewMatrix],
            ShaderVariant::RandomColor => &[
                Uniforms::ProjectionMatrix,
                Uniforms::ModelViewMatrix,
                Uniforms::Color,
            ],
        }
    }
}

/// A linked program along with the locations of its inputs.
pub struct Program<C: GpuContext + ?Sized> {
    /// The linked program object.
    handle: C::Program,

    /// Location of `aVertexPosition`.
    vertex_position: Option<u32>,

    /// Uniform locations, indexed by [`Uniforms`].
    uniforms: [Option<C::UniformLocation>; UNIFORM_COUNT],

    /// The variant the shaders came from.
    variant: ShaderVariant,
}

impl<C: GpuContext + ?Sized> fmt::Debug for Program<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("variant", &self.variant)
            .field("vertex_position", &self.vertex_position)
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> Program<C> {
    /// Compile both stages of `variant` and link them.
    pub fn new(context: &C, variant: ShaderVariant) -> Result<Self, Error> {
        let vertex = compile_shader(
            context,
            ShaderStage::Vertex,
            variant.source(ShaderStage::Vertex),
        )?;
        let delete_vertex = CallOnDrop(|| context.delete_shader(vertex));

        let fragment = compile_shader(
            context,
            ShaderStage::Fragment,
            variant.source(ShaderStage::Fragment),
        )?;
        let delete_fragment = CallOnDrop(|| context.delete_shader(fragment));

        let program = Self::link(context, vertex, fragment, variant)?;
        mem::forget(delete_vertex);
        mem::forget(delete_fragment);
        Ok(program)
    }

    /// Link two compiled shaders into a program and resolve its locations.
    ///
    /// Locations that the linker did not keep are stored as `None`; uploading to them is a
    /// no-op. On failure the program object is deleted, but the shaders are left alone.
    pub fn link(
        context: &C,
        vertex: C::Shader,
        fragment: C::Shader,
        variant: ShaderVariant,
    ) -> Result<Self, Error> {
        let program = context.create_program().backend_err()?;
        let call_on_drop = CallOnDrop(|| context.delete_program(program));

        context.attach_shader(program, vertex);
        context.attach_shader(program, fragment);
        context.link_program(program);

        if !context.program_link_status(program) {
            let log = context.program_info_log(program);
            tracing::error!("failed to link program: {log}");
            return Err(Error::ProgramLink { log });
        }
        mem::forget(call_on_drop);

        let vertex_position = context.attrib_location(program, VERTEX_POSITION);
        if vertex_position.is_none() {
            tracing::warn!("attribute {VERTEX_POSITION} is not active");
        }

        let mut uniforms = [None, None, None];
        for &uniform in Uniforms::for_variant(variant) {
            let location = context.uniform_location(program, uniform.as_name());
            if location.is_none() {
                tracing::warn!(
                    "uniform {} ({}) is not active",
                    uniform.as_name(),
                    uniform.as_key()
                );
            }
            uniforms[uniform.as_index()] = location;
        }

        tracing::debug!("linked {variant:?} program");

        Ok(Self {
            handle: program,
            vertex_position,
            uniforms,
            variant,
        })
    }

    /// The underlying program object.
    pub fn handle(&self) -> C::Program {
        self.handle
    }

    /// The location of the vertex position attribute.
    pub fn vertex_position(&self) -> Option<u32> {
        self.vertex_position
    }

    /// The location of a uniform, if the program uses it.
    pub fn uniform(&self, uniform: Uniforms) -> Option<&C::UniformLocation> {
        self.uniforms[uniform.as_index()].as_ref()
    }

    /// The variant this program was built from.
    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }
}
