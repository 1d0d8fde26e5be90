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

//! The vertex data for the quad.

use crate::gpu_backend::{BufferUsage, GpuContext};
use crate::{Error, ResultExt};

use std::fmt;

/// Corners of a square spanning `[-1, 1]` on both axes, in triangle strip order.
pub const SQUARE_POSITIONS: [f32; 8] = [
    -1.0, 1.0, //
    1.0, 1.0, //
    -1.0, -1.0, //
    1.0, -1.0, //
];

/// Number of components in each entry of [`SQUARE_POSITIONS`].
pub const POSITION_COMPONENTS: i32 = 2;

/// Number of vertices in [`SQUARE_POSITIONS`].
pub const VERTEX_COUNT: i32 = SQUARE_POSITIONS.len() as i32 / POSITION_COMPONENTS;

/// The buffers used to draw the quad, keyed by purpose.
pub struct Buffers<C: GpuContext + ?Sized> {
    /// Vertex positions.
    position: C::Buffer,
}

impl<C: GpuContext + ?Sized> fmt::Debug for Buffers<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffers").finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> Buffers<C> {
    /// Create the position buffer and fill it with [`SQUARE_POSITIONS`].
    ///
    /// The buffer is left bound to the array buffer target. Whether the upload succeeded is
    /// not checked.
    pub fn new(context: &C) -> Result<Self, Error> {
        let position = context.create_buffer().backend_err()?;

        context.bind_array_buffer(Some(position));
        context.array_buffer_data(
            bytemuck::cast_slice(&SQUARE_POSITIONS),
            BufferUsage::StaticDraw,
        );

        tracing::debug!("uploaded {} vertices", VERTEX_COUNT);
        Ok(Self { position })
    }

    /// The buffer holding vertex positions.
    pub fn position(&self) -> C::Buffer {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Call, RecordingContext};

    #[test]
    fn uploads_the_unit_square() {
        let context = RecordingContext::new();
        let buffers = Buffers::new(&context).unwrap();

        assert_eq!(
            context.buffer_contents(buffers.position()).unwrap(),
            [-1.0, 1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0]
        );
        assert!(context.calls().contains(&Call::BufferData {
            buffer: buffers.position(),
            len: 32,
            usage: BufferUsage::StaticDraw,
        }));
    }

    #[test]
    fn four_vertices() {
        assert_eq!(VERTEX_COUNT, 4);
    }
}
