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

//! Rendering a single frame.

use crate::gpu_backend::{AttribLayout, ClearMask, DepthFunc, GpuContext, Topology};
use crate::program::{Program, Uniforms};
use crate::resources::{Buffers, POSITION_COMPONENTS, VERTEX_COUNT};

use glam::{Mat4, Vec3};
use rand::Rng;

/// Fixed parameters of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Vertical field of view, in degrees.
    pub field_of_view: f32,

    /// Distance to the near clipping plane.
    pub near: f32,

    /// Distance to the far clipping plane.
    pub far: f32,

    /// Where the quad is placed relative to the camera.
    pub translation: Vec3,

    /// Color the color buffer is cleared to.
    pub clear_color: [f32; 4],

    /// Value the depth buffer is cleared to.
    pub clear_depth: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            field_of_view: 45.0,
            near: 0.1,
            far: 100.0,
            translation: Vec3::new(0.0, 0.0, -6.0),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
        }
    }
}

impl RenderConfig {
    /// The perspective projection for a surface of the given size.
    ///
    /// A zero height is treated as one.
    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width as f32 / height.max(1) as f32;
        Mat4::perspective_rh_gl(self.field_of_view.to_radians(), aspect, self.near, self.far)
    }

    /// The model-view matrix placing the quad in front of the camera.
    pub fn model_view(&self) -> Mat4 {
        Mat4::IDENTITY * Mat4::from_translation(self.translation)
    }
}

/// Everything that is recomputed for each draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// The projection matrix.
    pub projection: Mat4,

    /// The model-view matrix.
    pub model_view: Mat4,

    /// The quad color, for programs that take one.
    pub color: Option<[f32; 3]>,
}

impl FrameState {
    /// Compute the state for one frame.
    pub fn new(
        config: &RenderConfig,
        (width, height): (u32, u32),
        with_color: bool,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            projection: config.projection(width, height),
            model_view: config.model_view(),
            color: with_color.then(|| random_color(rng)),
        }
    }
}

/// Roll a color for the quad.
///
/// Each channel is `round(random * 255 / 255)`. The scale and the division cancel, so every
/// channel ends up as exactly `0.0` or `1.0` rather than an arbitrary shade.
pub fn random_color(rng: &mut impl Rng) -> [f32; 3] {
    let mut channel = || (rng.gen::<f32>() * 255.0 / 255.0).round();
    [channel(), channel(), channel()]
}

/// Draw the quad once.
///
/// Nothing here is checked for errors.
pub fn render_frame<C: GpuContext + ?Sized>(
    context: &C,
    program: &Program<C>,
    buffers: &Buffers<C>,
    config: &RenderConfig,
    state: &FrameState,
) {
    context.clear_color(config.clear_color);
    context.clear_depth(config.clear_depth);
    context.enable_depth_test();
    context.depth_func(DepthFunc::LessOrEqual);
    context.clear(ClearMask::COLOR_AND_DEPTH);

    if let Some(location) = program.vertex_position() {
        context.bind_array_buffer(Some(buffers.position()));
        context.vertex_attrib_pointer(
            location,
            AttribLayout {
                components: POSITION_COMPONENTS,
                normalized: false,
                stride: 0,
                offset: 0,
            },
        );
        context.enable_vertex_attrib_array(location);
    }

    context.use_program(Some(program.handle()));

    context.uniform_matrix_4(
        program.uniform(Uniforms::ProjectionMatrix),
        false,
        &state.projection.to_cols_array(),
    );
    context.uniform_matrix_4(
        program.uniform(Uniforms::ModelViewMatrix),
        false,
        &state.model_view.to_cols_array(),
    );

    if let Some(color) = state.color {
        context.uniform_3(program.uniform(Uniforms::Color), color);
    }

    context.draw_arrays(Topology::TriangleStrip, 0, VERTEX_COUNT);
    tracing::trace!("drew {} vertices", VERTEX_COUNT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn projection_matches_the_perspective_formula() {
        let config = RenderConfig::default();
        let projection = config.projection(640, 640).to_cols_array();

        let fov = f64::from(45.0_f32.to_radians());
        let (near, far) = (f64::from(0.1_f32), 100.0_f64);
        let f = 1.0 / (fov / 2.0).tan();
        let nf = 1.0 / (near - far);

        #[rustfmt::skip]
        let expected = [
            f,   0.0, 0.0,                   0.0,
            0.0, f,   0.0,                   0.0,
            0.0, 0.0, (far + near) * nf,     -1.0,
            0.0, 0.0, 2.0 * far * near * nf, 0.0,
        ];

        for (actual, expected) in projection.iter().zip(expected) {
            assert!(
                (*actual as f64 - expected).abs() < 1e-6,
                "{actual} != {expected}"
            );
        }
    }

    #[test]
    fn projection_follows_aspect_ratio() {
        let config = RenderConfig::default();
        let wide = config.projection(1280, 640);
        let square = config.projection(640, 640);

        assert!((wide.x_axis.x * 2.0 - square.x_axis.x).abs() < 1e-6);
        assert_eq!(wide.y_axis.y, square.y_axis.y);
    }

    #[test]
    fn zero_height_is_finite() {
        let projection = RenderConfig::default().projection(640, 0);
        assert!(projection.is_finite());
    }

    #[test]
    fn model_view_is_translated_identity() {
        let model_view = RenderConfig::default().model_view();
        let cols = model_view.to_cols_array_2d();

        assert_eq!(cols[3][2], -6.0);
        assert_eq!(cols[3], [0.0, 0.0, -6.0, 1.0]);
        assert_eq!(cols[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(cols[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(cols[2], [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn random_channels_collapse_to_zero_or_one() {
        // The channels look like they should land anywhere in [0, 255]; they do not.
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut seen = [false; 2];

        for _ in 0..1000 {
            for channel in random_color(&mut rng) {
                assert!(channel == 0.0 || channel == 1.0, "channel = {channel}");
                seen[channel as usize] = true;
            }
        }

        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn frame_state_only_rolls_color_when_asked() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = RenderConfig::default();

        assert!(FrameState::new(&config, (4, 3), false, &mut rng)
            .color
            .is_none());
        assert!(FrameState::new(&config, (4, 3), true, &mut rng)
            .color
            .is_some());
    }
}
