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

//! Drives the full initialize-then-draw sequence against the recording backend.

use flat_quad::recording::{Call, RecordingContext};
use flat_quad::{
    AttribLayout, BufferUsage, ClearMask, DepthFunc, Error, QuadContext, ShaderVariant, Topology,
    SQUARE_POSITIONS,
};

use rand::rngs::StdRng;
use rand::SeedableRng;

fn draw_calls(calls: &[Call]) -> Vec<&Call> {
    calls
        .iter()
        .filter(|call| matches!(call, Call::DrawArrays { .. }))
        .collect()
}

#[test]
fn one_frame_is_one_triangle_strip() {
    let recording = RecordingContext::new();
    let quad = QuadContext::new(&recording, ShaderVariant::Flat).unwrap();
    quad.render(640, 480);

    let calls = recording.calls();
    assert_eq!(
        draw_calls(&calls),
        [&Call::DrawArrays {
            mode: Topology::TriangleStrip,
            first: 0,
            count: 4,
        }]
    );
}

#[test]
fn initialization_creates_one_program_and_one_buffer() {
    let recording = RecordingContext::new();
    let quad = QuadContext::new(&recording, ShaderVariant::RandomColor).unwrap();

    assert_eq!(recording.live_programs(), 1);
    assert_eq!(recording.live_buffers(), 1);
    assert_eq!(recording.live_shaders(), 2);
    assert!(draw_calls(&recording.calls()).is_empty());

    assert_eq!(
        recording.buffer_contents(quad.buffers().position()).unwrap(),
        SQUARE_POSITIONS
    );
    assert_eq!(
        recording.buffer_contents(quad.buffers().position()).unwrap(),
        [-1.0, 1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0]
    );
}

#[test]
fn frame_state_is_set_in_order() {
    let recording = RecordingContext::new();
    let quad = QuadContext::new(&recording, ShaderVariant::Flat).unwrap();
    recording.clear_calls();

    let state = quad.render(800, 600);
    let program = quad.program().handle();
    let buffer = quad.buffers().position();

    assert_eq!(
        recording.calls(),
        [
            Call::ClearColor([0.0, 0.0, 0.0, 1.0]),
            Call::ClearDepth(1.0),
            Call::EnableDepthTest,
            Call::DepthFunc(DepthFunc::LessOrEqual),
            Call::Clear(ClearMask::COLOR_AND_DEPTH),
            Call::BindArrayBuffer(Some(buffer)),
            Call::VertexAttribPointer {
                index: 0,
                layout: AttribLayout {
                    components: 2,
                    normalized: false,
                    stride: 0,
                    offset: 0,
                },
            },
            Call::EnableVertexAttribArray(0),
            Call::UseProgram(Some(program)),
            Call::UniformMatrix4 {
                location: Some(1),
                transpose: false,
                value: state.projection.to_cols_array(),
            },
            Call::UniformMatrix4 {
                location: Some(0),
                transpose: false,
                value: state.model_view.to_cols_array(),
            },
            Call::DrawArrays {
                mode: Topology::TriangleStrip,
                first: 0,
                count: 4,
            },
        ]
    );
}

#[test]
fn buffer_is_uploaded_once_as_static() {
    let recording = RecordingContext::new();
    let quad = QuadContext::new(&recording, ShaderVariant::Flat).unwrap();
    quad.render(1, 1);
    quad.render(1, 1);

    let uploads: Vec<_> = recording
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::BufferData { .. }))
        .collect();

    assert_eq!(
        uploads,
        [Call::BufferData {
            buffer: quad.buffers().position(),
            len: 32,
            usage: BufferUsage::StaticDraw,
        }]
    );
}

#[test]
fn color_uploads_are_zero_or_one() {
    // Documents the color helper: channels never take values strictly between 0 and 1,
    // even though a random shade in [0, 255] looks like what was meant.
    let recording = RecordingContext::new();
    let quad = QuadContext::new(&recording, ShaderVariant::RandomColor).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..1000 {
        quad.render_with_rng(640, 480, &mut rng);
    }

    let colors: Vec<[f32; 3]> = recording
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Uniform3 { location, value } => {
                assert!(location.is_some());
                Some(value)
            }
            _ => None,
        })
        .collect();

    assert_eq!(colors.len(), 1000);
    assert!(colors
        .iter()
        .flatten()
        .all(|&channel| channel == 0.0 || channel == 1.0));
    assert_eq!(draw_calls(&recording.calls()).len(), 1000);
}

#[test]
fn flat_variant_uploads_no_color() {
    let recording = RecordingContext::new();
    let quad = QuadContext::new(&recording, ShaderVariant::Flat).unwrap();
    let state = quad.render(640, 480);

    assert!(state.color.is_none());
    assert!(!recording
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Uniform3 { .. })));
}

#[test]
fn allocation_failure_is_a_backend_error() {
    let recording = RecordingContext::new();
    recording.set_out_of_memory(true);

    match QuadContext::new(&recording, ShaderVariant::Flat) {
        Err(Error::Backend(err)) => assert!(err.to_string().contains("shader")),
        Err(err) => panic!("unexpected error: {err}"),
        Ok(_) => panic!("initialization should have failed"),
    }
    assert!(recording.calls().is_empty());
}
