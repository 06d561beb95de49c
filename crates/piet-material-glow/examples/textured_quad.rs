// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `piet-material-glow`.
//
// `piet-material-glow` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `piet-material-glow` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `piet-material-glow`. If not, see <https://www.gnu.org/licenses/>.

//! Draws a textured, tinted quad with the default material.

#[path = "util/setup_context.rs"]
mod util;

use glow::HasContext;

use piet_material::kurbo::Affine;
use piet_material::piet::Color;
use piet_material::{Mat4, Material, MaterialRegistry, Vertex, POSITION_SLOT, UV_SLOT};

use std::error::Error;
use std::mem;

const QUAD: [Vertex; 4] = [
    Vertex::new([-0.5, -0.5, 0.0], [0.0, 1.0]),
    Vertex::new([0.5, -0.5, 0.0], [1.0, 1.0]),
    Vertex::new([-0.5, 0.5, 0.0], [0.0, 0.0]),
    Vertex::new([0.5, 0.5, 0.0], [1.0, 0.0]),
];

struct Scene {
    registry: MaterialRegistry<piet_material_glow::GlContext<glow::Context>>,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    texture: glow::Texture,
    angle: f64,
}

impl Scene {
    fn new(context: &util::Context) -> Result<Self, Box<dyn Error>> {
        let registry = MaterialRegistry::new(context.clone())?;
        let gl = context.context();

        unsafe {
            let vao = gl.create_vertex_array()?;
            let vbo = gl.create_buffer()?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD),
                glow::STATIC_DRAW,
            );

            let stride = mem::size_of::<Vertex>() as i32;
            gl.enable_vertex_attrib_array(POSITION_SLOT);
            gl.vertex_attrib_pointer_f32(
                POSITION_SLOT,
                3,
                glow::FLOAT,
                false,
                stride,
                bytemuck::offset_of!(Vertex, pos) as i32,
            );
            gl.enable_vertex_attrib_array(UV_SLOT);
            gl.vertex_attrib_pointer_f32(
                UV_SLOT,
                2,
                glow::FLOAT,
                false,
                stride,
                bytemuck::offset_of!(Vertex, uv) as i32,
            );
            gl.bind_vertex_array(None);

            // A 2x2 checkerboard with one transparent texel.
            let texels: [u8; 16] = [
                0xff, 0xff, 0xff, 0xff, 0x20, 0x20, 0x20, 0xff, //
                0x20, 0x20, 0x20, 0xff, 0x00, 0x00, 0x00, 0x00, //
            ];
            let texture = gl.create_texture()?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                2,
                2,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(&texels),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);

            Ok(Self {
                registry,
                vao,
                vbo,
                texture,
                angle: 0.0,
            })
        }
    }

    fn draw(&mut self, width: u32, height: u32) {
        let gl = self.registry.context().context();
        let material = self.registry.default_material();
        let aspect = width as f32 / height.max(1) as f32;
        let model = Affine::rotate(self.angle);
        self.angle += 0.01;

        unsafe {
            gl.viewport(0, 0, width as i32, height as i32);
            gl.clear_color(0.53, 0.81, 0.92, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }

        material.begin(&model);
        material.set_projection(&Mat4::orthographic(
            -aspect, aspect, -1.0, 1.0, -1.0, 1.0,
        ));
        material.set_view(&Mat4::IDENTITY);
        material.set_model(&Mat4::from_affine(model));
        material.set_border_color(Color::rgba8(0x10, 0x00, 0x00, 0x00));
        material.set_add_color(Color::rgb8(0xff, 0xa5, 0x00));
        material.set_texture_unit(0);

        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, QUAD.len() as i32);
            gl.bind_vertex_array(None);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }

        material.end(&model);
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        let gl = self.registry.context().context();
        unsafe {
            gl.delete_texture(self.texture);
            gl.delete_buffer(self.vbo);
            gl.delete_vertex_array(self.vao);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    util::init();

    util::with_renderer(Scene::new, |_context, scene, width, height| {
        scene.draw(width, height)
    })
}
