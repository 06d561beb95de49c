// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `piet-material`.
//
// `piet-material` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `piet-material` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `piet-material`. If not, see <https://www.gnu.org/licenses/>.

//! The default material.

use crate::error::Error;
use crate::gpu_backend::{GpuContext, POSITION_SLOT, UV_SLOT};
use crate::material::{Material, Renderable};
use crate::math::Mat4;
use crate::program::{AttributeBindings, Program, POSITION_ATTRIBUTE, UV_ATTRIBUTE};
use crate::shader::{self, ShaderSource, ShaderStage};

use std::fmt;
use std::rc::Rc;

const VERTEX_SHADER: &str = include_str!("./shaders/basic.v.glsl");
const FRAGMENT_SHADER: &str = include_str!("./shaders/basic.f.glsl");

#[derive(Debug, Clone, Copy)]
enum Uniforms {
    ViewMatrix,
    ProjectionMatrix,
    ModelMatrix,
    BorderColor,
    Texture,
    AddColor,
}

impl Uniforms {
    fn as_name(self) -> &'static str {
        match self {
            Uniforms::ViewMatrix => "MView",
            Uniforms::ProjectionMatrix => "MProj",
            Uniforms::ModelMatrix => "MModel",
            Uniforms::BorderColor => "bcolor",
            Uniforms::Texture => "mytexture",
            Uniforms::AddColor => "addcolor",
        }
    }
}

/// The locations a [`BasicMaterial`] writes through, resolved once per load.
///
/// A `None` entry means the program does not expose that name. Writing through it does
/// nothing.
pub struct BindingLocations<C: GpuContext + ?Sized> {
    /// The view matrix, `MView`.
    pub view_matrix: Option<C::UniformLocation>,

    /// The projection matrix, `MProj`.
    pub projection_matrix: Option<C::UniformLocation>,

    /// The model matrix, `MModel`.
    pub model_matrix: Option<C::UniformLocation>,

    /// The color added to opaque texels, `bcolor`.
    pub border_color: Option<C::UniformLocation>,

    /// The color every texel is multiplied by, `addcolor`.
    pub add_color: Option<C::UniformLocation>,

    /// The texture sampler, `mytexture`.
    pub texture: Option<C::UniformLocation>,

    /// The position attribute, `vertexPos`.
    pub position: Option<u32>,

    /// The texture coordinate attribute, `vertexUV`.
    pub uv: Option<u32>,
}

impl<C: GpuContext + ?Sized> BindingLocations<C> {
    /// Look up every location in a linked program.
    ///
    /// The position and texture coordinate attributes are looked up by the names `bindings`
    /// pins to [`POSITION_SLOT`] and [`UV_SLOT`], or by the default names if those slots are
    /// unbound.
    pub fn resolve(program: &Program<C>, bindings: &AttributeBindings) -> Self {
        let uniform = |uniform: Uniforms| program.uniform_location(uniform.as_name());

        Self {
            view_matrix: uniform(Uniforms::ViewMatrix),
            projection_matrix: uniform(Uniforms::ProjectionMatrix),
            model_matrix: uniform(Uniforms::ModelMatrix),
            border_color: uniform(Uniforms::BorderColor),
            texture: uniform(Uniforms::Texture),
            add_color: uniform(Uniforms::AddColor),
            position: program
                .attrib_location(bindings.name(POSITION_SLOT).unwrap_or(POSITION_ATTRIBUTE)),
            uv: program.attrib_location(bindings.name(UV_SLOT).unwrap_or(UV_ATTRIBUTE)),
        }
    }
}

impl<C: GpuContext + ?Sized> Clone for BindingLocations<C> {
    fn clone(&self) -> Self {
        Self {
            view_matrix: self.view_matrix.clone(),
            projection_matrix: self.projection_matrix.clone(),
            model_matrix: self.model_matrix.clone(),
            border_color: self.border_color.clone(),
            add_color: self.add_color.clone(),
            texture: self.texture.clone(),
            position: self.position,
            uv: self.uv,
        }
    }
}

impl<C: GpuContext + ?Sized> fmt::Debug for BindingLocations<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingLocations")
            .field("view_matrix", &self.view_matrix)
            .field("projection_matrix", &self.projection_matrix)
            .field("model_matrix", &self.model_matrix)
            .field("border_color", &self.border_color)
            .field("add_color", &self.add_color)
            .field("texture", &self.texture)
            .field("position", &self.position)
            .field("uv", &self.uv)
            .finish()
    }
}

struct Loaded<C: GpuContext + ?Sized> {
    program: Program<C>,
    locations: BindingLocations<C>,
}

/// The default material: a textured, tinted quad shader.
///
/// After [`load`](Material::load), the per-draw uniforms can be written with the `set_*`
/// methods. They write into the material's program, so call them between
/// [`begin`](Material::begin) and [`end`](Material::end).
pub struct BasicMaterial<C: GpuContext + ?Sized> {
    vertex: ShaderSource,
    fragment: ShaderSource,
    bindings: AttributeBindings,
    loaded: Option<Loaded<C>>,
}

impl<C: GpuContext + ?Sized> fmt::Debug for BasicMaterial<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicMaterial")
            .field("bindings", &self.bindings)
            .field("locations", &self.locations())
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> Default for BasicMaterial<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: GpuContext + ?Sized> BasicMaterial<C> {
    /// A material using the bundled shaders.
    pub fn new() -> Self {
        Self::with_sources(
            ShaderSource::vertex(VERTEX_SHADER),
            ShaderSource::fragment(FRAGMENT_SHADER),
        )
    }

    /// A material using a custom pair of shaders.
    ///
    /// The shaders are expected to use the same uniform names as the bundled ones. Names they
    /// leave out are simply never written.
    ///
    /// # Panics
    ///
    /// Panics if the sources are not a vertex and a fragment shader, in that order.
    pub fn with_sources(vertex: ShaderSource, fragment: ShaderSource) -> Self {
        assert_eq!(vertex.stage(), ShaderStage::Vertex);
        assert_eq!(fragment.stage(), ShaderStage::Fragment);

        Self {
            vertex,
            fragment,
            bindings: AttributeBindings::standard(),
            loaded: None,
        }
    }

    /// Replace the attribute slots applied when linking.
    ///
    /// Takes effect on the next load.
    pub fn with_attribute_bindings(mut self, bindings: AttributeBindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// The attribute slots applied when linking.
    pub fn attribute_bindings(&self) -> &AttributeBindings {
        &self.bindings
    }

    /// The linked program, if the material is loaded.
    pub fn program(&self) -> Option<&Program<C>> {
        self.loaded.as_ref().map(|loaded| &loaded.program)
    }

    /// The resolved locations, if the material is loaded.
    pub fn locations(&self) -> Option<&BindingLocations<C>> {
        self.loaded.as_ref().map(|loaded| &loaded.locations)
    }

    /// Set the view matrix.
    pub fn set_view(&self, view: &Mat4) {
        let loaded = self.expect_loaded();
        loaded
            .program
            .context()
            .uniform_matrix_4(loaded.locations.view_matrix.as_ref(), view.as_array());
    }

    /// Set the projection matrix.
    pub fn set_projection(&self, projection: &Mat4) {
        let loaded = self.expect_loaded();
        loaded.program.context().uniform_matrix_4(
            loaded.locations.projection_matrix.as_ref(),
            projection.as_array(),
        );
    }

    /// Set the model matrix.
    pub fn set_model(&self, model: &Mat4) {
        let loaded = self.expect_loaded();
        loaded
            .program
            .context()
            .uniform_matrix_4(loaded.locations.model_matrix.as_ref(), model.as_array());
    }

    /// Set the color added to every texel that is not fully transparent.
    pub fn set_border_color(&self, color: piet::Color) {
        let loaded = self.expect_loaded();
        loaded
            .program
            .context()
            .uniform_4(loaded.locations.border_color.as_ref(), rgba(color));
    }

    /// Set the color every texel is multiplied by.
    pub fn set_add_color(&self, color: piet::Color) {
        let loaded = self.expect_loaded();
        loaded
            .program
            .context()
            .uniform_4(loaded.locations.add_color.as_ref(), rgba(color));
    }

    /// Set the texture unit the sampler reads from.
    pub fn set_texture_unit(&self, unit: i32) {
        let loaded = self.expect_loaded();
        loaded
            .program
            .context()
            .uniform_1_i32(loaded.locations.texture.as_ref(), unit);
    }

    fn expect_loaded(&self) -> &Loaded<C> {
        match &self.loaded {
            Some(loaded) => loaded,
            None => panic!("BasicMaterial used before a successful load"),
        }
    }
}

impl<C: GpuContext + ?Sized> Material<C> for BasicMaterial<C> {
    fn load(&mut self, context: &Rc<C>) -> Result<(), Error> {
        // Release the previous program first; a failed reload leaves nothing behind.
        self.loaded = None;

        // The vertex stage always compiles first, so a broken vertex shader is reported even
        // if the fragment shader is broken too.
        let vertex = shader::compile(context, &self.vertex)?;
        let fragment = shader::compile(context, &self.fragment)?;
        let program = Program::link(context, [vertex, fragment], &self.bindings)?;
        let locations = BindingLocations::resolve(&program, &self.bindings);

        tracing::debug!("loaded basic material: {locations:?}");
        self.loaded = Some(Loaded { program, locations });
        Ok(())
    }

    fn begin(&self, _target: &dyn Renderable) {
        tracing::trace!("begin basic material");
        self.expect_loaded().program.bind();
    }

    fn end(&self, _target: &dyn Renderable) {
        debug_assert!(self.loaded.is_some(), "BasicMaterial ended before a load");
        tracing::trace!("end basic material");
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }
}

fn rgba(color: piet::Color) -> [f32; 4] {
    let (r, g, b, a) = color.as_rgba();
    [r as f32, g as f32, b as f32, a as f32]
}
