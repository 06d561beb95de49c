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

//! An OpenGL backend for [`piet-material`] that uses the [`glow`] crate.
//!
//! Wrap a current [`glow`] context in a [`GlContext`], put it in an [`Rc`] and hand it to a
//! [`MaterialRegistry`] to build the default material on it.
//!
//! [`piet-material`]: https://crates.io/crates/piet-material
//! [`glow`]: https://crates.io/crates/glow
//! [`Rc`]: std::rc::Rc
//! [`MaterialRegistry`]: piet_material::MaterialRegistry

use glow::HasContext;

use piet_material::ShaderStage;

pub use piet_material;

use std::fmt;

/// A wrapper around a [`glow`] context that implements [`piet_material::GpuContext`].
pub struct GlContext<H: HasContext + ?Sized> {
    /// The underlying context.
    context: H,
}

impl<H: HasContext + ?Sized> fmt::Debug for GlContext<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlContext").finish_non_exhaustive()
    }
}

impl<H: HasContext> GlContext<H> {
    /// Create a new [`GlContext`] from a [`glow`] context.
    ///
    /// # Safety
    ///
    /// The context must be current on this thread whenever any method of this type is called,
    /// including when programs and shaders created from it are dropped.
    pub unsafe fn new(context: H) -> Self {
        let version = context.version();
        tracing::debug!(
            "creating material context for OpenGL{} {}.{}",
            if version.is_embedded { " ES" } else { "" },
            version.major,
            version.minor
        );

        Self { context }
    }

    /// Consume this wrapper and return the underlying context.
    pub fn into_inner(self) -> H {
        self.context
    }
}

impl<H: HasContext + ?Sized> GlContext<H> {
    /// Get a reference to the underlying [`glow`] context.
    pub fn context(&self) -> &H {
        &self.context
    }
}

/// An error from the OpenGL driver.
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

impl<H: HasContext + ?Sized> piet_material::GpuContext for GlContext<H> {
    type Shader = H::Shader;
    type Program = H::Program;
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
        unsafe {
            self.context.shader_source(shader, source);
        }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe {
            self.context.compile_shader(shader);
        }

        gl_error(&self.context, "glCompileShader");
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

        gl_error(&self.context, "glAttachShader");
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            self.context.detach_shader(program, shader);
        }
    }

    fn bind_attrib_location(&self, program: Self::Program, slot: u32, name: &str) {
        unsafe {
            self.context.bind_attrib_location(program, slot, name);
        }

        gl_error(&self.context, "glBindAttribLocation");
    }

    fn link_program(&self, program: Self::Program) {
        unsafe {
            self.context.link_program(program);
        }

        gl_error(&self.context, "glLinkProgram");
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

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.context.get_uniform_location(program, name) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.context.get_attrib_location(program, name) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe {
            self.context.use_program(program);
        }
    }

    fn uniform_matrix_4(&self, location: Option<&Self::UniformLocation>, matrix: &[f32; 16]) {
        unsafe {
            self.context
                .uniform_matrix_4_f32_slice(location, false, matrix);
        }
    }

    fn uniform_4(&self, location: Option<&Self::UniformLocation>, [x, y, z, w]: [f32; 4]) {
        unsafe {
            self.context.uniform_4_f32(location, x, y, z, w);
        }
    }

    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, value: i32) {
        unsafe {
            self.context.uniform_1_i32(location, value);
        }
    }
}

/// Log any error the driver raised during `operation`.
fn gl_error(h: &(impl HasContext + ?Sized), operation: &str) {
    let code = unsafe { h.get_error() };

    if let Some(name) = error_name(code) {
        tracing::error!("{operation} raised {name} (0x{code:04x})");
    }
}

/// The name of a `glGetError` code, or `None` for `GL_NO_ERROR`.
fn error_name(code: u32) -> Option<&'static str> {
    Some(match code {
        glow::NO_ERROR => return None,
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
        _ => "unknown GL error",
    })
}

trait ResultExt<T, E> {
    fn gl_err(self) -> Result<T, GlError>;
}

impl<T, E: Into<GlError>> ResultExt<T, E> for Result<T, E> {
    fn gl_err(self) -> Result<T, GlError> {
        self.map_err(Into::into)
    }
}
