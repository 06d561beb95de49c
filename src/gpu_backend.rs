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

//! Defines the GPU backend for piet-material.

use crate::shader::ShaderStage;

use std::error::Error;
use std::fmt;

/// The attribute slot that vertex positions are submitted through.
pub const POSITION_SLOT: u32 = 0;

/// The attribute slot that texture coordinates are submitted through.
pub const UV_SLOT: u32 = 1;

/// The backend that compiles, links and binds shader programs.
///
/// The handle types are plain identifiers handed out by the driver. Ownership of the objects
/// behind them is tracked by the resource wrappers in this crate, which call the `delete_*`
/// methods when they are dropped.
///
/// Every method must be called on the thread that owns the GPU context. Implementations are
/// expected to use interior mutability where they need it; nothing here is synchronized.
pub trait GpuContext {
    /// The type associated with a GPU shader object.
    type Shader: Copy;

    /// The type associated with a GPU program object.
    type Program: Copy + PartialEq;

    /// The type associated with a uniform location in a linked program.
    ///
    /// A uniform that the program does not expose has no location. That case is represented
    /// as `None` wherever a location is returned or consumed.
    type UniformLocation: Clone + fmt::Debug;

    /// The error type associated with this GPU context.
    type Error: Error + 'static;

    /// Create a new shader object for the given stage.
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, Self::Error>;

    /// Replace the source text of a shader object.
    fn shader_source(&self, shader: Self::Shader, source: &str);

    /// Compile a shader object. This blocks until the driver is done.
    fn compile_shader(&self, shader: Self::Shader);

    /// Whether the last compilation of this shader succeeded.
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;

    /// The driver's diagnostic log for this shader.
    fn shader_info_log(&self, shader: Self::Shader) -> String;

    /// Delete a shader object.
    fn delete_shader(&self, shader: Self::Shader);

    /// Create a new program object.
    fn create_program(&self) -> Result<Self::Program, Self::Error>;

    /// Attach a compiled shader to a program.
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Detach a shader from a program.
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Fix the attribute called `name` to the numeric `slot`.
    ///
    /// This only takes effect on the next link.
    fn bind_attrib_location(&self, program: Self::Program, slot: u32, name: &str);

    /// Link a program. This blocks until the driver is done.
    fn link_program(&self, program: Self::Program);

    /// Whether the last link of this program succeeded.
    fn program_link_status(&self, program: Self::Program) -> bool;

    /// The driver's diagnostic log for this program.
    fn program_info_log(&self, program: Self::Program) -> String;

    /// Delete a program object.
    fn delete_program(&self, program: Self::Program);

    /// Get the location of a uniform in a linked program.
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Get the slot of a vertex attribute in a linked program.
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    /// Make a program the current program, or clear the current program.
    fn use_program(&self, program: Option<Self::Program>);

    /// Set a 4x4 matrix uniform of the current program, in column-major order.
    fn uniform_matrix_4(&self, location: Option<&Self::UniformLocation>, matrix: &[f32; 16]);

    /// Set a four component vector uniform of the current program.
    fn uniform_4(&self, location: Option<&Self::UniformLocation>, value: [f32; 4]);

    /// Set an integer uniform of the current program, such as a sampler unit.
    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, value: i32);
}

/// The vertex type submitted by renderable objects.
///
/// `pos` goes through [`POSITION_SLOT`] and `uv` goes through [`UV_SLOT`].
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// The position of the vertex.
    pub pos: [f32; 3],

    /// The coordinate of the vertex in the texture.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a new vertex.
    pub const fn new(pos: [f32; 3], uv: [f32; 2]) -> Self {
        Self { pos, uv }
    }
}
