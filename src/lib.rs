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

//! Shader programs and materials for GPU accelerated rendering backends.
//!
//! This crate compiles shader stages, links them into programs, resolves the locations the
//! program exposes and wraps all of that in [`Material`]s: objects that the render loop
//! brackets every draw with, without having to know how the GPU state is bound.
//!
//! To use, implement the [`GpuContext`] trait on a type of your choice that represents an
//! active GPU context (the `piet-material-glow` crate does this for [`glow`]). Put it in an
//! [`Rc`] and build a [`MaterialRegistry`] from it, which loads the default
//! [`BasicMaterial`]. Then, for every object:
//!
//! ```no_run
//! # fn run<C: piet_material::GpuContext>(registry: &piet_material::MaterialRegistry<C>) {
//! use piet_material::{Mat4, Material};
//!
//! let material = registry.default_material();
//! material.begin(&());
//! material.set_model(&Mat4::IDENTITY);
//! // Submit geometry through slots 0 (position) and 1 (texture coordinates).
//! material.end(&());
//! # }
//! ```
//!
//! Note that this crate uses thread-unsafe primitives. Graphics contexts are bound to one
//! thread, and every call here has to happen on that thread anyway.
//!
//! [`glow`]: https://crates.io/crates/glow
//! [`Rc`]: std::rc::Rc

#![forbid(unsafe_code, rust_2018_idioms)]

mod basic;
mod error;
mod gpu_backend;
mod material;
mod math;
mod program;
mod registry;
mod resources;
mod shader;

pub use basic::{BasicMaterial, BindingLocations};
pub use error::{CompileError, Error, LinkError};
pub use gpu_backend::{GpuContext, Vertex, POSITION_SLOT, UV_SLOT};
pub use material::{draw, Material, Renderable};
pub use math::Mat4;
pub use program::{
    AttributeBindings, Program, MAX_ATTRIBUTES, MAX_LINKED_STAGES, POSITION_ATTRIBUTE,
    UV_ATTRIBUTE,
};
pub use registry::MaterialRegistry;
pub use shader::{compile, CompiledShader, ShaderSource, ShaderStage};

pub use kurbo;
pub use piet;

struct CallOnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for CallOnDrop<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}
