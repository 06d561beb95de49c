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

//! The binding contract between materials and the render loop.

use crate::error::Error;
use crate::gpu_backend::GpuContext;
use crate::CallOnDrop;

use kurbo::Affine;

use std::rc::Rc;

/// An object that is drawn with a material.
///
/// Materials receive the object they are drawing in [`Material::begin`] and
/// [`Material::end`]. Nothing here is required; materials that need per-object state can
/// read it through these methods.
pub trait Renderable {
    /// The transform of this object in world space, if it has one.
    fn transform(&self) -> Option<Affine> {
        None
    }
}

impl Renderable for () {}

impl Renderable for Affine {
    fn transform(&self) -> Option<Affine> {
        Some(*self)
    }
}

/// Prepares GPU state for drawing an object and cleans up after it.
///
/// The render loop holds materials as `dyn Material<C>` and never needs to know which kind it
/// has. A draw goes:
///
/// ```text
/// material.begin(&object);
/// // submit geometry
/// material.end(&object);
/// ```
///
/// Every `begin` must be followed by exactly one `end` before the next `begin`. `begin` may
/// change global context state, such as the current program, and `end` may restore state that
/// `begin` changed, so neither is safe to skip.
pub trait Material<C: GpuContext + ?Sized> {
    /// Build the GPU resources this material needs.
    ///
    /// Must succeed once before [`begin`] or [`end`] are called. Calling it again rebuilds
    /// everything from scratch and releases the previous resources. If it fails, the material
    /// is left unloaded.
    ///
    /// [`begin`]: Material::begin
    /// [`end`]: Material::end
    fn load(&mut self, context: &Rc<C>) -> Result<(), Error>;

    /// Bind this material's state before `target` is drawn.
    ///
    /// # Panics
    ///
    /// May panic if the material has not been loaded.
    fn begin(&self, target: &dyn Renderable);

    /// Clean up after `target` has been drawn.
    fn end(&self, target: &dyn Renderable);

    /// Whether the last call to [`load`](Material::load) succeeded.
    fn is_loaded(&self) -> bool;
}

/// Run `submit` between [`Material::begin`] and [`Material::end`] for `target`.
///
/// `end` runs even if `submit` panics, so the pairing always holds.
pub fn draw<C, M, R>(material: &M, target: &dyn Renderable, submit: impl FnOnce() -> R) -> R
where
    C: GpuContext + ?Sized,
    M: Material<C> + ?Sized,
{
    material.begin(target);
    let _end = CallOnDrop(|| material.end(target));
    submit()
}
