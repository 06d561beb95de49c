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

//! The shared default material and named materials.

use crate::basic::BasicMaterial;
use crate::error::Error;
use crate::gpu_backend::GpuContext;
use crate::material::Material;
use crate::program::Program;

use ahash::RandomState;
use hashbrown::HashMap;

use std::fmt;
use std::rc::Rc;

/// The materials shared by a renderer.
///
/// Construct one when the renderer starts, after the context is current, and pass it by
/// reference to whatever draws. It owns the single default [`BasicMaterial`] and any
/// materials registered by name, and keeps them alive until it is dropped.
pub struct MaterialRegistry<C: GpuContext + ?Sized> {
    context: Rc<C>,
    default: BasicMaterial<C>,
    named: HashMap<Box<str>, Box<dyn Material<C>>, RandomState>,
}

impl<C: GpuContext + ?Sized> fmt::Debug for MaterialRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialRegistry")
            .field("default", &self.default)
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> MaterialRegistry<C> {
    /// Create a registry and load the default material.
    pub fn new(context: Rc<C>) -> Result<Self, Error> {
        let mut default = BasicMaterial::new();
        default.load(&context)?;

        Ok(Self {
            context,
            default,
            named: HashMap::with_hasher(RandomState::new()),
        })
    }

    /// The context the materials were loaded on.
    pub fn context(&self) -> &Rc<C> {
        &self.context
    }

    /// The default material.
    pub fn default_material(&self) -> &BasicMaterial<C> {
        &self.default
    }

    /// The program of the default material.
    pub fn default_program(&self) -> &Program<C> {
        match self.default.program() {
            Some(program) => program,
            None => unreachable!("the default material is loaded on construction"),
        }
    }

    /// Load `material` and register it under `name`.
    ///
    /// Returns the material previously registered under that name, if any. If loading fails
    /// nothing is registered and the previous material stays in place.
    pub fn register(
        &mut self,
        name: impl Into<Box<str>>,
        mut material: Box<dyn Material<C>>,
    ) -> Result<Option<Box<dyn Material<C>>>, Error> {
        let name = name.into();
        material.load(&self.context)?;

        tracing::debug!("registered material {name}");
        Ok(self.named.insert(name, material))
    }

    /// Get the material registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Material<C>> {
        self.named.get(name).map(|material| &**material)
    }

    /// Get the material registered under `name`, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Material<C> + 'static)> {
        self.named.get_mut(name).map(|material| &mut **material)
    }

    /// Remove the material registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Material<C>>> {
        self.named.remove(name)
    }

    /// Get the material registered under `name`, or the default material.
    pub fn get_or_default(&self, name: &str) -> &dyn Material<C> {
        match self.get(name) {
            Some(material) => material,
            None => &self.default,
        }
    }
}
