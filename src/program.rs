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

//! Linking shader stages into programs.

use crate::error::{Error, LinkError};
use crate::gpu_backend::{GpuContext, POSITION_SLOT, UV_SLOT};
use crate::resources::ProgramObject;
use crate::shader::CompiledShader;
use crate::CallOnDrop;

use ahash::RandomState;
use arrayvec::ArrayVec;
use hashbrown::HashMap;

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The number of attribute slots that every GL implementation provides.
pub const MAX_ATTRIBUTES: usize = 16;

/// The most shader stages that can be linked into one program.
pub const MAX_LINKED_STAGES: usize = 5;

/// The name of the position attribute in the default shaders.
pub const POSITION_ATTRIBUTE: &str = "vertexPos";

/// The name of the texture coordinate attribute in the default shaders.
pub const UV_ATTRIBUTE: &str = "vertexUV";

/// A map from attribute slots to attribute names, applied before a program is linked.
///
/// Geometry is submitted through fixed slot numbers, so the slots have to be pinned no matter
/// what the shader names its inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBindings {
    slots: ArrayVec<(u32, Cow<'static, str>), MAX_ATTRIBUTES>,
}

impl AttributeBindings {
    /// An empty set of bindings. The driver picks every slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Position at [`POSITION_SLOT`] and texture coordinates at [`UV_SLOT`].
    pub fn standard() -> Self {
        Self::new()
            .bind(POSITION_SLOT, POSITION_ATTRIBUTE)
            .bind(UV_SLOT, UV_ATTRIBUTE)
    }

    /// Bind `name` to `slot`, replacing whatever was bound to that slot before.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`MAX_ATTRIBUTES`].
    pub fn bind(mut self, slot: u32, name: impl Into<Cow<'static, str>>) -> Self {
        assert!(
            (slot as usize) < MAX_ATTRIBUTES,
            "attribute slot {slot} is out of range"
        );

        let name = name.into();
        match self.slots.iter_mut().find(|(bound, _)| *bound == slot) {
            Some(entry) => entry.1 = name,
            None => self.slots.push((slot, name)),
        }

        self
    }

    /// The name bound to `slot`, if any.
    pub fn name(&self, slot: u32) -> Option<&str> {
        self.slots
            .iter()
            .find(|(bound, _)| *bound == slot)
            .map(|(_, name)| &**name)
    }

    /// Iterate over the `(slot, name)` pairs in the order they were bound.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.slots.iter().map(|(slot, name)| (*slot, &**name))
    }

    /// The number of bound slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots are bound.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A successfully linked shader program.
///
/// The program object is deleted when this is dropped.
pub struct Program<C: GpuContext + ?Sized> {
    object: ProgramObject<C>,

    /// Uniform locations looked up so far, including ones that were not found.
    uniforms: RefCell<HashMap<Box<str>, Option<C::UniformLocation>, RandomState>>,

    /// Attribute slots looked up so far, including ones that were not found.
    attributes: RefCell<HashMap<Box<str>, Option<u32>, RandomState>>,
}

impl<C: GpuContext + ?Sized> fmt::Debug for Program<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("uniforms", &self.uniforms.borrow())
            .field("attributes", &self.attributes.borrow())
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> Program<C> {
    /// Link compiled shader stages into a program.
    ///
    /// The attribute bindings are applied before linking. The stages are detached and
    /// released once linking is over, whether or not it succeeded. A failed link releases
    /// the program as well, so it cannot be retried; compile the stages again instead.
    ///
    /// # Panics
    ///
    /// Panics if `units` is empty or holds more than [`MAX_LINKED_STAGES`] stages.
    pub fn link(
        context: &Rc<C>,
        units: impl IntoIterator<Item = CompiledShader<C>>,
        bindings: &AttributeBindings,
    ) -> Result<Self, Error> {
        let mut stages = ArrayVec::<CompiledShader<C>, MAX_LINKED_STAGES>::new();
        for unit in units {
            assert!(
                stages.try_push(unit).is_ok(),
                "cannot link more than {MAX_LINKED_STAGES} shader stages"
            );
        }
        assert!(!stages.is_empty(), "cannot link a program without shaders");

        let object = ProgramObject::new(context).map_err(Error::backend)?;
        let program = object.resource();

        for stage in &stages {
            context.attach_shader(program, stage.resource());
        }
        let _detach_shaders = CallOnDrop(|| {
            for stage in &stages {
                context.detach_shader(program, stage.resource());
            }
        });

        for (slot, name) in bindings.iter() {
            context.bind_attrib_location(program, slot, name);
        }

        context.link_program(program);

        if !context.program_link_status(program) {
            let log = context.program_info_log(program);
            tracing::debug!("program failed to link");
            return Err(LinkError::new(log).into());
        }

        tracing::debug!("linked program from {} shader stages", stages.len());
        Ok(Self {
            object,
            uniforms: RefCell::new(HashMap::with_hasher(RandomState::new())),
            attributes: RefCell::new(HashMap::with_hasher(RandomState::new())),
        })
    }

    /// Get the location of the uniform called `name`.
    ///
    /// Returns `None` if the program does not expose that uniform, for instance because the
    /// driver optimized it out. Setting a uniform through `None` does nothing. The answer for
    /// each name is looked up once and cached.
    pub fn uniform_location(&self, name: &str) -> Option<C::UniformLocation> {
        if let Some(location) = self.uniforms.borrow().get(name) {
            tracing::trace!("uniform {name} cached");
            return location.clone();
        }

        let location = self.context().uniform_location(self.resource(), name);
        if location.is_none() {
            tracing::debug!("uniform {name} is not active in the program");
        }

        self.uniforms
            .borrow_mut()
            .insert(name.into(), location.clone());
        location
    }

    /// Get the slot of the vertex attribute called `name`.
    ///
    /// Behaves like [`Program::uniform_location`] for attributes that are not found.
    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        if let Some(location) = self.attributes.borrow().get(name) {
            tracing::trace!("attribute {name} cached");
            return *location;
        }

        let location = self.context().attrib_location(self.resource(), name);
        if location.is_none() {
            tracing::debug!("attribute {name} is not active in the program");
        }

        self.attributes.borrow_mut().insert(name.into(), location);
        location
    }

    /// Make this the current program.
    pub fn bind(&self) {
        self.context().use_program(Some(self.resource()));
    }

    /// The context this program belongs to.
    pub fn context(&self) -> &Rc<C> {
        self.object.context()
    }

    /// The raw backend handle.
    pub fn resource(&self) -> C::Program {
        self.object.resource()
    }
}
