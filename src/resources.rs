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

//! Defines useful resource wrappers.

use super::gpu_backend::GpuContext;
use super::shader::ShaderStage;

use std::fmt;
use std::rc::Rc;

macro_rules! define_resource_wrappers {
    ($($name:ident($res:ident, $delete:ident)),* $(,)?) => {
        $(
            /// An owned GPU object that is deleted when this wrapper is dropped.
            pub(crate) struct $name<C: GpuContext + ?Sized> {
                context: Rc<C>,
                resource: C::$res,
            }

            impl<C: GpuContext + ?Sized> fmt::Debug for $name<C> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($name))
                        .finish_non_exhaustive()
                }
            }

            impl<C: GpuContext + ?Sized> $name<C> {
                pub(crate) fn from_raw(context: &Rc<C>, resource: C::$res) -> Self {
                    Self {
                        context: context.clone(),
                        resource,
                    }
                }

                pub(crate) fn resource(&self) -> C::$res {
                    self.resource
                }
            }

            impl<C: GpuContext + ?Sized> Drop for $name<C> {
                fn drop(&mut self) {
                    self.context.$delete(self.resource);
                }
            }
        )*
    };
}

define_resource_wrappers! {
    ShaderObject(Shader, delete_shader),
    ProgramObject(Program, delete_program),
}

impl<C: GpuContext + ?Sized> ShaderObject<C> {
    pub(crate) fn new(context: &Rc<C>, stage: ShaderStage) -> Result<Self, C::Error> {
        let resource = context.create_shader(stage)?;
        Ok(Self::from_raw(context, resource))
    }
}

impl<C: GpuContext + ?Sized> ProgramObject<C> {
    pub(crate) fn new(context: &Rc<C>) -> Result<Self, C::Error> {
        let resource = context.create_program()?;
        Ok(Self::from_raw(context, resource))
    }

    pub(crate) fn context(&self) -> &Rc<C> {
        &self.context
    }
}
