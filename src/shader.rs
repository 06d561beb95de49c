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

//! Shader stages and their compilation.

use crate::error::{CompileError, Error};
use crate::gpu_backend::GpuContext;
use crate::resources::ShaderObject;

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

/// The pipeline phase a shader runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Transforms input geometry.
    Vertex,

    /// Computes the color of each pixel.
    Fragment,
}

impl ShaderStage {
    /// A lowercase name for this stage.
    pub fn as_str(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The source text of one shader stage.
///
/// The text is expected to start with a `#version` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    stage: ShaderStage,
    text: Cow<'static, str>,
}

impl ShaderSource {
    /// Create a new shader source for the given stage.
    pub fn new(stage: ShaderStage, text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            stage,
            text: text.into(),
        }
    }

    /// Create a new vertex shader source.
    pub fn vertex(text: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ShaderStage::Vertex, text)
    }

    /// Create a new fragment shader source.
    pub fn fragment(text: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ShaderStage::Fragment, text)
    }

    /// The stage this source is for.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// The source text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A shader stage that compiled successfully.
///
/// The shader object is deleted when this is dropped. [`Program::link`] consumes these and
/// releases them once linking is over.
///
/// [`Program::link`]: crate::Program::link
pub struct CompiledShader<C: GpuContext + ?Sized> {
    object: ShaderObject<C>,
    stage: ShaderStage,
    log: Option<String>,
}

impl<C: GpuContext + ?Sized> fmt::Debug for CompiledShader<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledShader")
            .field("stage", &self.stage)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> CompiledShader<C> {
    /// The stage of this shader.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Warnings the driver emitted while compiling, if any.
    pub fn log(&self) -> Option<&str> {
        self.log.as_deref()
    }

    pub(crate) fn resource(&self) -> C::Shader {
        self.object.resource()
    }
}

/// Compile one shader stage.
///
/// On failure the shader object is released and the driver's log is returned unchanged.
pub fn compile<C: GpuContext + ?Sized>(
    context: &Rc<C>,
    source: &ShaderSource,
) -> Result<CompiledShader<C>, Error> {
    let stage = source.stage();

    if source.text().trim().is_empty() {
        return Err(CompileError::new(stage, "shader source is empty").into());
    }

    let object = ShaderObject::new(context, stage).map_err(Error::backend)?;
    let shader = object.resource();

    context.shader_source(shader, source.text());
    context.compile_shader(shader);

    let log = context.shader_info_log(shader);
    if !context.shader_compile_status(shader) {
        tracing::debug!("{stage} shader failed to compile");

        let log = if log.is_empty() {
            String::from("no diagnostic available")
        } else {
            log
        };
        return Err(CompileError::new(stage, log).into());
    }

    tracing::debug!("compiled {stage} shader");
    Ok(CompiledShader {
        object,
        stage,
        log: if log.trim().is_empty() {
            None
        } else {
            Some(log)
        },
    })
}
