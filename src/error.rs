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

//! Error types for building shader programs.

use crate::shader::ShaderStage;

use std::error::Error as StdError;
use std::fmt;

/// An error that occurred while loading a material or building a program.
#[derive(Debug)]
pub enum Error {
    /// A shader stage failed to compile.
    Compile(CompileError),

    /// The program failed to link.
    Link(LinkError),

    /// The backend could not allocate a GPU object.
    Backend(Box<dyn StdError + 'static>),
}

impl Error {
    pub(crate) fn backend(err: impl StdError + 'static) -> Self {
        Error::Backend(Box::new(err))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Compile(err) => fmt::Display::fmt(err, f),
            Error::Link(err) => fmt::Display::fmt(err, f),
            Error::Backend(err) => write!(f, "gpu backend error: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Compile(err) => Some(err),
            Error::Link(err) => Some(err),
            Error::Backend(err) => Some(&**err),
        }
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Error::Compile(err)
    }
}

impl From<LinkError> for Error {
    fn from(err: LinkError) -> Self {
        Error::Link(err)
    }
}

/// A shader stage failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    stage: ShaderStage,
    log: String,
}

impl CompileError {
    pub(crate) fn new(stage: ShaderStage, log: impl Into<String>) -> Self {
        Self {
            stage,
            log: log.into(),
        }
    }

    /// The stage that failed.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// The diagnostic log, exactly as the driver reported it.
    pub fn log(&self) -> &str {
        &self.log
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to compile {} shader: {}", self.stage, self.log)
    }
}

impl StdError for CompileError {}

/// A program failed to link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkError {
    log: String,
}

impl LinkError {
    pub(crate) fn new(log: impl Into<String>) -> Self {
        Self { log: log.into() }
    }

    /// The diagnostic log, exactly as the driver reported it.
    pub fn log(&self) -> &str {
        &self.log
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to link program: {}", self.log)
    }
}

impl StdError for LinkError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct OutOfHandles;

    impl fmt::Display for OutOfHandles {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("out of handles")
        }
    }

    impl StdError for OutOfHandles {}

    #[test]
    fn compile_error_keeps_log_verbatim() {
        let log = "0:3(1): error: syntax error, unexpected '}'\n";
        let err = CompileError::new(ShaderStage::Fragment, log);
        assert_eq!(err.log(), log);
        assert_eq!(err.stage(), ShaderStage::Fragment);
        assert_eq!(
            err.to_string(),
            format!("failed to compile fragment shader: {log}")
        );
    }

    #[test]
    fn load_error_wraps_stages() {
        let err: Error = LinkError::new("vertexUV: unresolved").into();
        assert!(matches!(err, Error::Link(_)));
        assert_eq!(err.to_string(), "failed to link program: vertexUV: unresolved");
        assert!(err.source().is_some());

        let err = Error::backend(OutOfHandles);
        assert_eq!(err.to_string(), "gpu backend error: out of handles");
    }
}
