//! The crate-wide error type.

use std::fmt;

use crate::context::ShaderStage;

/// Everything that can go wrong in this crate.
///
/// Pure-function failures (`InvalidParameter`) surface directly to the caller.
/// Resource failures abort the constructing renderer, which releases every
/// GPU resource created so far before the error propagates. Per-frame
/// `DegenerateTransform` failures are meant to skip the affected draw, not to
/// bring down the render loop.
#[derive(Debug)]
pub enum Error {
    /// A malformed geometry-generator argument or degenerate transform input.
    InvalidParameter(String),
    /// A shader stage failed to compile; carries the back-end's info log.
    ShaderCompilation {
        /// The stage that failed.
        stage: ShaderStage,
        /// The compiler's info log.
        log: String,
    },
    /// The program failed to link from its compiled stages.
    ProgramLink {
        /// The linker's info log.
        log: String,
    },
    /// A uniform required by a renderer's shading contract does not exist in
    /// the linked program.
    MissingUniform {
        /// The unresolved uniform name.
        name: &'static str,
    },
    /// An image file could not be opened or decoded.
    TextureDecode(image::ImageError),
    /// The view or view·model matrix was singular at render time; names the
    /// offending matrix.
    DegenerateTransform(&'static str),
    /// The graphics back-end failed to allocate a resource.
    Backend(String),
    /// One or more children of a composite failed to close. The composite
    /// still closed every other child.
    Close(Vec<Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(what) => write!(f, "invalid parameter: {}", what),
            Error::ShaderCompilation { stage, log } => {
                write!(f, "failed to compile {} shader: {}", stage.name(), log)
            }
            Error::ProgramLink { log } => write!(f, "failed to link shader program: {}", log),
            Error::MissingUniform { name } => {
                write!(f, "required uniform `{}` not found in program", name)
            }
            Error::TextureDecode(err) => write!(f, "failed to decode texture: {}", err),
            Error::DegenerateTransform(what) => {
                write!(f, "the {} matrix is not invertible", what)
            }
            Error::Backend(what) => write!(f, "graphics back-end failure: {}", what),
            Error::Close(failures) => {
                write!(f, "{} renderable(s) failed to close:", failures.len())?;
                for failure in failures {
                    write!(f, " [{}]", failure)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::TextureDecode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Error {
        Error::TextureDecode(err)
    }
}
