//! Error taxonomy for the graphics command surface (spec §7).
//!
//! Grid and selection operations never raise — out-of-range inputs are
//! clamped silently (spec §7 "Bounds errors"). Only the graphics manager
//! and resize paths return a typed error, mirroring how
//! `par_term_render::error::RenderError` is the one place in the render
//! crate that surfaces a structured error to its caller.

use thiserror::Error;

/// Fixed error-code taxonomy echoed back to the APC reply
/// (`G<selectors>;<code>:<msg>`, spec §4.4.1/§4.4.2).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    #[error("EINVAL: {0}")]
    Invalid(String),
    #[error("ENOMEM: {0}")]
    OutOfMemory(String),
    #[error("ENODATA: {0}")]
    NoData(String),
    #[error("ENOSPC: {0}")]
    NoSpace(String),
    #[error("ENOENT: {0}")]
    NotFound(String),
    #[error("EBADF: {0}")]
    BadFile(String),
    #[error("EFBIG: {0}")]
    TooBig(String),
    #[error("EPERM: {0}")]
    PermissionDenied(String),
    #[error("EILSEQ: {0}")]
    InvalidSequence(String),
    #[error("ECYCLE: {0}")]
    Cycle(String),
    #[error("ETOODEEP: {0}")]
    TooDeep(String),
    #[error("ENOPARENT: {0}")]
    NoParent(String),
}

impl GraphicsError {
    /// Render as the `code:message` form the APC reply protocol expects
    /// (spec §4.4.1 — the manager returns this string, never the variant
    /// name, to the parser for echo).
    pub fn to_reply(&self) -> String {
        self.to_string()
    }
}

pub type GraphicsResult<T> = Result<T, GraphicsError>;
