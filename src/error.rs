// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can stop a render.  Nothing here is recoverable;
//! the binaries report the message and exit.

use failure::Fail;

/// The renderer's error taxonomy.
#[derive(Debug, Fail)]
pub enum BuddhaError {
    /// A render parameter failed validation.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// The image or complex plane has an impossible shape.
    #[fail(display = "invalid plane: {}", _0)]
    InvalidPlane(String),

    /// A render worker panicked; the whole run is abandoned.
    #[fail(display = "render worker panicked: {}", _0)]
    WorkerPanicked(String),

    /// The image encoder or decoder rejected the data.
    #[fail(display = "image error: {}", _0)]
    Image(String),

    /// Reading or writing a file failed.
    #[fail(display = "i/o error: {}", _0)]
    Io(#[cause] std::io::Error),
}

impl From<std::io::Error> for BuddhaError {
    fn from(err: std::io::Error) -> Self {
        BuddhaError::Io(err)
    }
}

impl From<image::ImageError> for BuddhaError {
    fn from(err: image::ImageError) -> Self {
        BuddhaError::Image(err.to_string())
    }
}

impl From<png::EncodingError> for BuddhaError {
    fn from(err: png::EncodingError) -> Self {
        BuddhaError::Image(err.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BuddhaError>;
