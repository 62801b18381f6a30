//! Error types for palette extraction

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Invalid color component: {0} is not an integer in [0, 255]")]
    InvalidColorComponent(f64),

    #[error("Sequence not ready: {0}")]
    SequenceNotReady(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),

    #[error("Unable to decode image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PaletteError>;
