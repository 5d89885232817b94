use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Degenerate image: {width}x{height} has no pixels")]
    DegenerateImage { width: u32, height: u32 },

    #[error("Conversion failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Conversion failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion failed: {0}")]
    Conversion(String),
}

impl PatternError {
    /// True for errors caused by the caller's parameters or input geometry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PatternError::InvalidParameter(_) | PatternError::DegenerateImage { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PatternError>;

// Serialized as its display string so hosts can put it in a JSON envelope
impl serde::Serialize for PatternError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
