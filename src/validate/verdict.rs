use serde::Serialize;

/// Which stage of validation produced a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The file could not be opened as a TIFF container
    OpenFailure,
    /// The cursor could not produce a tile
    FetchFailure,
    /// A tile's JPEG stream did not decode
    DecodeFailure,
    /// A tile had zero bytes
    EmptyChunk,
}

/// Directory and tile index of a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileLocation {
    pub directory: usize,
    pub tile: u32,
}

/// Outcome of validating a chunk or a whole file.
///
/// The message is empty exactly when the verdict is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    is_valid: bool,
    #[serde(rename = "error_message")]
    message: String,
    kind: Option<FaultKind>,
    location: Option<TileLocation>,
}

impl Verdict {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
            kind: None,
            location: None,
        }
    }

    /// An invalid verdict. An empty message is replaced with a generic one.
    pub fn invalid(kind: FaultKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = "Validation failed".to_string();
        }
        Self {
            is_valid: false,
            message,
            kind: Some(kind),
            location: None,
        }
    }

    /// Attach the location of the fault. Has no effect on a valid verdict.
    pub fn at(mut self, location: TileLocation) -> Self {
        if !self.is_valid {
            self.location = Some(location);
        }
        self
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> Option<FaultKind> {
        self.kind
    }

    pub fn location(&self) -> Option<TileLocation> {
        self.location
    }

    pub fn into_tuple(self) -> (bool, String) {
        (self.is_valid, self.message)
    }
}
