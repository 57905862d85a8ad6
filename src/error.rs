use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizationError {
    #[error("invalid piece '{id}': {reason}")]
    InvalidPiece { id: String, reason: String },
    #[error("invalid sheet #{index}: {reason}")]
    InvalidSheet { index: usize, reason: String },
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("no pieces to cut")]
    NoPieces,
    #[error("no sheet sizes supplied")]
    NoSheets,
    #[error("pieces do not fit on any sheet: {}", ids.join(", "))]
    UnplaceablePiece { ids: Vec<String> },
}

impl OptimizationError {
    /// Stable tag for machine consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPiece { .. } => "invalid_piece",
            Self::InvalidSheet { .. } => "invalid_sheet",
            Self::InvalidOptions(_) => "invalid_options",
            Self::NoPieces => "no_pieces",
            Self::NoSheets => "no_sheets",
            Self::UnplaceablePiece { .. } => "unplaceable_piece",
        }
    }

    pub fn piece_ids(&self) -> Option<&[String]> {
        match self {
            Self::UnplaceablePiece { ids } => Some(ids),
            _ => None,
        }
    }

    pub fn invalid_piece(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPiece {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_sheet(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSheet {
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OptimizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unplaceable_message_lists_ids() {
        let err = OptimizationError::UnplaceablePiece {
            ids: vec!["X".into(), "Z".into()],
        };
        assert_eq!(err.to_string(), "pieces do not fit on any sheet: X, Z");
        assert_eq!(err.kind(), "unplaceable_piece");
        assert_eq!(err.piece_ids().unwrap(), ["X".to_string(), "Z".to_string()]);
    }

    #[test]
    fn test_invalid_piece_names_id() {
        let err = OptimizationError::invalid_piece("A7", "width must be positive");
        assert_eq!(err.to_string(), "invalid piece 'A7': width must be positive");
        assert!(err.piece_ids().is_none());
    }
}
