use engine::EngineError;

/// Errors surfaced by the bridge to its callers.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
    #[error("Unknown variant: {0}")]
    UnknownVariant(String),
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("No best move within {0} ms")]
    SearchTimeout(u64),
    #[error("Engine found no legal move")]
    NoLegalMove,
    #[error("Engine not ready")]
    EngineNotReady,
    #[error("Engine error: {0}")]
    Engine(EngineError),
    #[error("Failed to start worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

impl From<EngineError> for BridgeError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidFen(fen) => BridgeError::InvalidFen(fen),
            EngineError::UnknownVariant(variant) => BridgeError::UnknownVariant(variant),
            EngineError::UnknownOption(name) => BridgeError::UnknownOption(name),
            other => BridgeError::Engine(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_taxonomy() {
        assert!(matches!(
            BridgeError::from(EngineError::InvalidFen("x".into())),
            BridgeError::InvalidFen(_)
        ));
        assert!(matches!(
            BridgeError::from(EngineError::UnknownVariant("xiangqi".into())),
            BridgeError::UnknownVariant(v) if v == "xiangqi"
        ));
        assert!(matches!(
            BridgeError::from(EngineError::UnknownOption("Foo".into())),
            BridgeError::UnknownOption(_)
        ));
        assert!(matches!(
            BridgeError::from(EngineError::Closed),
            BridgeError::Engine(EngineError::Closed)
        ));
    }
}
