//! Reconocimiento de gestos estáticos de mano a partir de 21 landmarks 2D.
//!
//! Flujo por frame: landmarks + lateralidad → estados de los dedos →
//! tabla de decisión ordenada → etiqueta con el timestamp de entrada.

pub mod calculator;
pub mod csv_loader;
pub mod finger_state;
pub mod geometry;
pub mod gesture_classifier;
pub mod types;

pub use calculator::{
    ConfigError, FrameError, FrameOutcome, GestureCalculator, NodeConfig, PipelineParams,
    TimestampedGesture,
};
pub use gesture_classifier::{ClassifierError, Classification, GestureClassifier, GestureLabel};
pub use types::{FingerStates, HandLandmark, Handedness, LandmarkFrame, LandmarkList, Point2D};

/// Inicializa el subscriber de `tracing` para los binarios (RUST_LOG o `gestos_mano=info`)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gestos_mano=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
