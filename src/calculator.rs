//! Nodo de reconocimiento tal como lo ve el pipeline anfitrión.
//!
//! Contrato de streams en tiempo de montaje, un frame de entrada produce una
//! etiqueta con el mismo timestamp, y un pool de hilos sobre canales.

use crate::gesture_classifier::{ClassifierError, GestureClassifier, GestureLabel};
use crate::types::{LandmarkFrame, LandmarkList};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{info, warn};

pub const CALCULATOR_NAME: &str = "HandGestureRecognitionCalculator";

pub const NORM_LANDMARKS_TAG: &str = "NORM_LANDMARKS";
pub const HANDEDNESS_TAG: &str = "HANDEDNESS";
pub const RECOGNIZED_HAND_GESTURE_TAG: &str = "RECOGNIZED_HAND_GESTURE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {direction} stream with tag {tag}")]
    MissingStream {
        tag: &'static str,
        direction: &'static str,
    },

    #[error("Invalid stream spec {0:?}: expected TAG:name")]
    InvalidStreamSpec(String),

    #[error("Unknown calculator {0:?}")]
    UnknownCalculator(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Stream etiquetado, p.ej. `NORM_LANDMARKS:scaled_landmarks`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    pub tag: String,
    pub name: String,
}

impl StreamSpec {
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (tag, name) = spec
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidStreamSpec(spec.to_string()))?;

        let tag = tag.trim();
        let name = name.trim();
        if tag.is_empty() || name.is_empty() {
            return Err(ConfigError::InvalidStreamSpec(spec.to_string()));
        }

        Ok(Self {
            tag: tag.to_string(),
            name: name.to_string(),
        })
    }
}

/// Configuración del nodo dentro del grafo (formato JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub calculator: String,
    #[serde(default)]
    pub input_streams: Vec<String>,
    #[serde(default)]
    pub output_streams: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            calculator: CALCULATOR_NAME.to_string(),
            input_streams: vec![
                format!("{}:scaled_landmarks", NORM_LANDMARKS_TAG),
                format!("{}:handedness", HANDEDNESS_TAG),
            ],
            output_streams: vec![format!(
                "{}:recognized_hand_gesture",
                RECOGNIZED_HAND_GESTURE_TAG
            )],
        }
    }
}

impl NodeConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn find_stream(
    specs: &[StreamSpec],
    tag: &'static str,
    direction: &'static str,
) -> Result<String, ConfigError> {
    specs
        .iter()
        .find(|spec| spec.tag == tag)
        .map(|spec| spec.name.clone())
        .ok_or(ConfigError::MissingStream { tag, direction })
}

fn parse_streams(specs: &[String]) -> Result<Vec<StreamSpec>, ConfigError> {
    specs.iter().map(|spec| StreamSpec::parse(spec)).collect()
}

/// Etiqueta emitida con el timestamp del frame que la produjo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedGesture {
    pub timestamp: i64,
    pub label: GestureLabel,
}

/// Frame rechazado, con su timestamp para que el anfitrión decida
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("frame {timestamp}: {source}")]
pub struct FrameError {
    pub timestamp: i64,
    #[source]
    pub source: ClassifierError,
}

pub type FrameOutcome = Result<TimestampedGesture, FrameError>;

/// Nodo abierto: contrato verificado, listo para procesar frames
#[derive(Debug, Clone)]
pub struct GestureCalculator {
    classifier: GestureClassifier,
    landmarks_stream: String,
    handedness_stream: String,
    output_stream: String,
}

impl GestureCalculator {
    /// Verifica el contrato del nodo. Un stream ausente es fatal al montar el grafo.
    pub fn open(config: &NodeConfig) -> Result<Self, ConfigError> {
        if config.calculator != CALCULATOR_NAME {
            return Err(ConfigError::UnknownCalculator(config.calculator.clone()));
        }

        let inputs = parse_streams(&config.input_streams)?;
        let outputs = parse_streams(&config.output_streams)?;

        let landmarks_stream = find_stream(&inputs, NORM_LANDMARKS_TAG, "input")?;
        let handedness_stream = find_stream(&inputs, HANDEDNESS_TAG, "input")?;
        let output_stream = find_stream(&outputs, RECOGNIZED_HAND_GESTURE_TAG, "output")?;

        info!(
            landmarks = %landmarks_stream,
            handedness = %handedness_stream,
            output = %output_stream,
            "nodo {} abierto",
            CALCULATOR_NAME
        );

        Ok(Self {
            classifier: GestureClassifier::new(),
            landmarks_stream,
            handedness_stream,
            output_stream,
        })
    }

    pub fn output_stream(&self) -> &str {
        &self.output_stream
    }

    pub fn input_streams(&self) -> (&str, &str) {
        (&self.landmarks_stream, &self.handedness_stream)
    }

    /// Procesa un frame. El timestamp de salida es el de entrada (offset 0).
    pub fn process(&self, frame: &LandmarkFrame) -> Result<TimestampedGesture, ClassifierError> {
        let landmarks = LandmarkList::from_points(&frame.landmarks)?;
        let label = self.classifier.classify(&landmarks, frame.handedness);

        Ok(TimestampedGesture {
            timestamp: frame.timestamp,
            label,
        })
    }

    fn process_outcome(&self, frame: &LandmarkFrame) -> FrameOutcome {
        self.process(frame).map_err(|source| {
            warn!(timestamp = frame.timestamp, error = %source, "frame rechazado");
            FrameError {
                timestamp: frame.timestamp,
                source,
            }
        })
    }
}

/// Parámetros del pool de procesamiento
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Hilos de clasificación. Con más de uno el orden de salida no está garantizado.
    pub workers: usize,
    /// Capacidad del canal de entrada (default: 100)
    pub channel_capacity: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            workers: 1,
            channel_capacity: 100,
        }
    }
}

/// Lanza `params.workers` hilos que consumen frames de `rx` y envían el resultado por `tx`.
/// Los hilos terminan cuando se cierra `rx` o cuando nadie escucha en `tx`.
pub fn spawn_workers(
    calculator: &GestureCalculator,
    params: &PipelineParams,
    rx: Receiver<LandmarkFrame>,
    tx: Sender<FrameOutcome>,
) -> Vec<JoinHandle<()>> {
    (0..params.workers.max(1))
        .map(|_| {
            let calculator = calculator.clone();
            let rx = rx.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                for frame in rx.iter() {
                    if tx.send(calculator.process_outcome(&frame)).is_err() {
                        break;
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finger_state::tests::hand;
    use crate::types::{FingerStates, Handedness, Point2D};
    use crossbeam_channel::{bounded, unbounded};

    fn frame(timestamp: i64, states: FingerStates) -> LandmarkFrame {
        LandmarkFrame {
            timestamp,
            handedness: Handedness::Left,
            landmarks: hand(states).to_vec(),
        }
    }

    #[test]
    fn test_default_config_opens() {
        let calculator = GestureCalculator::open(&NodeConfig::default()).unwrap();
        assert_eq!(calculator.output_stream(), "recognized_hand_gesture");
        assert_eq!(
            calculator.input_streams(),
            ("scaled_landmarks", "handedness")
        );
    }

    #[test]
    fn test_missing_handedness_is_config_error() {
        let config = NodeConfig {
            input_streams: vec!["NORM_LANDMARKS:scaled_landmarks".to_string()],
            ..NodeConfig::default()
        };
        let err = GestureCalculator::open(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingStream {
                tag: HANDEDNESS_TAG,
                direction: "input"
            }
        ));
    }

    #[test]
    fn test_missing_output_is_config_error() {
        let config = NodeConfig {
            output_streams: Vec::new(),
            ..NodeConfig::default()
        };
        let err = GestureCalculator::open(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing output stream with tag RECOGNIZED_HAND_GESTURE"
        );
    }

    #[test]
    fn test_bad_stream_spec_and_calculator() {
        assert!(matches!(
            StreamSpec::parse("scaled_landmarks"),
            Err(ConfigError::InvalidStreamSpec(_))
        ));
        assert!(StreamSpec::parse("NORM_LANDMARKS:").is_err());

        let config = NodeConfig {
            calculator: "HandTrackingCalculator".to_string(),
            ..NodeConfig::default()
        };
        assert!(matches!(
            GestureCalculator::open(&config),
            Err(ConfigError::UnknownCalculator(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "calculator": "HandGestureRecognitionCalculator",
            "input_streams": ["NORM_LANDMARKS:lm", "HANDEDNESS:hd"],
            "output_streams": ["RECOGNIZED_HAND_GESTURE:out"]
        }"#;
        let path = std::env::temp_dir().join("gestos_mano_node_config_test.json");
        fs::write(&path, json).unwrap();

        let config = NodeConfig::from_json_file(&path).unwrap();
        let calculator = GestureCalculator::open(&config).unwrap();
        assert_eq!(calculator.input_streams(), ("lm", "hd"));
        assert_eq!(calculator.output_stream(), "out");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_process_keeps_timestamp() {
        let calculator = GestureCalculator::open(&NodeConfig::default()).unwrap();
        let out = calculator
            .process(&frame(1_234_567, FingerStates::new(true, true, true, true, true)))
            .unwrap();
        assert_eq!(out.timestamp, 1_234_567);
        assert_eq!(out.label, GestureLabel::Five);
    }

    #[test]
    fn test_process_rejects_empty_frame() {
        let calculator = GestureCalculator::open(&NodeConfig::default()).unwrap();
        let empty = LandmarkFrame {
            timestamp: 5,
            handedness: Handedness::Right,
            landmarks: Vec::new(),
        };
        assert_eq!(
            calculator.process(&empty).unwrap_err(),
            ClassifierError::EmptyInput
        );
    }

    #[test]
    fn test_workers_forward_labels_and_errors() {
        let calculator = GestureCalculator::open(&NodeConfig::default()).unwrap();
        let params = PipelineParams {
            workers: 3,
            ..PipelineParams::default()
        };
        let (tx_frames, rx_frames) = bounded(params.channel_capacity);
        let (tx_out, rx_out) = unbounded();

        let handles = spawn_workers(&calculator, &params, rx_frames, tx_out);

        for ts in 0..30 {
            tx_frames
                .send(frame(ts, FingerStates::default()))
                .unwrap();
        }
        tx_frames
            .send(LandmarkFrame {
                timestamp: 99,
                handedness: Handedness::Left,
                landmarks: vec![Point2D::new(0.5, 0.5); 3],
            })
            .unwrap();
        drop(tx_frames);

        for handle in handles {
            handle.join().unwrap();
        }

        let mut outcomes: Vec<FrameOutcome> = rx_out.try_iter().collect();
        assert_eq!(outcomes.len(), 31);

        outcomes.sort_by_key(|outcome| match outcome {
            Ok(gesture) => gesture.timestamp,
            Err(err) => err.timestamp,
        });
        for (ts, outcome) in outcomes.iter().take(30).enumerate() {
            let gesture = outcome.as_ref().unwrap();
            assert_eq!(gesture.timestamp, ts as i64);
            assert_eq!(gesture.label, GestureLabel::Fist);
        }
        let rejected = outcomes[30].as_ref().unwrap_err();
        assert_eq!(rejected.timestamp, 99);
        assert_eq!(
            rejected.source,
            ClassifierError::InvalidLandmarkCount {
                expected: 21,
                actual: 3
            }
        );
    }
}
