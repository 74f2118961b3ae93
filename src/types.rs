use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use crate::gesture_classifier::ClassifierError;

/// Número fijo de landmarks por mano
pub const NUM_LANDMARKS: usize = 21;

/// Umbral de proximidad en coordenadas normalizadas (estricto: `<`)
pub const NEAR_THRESHOLD: f32 = 0.1;

/// Punto 2D normalizado a [0, 1] respecto al tamaño del frame.
/// Y crece hacia abajo, X hacia la derecha. No se recorta ningún valor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Índices anatómicos de los 21 landmarks de la mano
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandLandmark {
    /// Base de la palma
    Wrist = 0,
    ThumbCmc = 1,
    /// Base del pulgar
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    /// Nudillo del índice
    IndexMcp = 5,
    /// Base del índice
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    /// Nudillo del meñique
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Lista validada de exactamente 21 landmarks de un único frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkList {
    points: [Point2D; NUM_LANDMARKS],
}

impl LandmarkList {
    pub const fn new(points: [Point2D; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Valida la longitud y copia los puntos.
    /// Una lista vacía es `EmptyInput`; cualquier otra longitud distinta de 21
    /// se rechaza igual porque los índices fijos dejan de tener sentido.
    pub fn from_points(points: &[Point2D]) -> Result<Self, ClassifierError> {
        if points.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }

        let points: [Point2D; NUM_LANDMARKS] =
            points
                .try_into()
                .map_err(|_| ClassifierError::InvalidLandmarkCount {
                    expected: NUM_LANDMARKS,
                    actual: points.len(),
                })?;

        Ok(Self { points })
    }
}

impl Index<HandLandmark> for LandmarkList {
    type Output = Point2D;

    fn index(&self, landmark: HandLandmark) -> &Point2D {
        &self.points[landmark.index()]
    }
}

/// Lateralidad reportada por el detector para el mismo frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("left") {
            Ok(Self::Left)
        } else if s.eq_ignore_ascii_case("right") {
            Ok(Self::Right)
        } else {
            Err(format!("lateralidad desconocida: {:?}", s))
        }
    }
}

/// Vector de apertura de los cinco dedos (true = extendido)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    pub const fn new(thumb: bool, index: bool, middle: bool, ring: bool, pinky: bool) -> Self {
        Self {
            thumb,
            index,
            middle,
            ring,
            pinky,
        }
    }

    /// Orden fijo: pulgar, índice, medio, anular, meñique
    pub fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }
}

impl fmt::Display for FingerStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for open in self.as_array() {
            f.write_str(if open { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Un frame tal como llega del detector, todavía sin validar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Timestamp opaco (microsegundos en el pipeline), solo se propaga
    pub timestamp: i64,
    pub handedness: Handedness,
    pub landmarks: Vec<Point2D>,
}
