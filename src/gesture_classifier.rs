use crate::finger_state::evaluate_fingers;
use crate::geometry::is_near;
use crate::types::{FingerStates, HandLandmark, Handedness, LandmarkList, Point2D};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("Input landmark vector is empty")]
    EmptyInput,

    #[error("Invalid landmark count: expected {expected}, got {actual}")]
    InvalidLandmarkCount { expected: usize, actual: usize },
}

/// Vocabulario cerrado de gestos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GestureLabel {
    Five,
    Four,
    Three,
    Two,
    One,
    Yeah,
    Rock,
    Spiderman,
    Fist,
    Ok,
    Bird,
    Shaka,
    None,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 13] = [
        Self::Five,
        Self::Four,
        Self::Three,
        Self::Two,
        Self::One,
        Self::Yeah,
        Self::Rock,
        Self::Spiderman,
        Self::Fist,
        Self::Ok,
        Self::Bird,
        Self::Shaka,
        Self::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Five => "FIVE",
            Self::Four => "FOUR",
            Self::Three => "THREE",
            Self::Two => "TWO",
            Self::One => "ONE",
            Self::Yeah => "YEAH",
            Self::Rock => "ROCK",
            Self::Spiderman => "SPIDERMAN",
            Self::Fist => "FIST",
            Self::Ok => "OK",
            Self::Bird => "BIRD",
            Self::Shaka => "SHAKA",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for GestureLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("gesto desconocido: {:?}", s))
    }
}

/// Patrón de apertura por dedo. `None` = cualquier estado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerPattern {
    pub thumb: Option<bool>,
    pub index: Option<bool>,
    pub middle: Option<bool>,
    pub ring: Option<bool>,
    pub pinky: Option<bool>,
}

impl FingerPattern {
    const fn exact(thumb: bool, index: bool, middle: bool, ring: bool, pinky: bool) -> Self {
        Self {
            thumb: Some(thumb),
            index: Some(index),
            middle: Some(middle),
            ring: Some(ring),
            pinky: Some(pinky),
        }
    }

    const fn any_thumb(index: bool, middle: bool, ring: bool, pinky: bool) -> Self {
        Self {
            thumb: None,
            index: Some(index),
            middle: Some(middle),
            ring: Some(ring),
            pinky: Some(pinky),
        }
    }

    pub fn matches(&self, states: &FingerStates) -> bool {
        let pattern = [self.thumb, self.index, self.middle, self.ring, self.pinky];
        pattern
            .into_iter()
            .zip(states.as_array())
            .all(|(want, open)| want.map_or(true, |want| want == open))
    }
}

/// Una fila de la tabla de decisión
#[derive(Debug, Clone, Copy)]
pub struct GestureRule {
    pub pattern: FingerPattern,
    /// Además exige la pinza pulgar-índice
    pub requires_pinch: bool,
    pub label: GestureLabel,
}

impl GestureRule {
    const fn new(pattern: FingerPattern, label: GestureLabel) -> Self {
        Self {
            pattern,
            requires_pinch: false,
            label,
        }
    }

    const fn with_pinch(pattern: FingerPattern, label: GestureLabel) -> Self {
        Self {
            pattern,
            requires_pinch: true,
            label,
        }
    }
}

/// Tabla ordenada: gana la primera regla que se cumple.
/// THREE ocupa dos filas consecutivas (pulgar+índice+medio, o índice+medio+anular).
/// El orden importa, las reglas se solapan.
pub const GESTURE_RULES: [GestureRule; 13] = {
    use FingerPattern as P;
    use GestureLabel as G;
    [
        GestureRule::new(P::exact(true, true, true, true, true), G::Five),
        GestureRule::new(P::exact(false, true, true, true, true), G::Four),
        GestureRule::new(P::exact(true, true, true, false, false), G::Three),
        GestureRule::new(P::exact(false, true, true, true, false), G::Three),
        GestureRule::new(P::exact(true, true, false, false, false), G::Two),
        GestureRule::new(P::exact(false, true, false, false, false), G::One),
        GestureRule::new(P::exact(false, true, true, false, false), G::Yeah),
        GestureRule::new(P::exact(false, true, false, false, true), G::Rock),
        GestureRule::new(P::exact(true, true, false, false, true), G::Spiderman),
        GestureRule::new(P::exact(false, false, false, false, false), G::Fist),
        GestureRule::with_pinch(P::any_thumb(false, true, true, true), G::Ok),
        GestureRule::new(P::any_thumb(false, true, false, false), G::Bird),
        GestureRule::new(P::exact(true, false, false, false, true), G::Shaka),
    ]
};

/// Número de regla (1-based) del caso por defecto
pub const FALLBACK_RULE: usize = 13;

/// Resultado detallado de una clasificación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub states: FingerStates,
    pub label: GestureLabel,
    /// Regla que decidió, numerada como en la tabla publicada (1..=13)
    pub rule: usize,
}

fn thumb_touches_index(landmarks: &LandmarkList) -> bool {
    is_near(
        landmarks[HandLandmark::ThumbTip],
        landmarks[HandLandmark::IndexTip],
    )
}

/// Recorre la tabla y devuelve la etiqueta y el número de regla.
/// La proximidad solo se evalúa cuando el patrón de dedos ya coincide.
fn match_rule(states: &FingerStates, landmarks: &LandmarkList) -> (GestureLabel, usize) {
    let mut rule_number = 0;
    let mut last_label = None;

    for rule in GESTURE_RULES.iter() {
        // Filas consecutivas con la misma etiqueta son ramas de una misma regla
        if last_label != Some(rule.label) {
            rule_number += 1;
        }
        last_label = Some(rule.label);

        if rule.pattern.matches(states) && (!rule.requires_pinch || thumb_touches_index(landmarks))
        {
            return (rule.label, rule_number);
        }
    }

    (GestureLabel::None, FALLBACK_RULE)
}

/// Aplica la tabla de decisión a un vector de apertura ya calculado
pub fn classify_states(states: &FingerStates, landmarks: &LandmarkList) -> GestureLabel {
    match_rule(states, landmarks).0
}

/// Clasificador sin estado: cada llamada depende solo de sus argumentos,
/// así que se puede compartir entre hilos sin sincronización.
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureClassifier;

impl GestureClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Clasifica una lista ya validada. Nunca falla.
    pub fn classify(&self, landmarks: &LandmarkList, handedness: Handedness) -> GestureLabel {
        self.explain(landmarks, handedness).label
    }

    /// Valida la longitud y clasifica. Una entrada inválida no produce etiqueta.
    pub fn classify_points(
        &self,
        points: &[Point2D],
        handedness: Handedness,
    ) -> Result<GestureLabel, ClassifierError> {
        let landmarks = LandmarkList::from_points(points)?;
        Ok(self.classify(&landmarks, handedness))
    }

    /// Igual que `classify` pero devuelve también los estados y la regla aplicada
    pub fn explain(&self, landmarks: &LandmarkList, handedness: Handedness) -> Classification {
        let states = evaluate_fingers(landmarks, handedness);
        let (label, rule) = match_rule(&states, landmarks);

        if label == GestureLabel::None {
            debug!(finger_states = %states, "ninguna regla coincide");
        } else {
            trace!(finger_states = %states, %label, rule, "gesto reconocido");
        }

        Classification {
            states,
            label,
            rule,
        }
    }
}
