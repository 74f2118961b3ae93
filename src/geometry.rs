use crate::types::{Point2D, NEAR_THRESHOLD};

/// Distancia euclídea entre dos puntos normalizados
pub fn distance(a: Point2D, b: Point2D) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Test de proximidad (pinza pulgar-índice). Estrictamente menor que el umbral.
pub fn is_near(a: Point2D, b: Point2D) -> bool {
    distance(a, b) < NEAR_THRESHOLD
}
