use crate::types::{FingerStates, HandLandmark, Handedness, LandmarkList};

/// Lado de la mano en el que queda el pulgar dentro de la imagen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbSide {
    Left,
    Right,
}

/// Deduce la orientación comparando la X de la base del índice con la del anular.
pub fn thumb_side(landmarks: &LandmarkList) -> ThumbSide {
    if landmarks[HandLandmark::IndexPip].x < landmarks[HandLandmark::RingPip].x {
        ThumbSide::Left
    } else {
        ThumbSide::Right
    }
}

/// Calcula qué dedos están extendidos en un frame.
///
/// Los cuatro dedos largos están abiertos cuando la punta queda por encima
/// (Y menor) de su base. El pulgar se abre hacia un lado, así que se mira el
/// desplazamiento horizontal de la punta respecto a su base, con el signo que
/// marque `thumb_side`.
pub fn evaluate_fingers(landmarks: &LandmarkList, _handedness: Handedness) -> FingerStates {
    // NOTE: la lateralidad del detector se recibe pero no se usa; el lado del
    // pulgar se infiere de la geometría. Unificar ambas fuentes cambiaría las
    // etiquetas para manos con lateralidad mal clasificada.
    let thumb_tip = landmarks[HandLandmark::ThumbTip].x;
    let thumb_base = landmarks[HandLandmark::ThumbMcp].x;
    let thumb = match thumb_side(landmarks) {
        ThumbSide::Left => thumb_tip < thumb_base,
        ThumbSide::Right => thumb_tip > thumb_base,
    };

    FingerStates {
        thumb,
        index: is_raised(landmarks, HandLandmark::IndexTip, HandLandmark::IndexPip),
        middle: is_raised(landmarks, HandLandmark::MiddleTip, HandLandmark::MiddlePip),
        ring: is_raised(landmarks, HandLandmark::RingTip, HandLandmark::RingPip),
        pinky: is_raised(landmarks, HandLandmark::PinkyTip, HandLandmark::PinkyPip),
    }
}

fn is_raised(landmarks: &LandmarkList, tip: HandLandmark, base: HandLandmark) -> bool {
    landmarks[tip].y < landmarks[base].y
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{Point2D, NUM_LANDMARKS};

    /// Mano sintética: índice base en x=0.40, anular base en x=0.60 (pulgar a la izquierda).
    /// Cada dedo largo abierto tiene la punta 0.1 por encima de su base.
    pub(crate) fn hand(states: FingerStates) -> [Point2D; NUM_LANDMARKS] {
        let mut points = [Point2D::new(0.5, 0.8); NUM_LANDMARKS];

        points[HandLandmark::ThumbMcp.index()] = Point2D::new(0.45, 0.6);
        points[HandLandmark::ThumbTip.index()] =
            Point2D::new(if states.thumb { 0.30 } else { 0.50 }, 0.6);

        let fingers = [
            (HandLandmark::IndexTip, HandLandmark::IndexPip, 0.40, states.index),
            (HandLandmark::MiddleTip, HandLandmark::MiddlePip, 0.50, states.middle),
            (HandLandmark::RingTip, HandLandmark::RingPip, 0.60, states.ring),
            (HandLandmark::PinkyTip, HandLandmark::PinkyPip, 0.70, states.pinky),
        ];
        for (tip, base, x, open) in fingers {
            points[base.index()] = Point2D::new(x, 0.5);
            points[tip.index()] = Point2D::new(x, if open { 0.4 } else { 0.6 });
        }

        points
    }

    fn list(points: [Point2D; NUM_LANDMARKS]) -> LandmarkList {
        LandmarkList::new(points)
    }

    #[test]
    fn test_all_fingers_open() {
        let all = FingerStates::new(true, true, true, true, true);
        let states = evaluate_fingers(&list(hand(all)), Handedness::Left);
        assert_eq!(states, all);
    }

    #[test]
    fn test_all_fingers_closed() {
        let none = FingerStates::default();
        let states = evaluate_fingers(&list(hand(none)), Handedness::Right);
        assert_eq!(states, none);
    }

    #[test]
    fn test_each_finger_is_independent() {
        for bit in 0..5 {
            let mut flags = [false; 5];
            flags[bit] = true;
            let expected = FingerStates::new(flags[0], flags[1], flags[2], flags[3], flags[4]);
            let states = evaluate_fingers(&list(hand(expected)), Handedness::Left);
            assert_eq!(states, expected, "dedo {}", bit);
        }
    }

    #[test]
    fn test_thumb_side_from_knuckle_order() {
        let points = hand(FingerStates::default());
        assert_eq!(thumb_side(&list(points)), ThumbSide::Left);

        let mut mirrored = points;
        mirrored[HandLandmark::IndexPip.index()].x = 0.60;
        mirrored[HandLandmark::RingPip.index()].x = 0.40;
        assert_eq!(thumb_side(&list(mirrored)), ThumbSide::Right);

        // Empate: se considera lado derecho
        let mut tied = points;
        tied[HandLandmark::RingPip.index()].x = 0.40;
        assert_eq!(thumb_side(&list(tied)), ThumbSide::Right);
    }

    #[test]
    fn test_thumb_open_on_right_side() {
        let mut points = hand(FingerStates::default());
        points[HandLandmark::IndexPip.index()].x = 0.60;
        points[HandLandmark::RingPip.index()].x = 0.40;
        points[HandLandmark::ThumbTip.index()].x = 0.55;

        let states = evaluate_fingers(&list(points), Handedness::Left);
        assert!(states.thumb);

        points[HandLandmark::ThumbTip.index()].x = 0.30;
        let states = evaluate_fingers(&list(points), Handedness::Left);
        assert!(!states.thumb);
    }

    #[test]
    fn test_handedness_does_not_change_result() {
        let points = list(hand(FingerStates::new(true, false, true, false, true)));
        assert_eq!(
            evaluate_fingers(&points, Handedness::Left),
            evaluate_fingers(&points, Handedness::Right)
        );
    }

    #[test]
    fn test_tip_level_with_base_is_closed() {
        let mut points = hand(FingerStates::default());
        points[HandLandmark::IndexTip.index()].y = 0.5;
        let states = evaluate_fingers(&list(points), Handedness::Left);
        assert!(!states.index);
    }
}
