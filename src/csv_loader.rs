use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use csv::{ReaderBuilder, Writer};

use crate::types::{Handedness, LandmarkFrame, Point2D};

pub const CSV_HEADER: [&str; 6] = ["frame", "timestamp", "handedness", "landmark", "x", "y"];

/// Frame en construcción: landmarks indexados para detectar huecos
struct PendingFrame {
    timestamp: i64,
    handedness: Handedness,
    landmarks: BTreeMap<usize, Point2D>,
}

/// Carga una secuencia de LandmarkFrame desde un CSV en el formato
/// frame,timestamp,handedness,landmark,x,y (una fila por landmark).
///
/// Un frame sin landmarks se escribe como una fila con landmark, x e y vacíos.
/// Los frames con un número de landmarks distinto de 21 se cargan igual: es el
/// clasificador quien los rechaza.
pub fn load_frames_from_csv(path: impl AsRef<Path>) -> Result<Vec<LandmarkFrame>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;

    let mut frames: BTreeMap<u64, PendingFrame> = BTreeMap::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 1;
        let record = result.with_context(|| format!("Fila {} inválida en {:?}", row, path))?;
        if record.len() < 6 {
            bail!("La fila {} no tiene 6 columnas", row);
        }

        let frame_idx: u64 = record[0]
            .parse()
            .with_context(|| format!("frame inválido en fila {}", row))?;
        let timestamp: i64 = record[1]
            .parse()
            .with_context(|| format!("timestamp inválido en fila {}", row))?;
        let handedness: Handedness = record[2]
            .parse()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("handedness inválido en fila {}", row))?;

        let pending = frames.entry(frame_idx).or_insert_with(|| PendingFrame {
            timestamp,
            handedness,
            landmarks: BTreeMap::new(),
        });

        ensure!(
            pending.timestamp == timestamp && pending.handedness == handedness,
            "Frame {} con timestamp/handedness inconsistentes (fila {})",
            frame_idx,
            row
        );

        // Fila marcador de frame vacío
        if record[3].is_empty() {
            ensure!(
                record[4].is_empty() && record[5].is_empty(),
                "Fila {} sin landmark pero con coordenadas",
                row
            );
            continue;
        }

        let landmark: usize = record[3]
            .parse()
            .with_context(|| format!("landmark inválido en fila {}", row))?;
        let x: f32 = record[4]
            .parse()
            .with_context(|| format!("x inválido en fila {}", row))?;
        let y: f32 = record[5]
            .parse()
            .with_context(|| format!("y inválido en fila {}", row))?;

        if pending.landmarks.insert(landmark, Point2D::new(x, y)).is_some() {
            bail!(
                "Landmark {} duplicado en frame {} (fila {})",
                landmark,
                frame_idx,
                row
            );
        }
    }

    ensure!(!frames.is_empty(), "El CSV {:?} no contiene datos", path);

    let mut out = Vec::with_capacity(frames.len());
    for (frame_idx, pending) in frames {
        // Los índices deben ser 0..n sin huecos, si no las posiciones fijas se corren
        let contiguous = pending.landmarks.keys().copied().eq(0..pending.landmarks.len());
        ensure!(
            contiguous,
            "Frame {} tiene landmarks no contiguos: {:?}",
            frame_idx,
            pending.landmarks.keys().collect::<Vec<_>>()
        );

        out.push(LandmarkFrame {
            timestamp: pending.timestamp,
            handedness: pending.handedness,
            landmarks: pending.landmarks.into_values().collect(),
        });
    }

    Ok(out)
}

/// Graba frames en el formato de `load_frames_from_csv` a medida que llegan,
/// sin acumularlos en memoria.
pub struct LandmarkRecorder<W: Write> {
    writer: Writer<W>,
    frames_written: u64,
}

impl<W: Write> LandmarkRecorder<W> {
    pub fn new(output: W) -> Result<Self> {
        let mut writer = Writer::from_writer(output);
        writer.write_record(CSV_HEADER)?;
        Ok(Self {
            writer,
            frames_written: 0,
        })
    }

    /// Escribe un frame tal cual llegó, aunque luego el clasificador lo rechace
    pub fn record(&mut self, frame: &LandmarkFrame) -> Result<()> {
        let frame_idx = self.frames_written.to_string();
        let timestamp = frame.timestamp.to_string();
        let handedness = frame.handedness.as_str();

        if frame.landmarks.is_empty() {
            self.writer
                .write_record([frame_idx.as_str(), timestamp.as_str(), handedness, "", "", ""])?;
        }

        for (landmark, point) in frame.landmarks.iter().enumerate() {
            self.writer.write_record([
                frame_idx.clone(),
                timestamp.clone(),
                handedness.to_string(),
                landmark.to_string(),
                point.x.to_string(),
                point.y.to_string(),
            ])?;
        }

        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Vacía el buffer y devuelve el destino
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("No se pudo vaciar el CSV: {}", e.error()))
    }
}

/// Exporta frames al mismo formato CSV que lee `load_frames_from_csv`
pub fn frames_to_csv(frames: &[LandmarkFrame]) -> Result<String> {
    let mut recorder = LandmarkRecorder::new(Vec::new())?;
    for frame in frames {
        recorder.record(frame)?;
    }
    Ok(String::from_utf8(recorder.finish()?)?)
}
