/*
Reconocimiento de gestos de mano en tiempo real - Rust

Daemon que:
1. Recibe frames de landmarks (21 puntos normalizados + lateralidad) como
   líneas JSON, desde stdin o desde un archivo
2. Valida el contrato del nodo (streams NORM_LANDMARKS, HANDEDNESS y
   RECOGNIZED_HAND_GESTURE) antes de procesar nada
3. Clasifica cada frame en un pool de hilos
4. Emite una etiqueta por frame con el mismo timestamp

Formato de entrada (una línea por frame):
{"timestamp": 33333, "handedness": "Right", "landmarks": [{"x": 0.5, "y": 0.9}, ...]}

Uso:
    detector | ./target/release/gestos-mano
    ./target/release/gestos-mano --graph grafo.json --workers 4 --json frames.jsonl
    ./target/release/gestos-mano --record captura.csv frames.jsonl

Solo las etiquetas van a stdout; mensajes y logs van a stderr.
Logs: RUST_LOG=gestos_mano=debug muestra los estados de los dedos de los frames sin gesto.
*/

use anyhow::{bail, Context, Result};
use crossbeam_channel::{bounded, select, tick, unbounded, Sender};
use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gestos_mano::calculator::{spawn_workers, FrameOutcome};
use gestos_mano::csv_loader::LandmarkRecorder;
use gestos_mano::{GestureCalculator, LandmarkFrame, NodeConfig, PipelineParams};

const STATS_INTERVAL: Duration = Duration::from_secs(5);

struct DaemonOptions {
    graph: Option<PathBuf>,
    input: Option<PathBuf>,
    record: Option<PathBuf>,
    json: bool,
    params: PipelineParams,
}

fn print_usage() {
    eprintln!("Uso: gestos-mano [--graph <grafo.json>] [--workers <n>] [--json] [--record <salida.csv>] [frames.jsonl]");
}

fn parse_args() -> Result<DaemonOptions> {
    let mut opts = DaemonOptions {
        graph: None,
        input: None,
        record: None,
        json: false,
        params: PipelineParams::default(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--graph" => {
                let value = args.next().context("--graph requiere un valor")?;
                opts.graph = Some(PathBuf::from(value));
            }
            "--workers" => {
                let value = args.next().context("--workers requiere un valor")?;
                opts.params.workers = value
                    .parse()
                    .with_context(|| format!("--workers inválido: {}", value))?;
                if opts.params.workers == 0 {
                    bail!("--workers debe ser al menos 1");
                }
            }
            "--record" => {
                let value = args.next().context("--record requiere un valor")?;
                opts.record = Some(PathBuf::from(value));
            }
            "--json" => opts.json = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ if arg.starts_with("--") => {
                print_usage();
                bail!("Argumento desconocido: {}", arg);
            }
            _ => {
                if opts.input.is_some() {
                    print_usage();
                    bail!("Solo se admite un archivo de entrada");
                }
                opts.input = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(opts)
}

type Recorder = LandmarkRecorder<BufWriter<File>>;

/// Lee líneas JSON y las manda al pool. Las líneas mal formadas se descartan.
/// Si hay grabación, cada frame se escribe al CSV según llega.
fn start_reader(
    input: Option<PathBuf>,
    mut recorder: Option<Recorder>,
    tx: Sender<LandmarkFrame>,
) -> Result<JoinHandle<Result<Option<Recorder>>>> {
    let reader: Box<dyn BufRead + Send> = match input {
        Some(path) => {
            let file =
                File::open(&path).with_context(|| format!("No se pudo abrir {:?}", path))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    Ok(thread::spawn(move || -> Result<Option<Recorder>> {
        for (line_idx, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    eprintln!("❌ Error leyendo entrada: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<LandmarkFrame>(&line) {
                Ok(frame) => {
                    if let Some(recorder) = recorder.as_mut() {
                        recorder.record(&frame)?;
                    }
                    if tx.send(frame).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("⚠️  Línea {} descartada: {}", line_idx + 1, e);
                }
            }
        }

        Ok(recorder)
    }))
}

fn main() -> Result<()> {
    gestos_mano::init_tracing();
    let opts = parse_args()?;

    eprintln!("🖐️  Reconocimiento de gestos de mano\n");

    // Contrato del nodo: cualquier stream ausente aborta aquí
    let config = match &opts.graph {
        Some(path) => NodeConfig::from_json_file(path)
            .with_context(|| format!("No se pudo cargar el grafo {:?}", path))?,
        None => NodeConfig::default(),
    };
    let calculator = GestureCalculator::open(&config).context("Configuración del nodo inválida")?;
    eprintln!(
        "✅ Nodo listo ({} hilo(s)) → {}",
        opts.params.workers,
        calculator.output_stream()
    );

    let (tx_frames, rx_frames) = bounded::<LandmarkFrame>(opts.params.channel_capacity);
    let (tx_out, rx_out) = unbounded::<FrameOutcome>();

    let workers = spawn_workers(&calculator, &opts.params, rx_frames, tx_out);
    // El CSV se abre antes de leer nada para fallar pronto
    let recorder = match &opts.record {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("No se pudo crear {:?}", path))?;
            Some(LandmarkRecorder::new(BufWriter::new(file))?)
        }
        None => None,
    };
    let reader = start_reader(opts.input.clone(), recorder, tx_frames)?;

    let ticker = tick(STATS_INTERVAL);
    let mut recognized = 0u64;
    let mut rejected = 0u64;

    loop {
        select! {
            recv(rx_out) -> msg => {
                match msg {
                    Ok(Ok(gesture)) => {
                        recognized += 1;
                        if opts.json {
                            println!("{}", serde_json::to_string(&gesture)?);
                        } else {
                            println!("{} {}", gesture.timestamp, gesture.label);
                        }
                    }
                    Ok(Err(e)) => {
                        // El frame se descarta; el pipeline sigue
                        rejected += 1;
                        eprintln!("❌ {}", e);
                    }
                    Err(_) => break,
                }
            }
            recv(ticker) -> _ => {
                tracing::info!(recognized, rejected, "estadísticas");
            }
        }
    }

    for worker in workers {
        if worker.join().is_err() {
            eprintln!("❌ Un hilo de clasificación terminó con pánico");
        }
    }

    let recorder = match reader.join() {
        Ok(recorder) => recorder?,
        Err(_) => bail!("El hilo lector terminó con pánico"),
    };

    if let (Some(recorder), Some(path)) = (recorder, &opts.record) {
        let frames = recorder.frames_written();
        recorder
            .finish()?
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("No se pudo escribir {:?}", path))?;
        eprintln!("💾 {} frames grabados en {:?}", frames, path);
    }

    eprintln!(
        "\n👋 Fin de la entrada: {} gestos, {} frames rechazados",
        recognized, rejected
    );

    Ok(())
}
