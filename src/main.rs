//! Headless evaluation: `kettex <circuit.json> [time]`.
//!
//! Prints the final amplitudes and per-wire probabilities as JSON. Engine
//! options are read from the TOML file named by `KETTEX_OPTIONS`, if set.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use kettex::catalog::GateCatalog;
use kettex::circuit::{Circuit, CircuitEvaluator, EvaluationFailure, EvaluationOutput};
use kettex::gpu::WgpuBackend;
use kettex::kernel::reference::ReferenceBackend;
use kettex::options::EngineOptions;
use kettex::resource::Backend;

type BoxError = Box<dyn std::error::Error>;

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), BoxError> {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        return Err("usage: kettex <circuit.json> [time]".into());
    };
    let time = args
        .next()
        .map(|t| t.parse::<f64>())
        .transpose()?
        .unwrap_or(0.0);
    let options = match std::env::var_os("KETTEX_OPTIONS") {
        Some(p) => EngineOptions::load(Path::new(&p))?,
        None => EngineOptions::default(),
    };

    let catalog = GateCatalog::standard()?;
    let json = std::fs::read_to_string(&path)?;
    let circuit = Circuit::from_json(&json, &catalog)?;

    let output = match WgpuBackend::new(options.gpu.clone()) {
        Ok(backend) => {
            log::info!("rendering on {}", backend.context().adapter_name);
            evaluate(backend, &options, &circuit, time)?
        }
        Err(e) => {
            log::warn!("{e}; evaluating on the host instead");
            evaluate(ReferenceBackend::new(), &options, &circuit, time)?
        }
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}

fn evaluate<B: Backend>(
    backend: B,
    options: &EngineOptions,
    circuit: &Circuit,
    time: f64,
) -> Result<EvaluationOutput, EvaluationFailure> {
    CircuitEvaluator::new(backend, options).evaluate(circuit, time)
}
