use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kettex::catalog::GateCatalog;
use kettex::circuit::{Circuit, CircuitEvaluator};
use kettex::kernel::reference::ReferenceBackend;
use kettex::kernel::{Kernel, ShaderPass};
use kettex::options::EngineOptions;
use kettex::pipeline::PipelineExecutor;

fn fourier_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_fourier");

    for qubits in [4u32, 8, 12].iter() {
        let mut executor =
            PipelineExecutor::new(ReferenceBackend::new(), &EngineOptions::default());
        let passes: Vec<ShaderPass> = Kernel::fourier(0, *qubits, false)
            .into_iter()
            .map(ShaderPass::new)
            .collect();

        group.bench_function(format!("{}_qubits", qubits), |b| {
            b.iter(|| {
                let state = executor.create_state(*qubits).unwrap();
                let state = executor.execute(state, black_box(&passes)).unwrap();
                executor.discard(state);
            })
        });
    }
    group.finish();
}

fn circuit_benchmark(c: &mut Criterion) {
    let catalog = GateCatalog::standard().unwrap();
    let circuit = Circuit::from_json(
        r#"{"cols":[["H","H","H","H"],["•","X"],["QFT4"],["inc4"],["inputA2",1,"+=A2"],["QFT†4"]]}"#,
        &catalog,
    )
    .unwrap();
    let mut evaluator =
        CircuitEvaluator::new(ReferenceBackend::new(), &EngineOptions::default());

    c.bench_function("host_circuit_evaluation", |b| {
        b.iter(|| black_box(evaluator.evaluate(black_box(&circuit), 0.25).unwrap()))
    });
}

criterion_group!(benches, fourier_benchmark, circuit_benchmark);
criterion_main!(benches);
