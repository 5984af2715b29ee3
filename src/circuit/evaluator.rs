use std::fmt;

use log::{debug, warn};
use num_complex::Complex32;
use serde::Serialize;

use super::{compile_column, Circuit};
use crate::error::EngineError;
use crate::options::EngineOptions;
use crate::pipeline::PipelineExecutor;
use crate::resource::Backend;

/// Result of a successful evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutput {
    /// Animation time the circuit was evaluated at.
    pub time: f64,
    /// Register width.
    pub qubits: u32,
    /// Final amplitudes, little-endian basis order.
    pub amplitudes: Vec<Complex32>,
    /// Probability of measuring each wire ON.
    pub wire_probabilities: Vec<f64>,
}

/// An evaluation that stopped early. The evaluator stays usable.
#[derive(Debug)]
pub struct EvaluationFailure {
    /// Column being compiled or executed, if the failure was in one.
    pub column: Option<usize>,
    /// Cause.
    pub error: EngineError,
}

impl fmt::Display for EvaluationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(c) => write!(f, "column {c}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for EvaluationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Runs circuits on a [`PipelineExecutor`].
pub struct CircuitEvaluator<B: Backend> {
    executor: PipelineExecutor<B>,
}

impl<B: Backend> CircuitEvaluator<B> {
    /// An evaluator over `backend`.
    pub fn new(backend: B, options: &EngineOptions) -> Self {
        Self {
            executor: PipelineExecutor::new(backend, options),
        }
    }

    /// The underlying executor.
    pub fn executor(&self) -> &PipelineExecutor<B> {
        &self.executor
    }

    /// Mutable access to the underlying executor.
    pub fn executor_mut(&mut self) -> &mut PipelineExecutor<B> {
        &mut self.executor
    }

    /// Evaluate `circuit` at animation `time`, starting from |0…0⟩.
    ///
    /// The state is discarded afterwards whether or not evaluation
    /// succeeded.
    ///
    /// # Errors
    ///
    /// An [`EvaluationFailure`] naming the failing column; fault injection
    /// arrives here as [`EngineError::InjectedFault`].
    pub fn evaluate(
        &mut self,
        circuit: &Circuit,
        time: f64,
    ) -> Result<EvaluationOutput, EvaluationFailure> {
        let qubits = circuit.qubit_count();
        let fail = |column, error: EngineError| {
            if error.is_fatal() {
                warn!("evaluation failed: {error}");
            } else {
                debug!("evaluation stopped: {error}");
            }
            EvaluationFailure { column, error }
        };

        let mut state = self
            .executor
            .create_state(qubits)
            .map_err(|e| fail(None, e))?;
        for (c, column) in circuit.columns().iter().enumerate() {
            let passes = match compile_column(column, qubits, time) {
                Ok(passes) => passes,
                Err(e) => {
                    self.executor.discard(state);
                    return Err(fail(Some(c), e));
                }
            };
            state = self
                .executor
                .execute(state, &passes)
                .map_err(|e| fail(Some(c), e))?;
        }

        let amplitudes = self.executor.read(&state);
        self.executor.discard(state);
        let amplitudes = amplitudes.map_err(|e| fail(None, e))?;
        let wire_probabilities: Vec<f64> = (0..qubits)
            .map(|w| {
                amplitudes
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| (i >> w) & 1 == 1)
                    .map(|(_, a)| f64::from(a.norm_sqr()))
                    .sum::<f64>()
            })
            .collect();
        Ok(EvaluationOutput {
            time,
            qubits,
            amplitudes,
            wire_probabilities,
        })
    }
}

impl<B: Backend> fmt::Debug for CircuitEvaluator<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitEvaluator")
            .field("executor", &self.executor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_1_SQRT_2;

    use super::*;
    use crate::catalog::GateCatalog;
    use crate::kernel::reference::ReferenceBackend;

    const EPS: f32 = 1e-5;

    fn evaluator() -> CircuitEvaluator<ReferenceBackend> {
        CircuitEvaluator::new(ReferenceBackend::new(), &EngineOptions::default())
    }

    fn load(json: &str) -> Circuit {
        Circuit::from_json(json, &GateCatalog::standard().unwrap()).unwrap()
    }

    fn peak(out: &EvaluationOutput) -> usize {
        out.amplitudes
            .iter()
            .position(|a| (a.norm_sqr() - 1.0).abs() < EPS)
            .unwrap()
    }

    #[test]
    fn bell_pair() {
        let out = evaluator()
            .evaluate(&load(r#"{"cols":[["H"],["•","X"]]}"#), 0.0)
            .unwrap();
        let r = FRAC_1_SQRT_2;
        let expected = [r, 0.0, 0.0, r];
        for (a, e) in out.amplitudes.iter().zip(expected) {
            assert!((a - Complex32::new(e, 0.0)).norm() < EPS);
        }
        assert!((out.wire_probabilities[0] - 0.5).abs() < 1e-5);
        assert!((out.wire_probabilities[1] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn swap_and_register_arithmetic() {
        let mut ev = evaluator();
        let swapped = ev
            .evaluate(&load(r#"{"cols":[["X"],["Swap",1,"Swap"]]}"#), 0.0)
            .unwrap();
        assert_eq!(peak(&swapped), 0b100);
        let added = ev
            .evaluate(&load(r#"{"cols":[[1,1,"X"],["+=A2",1,"inputA1"]]}"#), 0.0)
            .unwrap();
        assert_eq!(peak(&added), 0b101);
    }

    #[test]
    fn counting_follows_time() {
        let circuit = load(r#"{"cols":[["Counting2"]]}"#);
        let mut ev = evaluator();
        assert_eq!(peak(&ev.evaluate(&circuit, 0.0).unwrap()), 0);
        assert_eq!(peak(&ev.evaluate(&circuit, 0.5).unwrap()), 2);
        assert_eq!(peak(&ev.evaluate(&circuit, 0.8).unwrap()), 3);
    }

    #[test]
    fn fault_injection_is_reported_and_evaluator_survives() {
        let mut ev = evaluator();
        let failure = ev
            .evaluate(&load(r#"{"cols":[["H"],["__error__"],["X"]]}"#), 0.0)
            .unwrap_err();
        assert_eq!(failure.column, Some(1));
        assert!(matches!(failure.error, EngineError::InjectedFault(_)));
        assert!(!failure.error.is_fatal());
        assert_eq!(ev.executor().pool().checked_out_count(), 0);

        let out = ev.evaluate(&load(r#"{"cols":[["X"]]}"#), 0.0).unwrap();
        assert_eq!(peak(&out), 1);
    }

    #[test]
    fn compile_errors_name_the_column() {
        let mut ev = evaluator();
        let failure = ev
            .evaluate(&load(r#"{"cols":[["X"],["Swap"]]}"#), 0.0)
            .unwrap_err();
        assert_eq!(failure.column, Some(1));
        assert!(matches!(failure.error, EngineError::Circuit(_)));
        assert!(failure.to_string().starts_with("column 1:"));
        assert_eq!(ev.executor().pool().checked_out_count(), 0);
    }

    #[test]
    fn loss_before_evaluation_is_transparent() {
        let mut ev = evaluator();
        let circuit = load(r#"{"cols":[["H"],["H"]]}"#);
        assert_eq!(peak(&ev.evaluate(&circuit, 0.0).unwrap()), 0);
        ev.executor_mut()
            .resources_mut()
            .backend_mut()
            .simulate_context_loss();
        assert_eq!(peak(&ev.evaluate(&circuit, 0.0).unwrap()), 0);
        assert_eq!(ev.executor().resources().stats().context_restorations, 1);
    }

    #[test]
    fn unresolved_gates_act_as_identity() {
        let out = evaluator()
            .evaluate(&load(r#"{"cols":[["X"],["NoSuchGate"]]}"#), 0.0)
            .unwrap();
        assert_eq!(peak(&out), 1);
    }
}
