//! Operating point tests for complete transistor circuits.
//!
//! Exercises the public API end to end: wiring, setup, repeated solves and
//! the error paths that must leave a circuit untouched.

use approx::assert_abs_diff_eq;
use nodal_core::circuit::{Circuit, Pin};
use nodal_core::components::Component;
use nodal_core::{NodalError, SolverConfig};

const NPN_BIAS: [f64; 3] = [4.0510472e-01, 4.9942854e+00, 5.7717722e-04];

// ===========================================================================
// Fixtures
// ===========================================================================

/// Divider-biased stage: S0 is ground, S1 the supply.
fn stage_parts(transistor: Component) -> Vec<(Component, Vec<Pin>)> {
    vec![
        (Component::resistor(1470.0).unwrap(), vec![Pin::Static(0), Pin::Dynamic(0)]),
        (Component::resistor(16670.0).unwrap(), vec![Pin::Dynamic(0), Pin::Static(1)]),
        (Component::resistor(1000.0).unwrap(), vec![Pin::Static(1), Pin::Dynamic(1)]),
        (Component::resistor(100.0).unwrap(), vec![Pin::Static(0), Pin::Dynamic(2)]),
        (transistor, vec![Pin::Dynamic(0), Pin::Dynamic(1), Pin::Dynamic(2)]),
    ]
}

fn assemble(parts: Vec<(Component, Vec<Pin>)>, supply: f64, config: SolverConfig) -> Circuit {
    let mut circuit = Circuit::with_config(3, 2, 0, config).unwrap();
    for (component, pins) in parts {
        circuit.add_component(component, &pins).unwrap();
    }
    circuit.set_static_state(&[0.0, supply]).unwrap();
    circuit.set_time_step(1e-3).unwrap();
    circuit
}

fn npn_stage() -> Circuit {
    assemble(stage_parts(Component::npn()), 5.0, SolverConfig::default())
}

fn pnp_stage() -> Circuit {
    assemble(stage_parts(Component::pnp()), -5.0, SolverConfig::default())
}

fn assert_states_close(a: &[f64], b: &[f64], epsilon: f64) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_abs_diff_eq!(*x, *y, epsilon = epsilon);
    }
}

// ===========================================================================
// Reference operating points
// ===========================================================================

#[test]
fn npn_stage_bias_point() {
    let mut circuit = npn_stage();
    let report = circuit.setup().unwrap();

    assert_states_close(circuit.dynamic_state(), &NPN_BIAS, 1e-6);
    assert!(report.residual < 1e-8);
    assert!(report.iterations <= 50);
}

#[test]
fn pnp_stage_mirrors_npn() {
    let mut npn = npn_stage();
    let mut pnp = pnp_stage();
    npn.setup().unwrap();
    pnp.setup().unwrap();

    let negated: Vec<f64> = npn.dynamic_state().iter().map(|v| -v).collect();
    assert_states_close(pnp.dynamic_state(), &negated, 1e-6);

    let expected: Vec<f64> = NPN_BIAS.iter().map(|v| -v).collect();
    assert_states_close(pnp.dynamic_state(), &expected, 1e-6);
}

#[test]
fn matched_pair_settles_at_midpoint() {
    let mut circuit = Circuit::new(1, 3, 0);
    circuit
        .add_component(Component::resistor(200e3).unwrap(), &[Pin::Static(0), Pin::Dynamic(0)])
        .unwrap();
    circuit
        .add_component(Component::npn(), &[Pin::Static(0), Pin::Static(1), Pin::Dynamic(0)])
        .unwrap();
    circuit
        .add_component(Component::pnp(), &[Pin::Static(0), Pin::Static(2), Pin::Dynamic(0)])
        .unwrap();
    circuit.set_static_state(&[1.0, 2.0, 0.0]).unwrap();
    circuit.set_time_step(1e-3).unwrap();

    circuit.setup().unwrap();
    assert_abs_diff_eq!(circuit.dynamic_state()[0], 1.0, epsilon = 1e-4);
}

// ===========================================================================
// Solver properties
// ===========================================================================

#[test]
fn registration_order_does_not_matter() {
    let mut reference = npn_stage();
    reference.setup().unwrap();

    let mut reversed = stage_parts(Component::npn());
    reversed.reverse();
    let mut rotated = stage_parts(Component::npn());
    rotated.rotate_left(2);

    for parts in [reversed, rotated] {
        let mut circuit = assemble(parts, 5.0, SolverConfig::default());
        circuit.setup().unwrap();
        assert_states_close(circuit.dynamic_state(), reference.dynamic_state(), 1e-6);
    }
}

#[test]
fn repeated_solves_are_deterministic() {
    let mut a = npn_stage();
    let mut b = npn_stage();
    a.setup().unwrap();
    b.setup().unwrap();
    assert_eq!(a.dynamic_state(), b.dynamic_state());

    let first = a.dynamic_state().to_vec();
    for _ in 0..3 {
        a.solve().unwrap();
        assert_states_close(a.dynamic_state(), &first, 1e-9);
    }
}

#[test]
fn floating_node_is_an_error() {
    // D1 and D2 form an island joined only to each other
    let mut circuit = Circuit::new(3, 1, 0);
    circuit
        .add_component(Component::resistor(1000.0).unwrap(), &[Pin::Static(0), Pin::Dynamic(0)])
        .unwrap();
    circuit
        .add_component(Component::resistor(1000.0).unwrap(), &[Pin::Dynamic(0), Pin::Ground])
        .unwrap();
    circuit
        .add_component(Component::resistor(1000.0).unwrap(), &[Pin::Dynamic(1), Pin::Dynamic(2)])
        .unwrap();
    circuit.set_static_state(&[2.0]).unwrap();

    let err = circuit.setup().unwrap_err();
    assert!(err.is_numerical() || err.is_convergence(), "{}", err);
    assert_eq!(circuit.dynamic_state(), &[0.0, 0.0, 0.0]);
}

#[test]
fn floating_node_without_drive_is_an_error() {
    // With zero drive every current is already balanced at the start
    let mut circuit = Circuit::new(3, 1, 0);
    circuit
        .add_component(Component::resistor(1000.0).unwrap(), &[Pin::Static(0), Pin::Dynamic(0)])
        .unwrap();
    circuit
        .add_component(Component::resistor(1000.0).unwrap(), &[Pin::Dynamic(0), Pin::Ground])
        .unwrap();
    circuit
        .add_component(Component::resistor(1000.0).unwrap(), &[Pin::Dynamic(1), Pin::Dynamic(2)])
        .unwrap();
    circuit.set_static_state(&[0.0]).unwrap();

    let err = circuit.setup().unwrap_err();
    assert!(matches!(err, NodalError::FloatingNode { .. }), "{}", err);
    assert!(err.is_numerical());
    assert_eq!(circuit.dynamic_state(), &[0.0, 0.0, 0.0]);
}

#[test]
fn static_reassignment_moves_operating_point() {
    let mut circuit = npn_stage();
    circuit.setup().unwrap();

    circuit.set_static_state(&[0.0, 9.0]).unwrap();
    circuit.solve().unwrap();
    let mut fresh = assemble(stage_parts(Component::npn()), 9.0, SolverConfig::default());
    fresh.setup().unwrap();
    assert_states_close(circuit.dynamic_state(), fresh.dynamic_state(), 1e-5);

    // And back again
    circuit.set_static_state(&[0.0, 5.0]).unwrap();
    circuit.solve().unwrap();
    assert_states_close(circuit.dynamic_state(), &NPN_BIAS, 1e-5);
}

#[test]
fn warm_up_reaches_the_same_point() {
    let config = SolverConfig::new().with_warmup_steps(10);
    let mut circuit = assemble(stage_parts(Component::npn()), 5.0, config);
    circuit.setup().unwrap();

    assert_eq!(circuit.static_state(), &[0.0, 5.0]);
    assert_states_close(circuit.dynamic_state(), &NPN_BIAS, 1e-5);
}

#[test]
fn failed_warm_up_leaves_state_unchanged() {
    let mut failures = 0;
    for steps in 2..=11 {
        let config = SolverConfig::new()
            .with_warmup_steps(steps)
            .with_max_iterations(4);
        let mut circuit = assemble(stage_parts(Component::npn()), 5.0, config);

        match circuit.setup() {
            Ok(_) => assert_states_close(circuit.dynamic_state(), &NPN_BIAS, 1e-5),
            Err(err) => {
                failures += 1;
                assert!(err.is_convergence(), "{}", err);
                assert_eq!(circuit.dynamic_state(), &[0.0, 0.0, 0.0]);
                assert_eq!(circuit.static_state(), &[0.0, 5.0]);
            }
        }
    }
    assert!(failures > 0);
}

#[test]
fn configuration_errors_leave_circuit_unchanged() {
    let mut circuit = npn_stage();
    circuit.setup().unwrap();
    let state = circuit.dynamic_state().to_vec();

    let err = circuit
        .add_component(Component::npn(), &[Pin::Dynamic(0), Pin::Static(2), Pin::Ground])
        .unwrap_err();
    assert!(matches!(err, NodalError::PinOutOfRange { .. }));
    assert!(err.is_configuration());

    let err = circuit.set_static_state(&[0.0, 5.0, 1.0]).unwrap_err();
    assert!(err.is_configuration());
    let err = circuit.set_time_step(-1.0).unwrap_err();
    assert!(err.is_configuration());

    assert_eq!(circuit.components().len(), 5);
    assert_eq!(circuit.static_state(), &[0.0, 5.0]);
    assert_eq!(circuit.time_step(), Some(1e-3));
    assert_eq!(circuit.dynamic_state(), state.as_slice());
}

#[test]
fn iteration_cap_is_a_convergence_error() {
    let config = SolverConfig::new().with_max_iterations(2);
    let mut circuit = assemble(stage_parts(Component::npn()), 5.0, config);

    let err = circuit.setup().unwrap_err();
    assert!(err.is_convergence());
    assert_eq!(circuit.dynamic_state(), &[0.0, 0.0, 0.0]);
}

#[test]
fn converged_state_balances_currents() {
    let mut circuit = npn_stage();
    circuit.setup().unwrap();
    assert!(circuit.residual() < 1e-8);

    // Emitter current through the 100 ohm resistor equals ic + ib
    let emitter = circuit.dynamic_state()[2];
    let collector = circuit.dynamic_state()[1];
    let ic = (5.0 - collector) / 1000.0;
    let ie = emitter / 100.0;
    assert!(ie > ic);
    assert_abs_diff_eq!(ic / ie, 100.0 / 101.0, epsilon = 1e-2);
}

// ===========================================================================
// Concurrency
// ===========================================================================

#[test]
fn independent_circuits_solve_on_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Circuit>();

    let mut reference = npn_stage();
    reference.setup().unwrap();
    let reference = reference.dynamic_state().to_vec();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let mut circuit = npn_stage();
                circuit.setup().unwrap();
                circuit.dynamic_state().to_vec()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), reference);
    }
}
