//! Tests for the engine: construction, reuse, concurrency, and a property
//! test over randomly generated linear chains.


use std::sync::Arc;

use conflux_engine::{ComputationError, ComputationMode, Engine};
use conflux_graph::{ComputeState, NodeSystem};
use test_utils::{Ctx, activated, continuing};

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn engine_rejects_unactivated_systems() {
    let system = Arc::new(NodeSystem::<Ctx>::new());

    let err = Engine::new(system, ComputationMode::Sequential).unwrap_err();

    assert_eq!(err, ComputationError::NotActivated);
}

#[test]
fn engine_exposes_its_mode() {
    let a = continuing("a");
    let system = activated(|sys| {
        sys.add_node(&a).unwrap();
    });

    let engine = Engine::new(system, ComputationMode::Sequential).unwrap();

    assert_eq!(engine.mode(), ComputationMode::Sequential);
    assert_eq!(ComputationMode::default(), ComputationMode::Sequential);
    assert!(engine.system().is_activated());
}

// ═══════════════════════════════════════════════════════════════════════════════
// REUSE
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn engine_is_reusable_across_contexts() {
    let a = continuing("a");
    let b = continuing("b");
    let system = activated(|sys| {
        sys.add_node(&a).unwrap();
        sys.add_node(&b).unwrap();
        sys.add_link(&a, &b).unwrap();
    });
    let engine = Engine::new(system, ComputationMode::Sequential).unwrap();

    let first = engine.compute(Ctx::default()).await;
    let second = engine.compute(Ctx { x: 7, ..Ctx::default() }).await;

    assert!(first.success);
    assert!(second.success);
    assert_eq!(first.context.ran, vec!["a", "b"]);
    assert_eq!(second.context.ran, vec!["a", "b"]);
    assert_eq!(second.context.x, 7);
}

#[tokio::test]
async fn concurrent_computations_are_independent() {
    let a = continuing("a");
    let b = continuing("b");
    let system = activated(|sys| {
        sys.add_node(&a).unwrap();
        sys.add_node(&b).unwrap();
        sys.add_link(&a, &b).unwrap();
    });
    let engine = Engine::new(system, ComputationMode::Sequential).unwrap();

    let (first, second) = tokio::join!(
        engine.compute(Ctx { x: 1, ..Ctx::default() }),
        engine.compute(Ctx { x: 2, ..Ctx::default() }),
    );

    assert!(first.success && second.success);
    assert_eq!(first.context.x, 1);
    assert_eq!(second.context.x, 2);
    assert_eq!(first.context.ran, second.context.ran);
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTY TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Property: in a linear chain with one fault injected at position `k`,
/// exactly the nodes up to and including `k` resolve, each behavior runs at
/// most once, and the report succeeds iff the fault was not an abort.
///
/// `proptest` does not natively support async test functions, so each case
/// creates a `tokio` runtime and drives the computation with `block_on`.
mod prop_tests {
    use super::*;
    use conflux_graph::Node;
    use proptest::prelude::*;

    /// Outcome injected at one position of the chain.
    #[derive(Debug, Clone, Copy)]
    enum Fault {
        Skip,
        Abort,
    }

    fn chain_node(index: usize, fault: Option<Fault>) -> Node<Ctx> {
        let name = format!("n{index}");
        let tag = name.clone();
        Node::action(name, move |ctx: &mut Ctx| {
            ctx.ran.push(tag.clone());
            match fault {
                None => ComputeState::new_continue(),
                Some(Fault::Skip) => ComputeState::new_skip(),
                Some(Fault::Abort) => ComputeState::new_abort("injected"),
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_linear_chain_resolves_exactly_the_prefix(
            len in 1..8usize,
            fault_at in 0..16usize,
            abort in any::<bool>(),
        ) {
            let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
            rt.block_on(async {
                let fault = if abort { Fault::Abort } else { Fault::Skip };
                let faulty = fault_at < len;

                let nodes: Vec<Node<Ctx>> = (0..len)
                    .map(|i| chain_node(i, (i == fault_at).then_some(fault)))
                    .collect();

                let mut system = NodeSystem::new();
                for node in &nodes {
                    system.add_node(node).expect("builder accepts nodes");
                }
                for pair in nodes.windows(2) {
                    system.add_link(&pair[0], &pair[1]).expect("builder accepts links");
                }
                system.activate().expect("chain activates");

                let engine = Engine::new(Arc::new(system), ComputationMode::Sequential)
                    .expect("system is activated");
                let report = engine.compute(Ctx::default()).await;

                let resolved = if faulty { fault_at + 1 } else { len };
                prop_assert_eq!(report.states.len(), resolved);
                prop_assert_eq!(report.context.ran.len(), resolved);
                // Each behavior ran at most once, in chain order.
                let expected: Vec<String> = (0..resolved).map(|i| format!("n{i}")).collect();
                prop_assert_eq!(&report.context.ran, &expected);
                prop_assert_eq!(report.success, !(faulty && abort));
                for node in nodes.iter().skip(resolved) {
                    prop_assert_eq!(report.state_of(node), None);
                }
                Ok(())
            })?;
        }
    }
}
