use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use proptest::prelude::*;

use assetforge::graph::{Orchestrator, TaskGraph, TaskRegistry};
use assetforge_test_utils::fake_runner::{ExecutionLog, FakeRunner};

// Generate acyclic dependency lists: task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(move |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let mut deps: HashSet<usize> = HashSet::new();
                    if i > 0 {
                        for d in potential {
                            deps.insert(d % i);
                        }
                    }
                    deps.into_iter().collect()
                })
                .collect()
        })
    })
}

fn orchestrator_from(deps: &[Vec<usize>]) -> Orchestrator {
    let log = ExecutionLog::new();
    let mut registry = TaskRegistry::new();
    let mut edges: Vec<(String, Vec<String>)> = Vec::new();

    for (i, dep_list) in deps.iter().enumerate() {
        let name = format!("task_{i}");
        let after: Vec<String> = dep_list.iter().map(|d| format!("task_{d}")).collect();
        registry
            .register(
                name.clone(),
                after.clone(),
                Arc::new(FakeRunner::new(&name, log.clone())),
            )
            .unwrap();
        edges.push((name, after));
    }

    let graph = TaskGraph::from_edges(edges.iter().map(|(n, a)| (n.as_str(), a.as_slice())));
    Orchestrator::new(Arc::new(registry), graph)
}

proptest! {
    #[test]
    fn resolve_order_is_a_valid_topological_order(deps in dag_strategy(10)) {
        let orch = orchestrator_from(&deps);
        let entry = format!("task_{}", deps.len() - 1);

        let order = orch.resolve_order(&entry).unwrap();

        // No duplicates, entry comes last.
        let positions: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(pos, name)| (name.as_str(), pos))
            .collect();
        prop_assert_eq!(positions.len(), order.len(), "duplicate task in order");
        prop_assert_eq!(order.last().map(String::as_str), Some(entry.as_str()));

        // Every listed task appears after all of its prerequisites, and
        // every prerequisite of a listed task is itself listed.
        for name in &order {
            let idx: usize = name["task_".len()..].parse().unwrap();
            for dep in &deps[idx] {
                let dep_name = format!("task_{dep}");
                let dep_pos = positions
                    .get(dep_name.as_str())
                    .copied()
                    .expect("prerequisite missing from order");
                prop_assert!(dep_pos < positions[name.as_str()]);
            }
        }
    }
}
