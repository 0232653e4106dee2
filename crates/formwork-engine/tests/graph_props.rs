//! Property tests for dependency-graph construction over arbitrary
//! dependency tables, including out-of-range targets and cycles.

use formwork_engine::{CyclePolicy, DependencyGraph};
use formwork_model::{FieldKind, FieldSpec, FormDefinition};
use formwork_validate::Issue;
use proptest::prelude::*;

/// Dependency table: one entry per field, each optionally naming a target
/// index. Targets may exceed the field count, which yields unknown names.
fn dependency_table() -> impl Strategy<Value = Vec<Option<usize>>> {
    proptest::collection::vec(proptest::option::of(0usize..12), 1..10)
}

fn definition_from(table: &[Option<usize>]) -> FormDefinition {
    let fields = table
        .iter()
        .enumerate()
        .map(|(i, dep)| {
            let mut spec = FieldSpec::new(format!("field{i}"), FieldKind::Select);
            if let Some(target) = dep {
                spec = spec.with_dependency(format!("field{target}"));
            }
            spec
        })
        .collect();
    FormDefinition::from_fields(fields)
}

proptest! {
    #[test]
    fn builds_are_deterministic(table in dependency_table()) {
        let def = definition_from(&table);
        prop_assert_eq!(
            DependencyGraph::build(&def, CyclePolicy::Reject),
            DependencyGraph::build(&def, CyclePolicy::Reject)
        );
    }

    #[test]
    fn severed_chains_always_terminate(table in dependency_table()) {
        let def = definition_from(&table);
        let graph = DependencyGraph::build(&def, CyclePolicy::Reject);

        for i in 0..table.len() {
            let mut current = format!("field{i}");
            let mut steps = 0;
            while let Some(next) = graph.dependency_of(&current) {
                current = next.to_string();
                steps += 1;
                prop_assert!(
                    steps <= table.len(),
                    "chain from field{} does not terminate",
                    i
                );
            }
        }
    }

    #[test]
    fn every_declared_link_survives_or_is_reported(table in dependency_table()) {
        let def = definition_from(&table);
        let graph = DependencyGraph::build(&def, CyclePolicy::Reject);

        for spec in def.fields() {
            if let Some(target) = graph.dependency_of(&spec.name) {
                prop_assert!(def.contains(target));
            }
        }

        let declared = def.fields().filter(|s| s.depends_on.is_some()).count();
        let surviving = def
            .fields()
            .filter(|s| graph.dependency_of(&s.name).is_some())
            .count();
        let severed_unknown = graph
            .issues()
            .iter()
            .filter(|i| matches!(i, Issue::UnknownDependency { .. }))
            .count();
        let severed_cyclic: usize = graph
            .issues()
            .iter()
            .filter_map(|i| match i {
                Issue::DependencyCycle { fields } => Some(fields.len()),
                _ => None,
            })
            .sum();
        prop_assert_eq!(declared, surviving + severed_unknown + severed_cyclic);
    }
}
