//! Dependency graph derived from a form definition.

use std::collections::{BTreeMap, BTreeSet};

use formwork_model::FormDefinition;
use formwork_validate::Issue;

use crate::options::CyclePolicy;

/// The dependency relation between fields: which sources are watched, and
/// which dependents watch each source.
///
/// Derived deterministically from the field list; building twice over an
/// identical definition yields an equal graph. Structural problems are
/// collected as [`Issue`]s, never thrown, and the offending links are
/// severed so they can never trigger loads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    sources: BTreeSet<String>,
    dependency_of: BTreeMap<String, String>,
    dependents_of: BTreeMap<String, Vec<String>>,
    issues: Vec<Issue>,
}

impl DependencyGraph {
    /// Build the graph from the definition's `depends_on` declarations.
    ///
    /// A declaration naming an unknown field is accepted structurally but
    /// severed and reported. Under [`CyclePolicy::Reject`], cyclic chains
    /// are severed link by link and reported as one issue per cycle.
    pub fn build(definition: &FormDefinition, policy: CyclePolicy) -> Self {
        let names: BTreeSet<&str> = definition.fields().map(|f| f.name.as_str()).collect();
        let order: Vec<&str> = definition.fields().map(|f| f.name.as_str()).collect();

        let mut issues = Vec::new();
        let mut dependency_of: BTreeMap<String, String> = BTreeMap::new();

        for field in definition.fields() {
            let Some(target) = field.depends_on.as_deref() else {
                continue;
            };
            if !names.contains(target) {
                tracing::warn!(
                    field = %field.name,
                    target = %target,
                    "dependency references unknown field"
                );
                issues.push(Issue::UnknownDependency {
                    field: field.name.clone(),
                    target: target.to_string(),
                });
                continue;
            }
            dependency_of.insert(field.name.clone(), target.to_string());
        }

        if policy == CyclePolicy::Reject {
            for cycle in find_cycles(&order, &dependency_of) {
                tracing::warn!(fields = ?cycle, "cyclic dependency chain severed");
                for field in &cycle {
                    dependency_of.remove(field);
                }
                issues.push(Issue::DependencyCycle { fields: cycle });
            }
        }

        let mut sources = BTreeSet::new();
        let mut dependents_of: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in &order {
            if let Some(source) = dependency_of.get(*name) {
                sources.insert(source.clone());
                dependents_of
                    .entry(source.clone())
                    .or_default()
                    .push((*name).to_string());
            }
        }

        Self {
            sources,
            dependency_of,
            dependents_of,
            issues,
        }
    }

    /// Distinct field names watched by at least one dependent.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }

    pub fn is_source(&self, field: &str) -> bool {
        self.sources.contains(field)
    }

    /// Fields watching `source`, in declaration order.
    pub fn dependents_of(&self, source: &str) -> &[String] {
        self.dependents_of
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The source `field` watches, if its link survived the build.
    pub fn dependency_of(&self, field: &str) -> Option<&str> {
        self.dependency_of.get(field).map(String::as_str)
    }

    /// Structural problems found during the build.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

/// Find cycles in the dependency relation. Every field has at most one
/// outgoing link, so each cycle is a simple loop; walking the chain from
/// every node visits each link once.
///
/// Each cycle is rotated to start at its lexicographically smallest field
/// so the result does not depend on traversal entry point.
fn find_cycles(order: &[&str], dependency_of: &BTreeMap<String, String>) -> Vec<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks: BTreeMap<&str, Mark> = order.iter().map(|n| (*n, Mark::Unvisited)).collect();
    let mut cycles = Vec::new();

    for start in order {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        let mut path: Vec<&str> = Vec::new();
        let mut current = *start;
        loop {
            match marks[current] {
                Mark::Done => break,
                Mark::OnPath => {
                    let begin = path
                        .iter()
                        .position(|n| *n == current)
                        .unwrap_or(path.len());
                    let mut cycle: Vec<String> =
                        path[begin..].iter().map(|n| (*n).to_string()).collect();
                    if let Some(at) = cycle
                        .iter()
                        .enumerate()
                        .min_by(|(_, a), (_, b)| a.cmp(b))
                        .map(|(i, _)| i)
                    {
                        cycle.rotate_left(at);
                    }
                    cycles.push(cycle);
                    break;
                }
                Mark::Unvisited => {
                    marks.insert(current, Mark::OnPath);
                    path.push(current);
                    match dependency_of.get(current) {
                        Some(next) => current = next.as_str(),
                        None => break,
                    }
                }
            }
        }
        for visited in path {
            marks.insert(visited, Mark::Done);
        }
    }

    cycles
}
