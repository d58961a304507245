use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::planner::model::DependencyGraph;
use crate::planner::PlanError;
use crate::types::Step;

/// Build the dependency graph for one step list.
///
/// `extra` carries implicit edges (e.g. a `when` reading `steps.x`) that are
/// merged with the declared `dependsOn` entries.
pub(crate) fn build_step_dependency_graph(
    steps: &[Step],
    extra: &BTreeMap<String, Vec<String>>,
) -> Result<DependencyGraph, PlanError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
    for (i, s) in steps.iter().enumerate() {
        if index.insert(s.name.as_str(), i).is_some() {
            return Err(PlanError::DuplicateStep(s.name.clone()));
        }
    }

    let mut depends_on: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for step in steps {
        let mut deps: Vec<String> = Vec::new();
        for dep in &step.depends_on {
            if !index.contains_key(dep.as_str()) {
                return Err(PlanError::UnknownDependency {
                    step: step.name.clone(),
                    dependency: dep.clone(),
                });
            }
            if !deps.contains(dep) {
                deps.push(dep.clone());
            }
        }
        if let Some(implicit) = extra.get(&step.name) {
            for dep in implicit {
                if dep != &step.name && index.contains_key(dep.as_str()) && !deps.contains(dep) {
                    deps.push(dep.clone());
                }
            }
        }
        depends_on.insert(step.name.clone(), deps);
    }

    let order: Vec<String> = steps.iter().map(|s| s.name.clone()).collect();
    let topo_order = topo_sort(&order, &depends_on)
        .ok_or_else(|| PlanError::Cycle(find_cycle(&order, &depends_on).unwrap_or_default()))?;
    let waves = compute_waves(&order, &topo_order, &depends_on);

    Ok(DependencyGraph {
        depends_on,
        waves,
        topo_order,
    })
}

// Kahn's algorithm seeded in declaration order; `None` when a cycle remains.
fn topo_sort(nodes: &[String], depends_on: &BTreeMap<String, Vec<String>>) -> Option<Vec<String>> {
    let position: HashMap<&str, usize> =
        nodes.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
    let mut indeg: HashMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 0)).collect();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();

    for n in nodes {
        for d in depends_on.get(n).map(Vec::as_slice).unwrap_or(&[]) {
            *indeg.entry(n.as_str()).or_default() += 1;
            outgoing.entry(d.as_str()).or_default().push(n.as_str());
        }
    }
    for v in outgoing.values_mut() {
        v.sort_by_key(|n| position[n]);
    }

    let mut q: VecDeque<&str> = nodes
        .iter()
        .map(String::as_str)
        .filter(|n| indeg[n] == 0)
        .collect();

    let mut out = Vec::with_capacity(nodes.len());
    while let Some(n) = q.pop_front() {
        out.push(n.to_string());
        for m in outgoing.get(n).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(e) = indeg.get_mut(m) {
                *e -= 1;
                if *e == 0 {
                    q.push_back(*m);
                }
            }
        }
    }

    (out.len() == nodes.len()).then_some(out)
}

/// Depth-first search for one cycle, returned as a closed path (`a, b, a`).
pub(crate) fn find_cycle(
    nodes: &[String],
    depends_on: &BTreeMap<String, Vec<String>>,
) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        depends_on: &'a BTreeMap<String, Vec<String>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(node, Mark::Visiting);
        stack.push(node);
        for dep in depends_on.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            match marks.get(dep.as_str()) {
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|n| *n == dep.as_str()).unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[start..].iter().map(|s| s.to_string()).collect();
                    path.push(dep.clone());
                    return Some(path);
                }
                Some(Mark::Done) => {}
                None => {
                    if let Some(p) = visit(dep.as_str(), depends_on, marks, stack) {
                        return Some(p);
                    }
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack = Vec::new();
    for n in nodes {
        if !marks.contains_key(n.as_str()) {
            if let Some(p) = visit(n.as_str(), depends_on, &mut marks, &mut stack) {
                return Some(p);
            }
        }
    }
    None
}

// Wave of a step = 1 + the highest wave among its dependencies. Steps inside a
// wave keep declaration order.
fn compute_waves(
    declared: &[String],
    topo: &[String],
    depends_on: &BTreeMap<String, Vec<String>>,
) -> Vec<Vec<String>> {
    let mut level: HashMap<&str, usize> = HashMap::new();
    for node in topo {
        let l = depends_on
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(|d| level.get(d.as_str()).copied())
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        level.insert(node.as_str(), l);
    }

    let max_level = level.values().copied().max().unwrap_or(0);
    let mut waves = vec![Vec::<String>::new(); if declared.is_empty() { 0 } else { max_level + 1 }];
    let seen: HashSet<&str> = level.keys().copied().collect();
    for node in declared {
        if seen.contains(node.as_str()) {
            waves[level[node.as_str()]].push(node.clone());
        }
    }
    waves
}
