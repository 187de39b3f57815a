//! Project dependency graph and build order.
//!
//! Edges point from a dependency to the project that uses it, so a
//! topological walk yields dependencies first. Among projects that are ready
//! at the same time, declaration order wins.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;

use crate::core::Workspace;

/// Errors in the project or task graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("dependency cycle between projects: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("no project named `{0}`")]
    UnknownProject(String),

    #[error("no project or task named `{name}` (required by task `{task}`)")]
    UnknownTaskDependency { task: String, name: String },

    #[error("no task named `{0}`")]
    UnknownTask(String),

    #[error("dependency cycle through task `{0}`")]
    TaskCycle(String),
}

/// The `use` graph of a workspace's projects.
#[derive(Debug)]
pub struct ProjectGraph {
    graph: DiGraph<usize, ()>,
    by_name: HashMap<String, NodeIndex>,
    names: Vec<String>,
}

impl ProjectGraph {
    /// Build the graph. Unknown dependency names contribute no edge.
    pub fn new(ws: &Workspace) -> Self {
        let mut graph = DiGraph::new();
        let mut by_name = HashMap::new();
        let mut names = Vec::with_capacity(ws.projects.len());

        for (idx, project) in ws.projects.iter().enumerate() {
            let node = graph.add_node(idx);
            by_name.insert(project.name.clone(), node);
            names.push(project.name.clone());
        }

        for project in &ws.projects {
            let user = by_name[&project.name];
            for dep in &project.deps {
                match by_name.get(dep) {
                    Some(&dep_node) => {
                        if !graph.contains_edge(dep_node, user) {
                            graph.add_edge(dep_node, user, ());
                        }
                    }
                    None => tracing::debug!("`{}` uses unknown project `{}`", project.name, dep),
                }
            }
        }

        ProjectGraph {
            graph,
            by_name,
            names,
        }
    }

    /// Find a dependency cycle, if any.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        for scc in tarjan_scc(&self.graph) {
            let is_cycle = scc.len() > 1
                || scc
                    .first()
                    .is_some_and(|&n| self.graph.contains_edge(n, n));
            if is_cycle {
                let mut members: Vec<usize> = scc.iter().map(|&n| self.graph[n]).collect();
                members.sort_unstable();
                return Some(members.into_iter().map(|i| self.names[i].clone()).collect());
            }
        }
        None
    }

    /// Indices (into `Workspace::projects`) of the projects to build, in
    /// build order.
    ///
    /// With a selection, only the selected projects and everything they
    /// transitively use are included.
    pub fn build_order(&self, selection: Option<&[String]>) -> Result<Vec<usize>, GraphError> {
        if let Some(cycle) = self.find_cycle() {
            return Err(GraphError::Cycle(cycle));
        }

        let included = match selection {
            Some(names) => self.with_dependencies(names)?,
            None => self.graph.node_indices().collect(),
        };

        let mut pending: HashMap<NodeIndex, usize> = included
            .iter()
            .map(|&n| {
                let deps = self
                    .graph
                    .neighbors_directed(n, Direction::Incoming)
                    .filter(|d| included.contains(d))
                    .count();
                (n, deps)
            })
            .collect();

        let mut ready: BTreeSet<NodeIndex> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(&n, _)| n)
            .collect();

        let mut order = Vec::with_capacity(included.len());
        while let Some(node) = ready.pop_first() {
            order.push(self.graph[node]);
            for user in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(count) = pending.get_mut(&user) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(user);
                    }
                }
            }
        }

        Ok(order)
    }

    fn with_dependencies(&self, names: &[String]) -> Result<BTreeSet<NodeIndex>, GraphError> {
        let mut included = BTreeSet::new();
        let mut stack = Vec::new();

        for name in names {
            let node = self
                .by_name
                .get(name)
                .ok_or_else(|| GraphError::UnknownProject(name.clone()))?;
            stack.push(*node);
        }

        while let Some(node) = stack.pop() {
            if included.insert(node) {
                stack.extend(self.graph.neighbors_directed(node, Direction::Incoming));
            }
        }

        Ok(included)
    }
}
