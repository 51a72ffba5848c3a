//! The persona `extends` graph.
//!
//! Nodes are personas (by position in the input slice); an edge points from a
//! child to its parent. Every persona has at most one outgoing edge, so a
//! persona's ancestry is a walk along single edges. Parents are looked up by
//! name; when several personas share a name the first loaded one is used.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

use super::InheritanceError;
use crate::constants::MAX_INHERITANCE_DEPTH;
use crate::core::Document;

pub struct InheritanceGraph<'a> {
    personas: Vec<&'a Document>,
    graph: DiGraph<usize, ()>,
    nodes: Vec<NodeIndex>,
    /// `(child, parent name)` for every `extends` that names no loaded persona.
    missing: Vec<(usize, String)>,
    max_depth: usize,
}

impl<'a> InheritanceGraph<'a> {
    /// Build the graph over `personas`. Documents of other kinds are ignored.
    pub fn build(personas: Vec<&'a Document>) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..personas.len()).map(|i| graph.add_node(i)).collect();

        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (index, persona) in personas.iter().enumerate() {
            by_name.entry(persona.name.as_str()).or_insert(index);
        }

        let mut missing = Vec::new();
        for (index, persona) in personas.iter().enumerate() {
            let Some(parent) = persona.as_persona().and_then(|spec| spec.extends.as_deref()) else {
                continue;
            };
            match by_name.get(parent) {
                Some(&parent_index) => {
                    graph.add_edge(nodes[index], nodes[parent_index], ());
                }
                None => missing.push((index, parent.to_string())),
            }
        }

        Self {
            personas,
            graph,
            nodes,
            missing,
            max_depth: MAX_INHERITANCE_DEPTH,
        }
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    pub fn persona(&self, index: usize) -> &'a Document {
        self.personas[index]
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Personas whose `extends` names no loaded persona, with the missing name.
    pub fn missing_parents(&self) -> &[(usize, String)] {
        &self.missing
    }

    /// Indices of every persona that lies on a cycle.
    pub fn cycle_members(&self) -> HashSet<usize> {
        let mut members = HashSet::new();
        for component in tarjan_scc(&self.graph) {
            let on_cycle = component.len() > 1
                || component.first().is_some_and(|&node| self.graph.contains_edge(node, node));
            if on_cycle {
                members.extend(component.into_iter().map(|node| self.graph[node]));
            }
        }
        members
    }

    fn parent_of(&self, index: usize) -> Option<usize> {
        self.graph.neighbors(self.nodes[index]).next().map(|node| self.graph[node])
    }

    /// The ancestry of `index`, ordered root first and ending with `index`.
    ///
    /// Walks parent edges iteratively with a visited stack. Revisiting a persona
    /// is a cycle; more than `max_depth` links is a depth error.
    pub fn chain(&self, index: usize) -> Result<Vec<usize>, InheritanceError> {
        let mut stack = vec![index];
        let mut visited = HashSet::from([index]);
        let mut current = index;

        while let Some(parent) = self.parent_of(current) {
            if !visited.insert(parent) {
                let start = stack.iter().position(|&i| i == parent).unwrap_or(0);
                let mut cycle: Vec<String> =
                    stack[start..].iter().map(|&i| self.personas[i].name.clone()).collect();
                cycle.push(self.personas[parent].name.clone());
                return Err(InheritanceError::Cycle {
                    persona: self.personas[index].name.clone(),
                    cycle,
                });
            }
            stack.push(parent);
            if stack.len() - 1 > self.max_depth {
                return Err(InheritanceError::DepthExceeded {
                    persona: self.personas[index].name.clone(),
                    limit: self.max_depth,
                    links: stack.len() - 1,
                });
            }
            current = parent;
        }

        stack.reverse();
        Ok(stack)
    }
}
