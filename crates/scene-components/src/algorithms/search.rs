//! Graph Search
//!
//! Breadth-first and depth-first search over an undirected graph. Both share
//! one state machine and differ only in how the frontier is consumed.
//!
//! ```text
//! 1  visited <- {}, toVisit <- {}
//! 2  toVisit.add(start)
//! 3  while toVisit is not empty
//! 4      current <- toVisit.take()
//! 5      if current = end: return
//! 6      visited.add(current)
//! 7      for each neighbor of current
//! 8          if neighbor is unseen: toVisit.add(neighbor)
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::{json, Value};

use scene_engine::{
    Algorithm, CatalogEntry, CatalogFn, Component, ComponentError, ComponentKind, Parameterized,
    Resume, StateType, StepGenerator,
};

use crate::keys;
use crate::shapes::{decode, encode, fields, graph_state_type, graph_type, Graph};

/// How the frontier is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frontier {
    /// First in, first out (breadth-first)
    Queue,
    /// Last in, first out (depth-first)
    Stack,
}

/// Graph search algorithm
pub struct GraphSearch {
    name: &'static str,
    frontier: Frontier,
    accepts: StateType,
    outputs: StateType,
}

impl GraphSearch {
    fn new(name: &'static str, frontier: Frontier) -> Self {
        Self {
            name,
            frontier,
            accepts: graph_type(),
            outputs: graph_state_type(),
        }
    }

    pub fn breadth_first() -> Self {
        Self::new("Breadth-first search", Frontier::Queue)
    }

    pub fn depth_first() -> Self {
        Self::new("Depth-first search", Frontier::Stack)
    }

    pub fn breadth_first_entry() -> CatalogEntry {
        CatalogEntry::new(
            keys::BREADTH_FIRST_SEARCH,
            ComponentKind::Algorithm,
            "Breadth-first search",
            "Visits nodes in order of distance from the start node",
            Parameterized::fixed(Component::Algorithm(Arc::new(Self::breadth_first()))),
        )
    }

    pub fn depth_first_entry() -> CatalogEntry {
        CatalogEntry::new(
            keys::DEPTH_FIRST_SEARCH,
            ComponentKind::Algorithm,
            "Depth-first search",
            "Follows each branch as deep as possible before backtracking",
            Parameterized::fixed(Component::Algorithm(Arc::new(Self::depth_first()))),
        )
    }
}

inventory::submit!(CatalogFn(GraphSearch::breadth_first_entry));
inventory::submit!(CatalogFn(GraphSearch::depth_first_entry));

impl Algorithm for GraphSearch {
    fn name(&self) -> &str {
        self.name
    }

    fn accepts(&self) -> &StateType {
        &self.accepts
    }

    fn outputs(&self) -> &StateType {
        &self.outputs
    }

    fn start(&self, input: Value) -> Result<Box<dyn StepGenerator>, ComponentError> {
        let graph: Graph = decode(&input)?;
        graph.validate()?;
        let start = graph
            .start_node_id
            .clone()
            .ok_or_else(|| ComponentError::invalid_input("graph has no start node"))?;

        let mut run = SearchRun {
            state: encode(&graph)?,
            graph,
            frontier: self.frontier,
            start,
            pc: Pc::Init,
            current: None,
            visited: Vec::new(),
            to_visit: VecDeque::new(),
        };
        run.sync();
        Ok(Box::new(run))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pc {
    Init,
    Seed,
    LoopCheck,
    Take,
    CheckEnd,
    Found,
    Visit,
    Expand,
    Done,
}

struct SearchRun {
    graph: Graph,
    frontier: Frontier,
    start: String,
    pc: Pc,
    current: Option<String>,
    visited: Vec<String>,
    /// Queue front or stack top is the next node taken
    to_visit: VecDeque<String>,
    state: Value,
}

impl SearchRun {
    /// Mirror the search fields into the shared state value
    fn sync(&mut self) {
        if let Some(state) = self.state.as_object_mut() {
            state.insert(fields::CURRENT_NODE_ID.to_string(), json!(self.current));
            state.insert(fields::VISITED.to_string(), json!(self.visited));
            state.insert(fields::TO_VISIT.to_string(), json!(self.to_visit));
        }
    }

    fn take(&mut self) -> Option<String> {
        match self.frontier {
            Frontier::Queue => self.to_visit.pop_front(),
            Frontier::Stack => self.to_visit.pop_back(),
        }
    }

    fn expand(&mut self, current: &str) {
        let neighbors: Vec<String> = self
            .graph
            .neighbors(current)
            .into_iter()
            .map(str::to_string)
            .collect();

        match self.frontier {
            Frontier::Queue => {
                for neighbor in neighbors {
                    if !self.visited.contains(&neighbor) && !self.to_visit.contains(&neighbor) {
                        self.to_visit.push_back(neighbor);
                    }
                }
            }
            // Reversed so the first neighbor ends up on top
            Frontier::Stack => {
                for neighbor in neighbors.into_iter().rev() {
                    if !self.visited.contains(&neighbor) {
                        self.to_visit.push_back(neighbor);
                    }
                }
            }
        }
    }
}

impl StepGenerator for SearchRun {
    fn resume(&mut self) -> Result<Resume, ComponentError> {
        match self.pc {
            Pc::Init => {
                self.pc = Pc::Seed;
                Ok(Resume::line(1))
            }
            Pc::Seed => {
                self.to_visit.push_back(self.start.clone());
                self.sync();
                self.pc = Pc::LoopCheck;
                Ok(Resume::line(2))
            }
            Pc::LoopCheck => {
                if self.to_visit.is_empty() {
                    self.pc = Pc::Done;
                    return Ok(Resume::Complete);
                }
                self.pc = Pc::Take;
                Ok(Resume::line(3))
            }
            Pc::Take => {
                let current = self
                    .take()
                    .ok_or_else(|| ComponentError::failed("frontier is empty"))?;
                self.current = Some(current);
                self.sync();
                self.pc = Pc::CheckEnd;
                Ok(Resume::line(4))
            }
            Pc::CheckEnd => {
                let found = self.current.is_some() && self.current == self.graph.end_node_id;
                let seen = self
                    .current
                    .as_ref()
                    .is_some_and(|c| self.visited.contains(c));
                self.pc = if found {
                    Pc::Found
                } else if seen {
                    // Depth-first may stack a node twice
                    Pc::LoopCheck
                } else {
                    Pc::Visit
                };
                Ok(Resume::Sentinel(found))
            }
            Pc::Found => {
                self.pc = Pc::Done;
                Ok(Resume::line(5))
            }
            Pc::Visit => {
                if let Some(current) = self.current.clone() {
                    self.visited.push(current);
                }
                self.sync();
                self.pc = Pc::Expand;
                Ok(Resume::line(6))
            }
            Pc::Expand => {
                if let Some(current) = self.current.clone() {
                    self.expand(&current);
                }
                self.sync();
                self.pc = Pc::LoopCheck;
                Ok(Resume::lines(7, 8))
            }
            Pc::Done => Ok(Resume::Complete),
        }
    }

    fn state(&self) -> &Value {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_graph() -> Value {
        json!({
            "nodes": ["A", "B", "C", "D", "E"],
            "edges": [
                {"source": "A", "target": "B"},
                {"source": "B", "target": "C"},
                {"source": "B", "target": "D"},
                {"source": "D", "target": "E"},
                {"source": "A", "target": "E"}
            ],
            "startNodeId": "A",
            "endNodeId": "D"
        })
    }

    /// Drive a generator to completion, returning (lines, final state)
    fn run(algorithm: &GraphSearch, input: Value) -> (Vec<u32>, Value) {
        let mut generator = algorithm.start(input).unwrap();
        let mut lines = Vec::new();
        loop {
            match generator.resume().unwrap() {
                Resume::Step { start_line, .. } => lines.push(start_line),
                Resume::Sentinel(_) => {}
                Resume::Complete => break,
            }
        }
        (lines, generator.state().clone())
    }

    #[test]
    fn test_breadth_first_order() {
        let (lines, state) = run(&GraphSearch::breadth_first(), default_graph());
        assert_eq!(state["currentNodeId"], "D");
        assert_eq!(state["visited"], json!(["A", "B", "E", "C"]));
        assert_eq!(lines[0], 1);
        assert_eq!(*lines.last().unwrap(), 5);
    }

    #[test]
    fn test_depth_first_order() {
        let (_, state) = run(&GraphSearch::depth_first(), default_graph());
        assert_eq!(state["currentNodeId"], "D");
        assert_eq!(state["visited"], json!(["A", "B", "C"]));
    }

    #[test]
    fn test_unreachable_end_exhausts_graph() {
        let mut input = default_graph();
        input["nodes"] = json!(["A", "B", "C", "D", "E", "F"]);
        input["endNodeId"] = json!("F");

        let (lines, state) = run(&GraphSearch::breadth_first(), input);
        assert_eq!(state["visited"].as_array().unwrap().len(), 5);
        assert_eq!(state["toVisit"], json!([]));
        assert!(!lines.contains(&5));
    }

    #[test]
    fn test_initial_state_is_empty_search() {
        let mut generator = GraphSearch::breadth_first().start(default_graph()).unwrap();
        assert_eq!(generator.resume().unwrap(), Resume::line(1));
        let state = generator.state();
        assert_eq!(state["visited"], json!([]));
        assert_eq!(state["toVisit"], json!([]));
        assert_eq!(state["currentNodeId"], json!(null));
    }

    #[test]
    fn test_invalid_input() {
        let algorithm = GraphSearch::breadth_first();
        assert!(matches!(
            algorithm.start(json!({"counter": 3})),
            Err(ComponentError::InvalidInput(_))
        ));

        let mut no_start = default_graph();
        no_start["startNodeId"] = json!(null);
        assert!(matches!(
            algorithm.start(no_start),
            Err(ComponentError::InvalidInput(_))
        ));
    }
}
