use legocore::{FlowDefinition, WorkflowError};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// Step dependency graph of a flow. Node indices follow the declared step
/// order and edge indices follow connection order.
pub struct DependencyGraph<'a> {
    graph: DiGraph<&'a str, ()>,
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    pub fn build(flow: &'a FlowDefinition) -> Result<Self, WorkflowError> {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for step in &flow.steps {
            let id = step.id.as_str();
            if index.contains_key(id) {
                return Err(WorkflowError::DuplicateStep(step.id.clone()));
            }
            index.insert(id, graph.add_node(id));
        }

        for conn in &flow.connections {
            let from = *index
                .get(conn.from.as_str())
                .ok_or_else(|| WorkflowError::StepNotFound(conn.from.clone()))?;
            let to = *index
                .get(conn.to.as_str())
                .ok_or_else(|| WorkflowError::StepNotFound(conn.to.clone()))?;
            graph.add_edge(from, to, ());
        }

        Ok(Self { graph, index })
    }

    /// Direct dependencies of a step, in connection order.
    pub fn dependencies_of(&self, step_id: &str) -> Vec<&'a str> {
        self.index
            .get(step_id)
            .map(|idx| {
                self.dependencies(*idx)
                    .into_iter()
                    .map(|dep| self.graph[dep])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Depth-first topological order. Independent steps keep their declared
    /// relative order; a cycle fails with the step at which it was detected.
    pub fn execution_order(&self) -> Result<Vec<&'a str>, WorkflowError> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());

        for idx in self.graph.node_indices() {
            self.visit(idx, &mut marks, &mut order)?;
        }

        Ok(order)
    }

    /// Group an execution order into sets whose members only depend on steps
    /// of earlier sets. Members keep their position from `order`.
    pub fn ready_sets(&self, order: &[&'a str]) -> Vec<Vec<&'a str>> {
        let mut level: HashMap<&str, usize> = HashMap::new();
        let mut sets: Vec<Vec<&'a str>> = Vec::new();

        for &step_id in order {
            let depth = self
                .dependencies_of(step_id)
                .iter()
                .filter_map(|dep| level.get(dep))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);

            level.insert(step_id, depth);
            if sets.len() <= depth {
                sets.resize_with(depth + 1, Vec::new);
            }
            sets[depth].push(step_id);
        }

        sets
    }

    fn visit(
        &self,
        idx: NodeIndex,
        marks: &mut [Mark],
        order: &mut Vec<&'a str>,
    ) -> Result<(), WorkflowError> {
        match marks[idx.index()] {
            Mark::Visited => return Ok(()),
            Mark::Visiting => {
                return Err(WorkflowError::CyclicDependency {
                    step_id: self.graph[idx].to_string(),
                })
            }
            Mark::Unvisited => {}
        }

        marks[idx.index()] = Mark::Visiting;
        for dep in self.dependencies(idx) {
            self.visit(dep, marks, order)?;
        }
        marks[idx.index()] = Mark::Visited;
        order.push(self.graph[idx]);

        Ok(())
    }

    fn dependencies(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.source()).collect()
    }
}

/// Compute the execution order of a flow as owned step ids.
pub fn execution_order(flow: &FlowDefinition) -> Result<Vec<String>, WorkflowError> {
    let graph = DependencyGraph::build(flow)?;
    Ok(graph
        .execution_order()?
        .into_iter()
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use legocore::{Connection, Step};

    fn flow(steps: &[&str], edges: &[(&str, &str)]) -> FlowDefinition {
        let mut flow = FlowDefinition::new("f", "test");
        flow.steps = steps.iter().map(|id| Step::new(*id, "info-card")).collect();
        flow.connections = edges
            .iter()
            .map(|(from, to)| Connection::new(*from, *to))
            .collect();
        flow
    }

    fn position(order: &[String], id: &str) -> usize {
        order.iter().position(|s| s == id).unwrap()
    }

    #[test]
    fn dependencies_come_first() {
        let flow = flow(
            &["notify", "pay", "lookup", "auth"],
            &[("auth", "lookup"), ("lookup", "pay"), ("pay", "notify"), ("auth", "pay")],
        );
        let order = execution_order(&flow).unwrap();

        assert_eq!(order, vec!["auth", "lookup", "pay", "notify"]);
        for conn in &flow.connections {
            assert!(position(&order, &conn.from) < position(&order, &conn.to));
        }
    }

    #[test]
    fn isolated_steps_appear_once_in_declared_order() {
        let flow = flow(&["header", "a", "banner", "b"], &[("a", "b")]);
        let order = execution_order(&flow).unwrap();

        assert_eq!(order, vec!["header", "a", "banner", "b"]);
    }

    #[test]
    fn diamond_visits_shared_dependency_once() {
        let flow = flow(
            &["join", "left", "right", "root"],
            &[("left", "join"), ("right", "join"), ("root", "left"), ("root", "right")],
        );
        let order = execution_order(&flow).unwrap();

        assert_eq!(order, vec!["root", "left", "right", "join"]);
    }

    #[test]
    fn two_step_cycle_is_reported() {
        let flow = flow(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let err = execution_order(&flow).unwrap_err();

        match err {
            WorkflowError::CyclicDependency { step_id } => {
                assert!(step_id == "a" || step_id == "b")
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let flow = flow(&["a"], &[("a", "a")]);
        assert_eq!(
            execution_order(&flow),
            Err(WorkflowError::CyclicDependency {
                step_id: "a".to_string()
            })
        );
    }

    #[test]
    fn long_cycle_behind_a_tail_is_reported() {
        let flow = flow(
            &["x", "a", "b", "c"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "x")],
        );
        let err = execution_order(&flow).unwrap_err();
        assert!(matches!(err, WorkflowError::CyclicDependency { .. }));
    }

    #[test]
    fn dangling_connection_is_rejected() {
        let flow = flow(&["a"], &[("a", "ghost")]);
        assert_eq!(
            execution_order(&flow),
            Err(WorkflowError::StepNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn ready_sets_layer_by_depth() {
        let flow = flow(
            &["auth", "company", "car", "pay", "banner"],
            &[("auth", "company"), ("auth", "car"), ("company", "pay"), ("car", "pay")],
        );
        let graph = DependencyGraph::build(&flow).unwrap();
        let order = graph.execution_order().unwrap();
        let sets = graph.ready_sets(&order);

        assert_eq!(
            sets,
            vec![vec!["auth", "banner"], vec!["company", "car"], vec!["pay"]]
        );
    }
}
