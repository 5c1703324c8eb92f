//! Layer bookkeeping shared by mutation, crossover and import.
//!
//! Graph walks here are iterative and run over node positions
//! in the genome's node arena. Disabled connections count as
//! edges: they may be re-enabled by inheritance later on.
use super::{LayeredGenome, NodeType};

impl LayeredGenome {
    /// Returns, for every node position, the positions of the
    /// nodes it feeds.
    pub(super) fn successor_lists(&self) -> Vec<Vec<usize>> {
        let mut successors = vec![vec![]; self.nodes.len()];
        for connection in &self.connections {
            if let (Some(origin), Some(destination)) = (
                self.node_index(connection.origin()),
                self.node_index(connection.destination()),
            ) {
                successors[origin].push(destination);
            }
        }
        successors
    }

    /// Returns whether `target` can be reached from `start`
    /// by following connections forward.
    pub(super) fn reaches(successors: &[Vec<usize>], start: usize, target: usize) -> bool {
        let mut visited = vec![false; successors.len()];
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if std::mem::replace(&mut visited[current], true) {
                continue;
            }
            stack.extend(&successors[current]);
        }
        false
    }

    /// Lifts the node at position `index` to at least `min_layer`,
    /// shifting its whole downstream chain along with it. Output
    /// nodes are never moved one by one: they are settled together
    /// once the chain is done.
    pub(super) fn raise(&mut self, successors: &[Vec<usize>], index: usize, min_layer: usize) {
        let mut stack = vec![(index, min_layer)];
        while let Some((current, layer)) = stack.pop() {
            let node = &mut self.nodes[current];
            if node.node_type() == NodeType::Output || node.layer() >= layer {
                continue;
            }
            node.set_layer(layer);
            stack.extend(successors[current].iter().map(|&next| (next, layer + 1)));
        }
        self.settle_outputs();
    }

    /// Moves every output node to the single layer right above
    /// the highest non-output node, unless they already sit higher,
    /// and updates the layer count.
    pub(super) fn settle_outputs(&mut self) {
        let above_hidden = self
            .nodes
            .iter()
            .filter(|n| n.node_type() != NodeType::Output)
            .map(|n| n.layer() + 1)
            .max()
            .unwrap_or(1);
        let output_layer = self
            .nodes
            .iter()
            .filter(|n| n.node_type() == NodeType::Output)
            .map(|n| n.layer())
            .max()
            .unwrap_or(0)
            .max(above_hidden);
        for node in &mut self.nodes {
            if node.node_type() == NodeType::Output {
                node.set_layer(output_layer);
            }
        }
        self.layer_count = output_layer + 1;
    }

    /// Recomputes every node's input count from the connections
    /// feeding it. Input nodes always wait for their one external signal.
    pub(super) fn recount_inputs(&mut self) {
        let mut counts = vec![0; self.nodes.len()];
        for connection in &self.connections {
            if let Some(destination) = self.node_index(connection.destination()) {
                counts[destination] += 1;
            }
        }
        for (node, count) in self.nodes.iter_mut().zip(counts) {
            if node.node_type() == NodeType::Input {
                node.set_input_count(1);
            } else {
                node.set_input_count(count);
            }
        }
    }

    /// Returns whether every connection runs from a lower to a
    /// strictly higher layer, and all outputs share the top layer.
    pub fn is_consistently_layered(&self) -> bool {
        let output_layer = self
            .nodes
            .iter()
            .find(|n| n.node_type() == NodeType::Output)
            .map(|n| n.layer());
        let outputs_on_top = self.nodes.iter().all(|n| match n.node_type() {
            NodeType::Output => Some(n.layer()) == output_layer,
            _ => output_layer.map_or(true, |top| n.layer() < top),
        });
        let edges_ascend = self.connections.iter().all(|c| {
            match (self.node(c.origin()), self.node(c.destination())) {
                (Some(origin), Some(destination)) => origin.layer() < destination.layer(),
                _ => false,
            }
        });
        outputs_on_top && edges_ascend
    }

    /// Returns whether the connections describe a cycle.
    pub fn has_cycle(&self) -> bool {
        let successors = self.successor_lists();
        self.connections.iter().any(|c| {
            match (self.node_index(c.origin()), self.node_index(c.destination())) {
                (Some(origin), Some(destination)) => Self::reaches(&successors, destination, origin),
                _ => false,
            }
        })
    }
}
