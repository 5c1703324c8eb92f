//! Plain text encoding of genomes:
//!
//! ```text
//! <layer count>
//!
//! N
//! <id> <type> <layer> <input count>
//! ...
//!
//! C
//! <marking> <origin> <destination> <weight> <enabled>
//! ...
//! ```
use super::{Connection, ImportError, LayeredGenome, Node, NodeType};
use crate::NodeId;

use ahash::RandomState;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Returns the file name a genome exported from species
/// `species` with fitness `fitness` is saved under.
///
/// # Examples
/// ```
/// use tacneat_nn::genomics::suggested_file_name;
///
/// assert_eq!(suggested_file_name(3, 41.5), "brain-NEAT-s3-f41.5.txt");
/// ```
pub fn suggested_file_name(species: usize, fitness: f64) -> String {
    format!("brain-NEAT-s{}-f{}.txt", species, fitness)
}

impl LayeredGenome {
    /// Encodes the genome in the plain text format.
    ///
    /// # Examples
    /// ```
    /// use tacneat_nn::genomics::{GeneticConfig, LayeredGenome};
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let genome = LayeredGenome::new(&config, &mut rand::thread_rng());
    ///
    /// let text = genome.export();
    /// assert!(text.starts_with("2\n\nN\n0 Input 0 1\n"));
    /// assert_eq!(LayeredGenome::import(&text).unwrap(), genome);
    /// ```
    pub fn export(&self) -> String {
        self.to_string()
    }

    /// Decodes a genome from the plain text format.
    ///
    /// Nodes must be declared before the connections referencing them.
    /// The decoded genome is checked for consistency before being
    /// returned: its layers must ascend along every connection with
    /// the outputs alone on top, its input counts must match its
    /// connections, and it must be free of cycles.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first problem found.
    pub fn import(text: &str) -> Result<LayeredGenome, ImportError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let layer_count: usize = lines
            .next()
            .and_then(|l| l.parse().ok())
            .ok_or(ImportError::InvalidLayerCount)?;

        let mut nodes: Vec<Node> = vec![];
        let mut node_ids = HashSet::<NodeId, RandomState>::default();
        let mut connections: Vec<Connection> = vec![];
        let mut markings = HashSet::<usize, RandomState>::default();
        let mut endpoints = HashSet::<(NodeId, NodeId), RandomState>::default();

        while let Some(marker) = lines.next() {
            match marker {
                "N" => {
                    let line = lines.next().unwrap_or_default();
                    let node = parse_node(line)?;
                    if !node_ids.insert(node.id()) {
                        return Err(ImportError::DuplicateNode(node.id()));
                    }
                    nodes.push(node);
                }
                "C" => {
                    let line = lines.next().unwrap_or_default();
                    let connection = parse_connection(line)?;
                    for id in [connection.origin(), connection.destination()] {
                        if !node_ids.contains(&id) {
                            return Err(ImportError::UnknownNode(id));
                        }
                    }
                    if !markings.insert(connection.marking()) {
                        return Err(ImportError::DuplicateConnection(connection.marking()));
                    }
                    if !endpoints.insert(connection.endpoints()) {
                        let (origin, destination) = connection.endpoints();
                        return Err(ImportError::DuplicateEndpoints(origin, destination));
                    }
                    connections.push(connection);
                }
                other => return Err(ImportError::UnexpectedMarker(other.to_string())),
            }
        }

        nodes.sort_unstable_by_key(Node::id);
        connections.sort_unstable_by_key(Connection::marking);
        let genome = LayeredGenome {
            nodes,
            connections,
            layer_count,
        };
        genome.validate()?;
        Ok(genome)
    }

    fn validate(&self) -> Result<(), ImportError> {
        let has = |t: NodeType| self.nodes.iter().any(|n| n.node_type() == t);
        if !has(NodeType::Input) || !has(NodeType::Output) {
            return Err(ImportError::MissingIoNodes);
        }

        let successors = self.successor_lists();
        for connection in &self.connections {
            let (origin, destination) = (
                self.position(connection.origin()),
                self.position(connection.destination()),
            );
            if Self::reaches(&successors, destination, origin) {
                return Err(ImportError::Cycle(
                    connection.origin(),
                    connection.destination(),
                ));
            }
            if self.nodes[destination].node_type() == NodeType::Input {
                return Err(ImportError::InconsistentLayers(format!(
                    "connection {} feeds input node {}",
                    connection.marking(),
                    connection.destination()
                )));
            }
            if self.nodes[origin].layer() >= self.nodes[destination].layer() {
                return Err(ImportError::InconsistentLayers(format!(
                    "connection {} does not ascend layers",
                    connection.marking()
                )));
            }
        }

        let output_layer = self
            .nodes
            .iter()
            .filter(|n| n.node_type() == NodeType::Output)
            .map(Node::layer)
            .max()
            .unwrap_or_default();
        for node in &self.nodes {
            let misplaced = match node.node_type() {
                NodeType::Output => node.layer() != output_layer,
                _ => node.layer() >= output_layer,
            };
            if misplaced {
                return Err(ImportError::InconsistentLayers(format!(
                    "node {} is not below a single output layer {}",
                    node.id(),
                    output_layer
                )));
            }
        }
        if self.layer_count != output_layer + 1 {
            return Err(ImportError::InconsistentLayers(format!(
                "declared {} layers, outputs sit on layer {}",
                self.layer_count, output_layer
            )));
        }

        let mut feeding = vec![0; self.nodes.len()];
        for connection in &self.connections {
            feeding[self.position(connection.destination())] += 1;
        }
        for (node, actual) in self.nodes.iter().zip(feeding) {
            let actual = if node.node_type() == NodeType::Input { 1 } else { actual };
            if node.input_count() != actual {
                return Err(ImportError::InconsistentInputCount {
                    node: node.id(),
                    declared: node.input_count(),
                    actual,
                });
            }
        }

        Ok(())
    }
}

fn parse_node(line: &str) -> Result<Node, ImportError> {
    let malformed = || ImportError::MalformedEntry {
        kind: "node",
        line: line.to_string(),
    };
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(malformed());
    }
    let node_type: NodeType = fields[1].parse().map_err(ImportError::UnknownNodeType)?;
    Ok(Node::new(
        fields[0].parse().map_err(|_| malformed())?,
        node_type,
        fields[2].parse().map_err(|_| malformed())?,
        fields[3].parse().map_err(|_| malformed())?,
    ))
}

fn parse_connection(line: &str) -> Result<Connection, ImportError> {
    let malformed = || ImportError::MalformedEntry {
        kind: "connection",
        line: line.to_string(),
    };
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(malformed());
    }
    let weight: f64 = fields[3].parse().map_err(|_| malformed())?;
    if !weight.is_finite() {
        return Err(malformed());
    }
    Ok(Connection::new(
        fields[0].parse().map_err(|_| malformed())?,
        fields[1].parse().map_err(|_| malformed())?,
        fields[2].parse().map_err(|_| malformed())?,
        weight,
        fields[4].parse().map_err(|_| malformed())?,
    ))
}

impl fmt::Display for LayeredGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.layer_count)?;
        writeln!(f)?;
        for node in &self.nodes {
            writeln!(f, "N")?;
            writeln!(f, "{}", node)?;
        }
        writeln!(f)?;
        for connection in &self.connections {
            writeln!(f, "C")?;
            writeln!(f, "{}", connection)?;
        }
        Ok(())
    }
}

impl FromStr for LayeredGenome {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<LayeredGenome, ImportError> {
        LayeredGenome::import(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPLIT: &str = "3\n\nN\n0 Input 0 1\nN\n1 Input 0 1\nN\n2 Output 2 3\nN\n3 Hidden 1 1\n\n\
        C\n0 0 2 0.5 true\nC\n1 1 2 0.7 false\nC\n2 1 3 1 true\nC\n3 3 2 0.7 true\n";

    #[test]
    fn import_reads_every_entry() {
        let genome = LayeredGenome::import(SPLIT).unwrap();
        assert_eq!(genome.layer_count(), 3);
        assert_eq!(genome.nodes().count(), 4);
        assert_eq!(genome.node(3).unwrap().node_type(), NodeType::Hidden);
        assert!(!genome.connection(1).unwrap().enabled());
        assert_eq!(genome.connection(3).unwrap().weight(), 0.7);
    }

    #[test]
    fn export_is_byte_stable() {
        let genome: LayeredGenome = SPLIT.parse().unwrap();
        assert_eq!(genome.export(), SPLIT);
    }

    #[test]
    fn rejects_unknown_node_reference() {
        let text = SPLIT.replace("C\n3 3 2 0.7 true", "C\n3 9 2 0.7 true");
        assert_eq!(LayeredGenome::import(&text), Err(ImportError::UnknownNode(9)));
    }

    #[test]
    fn rejects_connection_before_its_nodes() {
        let text = "2\n\nN\n0 Input 0 1\nC\n0 0 1 0.5 true\nN\n1 Output 1 1\n";
        assert_eq!(LayeredGenome::import(text), Err(ImportError::UnknownNode(1)));
    }

    #[test]
    fn rejects_inconsistent_layers() {
        let text = SPLIT.replace("3 Hidden 1 1", "3 Hidden 2 1");
        assert!(matches!(
            LayeredGenome::import(&text),
            Err(ImportError::InconsistentLayers(_))
        ));
        let text = SPLIT.replacen("3\n", "4\n", 1);
        assert!(matches!(
            LayeredGenome::import(&text),
            Err(ImportError::InconsistentLayers(_))
        ));
    }

    #[test]
    fn rejects_bad_input_counts() {
        let text = SPLIT.replace("2 Output 2 3", "2 Output 2 2");
        assert_eq!(
            LayeredGenome::import(&text),
            Err(ImportError::InconsistentInputCount {
                node: 2,
                declared: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn rejects_cycles() {
        let text = "3\n\nN\n0 Input 0 1\nN\n1 Output 2 1\nN\n2 Hidden 1 2\nN\n3 Hidden 1 1\n\n\
            C\n0 0 2 1 true\nC\n1 2 3 1 true\nC\n2 3 2 1 true\nC\n3 2 1 1 true\n";
        assert!(matches!(
            LayeredGenome::import(text),
            Err(ImportError::Cycle(..))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            LayeredGenome::import("layers"),
            Err(ImportError::InvalidLayerCount)
        );
        assert_eq!(
            LayeredGenome::import("2\n\nN\n0 Sensor 0 1\n"),
            Err(ImportError::UnknownNodeType("Sensor".to_string()))
        );
        assert!(matches!(
            LayeredGenome::import("2\n\nN\n0 Input 0\n"),
            Err(ImportError::MalformedEntry { kind: "node", .. })
        ));
        assert_eq!(
            LayeredGenome::import("2\n\nX\n"),
            Err(ImportError::UnexpectedMarker("X".to_string()))
        );
    }

    #[test]
    fn file_name_embeds_species_and_fitness() {
        assert_eq!(suggested_file_name(0, 12.0), "brain-NEAT-s0-f12.txt");
    }
}
