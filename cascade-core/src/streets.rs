//! Builds the pedestrian [`GraphStore`] from an OSM `.pbf` extract:
//! one [`GraphNode::Walk`] per OSM node tagged `highway`, one
//! [`GraphEdge::Walk`] per routable segment between them, restricted
//! to the largest connected component so a disconnected sliver of the
//! extract never silently produces unreachable queries.

use std::path::Path;

use ahash::{HashMap, HashMapExt};
use petgraph::graph::{DiGraph, NodeIndex};
use rustworkx_core::connectivity::connected_components;

use crate::connectors::build_rtree;
use crate::entities::{Node, Way, WayId};
use crate::graph::{GraphEdge, GraphNode, GraphStore, WalkEdge};
use crate::Error;

/// Reads `filename`, keeps only the largest connected component of the
/// resulting walk graph, and returns a [`GraphStore`] with its spatial
/// index and `Way` entities already registered. GTFS entities are
/// merged in afterwards by [`crate::loaders`].
pub fn build_walk_graph(filename: impl AsRef<Path>) -> Result<GraphStore, Error> {
    let mut graph = DiGraph::<GraphNode, GraphEdge>::new();

    // This hashmap is used to store OSM node IDs and their corresponding
    // graph node indices. Required to avoid creating duplicate nodes for
    // the same OSM node id — petgraph has no "does this node exist"
    // lookup of its own.
    let (nodes, edges) = osm4routing::Reader::new()
        .read_tag("highway")
        .read(&filename)
        .map_err(|e| Error::InvalidData(format!("Error reading PBF: {e}")))?;

    let mut node_indices = HashMap::new();
    for node in nodes {
        node_indices.entry(node.id).or_insert_with(|| {
            graph.add_node(GraphNode::Walk(Node {
                location: node.coord.into(),
            }))
        });
    }

    for edge in &edges {
        let source_index = *node_indices
            .get(&edge.source)
            .ok_or_else(|| Error::InvalidData(format!("edge references unknown source node {:?}", edge.source)))?;
        let target_index = *node_indices
            .get(&edge.target)
            .ok_or_else(|| Error::InvalidData(format!("edge references unknown target node {:?}", edge.target)))?;

        let edge_type = GraphEdge::Walk(WalkEdge {
            edge_weight: edge.length(),
        });
        graph.add_edge(source_index, target_index, edge_type.clone());
        graph.add_edge(target_index, source_index, edge_type);
    }

    let largest_component = connected_components(&graph)
        .into_iter()
        .max_by_key(|component| component.len())
        .ok_or_else(|| Error::GraphInvariant("OSM extract produced an empty walk graph".to_string()))?;

    let mut trimmed = DiGraph::<GraphNode, GraphEdge>::new();
    let mut remap = HashMap::new();
    for &old_index in &largest_component {
        let node = graph[old_index].clone();
        remap.insert(old_index, trimmed.add_node(node));
    }

    // Collected here, rather than re-derived from the trimmed graph
    // afterwards, because this is the last point at which we still
    // have the pre-dedup edge list to walk.
    let mut kept_pairs: Vec<(NodeIndex, NodeIndex)> = Vec::new();
    for &old_index in &largest_component {
        for neighbor in graph.neighbors(old_index) {
            if let Some(edge_index) = graph.find_edge(old_index, neighbor) {
                let weight = graph[edge_index].clone();
                let new_source = remap[&old_index];
                let new_target = remap[&neighbor];
                trimmed.add_edge(new_source, new_target, weight);
                kept_pairs.push((new_source, new_target));
            }
        }
    }

    log::info!(
        "kept largest component: {} of {} nodes",
        trimmed.node_count(),
        graph.node_count()
    );

    let rtree = build_rtree(&trimmed);
    let mut store = GraphStore::from_parts(trimmed, rtree);
    register_ways(&mut store, kept_pairs);
    Ok(store)
}

/// Registers one [`Way`] per kept directed node pair. `osm4routing`
/// already splits OSM ways at every intersection, so each pair is
/// already the atomic routable segment — there is no parent way to
/// re-thread them back into, and the crate does not surface a street
/// name on the split edge, so `Way::name` stays `None` here (see
/// DESIGN.md).
fn register_ways(store: &mut GraphStore, pairs: Vec<(NodeIndex, NodeIndex)>) {
    let mut next_id = 0u64;
    for (source, target) in pairs {
        if store.way_between(source, target).is_some() {
            continue;
        }
        store.insert_way(Way {
            id: WayId(next_id),
            name: None,
            nodes: vec![source, target],
        });
        next_id += 1;
    }
}
