use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::ModelCatalog;
use crate::types::Cardinality;

/// Summary of the required-relation graph.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelationGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for required-relation dependency ordering.
///
/// `topo_order` lists models so that every required relation target precedes
/// its owner; `cycle` names the models on unresolvable cycles instead. Only
/// non-nullable to-one relations form edges — nullable ones can be broken at
/// synthesis time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelationGraphReport {
    pub summary: RelationGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic dependency report for a model catalog.
pub fn build_relation_graph_report(catalog: &ModelCatalog) -> RelationGraphReport {
    let graph = build_adjacency(catalog);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = RelationGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => RelationGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => RelationGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(catalog: &ModelCatalog) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for model in catalog.models() {
        graph.entry(model.name.clone()).or_default();

        let fields = match catalog.effective_fields(&model.name) {
            Ok(fields) => fields,
            Err(_) => continue,
        };

        for field in fields {
            if field.nullable {
                continue;
            }
            if let Some(relation) = &field.relation
                && relation.cardinality != Cardinality::ToMany
            {
                graph.entry(relation.target.clone()).or_default();
                graph
                    .entry(relation.target.clone())
                    .or_default()
                    .insert(model.name.clone());
            }
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();

    for node in graph.keys() {
        indegree.entry(node.clone()).or_insert(0);
    }

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| if *count == 0 { Some(node.clone()) } else { None })
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    let mut indegree = indegree;

    while let Some(node) = ready.iter().next().cloned() {
        ready.remove(&node);
        order.push(node.clone());

        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter_map(|(node, count)| if count > 0 { Some(node) } else { None })
            .collect();
        Err(cycle_nodes)
    }
}
