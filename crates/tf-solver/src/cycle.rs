//! Recycle-loop detection: Tarjan's SCC, tear-stream selection, and
//! topological ordering with tears removed.
//!
//! Grounded on `flowsheet_solver.py`'s `_tarjan_scc` (restricted to edges
//! whose endpoints are both known units), `_select_tear_streams` (first
//! intra-SCC connection, one tear per SCC), and
//! `_topological_sort_with_tears` (Kahn's algorithm with a defensive
//! trailing append for anything the sort couldn't place).

use std::collections::{HashMap, HashSet, VecDeque};

use tf_graph::Connection;

fn adjacency(unit_ids: &[String], connections: &[Connection]) -> HashMap<String, HashSet<String>> {
    let known: HashSet<&String> = unit_ids.iter().collect();
    let mut adj: HashMap<String, HashSet<String>> = unit_ids.iter().map(|u| (u.clone(), HashSet::new())).collect();
    for conn in connections {
        if let (Some(from), Some(to)) = (&conn.from_unit, &conn.to_unit) {
            if known.contains(from) && known.contains(to) {
                adj.entry(from.clone()).or_default().insert(to.clone());
            }
        }
    }
    adj
}

/// Strongly connected components of the unit graph, restricted to edges
/// both of whose endpoints are known units.
pub fn tarjan_scc(unit_ids: &[String], connections: &[Connection]) -> Vec<Vec<String>> {
    let adj = adjacency(unit_ids, connections);

    let mut index_counter = 0usize;
    let mut stack: Vec<String> = Vec::new();
    let mut on_stack: HashSet<String> = HashSet::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut lowlink: HashMap<String, usize> = HashMap::new();
    let mut sccs: Vec<Vec<String>> = Vec::new();

    fn strongconnect(
        v: &str,
        adj: &HashMap<String, HashSet<String>>,
        index_counter: &mut usize,
        stack: &mut Vec<String>,
        on_stack: &mut HashSet<String>,
        index: &mut HashMap<String, usize>,
        lowlink: &mut HashMap<String, usize>,
        sccs: &mut Vec<Vec<String>>,
    ) {
        index.insert(v.to_string(), *index_counter);
        lowlink.insert(v.to_string(), *index_counter);
        *index_counter += 1;
        stack.push(v.to_string());
        on_stack.insert(v.to_string());

        if let Some(neighbors) = adj.get(v) {
            for w in neighbors {
                if !index.contains_key(w) {
                    strongconnect(w, adj, index_counter, stack, on_stack, index, lowlink, sccs);
                    let w_low = lowlink[w];
                    let v_low = lowlink[v];
                    lowlink.insert(v.to_string(), v_low.min(w_low));
                } else if on_stack.contains(w) {
                    let w_idx = index[w];
                    let v_low = lowlink[v];
                    lowlink.insert(v.to_string(), v_low.min(w_idx));
                }
            }
        }

        if lowlink[v] == index[v] {
            let mut scc = Vec::new();
            loop {
                let w = stack.pop().unwrap();
                on_stack.remove(&w);
                scc.push(w.clone());
                if w == v {
                    break;
                }
            }
            sccs.push(scc);
        }
    }

    for v in unit_ids {
        if !index.contains_key(v) {
            strongconnect(v, &adj, &mut index_counter, &mut stack, &mut on_stack, &mut index, &mut lowlink, &mut sccs);
        }
    }

    sccs
}

/// One tear stream per SCC of more than one unit: the first connection
/// found whose endpoints both lie inside that SCC.
pub fn select_tear_streams(sccs: &[Vec<String>], connections: &[Connection]) -> Vec<String> {
    let mut tears = Vec::new();
    for scc in sccs {
        if scc.len() <= 1 {
            continue;
        }
        let scc_set: HashSet<&String> = scc.iter().collect();
        for conn in connections {
            if let (Some(from), Some(to)) = (&conn.from_unit, &conn.to_unit) {
                if scc_set.contains(from) && scc_set.contains(to) {
                    tears.push(conn.stream_id.clone());
                    break;
                }
            }
        }
    }
    tears
}

/// Kahn's algorithm over the unit graph with tear edges removed; units the
/// sort couldn't place (shouldn't happen if tears were selected correctly)
/// are appended defensively at the end.
pub fn topological_order_with_tears(unit_ids: &[String], connections: &[Connection], tear_streams: &[String]) -> Vec<String> {
    let tear_set: HashSet<&String> = tear_streams.iter().collect();
    let known: HashSet<&String> = unit_ids.iter().collect();

    let mut in_degree: HashMap<String, usize> = unit_ids.iter().map(|u| (u.clone(), 0)).collect();
    let mut adj_no_tears: HashMap<String, Vec<String>> = HashMap::new();

    for conn in connections {
        if tear_set.contains(&conn.stream_id) {
            continue;
        }
        if let (Some(from), Some(to)) = (&conn.from_unit, &conn.to_unit) {
            if known.contains(from) && known.contains(to) {
                adj_no_tears.entry(from.clone()).or_default().push(to.clone());
                *in_degree.entry(to.clone()).or_insert(0) += 1;
            }
        }
    }

    let mut queue: VecDeque<String> = in_degree.iter().filter(|(_, &d)| d == 0).map(|(u, _)| u.clone()).collect();
    let mut order: Vec<String> = Vec::new();

    while let Some(u) = queue.pop_front() {
        order.push(u.clone());
        if let Some(neighbors) = adj_no_tears.get(&u) {
            for v in neighbors {
                let deg = in_degree.get_mut(v).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(v.clone());
                }
            }
        }
    }

    let ordered: HashSet<&String> = order.iter().collect();
    let remaining: Vec<String> = unit_ids.iter().filter(|u| !ordered.contains(u)).cloned().collect();
    order.extend(remaining);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(stream: &str, from: &str, to: &str) -> Connection {
        Connection {
            stream_id: stream.to_string(),
            from_unit: Some(from.to_string()),
            from_port: Some("out".to_string()),
            to_unit: Some(to.to_string()),
            to_port: Some("in".to_string()),
        }
    }

    #[test]
    fn linear_chain_has_no_sccs_with_more_than_one_unit() {
        let units = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let conns = vec![conn("s1", "a", "b"), conn("s2", "b", "c")];
        let sccs = tarjan_scc(&units, &conns);
        assert!(sccs.iter().all(|s| s.len() == 1));
    }

    #[test]
    fn recycle_loop_forms_one_scc() {
        let units = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let conns = vec![conn("s1", "a", "b"), conn("s2", "b", "c"), conn("s3", "c", "b")];
        let sccs = tarjan_scc(&units, &conns);
        let big = sccs.iter().find(|s| s.len() > 1).unwrap();
        assert_eq!(big.len(), 2);
        let tears = select_tear_streams(&sccs, &conns);
        assert_eq!(tears.len(), 1);
        assert!(tears[0] == "s2" || tears[0] == "s3");
    }

    #[test]
    fn topo_order_respects_edges_once_tear_removed() {
        let units = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let conns = vec![conn("s1", "a", "b"), conn("s2", "b", "c"), conn("s3", "c", "b")];
        let sccs = tarjan_scc(&units, &conns);
        let tears = select_tear_streams(&sccs, &conns);
        let order = topological_order_with_tears(&units, &conns, &tears);
        assert_eq!(order.len(), 3);
        assert_eq!(order[0], "a");
    }
}
