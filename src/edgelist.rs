//! Whitespace-separated edge lists.
//!
//! One `source target` pair per line. Blank lines and lines starting with
//! `#` are skipped. Nodes are numbered in order of first appearance, so a
//! target that never appears as a source becomes a sink.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::{RankError, Result};
use crate::graph::{CsrGraph, GraphBuilder};

/// Parse a single line into an edge; `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str, line_number: usize) -> Result<Option<(String, String)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(source), Some(target), None) => Ok(Some((source.to_string(), target.to_string()))),
        (Some(_), None, _) => Err(RankError::malformed(
            Some(line_number),
            format!("expected \"source target\", found only \"{line}\""),
        )),
        _ => Err(RankError::malformed(
            Some(line_number),
            format!("expected two fields, found more in \"{line}\""),
        )),
    }
}

/// Read an edge list into a graph keyed by node name.
pub fn parse_edge_list<R: BufRead>(reader: R) -> Result<CsrGraph<String>> {
    let mut builder = GraphBuilder::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some((source, target)) = parse_line(&line, index + 1)? {
            builder.add_edge(source, target);
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        nodes = builder.node_count(),
        edges = builder.edge_count(),
        "edge list loaded"
    );

    Ok(CsrGraph::from_builder(&builder))
}

/// Open and parse an edge-list file.
pub fn read_edge_list(path: impl AsRef<Path>) -> Result<CsrGraph<String>> {
    let file = File::open(path.as_ref())?;
    parse_edge_list(BufReader::new(file))
}
