//! Wire protocol: command parsing and response text
//!
//! Line-oriented, case-insensitive command keyword, whitespace-separated
//! arguments. Vertex ids are 1-based on the wire and 0-based everywhere
//! else in the crate; the conversion happens here and nowhere else.

use crate::error::{Result, SccdError};

/// Response lines, verbatim on the wire.
pub mod responses {
    pub const SEND_EDGES: &str = "Send the edges.";
    pub const GRAPH_CREATED: &str = "New graph created.";
    pub const EDGE_ADDED: &str = "Edge added.";
    pub const EDGE_REMOVED: &str = "Edge removed.";
    pub const INVALID_COMMAND: &str = "Invalid command.";
    pub const INVALID_VERTEX: &str = "Invalid vertex.";
    pub const INVALID_EDGE: &str = "Invalid edge.";
}

/// Upper bound on the vertex count a `NEWGRAPH` may request. Larger
/// requests are rejected at parse time, before anything is allocated
/// from a client-controlled size.
pub const MAX_VERTICES: usize = 1_000_000;

/// Upper bound on the edge count a `NEWGRAPH` may announce.
pub const MAX_EDGES: usize = 1_000_000;

/// A parsed client command. Vertex ids here are still 1-based; the
/// session converts after bounds-checking against the live graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `NEWGRAPH n m`: reset to `n` vertices, then read `m` edge lines.
    NewGraph { n: usize, m: usize },
    /// `NEWEDGE u v`
    NewEdge { u: usize, v: usize },
    /// `REMOVEEDGE u v`
    RemoveEdge { u: usize, v: usize },
    /// `KOSARAJU`
    Kosaraju,
}

impl Command {
    /// Parse one command line. Keyword matching is case-insensitive;
    /// wrong arity or unparsable arguments are an invalid command.
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().ok_or_else(|| invalid(line))?;
        let cmd = match keyword.to_ascii_lowercase().as_str() {
            "newgraph" => {
                let n: usize = parse_arg(&mut parts, line)?;
                let m: usize = parse_arg(&mut parts, line)?;
                if n > MAX_VERTICES || m > MAX_EDGES {
                    return Err(invalid(line));
                }
                Command::NewGraph { n, m }
            }
            "newedge" => Command::NewEdge {
                u: parse_arg(&mut parts, line)?,
                v: parse_arg(&mut parts, line)?,
            },
            "removeedge" => Command::RemoveEdge {
                u: parse_arg(&mut parts, line)?,
                v: parse_arg(&mut parts, line)?,
            },
            "kosaraju" => Command::Kosaraju,
            _ => return Err(invalid(line)),
        };
        if parts.next().is_some() {
            return Err(invalid(line));
        }
        Ok(cmd)
    }
}

/// Parse one `u v` edge line from the NEWGRAPH sub-protocol (1-based).
pub fn parse_edge_line(line: &str) -> Result<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let err = || SccdError::MalformedEdgeLine { line: line.into() };
    let u: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(err)?;
    let v: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(err)?;
    if parts.next().is_some() {
        return Err(err());
    }
    Ok((u, v))
}

/// Format an SCC partition the way clients expect: one line per
/// component, 1-based component index and vertex ids.
pub fn format_partition(partition: &[Vec<usize>]) -> Vec<String> {
    partition
        .iter()
        .enumerate()
        .map(|(idx, component)| {
            let ids = component
                .iter()
                .map(|v| (v + 1).to_string())
                .collect::<Vec<_>>()
                .join(" ");
            format!("SCC {} is: {}", idx + 1, ids)
        })
        .collect()
}

fn invalid(line: &str) -> SccdError {
    SccdError::InvalidCommand { input: line.into() }
}

fn parse_arg<'a>(parts: &mut impl Iterator<Item = &'a str>, line: &str) -> Result<usize> {
    parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(line))
}
