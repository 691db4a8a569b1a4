//! GraphML export — serialize an interaction graph for graph tools.
//!
//! Produces a GraphML document readable by Gephi, Cytoscape, networkx and
//! friends. One `<node>` per author, one `<edge>` per directed pair, and the
//! edge weight as an integer `<data>` entry under the `weight` key.
//!
//! ```text
//! InteractionGraph → write_graphml() → <graphml> … </graphml>
//!   → export_graphml(path): temp file, fsync, rename
//! ```
//!
//! Nodes and edges are written in sorted order, so the same graph always
//! produces the same bytes.

pub mod reader;

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::model::InteractionGraph;
use crate::{Error, Result};

pub use reader::{parse_graphml, read_graphml, read_graphml_file};

/// GraphML key id for the edge weight attribute.
pub const WEIGHT_KEY_ID: &str = "d0";

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";
const GRAPHML_SCHEMA: &str =
    "http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd";

/// Write `graph` as a GraphML document.
///
/// Fails with [`Error::InvalidIdentifier`] before writing anything if an
/// author identifier holds characters XML 1.0 cannot represent.
pub fn write_graphml(graph: &InteractionGraph, writer: &mut dyn Write) -> Result<()> {
    if let Some(bad) = graph.nodes().find(|id| !id.as_str().chars().all(is_xml_char)) {
        return Err(Error::InvalidIdentifier(bad.to_string()));
    }

    // Header
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<graphml xmlns="{GRAPHML_NS}" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="{GRAPHML_SCHEMA}">"#
    )?;
    writeln!(
        writer,
        "  <!-- interaction-graph: {} nodes, {} edges -->",
        graph.node_count(),
        graph.edge_count()
    )?;
    writeln!(
        writer,
        r#"  <key id="{WEIGHT_KEY_ID}" for="edge" attr.name="weight" attr.type="long"/>"#
    )?;
    writeln!(writer, r#"  <graph edgedefault="directed">"#)?;

    for node in graph.sorted_nodes() {
        writeln!(writer, r#"    <node id="{}"/>"#, escape(node.as_str()))?;
    }

    for edge in graph.sorted_edges() {
        writeln!(
            writer,
            r#"    <edge source="{}" target="{}">"#,
            escape(edge.source.as_str()),
            escape(edge.target.as_str())
        )?;
        writeln!(writer, r#"      <data key="{WEIGHT_KEY_ID}">{}</data>"#, edge.weight)?;
        writeln!(writer, "    </edge>")?;
    }

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</graphml>")?;
    Ok(())
}

/// Write `graph` to `path` as GraphML.
///
/// The document goes to `<path>.tmp` first and is renamed over `path` only
/// once fully written and synced; on failure the temp file is removed and
/// `path` is left as it was.
pub fn export_graphml(graph: &InteractionGraph, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_atomic(path, |w| write_graphml(graph, w))?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph exported"
    );
    Ok(())
}

/// Run `write` against a temp sibling of `path`, then rename into place.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let tmp = temp_path(path)?;
    let result = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        write(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} does not name a file", path.display()),
        )
    })?;
    let mut tmp = name.to_os_string();
    tmp.push(".tmp");
    Ok(path.with_file_name(tmp))
}

/// The XML 1.0 `Char` production.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape text for an XML attribute value.
///
/// Tabs and line breaks become character references so attribute-value
/// normalization does not turn them into spaces.
fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'', '\n', '\r', '\t']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
