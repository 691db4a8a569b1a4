//! GraphML reader — load an exported interaction graph back.
//!
//! Understands the subset of GraphML that describes a weighted directed
//! graph: `<key>` declarations, one `<graph>`, `<node>`, `<edge>` and the
//! edge weight `<data>`. Everything else (other keys, node data, comments,
//! processing instructions, DOCTYPE) is skipped. Tags must nest properly.
//!
//! Edges without a weight entry count as weight 1; an edge pair listed more
//! than once has its weights summed.

use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

use crate::model::InteractionGraph;
use crate::{Error, Result};

/// Read a GraphML document from `reader`.
pub fn read_graphml<R: Read>(mut reader: R) -> Result<InteractionGraph> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_graphml(&text)
}

/// Read a GraphML file.
pub fn read_graphml_file(path: impl AsRef<Path>) -> Result<InteractionGraph> {
    read_graphml(std::fs::File::open(path)?)
}

/// Parse a GraphML document held in memory.
pub fn parse_graphml(input: &str) -> Result<InteractionGraph> {
    let mut scanner = Scanner { input, pos: 0 };
    let mut graph = InteractionGraph::new();

    let mut open: Vec<&str> = Vec::new();
    let mut weight_key: Option<String> = None;
    let mut saw_graph = false;
    let mut edge: Option<PendingEdge> = None;
    let mut weight_text: Option<String> = None;

    while let Some(event) = scanner.next_event()? {
        match event {
            Event::Open { name, attrs, empty, pos } => {
                match name {
                    "key" => {
                        let scope = attr(&attrs, "for").unwrap_or("all");
                        if attr(&attrs, "attr.name") == Some("weight") && matches!(scope, "edge" | "all") {
                            weight_key = Some(required(&attrs, "id", name, pos)?.to_string());
                        }
                    }
                    "graph" => {
                        if saw_graph {
                            return Err(syntax(pos, "only one <graph> element is supported"));
                        }
                        if let Some(kind) = attr(&attrs, "edgedefault") {
                            if kind != "directed" {
                                return Err(syntax(pos, format!("unsupported edgedefault \"{kind}\"")));
                            }
                        }
                        saw_graph = true;
                    }
                    "node" => {
                        graph.add_node(required(&attrs, "id", name, pos)?);
                    }
                    "edge" => {
                        if edge.is_some() {
                            return Err(syntax(pos, "nested <edge>"));
                        }
                        if attr(&attrs, "directed") == Some("false") {
                            return Err(syntax(pos, "undirected edges are not supported"));
                        }
                        edge = Some(PendingEdge {
                            source: required(&attrs, "source", name, pos)?.to_string(),
                            target: required(&attrs, "target", name, pos)?.to_string(),
                            weight: None,
                        });
                    }
                    "data" if edge.is_some()
                        && weight_key.is_some()
                        && attr(&attrs, "key") == weight_key.as_deref() =>
                    {
                        weight_text = Some(String::new());
                    }
                    _ => {}
                }

                if empty {
                    // <edge .../> and <data .../> close immediately
                    close_element(name, pos, &mut graph, &mut edge, &mut weight_text)?;
                } else {
                    open.push(name);
                }
            }
            Event::Close { name, pos } => {
                match open.pop() {
                    Some(expected) if expected == name => {}
                    Some(expected) => {
                        return Err(syntax(pos, format!("</{name}> does not close <{expected}>")));
                    }
                    None => return Err(syntax(pos, format!("unexpected </{name}>"))),
                }
                close_element(name, pos, &mut graph, &mut edge, &mut weight_text)?;
            }
            Event::Text(text) => {
                if let Some(buf) = weight_text.as_mut() {
                    buf.push_str(&text);
                }
            }
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(syntax(input.len(), format!("unclosed <{unclosed}>")));
    }
    if !saw_graph {
        return Err(syntax(0, "no <graph> element"));
    }
    Ok(graph)
}

struct PendingEdge {
    source: String,
    target: String,
    weight: Option<u64>,
}

fn close_element(
    name: &str,
    pos: usize,
    graph: &mut InteractionGraph,
    edge: &mut Option<PendingEdge>,
    weight_text: &mut Option<String>,
) -> Result<()> {
    match name {
        "data" => {
            if let (Some(text), Some(pending)) = (weight_text.take(), edge.as_mut()) {
                let weight: u64 = text
                    .trim()
                    .parse()
                    .map_err(|_| syntax(pos, format!("edge weight \"{}\" is not an integer", text.trim())))?;
                if weight == 0 {
                    return Err(syntax(pos, "edge weight must be at least 1"));
                }
                pending.weight = Some(weight);
            }
        }
        "edge" => {
            if let Some(pending) = edge.take() {
                graph.add_weighted(&pending.source, &pending.target, pending.weight.unwrap_or(1));
            }
        }
        _ => {}
    }
    Ok(())
}

fn attr<'b>(attrs: &'b [(&str, Cow<'_, str>)], name: &str) -> Option<&'b str> {
    attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_ref())
}

fn required<'b>(attrs: &'b [(&str, Cow<'_, str>)], name: &str, element: &str, pos: usize) -> Result<&'b str> {
    attr(attrs, name).ok_or_else(|| syntax(pos, format!("<{element}> without {name} attribute")))
}

fn syntax(position: usize, message: impl Into<String>) -> Error {
    Error::GraphMl { position, message: message.into() }
}

// ============================================================================
// Scanner
// ============================================================================

enum Event<'a> {
    Open {
        name: &'a str,
        attrs: Vec<(&'a str, Cow<'a, str>)>,
        empty: bool,
        pos: usize,
    },
    Close {
        name: &'a str,
        pos: usize,
    },
    Text(Cow<'a, str>),
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn next_event(&mut self) -> Result<Option<Event<'a>>> {
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Ok(None);
            }
            let start = self.pos;

            if !rest.starts_with('<') {
                let len = rest.find('<').unwrap_or(rest.len());
                self.pos += len;
                return Ok(Some(Event::Text(unescape(&rest[..len], start)?)));
            }

            if rest.starts_with("<?") {
                self.skip_past("?>", start)?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->", start)?;
            } else if let Some(body) = rest.strip_prefix("<![CDATA[") {
                let len = body
                    .find("]]>")
                    .ok_or_else(|| syntax(start, "unterminated CDATA section"))?;
                self.pos += "<![CDATA[".len() + len + "]]>".len();
                return Ok(Some(Event::Text(Cow::Borrowed(&body[..len]))));
            } else if rest.starts_with("<!") {
                self.skip_past(">", start)?;
            } else if let Some(body) = rest.strip_prefix("</") {
                let len = body.find('>').ok_or_else(|| syntax(start, "unterminated end tag"))?;
                self.pos += 2 + len + 1;
                return Ok(Some(Event::Close { name: local_name(body[..len].trim()), pos: start }));
            } else {
                return self.open_tag(start).map(Some);
            }
        }
    }

    fn skip_past(&mut self, terminator: &str, start: usize) -> Result<()> {
        let len = self
            .rest()
            .find(terminator)
            .ok_or_else(|| syntax(start, format!("missing \"{terminator}\"")))?;
        self.pos += len + terminator.len();
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn open_tag(&mut self, start: usize) -> Result<Event<'a>> {
        self.pos += 1;
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .ok_or_else(|| syntax(start, "unterminated start tag"))?;
        if len == 0 {
            return Err(syntax(start, "start tag without a name"));
        }
        let name = local_name(&rest[..len]);
        self.pos += len;

        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(Event::Open { name, attrs, empty: true, pos: start });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok(Event::Open { name, attrs, empty: false, pos: start });
            }
            if rest.is_empty() {
                return Err(syntax(start, format!("unterminated <{name}>")));
            }
            attrs.push(self.attribute()?);
        }
    }

    fn attribute(&mut self) -> Result<(&'a str, Cow<'a, str>)> {
        let at = self.pos;
        let rest = self.rest();
        let len = rest
            .find(|c: char| c == '=' || c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(syntax(at, "expected attribute name"));
        }
        let key = &rest[..len];
        self.pos += len;

        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return Err(syntax(at, format!("attribute {key} has no value")));
        }
        self.pos += 1;
        self.skip_whitespace();

        let rest = self.rest();
        let quote = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(syntax(self.pos, format!("attribute {key} value is not quoted"))),
        };
        let body = &rest[1..];
        let len = body
            .find(quote)
            .ok_or_else(|| syntax(at, format!("unterminated value for attribute {key}")))?;
        let value = unescape(&body[..len], self.pos + 1)?;
        self.pos += 1 + len + 1;
        Ok((key, value))
    }
}

/// Strip a namespace prefix: `g:node` → `node`.
fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Resolve the five predefined entities and numeric character references.
fn unescape(raw: &str, pos: usize) -> Result<Cow<'_, str>> {
    if !raw.contains('&') {
        return Ok(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| syntax(pos, "unterminated entity reference"))?;
        let entity = &after[..semi];
        let c = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .filter(|c| super::is_xml_char(*c))
                    .ok_or_else(|| syntax(pos, format!("unknown entity &{entity};")))?
            }
        };
        out.push(c);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(Cow::Owned(out))
}
