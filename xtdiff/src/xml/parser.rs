//! XML parser that builds arena trees.
//!
//! Uses quick-xml's streaming API. Character data is assigned lxml-style:
//! content before a node's first child becomes that node's `text`, content
//! after a node's end tag becomes that node's `tail`. Comments, processing
//! instructions, the XML declaration and DOCTYPE are skipped; CDATA is
//! treated as text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::error::{Error, Result};
use crate::tree::{NodeId, Tree};
use crate::xml::Normalize;

/// Parses XML from a string.
pub fn parse_str(xml: &str, normalize: Normalize) -> Result<Tree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;
    parse_reader(&mut reader, normalize)
}

/// Parses XML from a file.
pub fn parse_file<P: AsRef<Path>>(path: P, normalize: Normalize) -> Result<Tree> {
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;
    parse_reader(&mut reader, normalize)
}

struct TreeAssembler {
    tree: Option<Tree>,
    stack: Vec<NodeId>,
    pending: Option<String>,
    normalize: Normalize,
}

impl TreeAssembler {
    fn new(normalize: Normalize) -> Self {
        TreeAssembler {
            tree: None,
            stack: Vec::new(),
            pending: None,
            normalize,
        }
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.pending {
            Some(existing) => existing.push_str(text),
            None => self.pending = Some(text.to_string()),
        }
    }

    /// Assigns accumulated character data to its owner: the text of the
    /// element currently open (if it has no children yet), otherwise the
    /// tail of the last closed child.
    fn flush_text(&mut self) -> Result<()> {
        let Some(raw) = self.pending.take() else {
            return Ok(());
        };
        if self.normalize.contains(Normalize::TAGS) && raw.trim().is_empty() {
            return Ok(());
        }
        let text = if self.normalize.contains(Normalize::TEXT) {
            collapse_whitespace(&raw)
        } else {
            raw
        };
        match self.stack.last() {
            Some(&open) => {
                let tree = self.tree.as_mut().expect("stack implies a tree");
                match tree.node(open).children().last().copied() {
                    Some(last_child) => {
                        let combined = match tree.node(last_child).tail() {
                            Some(existing) => format!("{existing}{text}"),
                            None => text,
                        };
                        tree.set_tail(last_child, Some(combined));
                    }
                    None => {
                        let combined = match tree.node(open).text() {
                            Some(existing) => format!("{existing}{text}"),
                            None => text,
                        };
                        tree.set_text(open, Some(combined));
                    }
                }
            }
            None => match &mut self.tree {
                // Text after the document element becomes the root's tail.
                Some(tree) => {
                    let root = tree.root();
                    let combined = match tree.node(root).tail() {
                        Some(existing) => format!("{existing}{text}"),
                        None => text,
                    };
                    tree.set_tail(root, Some(combined));
                }
                None => {
                    return Err(Error::Parse(
                        "character data before the document element".to_string(),
                    ))
                }
            },
        }
        Ok(())
    }

    fn open_element(&mut self, start: &BytesStart<'_>) -> Result<NodeId> {
        self.flush_text()?;
        let tag = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        let id = match self.stack.last() {
            Some(&parent) => {
                let tree = self.tree.as_mut().expect("stack implies a tree");
                tree.add_child(parent, tag)
            }
            None => {
                if self.tree.is_some() {
                    return Err(Error::Parse("multiple document elements".to_string()));
                }
                self.tree = Some(Tree::new(tag));
                NodeId::ROOT
            }
        };
        let tree = self.tree.as_mut().expect("element was just created");
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::Parse(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?
                .into_owned();
            if tree.node(id).attr(&key).is_some() {
                return Err(Error::Parse(format!("duplicate attribute '{key}'")));
            }
            tree.set_attr(id, key, value);
        }
        Ok(id)
    }
}

fn parse_reader<R: BufRead>(reader: &mut Reader<R>, normalize: Normalize) -> Result<Tree> {
    let mut assembler = TreeAssembler::new(normalize);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let id = assembler.open_element(e)?;
                assembler.stack.push(id);
            }
            Event::Empty(ref e) => {
                assembler.open_element(e)?;
            }
            Event::End(_) => {
                assembler.flush_text()?;
                assembler.stack.pop();
            }
            Event::Text(ref e) => {
                let raw =
                    std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                assembler.push_text(&text);
            }
            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e.as_ref());
                assembler.push_text(&text);
            }
            Event::GeneralRef(ref e) => {
                // Re-wrap the reference and let the escape table resolve it.
                let name =
                    std::str::from_utf8(&e[..]).map_err(|e| Error::Parse(e.to_string()))?;
                let reference = format!("&{name};");
                let resolved = unescape(&reference)
                    .map_err(|e| Error::Parse(format!("unresolvable reference &{name};: {e}")))?;
                assembler.push_text(&resolved);
            }
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
        buf.clear();
    }

    if !assembler.stack.is_empty() {
        return Err(Error::Parse("unexpected end of document".to_string()));
    }
    assembler.flush_text()?;
    let tree = assembler
        .tree
        .ok_or_else(|| Error::Parse("no document element".to_string()))?;
    trace!(nodes = tree.node_count(), "parsed document");
    Ok(tree)
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    out
}
