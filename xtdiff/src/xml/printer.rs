//! XML printer that serializes arena trees.
//!
//! The inverse collaborator of the parser: walks a tree and writes markup
//! with proper escaping. Pretty-printing indents element-only content and
//! leaves mixed content alone, so a round trip never invents significant
//! whitespace.

use std::io::Write;

use quick_xml::escape::escape;

use crate::tree::{NodeId, Tree};

/// Options for XML printing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrinterOptions {
    /// Indent element-only content.
    pub pretty: bool,
    /// Emit an XML declaration first.
    pub declaration: bool,
}

/// XML printer over an arbitrary writer.
pub struct XmlPrinter<W: Write> {
    writer: W,
    options: PrinterOptions,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a printer with default options.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, PrinterOptions::default())
    }

    /// Creates a printer with the given options.
    pub fn with_options(writer: W, options: PrinterOptions) -> Self {
        XmlPrinter { writer, options }
    }

    /// Prints the whole tree.
    pub fn print(&mut self, tree: &Tree) -> std::io::Result<()> {
        if self.options.declaration {
            writeln!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        }
        self.print_node(tree, tree.root(), 0)?;
        if self.options.pretty {
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn print_node(&mut self, tree: &Tree, id: NodeId, indent: usize) -> std::io::Result<()> {
        let node = tree.node(id);
        write!(self.writer, "<{}", node.tag())?;
        for (k, v) in node.attrs() {
            write!(self.writer, " {}=\"{}\"", k, escape(v.as_str()))?;
        }

        let children = node.children();
        if children.is_empty() && node.text().is_none() {
            write!(self.writer, "/>")?;
        } else {
            write!(self.writer, ">")?;
            if let Some(text) = node.text() {
                write!(self.writer, "{}", escape(text))?;
            }
            // Indentation would alter mixed content, so only element-only
            // content is laid out.
            let layout = self.options.pretty
                && node.text().is_none()
                && children
                    .iter()
                    .all(|&c| tree.node(c).tail().is_none());
            for &child in children {
                if layout {
                    write!(self.writer, "\n{}", "  ".repeat(indent + 1))?;
                }
                self.print_node(tree, child, indent + 1)?;
            }
            if layout && !children.is_empty() {
                write!(self.writer, "\n{}", "  ".repeat(indent))?;
            }
            write!(self.writer, "</{}>", node.tag())?;
        }

        if let Some(tail) = node.tail() {
            write!(self.writer, "{}", escape(tail))?;
        }
        Ok(())
    }
}

/// Serializes a tree to a string with the given options.
pub fn to_string(tree: &Tree, options: PrinterOptions) -> String {
    let mut buf = Vec::new();
    XmlPrinter::with_options(&mut buf, options)
        .print(tree)
        .expect("writing to a Vec cannot fail");
    String::from_utf8(buf).expect("printer emits UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{parse_str, Normalize};

    fn roundtrip(xml: &str) -> String {
        let tree = parse_str(xml, Normalize::NONE).unwrap();
        to_string(&tree, PrinterOptions::default())
    }

    #[test]
    fn test_simple_roundtrip() {
        assert_eq!(roundtrip("<a><b/><c/></a>"), "<a><b/><c/></a>");
        assert_eq!(
            roundtrip(r#"<a id="1"><b>text</b>tail</a>"#),
            r#"<a id="1"><b>text</b>tail</a>"#
        );
    }

    #[test]
    fn test_escaping() {
        let mut tree = crate::tree::Tree::new("a");
        tree.set_text(tree.root(), Some("1 < 2 & 3".into()));
        tree.set_attr(tree.root(), "q", "say \"hi\"");
        let out = to_string(&tree, PrinterOptions::default());
        assert_eq!(out, r#"<a q="say &quot;hi&quot;">1 &lt; 2 &amp; 3</a>"#);
        // and it parses back to the same tree
        let back = parse_str(&out, Normalize::NONE).unwrap();
        assert!(tree.canonical_eq(&back));
    }

    #[test]
    fn test_pretty_layout_element_only() {
        let tree = parse_str("<a><b><c/></b></a>", Normalize::TAGS).unwrap();
        let out = to_string(
            &tree,
            PrinterOptions {
                pretty: true,
                declaration: false,
            },
        );
        assert_eq!(out, "<a>\n  <b>\n    <c/>\n  </b>\n</a>\n");
    }

    #[test]
    fn test_pretty_leaves_mixed_content_alone() {
        let tree = parse_str("<a>x<b/>y</a>", Normalize::NONE).unwrap();
        let out = to_string(
            &tree,
            PrinterOptions {
                pretty: true,
                declaration: false,
            },
        );
        assert_eq!(out, "<a>x<b/>y</a>\n");
    }

    #[test]
    fn test_declaration() {
        let tree = crate::tree::Tree::new("a");
        let out = to_string(
            &tree,
            PrinterOptions {
                pretty: false,
                declaration: true,
            },
        );
        assert_eq!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a/>");
    }
}
