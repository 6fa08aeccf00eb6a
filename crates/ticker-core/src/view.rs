#![forbid(unsafe_code)]

//! Display tree returned by [`Widget::render`](crate::Widget::render).
//!
//! The tree is deliberately tiny: tagged elements and text leaves. The host
//! decides how to present it (the terminal program prints
//! [`Node::text_content`] per top-level node; tests compare markup).

use std::fmt;

/// A node in a widget's display tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A tagged container.
    Element {
        tag: &'static str,
        children: Vec<Node>,
    },
    /// A text leaf.
    Text(String),
}

impl Node {
    /// Create an element with children.
    #[must_use]
    pub fn element(tag: &'static str, children: Vec<Node>) -> Self {
        Self::Element { tag, children }
    }

    /// Create a text leaf.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Element tag, or `None` for text.
    #[must_use]
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Element { tag, .. } => Some(*tag),
            Self::Text(_) => None,
        }
    }

    /// Child nodes (empty for text).
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Element { children, .. } => children,
            Self::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and all descendants, in document order.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(s) => out.push_str(s),
            Self::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '&' => f.write_str("&amp;")?,
            _ => fmt::Write::write_char(f, ch)?,
        }
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write_escaped(f, s),
            Self::Element { tag, children } => {
                write!(f, "<{tag}>")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{tag}>")
            }
        }
    }
}
