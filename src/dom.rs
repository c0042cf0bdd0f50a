//! Owned, mutable html tree. `select` parses the template, the renderer
//! rewrites this copy of it and `to_html` writes it back out.

use failure::{ensure, Error};
use select::document::Document as Parsed;
use select::node::Data;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Element {
        Element { name: name.to_owned(), attrs: Vec::new(), children: Vec::new() }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_owned(), value)),
        }
    }

    pub fn append_attr(&mut self, name: &str, value: &str) {
        let joined = format!("{}{}", self.attr(name).unwrap_or(""), value);
        self.set_attr(name, joined);
    }

    pub fn set_text(&mut self, text: String) {
        self.children = vec![Node::Text(text)];
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Element children, by their position in `children`.
    pub fn child_element_mut(&mut self, index: usize) -> Option<&mut Element> {
        match self.children.get_mut(index) {
            Some(Node::Element(e)) => Some(e),
            _ => None,
        }
    }

    /// Every element below this one (not including it), in document order.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        fn walk<'a>(e: &'a Element, out: &mut Vec<&'a Element>) {
            for child in e.elements() {
                out.push(child);
                walk(child, out);
            }
        }
        walk(self, &mut out);
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
            Node::Comment(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Synthetic container holding the top level nodes.
    pub root: Element,
}

impl Document {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let first = self.root.elements().next();
        if first.map(|e| e.name == "html").unwrap_or(false) {
            out.push_str("<!DOCTYPE html>\n");
        }
        for node in &self.root.children {
            write_node(node, false, &mut out);
        }
        out
    }
}

pub fn parse(html: &str) -> Result<Document, Error> {
    let parsed = Parsed::from(html);
    let mut root = Element::new("#document");
    for (index, raw) in parsed.nodes.iter().enumerate() {
        if raw.parent.is_none() {
            root.children.push(convert(&parsed, index));
        }
    }
    ensure!(!root.children.is_empty(), "Template is empty.");
    Ok(Document { root })
}

fn convert(parsed: &Parsed, index: usize) -> Node {
    let raw = &parsed.nodes[index];
    match raw.data {
        Data::Text(ref text) => Node::Text((&**text).to_owned()),
        Data::Comment(ref text) => Node::Comment((&**text).to_owned()),
        Data::Element(ref name, ref attrs) => {
            let mut element = Element::new(&name.local.to_string());
            for (attr, value) in attrs {
                element.attrs.push((attr.local.to_string(), (&**value).to_owned()));
            }
            let mut child = raw.first_child;
            while let Some(i) = child {
                element.children.push(convert(parsed, i));
                child = parsed.nodes[i].next;
            }
            Node::Element(element)
        }
    }
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Text(t) if raw_text => out.push_str(t),
        Node::Text(t) => escape(t, false, out),
        Node::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
        Node::Element(e) => write_element(e, out),
    }
}

fn write_element(e: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&e.name);
    for (name, value) in &e.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape(value, true, out);
        out.push('"');
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&e.name.as_str()) {
        return;
    }
    let raw_text = RAW_TEXT_ELEMENTS.contains(&e.name.as_str());
    for child in &e.children {
        write_node(child, raw_text, out);
    }
    out.push_str("</");
    out.push_str(&e.name);
    out.push('>');
}

fn escape(s: &str, attr: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if attr => out.push_str("&quot;"),
            '<' if !attr => out.push_str("&lt;"),
            '>' if !attr => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_writes_back() {
        let doc = parse("<!DOCTYPE html><html><head><title>Games</title></head>\
                         <body><ul id=\"list\"><li><a href=\"x\">one</a></li></ul><br></body></html>").unwrap();
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html>\n<html><head><title>Games</title></head>\
             <body><ul id=\"list\"><li><a href=\"x\">one</a></li></ul><br></body></html>"
        );
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut a = Element::new("a");
        a.set_attr("title", "say \"hi\" & <go>".to_owned());
        a.set_text("Ticket <to> Ride & more".to_owned());
        assert_eq!(
            a.to_html(),
            "<a title=\"say &quot;hi&quot; &amp; <go>\">Ticket &lt;to&gt; Ride &amp; more</a>"
        );
    }

    #[test]
    fn attribute_append_and_replace() {
        let mut a = Element::new("a");
        a.append_attr("href", "https://example.com/");
        a.append_attr("href", "42");
        assert_eq!(a.attr("href"), Some("https://example.com/42"));
        a.set_attr("href", "other".to_owned());
        assert_eq!(a.attrs.len(), 1);
        assert_eq!(a.attr("href"), Some("other"));
    }

    #[test]
    fn classes_and_text() {
        let doc = parse("<html><body><p class=\"a  b\">x<b>y</b><!-- z --></p></body></html>").unwrap();
        let p = doc.root.descendants().into_iter().find(|e| e.name == "p").unwrap().clone();
        assert!(p.has_class("a"));
        assert!(p.has_class("b"));
        assert!(!p.has_class("c"));
        assert_eq!(p.text(), "xy");
    }
}
