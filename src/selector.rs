//! The css subset the binding table uses: `tag`, `#id`, `.class`, `*`,
//! compounds of those, and the descendant and `>` combinators.

use crate::dom::Element;
use failure::Fail;

#[derive(Debug, Fail, PartialEq)]
pub enum SelectorError {
    #[fail(display = "empty selector")]
    Empty,
    #[fail(display = "can't parse selector `{}` near `{}`", _0, _1)]
    Syntax(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, e: &Element) -> bool {
        if let Some(ref tag) = self.tag {
            if !tag.eq_ignore_ascii_case(&e.name) {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if e.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| e.has_class(c))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    // right-most compound last; the combinator links a compound to the one before it
    parts: Vec<(Combinator, Compound)>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Selector, SelectorError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        let mut rest = source;
        while !rest.is_empty() {
            if rest.starts_with('>') {
                if parts.is_empty() || combinator == Combinator::Child {
                    return Err(SelectorError::Syntax(source.to_owned(), rest.to_owned()));
                }
                combinator = Combinator::Child;
                rest = rest[1..].trim_start();
                continue;
            }
            let end = rest.find(|c: char| c.is_whitespace() || c == '>').unwrap_or_else(|| rest.len());
            let compound = parse_compound(&rest[..end])
                .ok_or_else(|| SelectorError::Syntax(source.to_owned(), rest.to_owned()))?;
            parts.push((combinator, compound));
            combinator = Combinator::Descendant;
            rest = rest[end..].trim_start();
        }
        if combinator == Combinator::Child {
            return Err(SelectorError::Syntax(source.to_owned(), ">".to_owned()));
        }
        Ok(Selector { source: source.to_owned(), parts })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Index paths (positions in `children`) of the elements under `scope`
    /// that match, in document order. A match is not searched for nested matches.
    pub fn find(&self, scope: &Element) -> Vec<Vec<usize>> {
        let mut found = Vec::new();
        let mut ancestors = vec![scope];
        let mut path = Vec::new();
        self.walk(scope, &mut ancestors, &mut path, &mut found);
        found
    }

    fn walk<'a>(&self, e: &'a Element, ancestors: &mut Vec<&'a Element>,
                path: &mut Vec<usize>, found: &mut Vec<Vec<usize>>) {
        for (i, child) in e.children.iter().enumerate() {
            let child = match child {
                crate::dom::Node::Element(c) => c,
                _ => continue,
            };
            path.push(i);
            if self.matches(child, ancestors) {
                found.push(path.clone());
            } else {
                ancestors.push(child);
                self.walk(child, ancestors, path, found);
                ancestors.pop();
            }
            path.pop();
        }
    }

    fn matches(&self, e: &Element, ancestors: &[&Element]) -> bool {
        let last = self.parts.len() - 1;
        self.parts[last].1.matches(e) && self.matches_up(last, ancestors)
    }

    // parts[idx] matched the element just below `ancestors`; check parts[..idx]
    fn matches_up(&self, idx: usize, ancestors: &[&Element]) -> bool {
        if idx == 0 {
            return true;
        }
        let combinator = self.parts[idx].0;
        let wanted = &self.parts[idx - 1].1;
        match combinator {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, above)) => wanted.matches(parent) && self.matches_up(idx - 1, above),
                None => false,
            },
            Combinator::Descendant => (0..ancestors.len()).rev().any(|i| {
                wanted.matches(ancestors[i]) && self.matches_up(idx - 1, &ancestors[..i])
            }),
        }
    }
}

fn parse_compound(s: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = s;
    if rest.starts_with('*') {
        rest = &rest[1..];
    } else {
        let end = rest.find(|c: char| c == '#' || c == '.').unwrap_or_else(|| rest.len());
        if end > 0 {
            compound.tag = Some(valid_name(&rest[..end])?.to_owned());
        }
        rest = &rest[end..];
    }
    while !rest.is_empty() {
        let kind = rest.chars().next()?;
        let body = &rest[1..];
        let end = body.find(|c: char| c == '#' || c == '.').unwrap_or_else(|| body.len());
        let name = valid_name(&body[..end])?.to_owned();
        match kind {
            '#' if compound.id.is_none() => compound.id = Some(name),
            '.' => compound.classes.push(name),
            _ => return None,
        }
        rest = &body[end..];
    }
    Some(compound)
}

fn valid_name(s: &str) -> Option<&str> {
    if !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        Some(s)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    fn body() -> Element {
        let doc = dom::parse(
            "<html><body>\
               <ul id=\"games\"><li class=\"game hot\"><a>x</a><ul class=\"who\"><li><a>y</a></li></ul></li></ul>\
               <ul id=\"members\"><li><a>m</a></li><li><a>n</a></li></ul>\
             </body></html>",
        )
        .unwrap();
        doc.root.descendants().into_iter().find(|e| e.name == "body").unwrap().clone()
    }

    fn names(scope: &Element, selector: &str) -> Vec<String> {
        let sel = Selector::parse(selector).unwrap();
        sel.find(scope)
            .iter()
            .map(|path| {
                let mut e = scope;
                for &i in path {
                    e = match &e.children[i] {
                        dom::Node::Element(c) => c,
                        _ => panic!("path points at a non element"),
                    };
                }
                format!("{}:{}", e.name, e.text())
            })
            .collect()
    }

    #[test]
    fn child_combinator_skips_nested_lists() {
        let body = body();
        assert_eq!(names(&body, "#games > li"), vec!["li:xy"]);
        assert_eq!(names(&body, ".who > li"), vec!["li:y"]);
        assert_eq!(names(&body, "#members > li"), vec!["li:m", "li:n"]);
    }

    #[test]
    fn descendant_matches_do_not_nest() {
        let body = body();
        assert_eq!(names(&body, "li"), vec!["li:xy", "li:m", "li:n"]);
        assert_eq!(names(&body, "#games a"), vec!["a:x", "a:y"]);
    }

    #[test]
    fn compounds() {
        let body = body();
        assert_eq!(names(&body, "li.game.hot"), vec!["li:xy"]);
        assert_eq!(names(&body, "li.cold"), Vec::<String>::new());
        assert_eq!(names(&body, "ul#members li > a"), vec!["a:m", "a:n"]);
        assert_eq!(names(&body, "*#games"), vec!["ul:xy"]);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert!(Selector::parse("> li").is_err());
        assert!(Selector::parse("ul >").is_err());
        assert!(Selector::parse("ul > > li").is_err());
        assert!(Selector::parse("a[href]").is_err());
        assert!(Selector::parse("#a#b").is_err());
    }
}
