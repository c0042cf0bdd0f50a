//! Declarative rendering: a table of selector keyed directives applied to a
//! template tree. Text and attributes are filled from dotted paths or from
//! closures, and repeat rules clone an element once per item of a list.

use crate::dom::{Element, Node};
use crate::selector::{Selector, SelectorError};
use failure::Fail;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Receives the current item and the whole render context.
pub type ComputeFn = Box<dyn Fn(&Value, &Value) -> Option<String>>;
pub type ComputeListFn = Box<dyn Fn(&Value, &Value) -> Vec<Value>>;

#[derive(Debug, Fail)]
pub enum RenderError {
    #[fail(display = "{}", _0)]
    Selector(#[cause] SelectorError),
    #[fail(display = "template has no element for `{}`", _0)]
    NoMatch(String),
    #[fail(display = "can't parse directive `{}`: {}", _0, _1)]
    BadDirective(String, &'static str),
}

impl From<SelectorError> for RenderError {
    fn from(e: SelectorError) -> RenderError {
        RenderError::Selector(e)
    }
}

pub enum Binding {
    Path(String),
    Compute(ComputeFn),
}

pub fn path(p: &str) -> Binding {
    Binding::Path(p.to_owned())
}

pub fn compute<F>(f: F) -> Binding
where
    F: Fn(&Value, &Value) -> Option<String> + 'static,
{
    Binding::Compute(Box::new(f))
}

pub enum Source {
    Path(String),
    Compute(ComputeListFn),
}

pub fn list<F>(f: F) -> Source
where
    F: Fn(&Value, &Value) -> Vec<Value> + 'static,
{
    Source::Compute(Box::new(f))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Text,
    Attr(String),
    AppendAttr(String),
}

struct Repeat {
    item: String,
    source: Source,
    directives: Vec<Directive>,
}

enum Action {
    Bind(Target, Binding),
    Repeat(Repeat),
}

pub struct Directive {
    key: String,
    // None addresses the node in scope
    selector: Option<Selector>,
    action: Action,
}

impl Directive {
    /// `sel` sets text, `sel@attr` replaces an attribute, `sel@attr+`
    /// appends to it. An empty selector or `.` is the node in scope.
    pub fn bind(key: &str, binding: Binding) -> Result<Directive, RenderError> {
        let (sel, target) = match key.find('@') {
            None => (key, Target::Text),
            Some(at) => {
                let attr = &key[at + 1..];
                let target = if attr.ends_with('+') {
                    Target::AppendAttr(attr[..attr.len() - 1].to_owned())
                } else {
                    Target::Attr(attr.to_owned())
                };
                match target {
                    Target::Attr(ref a) | Target::AppendAttr(ref a) if a.is_empty() => {
                        return Err(RenderError::BadDirective(key.to_owned(), "missing attribute name"));
                    }
                    _ => {}
                }
                (&key[..at], target)
            }
        };
        Ok(Directive {
            key: key.to_owned(),
            selector: parse_scope(sel)?,
            action: Action::Bind(target, binding),
        })
    }

    /// `rule` reads `item<-dotted.path`.
    pub fn repeat(selector: &str, rule: &str, directives: Vec<Directive>) -> Result<Directive, RenderError> {
        let arrow = rule.find("<-")
            .ok_or_else(|| RenderError::BadDirective(rule.to_owned(), "expected `item<-path`"))?;
        let source = rule[arrow + 2..].trim();
        if source.is_empty() {
            return Err(RenderError::BadDirective(rule.to_owned(), "missing source path"));
        }
        Directive::repeat_with(selector, rule[..arrow].trim(), Source::Path(source.to_owned()), directives)
    }

    pub fn repeat_with(selector: &str, item: &str, source: Source, directives: Vec<Directive>)
            -> Result<Directive, RenderError> {
        if item.is_empty() || item.contains('.') {
            return Err(RenderError::BadDirective(selector.to_owned(), "bad item name"));
        }
        let selector = parse_scope(selector)?
            .ok_or_else(|| RenderError::BadDirective(item.to_owned(), "can't repeat the node in scope"))?;
        Ok(Directive {
            key: selector.as_str().to_owned(),
            selector: Some(selector),
            action: Action::Repeat(Repeat { item: item.to_owned(), source, directives }),
        })
    }
}

fn parse_scope(sel: &str) -> Result<Option<Selector>, RenderError> {
    match sel.trim() {
        "" | "." => Ok(None),
        s => Ok(Some(Selector::parse(s)?)),
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Written wherever a value can't be found.
    pub missing: String,
}

impl Default for RenderOptions {
    fn default() -> RenderOptions {
        RenderOptions { missing: "(unknown)".to_owned() }
    }
}

// Loop variables, innermost first.
struct Scope<'a> {
    name: &'a str,
    item: &'a Value,
    parent: Option<&'a Scope<'a>>,
}

/// Applies `table` to everything under `root`, in table order.
pub fn render(root: &mut Element, context: &Value, table: &[Directive], options: &RenderOptions)
        -> Result<(), RenderError> {
    apply(root, table, None, context, options)
}

fn apply(el: &mut Element, directives: &[Directive], scope: Option<&Scope>,
         ctx: &Value, opts: &RenderOptions) -> Result<(), RenderError> {
    for d in directives {
        let selector = match d.selector {
            None => {
                if let Action::Bind(ref target, ref binding) = d.action {
                    bind(el, &d.key, target, binding, scope, ctx, opts);
                }
                continue;
            }
            Some(ref s) => s,
        };
        let found = selector.find(el);
        if found.is_empty() {
            return Err(RenderError::NoMatch(d.key.clone()));
        }
        match d.action {
            Action::Bind(ref target, ref binding) => {
                for p in &found {
                    let target_el = element_at(el, p).ok_or_else(|| RenderError::NoMatch(d.key.clone()))?;
                    bind(target_el, &d.key, target, binding, scope, ctx, opts);
                }
            }
            Action::Repeat(ref repeat) => {
                // back to front so earlier paths survive the splices
                for p in found.iter().rev() {
                    let (&idx, parent_path) = p.split_last()
                        .ok_or_else(|| RenderError::NoMatch(d.key.clone()))?;
                    let parent = element_at(el, parent_path).ok_or_else(|| RenderError::NoMatch(d.key.clone()))?;
                    let template = parent.child_element_mut(idx)
                        .map(|t| t.clone())
                        .ok_or_else(|| RenderError::NoMatch(d.key.clone()))?;
                    let items = source_items(&repeat.source, &d.key, scope, ctx);
                    debug!(selector = %d.key, items = items.len(), "repeat");
                    let mut clones = Vec::with_capacity(items.len());
                    for item in &items {
                        let inner = Scope { name: &repeat.item, item, parent: scope };
                        let mut clone = template.clone();
                        apply(&mut clone, &repeat.directives, Some(&inner), ctx, opts)?;
                        clones.push(Node::Element(clone));
                    }
                    parent.children.splice(idx..idx + 1, clones);
                }
            }
        }
    }
    Ok(())
}

fn bind(el: &mut Element, key: &str, target: &Target, binding: &Binding,
        scope: Option<&Scope>, ctx: &Value, opts: &RenderOptions) {
    let value = match binding {
        Binding::Path(p) => resolve(p, scope, ctx).and_then(scalar_text),
        Binding::Compute(f) => f(current_item(scope, ctx), ctx),
    };
    let value = value.unwrap_or_else(|| {
        match binding {
            Binding::Path(p) => warn!(directive = key, path = %p, "missing value"),
            Binding::Compute(_) => warn!(directive = key, "missing value"),
        }
        opts.missing.clone()
    });
    match target {
        Target::Text => el.set_text(value),
        Target::Attr(name) => el.set_attr(name, value),
        Target::AppendAttr(name) => el.append_attr(name, &value),
    }
}

fn current_item<'a>(scope: Option<&Scope<'a>>, ctx: &'a Value) -> &'a Value {
    match scope {
        Some(s) => s.item,
        None => ctx,
    }
}

fn source_items(source: &Source, key: &str, scope: Option<&Scope>, ctx: &Value) -> Vec<Value> {
    match source {
        Source::Compute(f) => f(current_item(scope, ctx), ctx),
        Source::Path(p) => match resolve(p, scope, ctx) {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(map)) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort_by(|a, b| key_order(a, b));
                keys.into_iter().map(|k| map[k.as_str()].clone()).collect()
            }
            Some(_) | None => {
                warn!(directive = key, path = %p, "nothing to repeat over");
                Vec::new()
            }
        },
    }
}

// integer-like keys first, numerically, then the rest by name
fn key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Reads a dotted path. The first segment names a loop variable if one is
/// in scope, otherwise the path starts at the context root.
fn resolve<'a>(path: &str, scope: Option<&Scope<'a>>, ctx: &'a Value) -> Option<&'a Value> {
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let first = segments.next()?;
    let mut current = match find_var(scope, first) {
        Some(item) => item,
        None => step(ctx, first)?,
    };
    for seg in segments {
        current = step(current, seg)?;
    }
    Some(current)
}

fn find_var<'a>(mut scope: Option<&Scope<'a>>, name: &str) -> Option<&'a Value> {
    while let Some(s) = scope {
        if s.name == name {
            return Some(s.item);
        }
        scope = s.parent;
    }
    None
}

fn step<'a>(v: &'a Value, seg: &str) -> Option<&'a Value> {
    match v {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn element_at<'e>(root: &'e mut Element, path: &[usize]) -> Option<&'e mut Element> {
    let mut e = root;
    for &i in path {
        e = e.child_element_mut(i)?;
    }
    Some(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;
    use serde_json::json;

    fn body(html: &str) -> Element {
        let doc = dom::parse(&format!("<html><body>{}</body></html>", html)).unwrap();
        doc.root.descendants().into_iter().find(|e| e.name == "body").unwrap().clone()
    }

    fn inner(e: &Element) -> String {
        e.children.iter().map(|c| match c {
            Node::Element(e) => e.to_html(),
            Node::Text(t) => t.clone(),
            Node::Comment(_) => String::new(),
        }).collect()
    }

    #[test]
    fn path_and_compute_bindings() {
        let mut root = body("<h1></h1><a href=\"old\"></a>");
        let ctx = json!({"title": "Games", "id": 5});
        let table = vec![
            Directive::bind("h1", path("title")).unwrap(),
            Directive::bind("a", compute(|_, ctx| ctx["id"].as_u64().map(|i| format!("#{}", i)))).unwrap(),
            Directive::bind("a@href", compute(|item, _| Some(format!("/g/{}", item["id"])))).unwrap(),
        ];
        render(&mut root, &ctx, &table, &RenderOptions::default()).unwrap();
        assert_eq!(inner(&root), "<h1>Games</h1><a href=\"/g/5\">#5</a>");
    }

    #[test]
    fn repeat_with_append_and_replace() {
        let mut root = body("<ul id=\"l\"><li><a class=\"x\" href=\"https://x.org/u/\"></a></li></ul>");
        let ctx = json!({"people": [{"name": "Ann", "user": "ann"}, {"name": "Bo", "user": "bo"}]});
        let table = vec![Directive::repeat("#l > li", "p<-people", vec![
            Directive::bind("a", path("p.name")).unwrap(),
            Directive::bind("a@href+", path("p.user")).unwrap(),
            Directive::bind("a@class", path("p.user")).unwrap(),
        ]).unwrap()];
        render(&mut root, &ctx, &table, &RenderOptions::default()).unwrap();
        assert_eq!(
            inner(&root),
            "<ul id=\"l\"><li><a class=\"ann\" href=\"https://x.org/u/ann\">Ann</a></li>\
             <li><a class=\"bo\" href=\"https://x.org/u/bo\">Bo</a></li></ul>"
        );
    }

    #[test]
    fn empty_list_removes_the_template() {
        let mut root = body("<ul><li>x</li></ul>");
        let table = vec![Directive::repeat("ul > li", "p<-people", vec![]).unwrap()];
        render(&mut root, &json!({"people": []}), &table, &RenderOptions::default()).unwrap();
        assert_eq!(inner(&root), "<ul></ul>");
    }

    #[test]
    fn nested_repeats_see_outer_items() {
        let mut root = body("<ul class=\"g\"><li><b></b><ol><li><i></i></li></ol></li></ul>");
        let ctx = json!({
            "games": {"10": {"name": "Ten", "fans": ["a", "b"]}, "9": {"name": "Nine", "fans": []}},
            "names": {"a": "Ann", "b": "Bo"}
        });
        let table = vec![Directive::repeat(".g > li", "game<-games", vec![
            Directive::bind("b", path("game.name")).unwrap(),
            Directive::repeat("ol > li", "fan<-game.fans", vec![
                Directive::bind("i", compute(|fan, ctx| {
                    fan.as_str().and_then(|f| ctx["names"][f].as_str()).map(|s| s.to_owned())
                })).unwrap(),
            ]).unwrap(),
        ]).unwrap()];
        render(&mut root, &ctx, &table, &RenderOptions::default()).unwrap();
        // "9" sorts before "10"
        assert_eq!(
            inner(&root),
            "<ul class=\"g\"><li><b>Nine</b><ol></ol></li>\
             <li><b>Ten</b><ol><li><i>Ann</i></li><li><i>Bo</i></li></ol></li></ul>"
        );
    }

    #[test]
    fn computed_sources() {
        let mut root = body("<p><span></span></p>");
        let ctx = json!({"n": 3});
        let table = vec![Directive::repeat_with(
            "span", "i",
            list(|_, ctx| (0..ctx["n"].as_u64().unwrap_or(0)).map(|i| json!(i)).collect()),
            vec![Directive::bind(".", path("i")).unwrap()],
        ).unwrap()];
        render(&mut root, &ctx, &table, &RenderOptions::default()).unwrap();
        assert_eq!(inner(&root), "<p><span>0</span><span>1</span><span>2</span></p>");
    }

    #[test]
    fn missing_values_use_the_placeholder() {
        let mut root = body("<b></b><i></i><a></a>");
        let table = vec![
            Directive::bind("b", path("nope.deeper")).unwrap(),
            Directive::bind("i", path("obj")).unwrap(),
            Directive::bind("a", compute(|_, _| None)).unwrap(),
        ];
        let opts = RenderOptions { missing: "??".to_owned() };
        render(&mut root, &json!({"obj": {"a": 1}}), &table, &opts).unwrap();
        assert_eq!(inner(&root), "<b>??</b><i>??</i><a>??</a>");
    }

    #[test]
    fn missing_hook_is_an_error() {
        let mut root = body("<ul></ul>");
        let table = vec![Directive::repeat("#nowhere > li", "x<-xs", vec![]).unwrap()];
        match render(&mut root, &json!({}), &table, &RenderOptions::default()) {
            Err(RenderError::NoMatch(key)) => assert_eq!(key, "#nowhere > li"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_directives() {
        assert!(Directive::bind("a@", path("x")).is_err());
        assert!(Directive::bind("a@+", path("x")).is_err());
        assert!(Directive::repeat("li", "people", vec![]).is_err());
        assert!(Directive::repeat("li", "p<-", vec![]).is_err());
        assert!(Directive::repeat(".", "p<-people", vec![]).is_err());
        assert!(Directive::bind("ul >", path("x")).is_err());
    }

    #[test]
    fn resolves_array_indexes_and_outer_names() {
        let ctx = json!({"xs": [{"v": "first"}]});
        assert_eq!(resolve("xs.0.v", None, &ctx), Some(&json!("first")));
        let item = json!({"v": "inner"});
        let scope = Scope { name: "xs", item: &item, parent: None };
        assert_eq!(resolve("xs.v", Some(&scope), &ctx), Some(&json!("inner")));
        assert_eq!(resolve("xs.1.v", None, &ctx), None);
    }
}
