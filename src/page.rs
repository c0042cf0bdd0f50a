//! The group page: which hooks get filled with what.

use crate::dom;
use crate::join;
use crate::model::{Analysis, Member, MemberIndex};
use crate::render::{self, compute, list, path, Directive, RenderError, RenderOptions};
use failure::Error;
use serde_json::{json, to_value, Value};

pub const GAME_BASE: &str = "https://boardgamegeek.com/boardgame/";
pub const USER_BASE: &str = "https://boardgamegeek.com/user/";

pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Board games</title>
</head>
<body>
<h2>Most wanted</h2>
<ul id="most-wanted-list">
<li>
<a class="game" href=""></a>
<h4>Wanted by</h4>
<ul class="wanted-by"><li><a href="https://boardgamegeek.com/user/"></a></li></ul>
<h4>Possible hosts</h4>
<ul class="possible-hosts"><li><a href="https://boardgamegeek.com/user/"></a></li></ul>
</li>
</ul>
<h2>All games</h2>
<ul id="all-games-list"><li><a href=""></a></li></ul>
<h2>Members</h2>
<ul id="members-list"><li><a href="https://boardgamegeek.com/user/"></a></li></ul>
</body>
</html>
"#;

/// Everything the page bindings read from.
pub fn context(members: &[Member], index: &MemberIndex, analysis: &Analysis) -> Result<Value, Error> {
    Ok(json!({
        "members": to_value(members)?,
        "members_index": to_value(index)?,
        "analysis": to_value(analysis)?,
    }))
}

fn game_of<'a>(entry: &Value, ctx: &'a Value) -> Option<&'a Value> {
    let id = entry["game_id"].as_str()?;
    ctx["analysis"]["master_list"].get(id)
}

fn member_name(user: &Value, ctx: &Value) -> Option<String> {
    let user = user.as_str()?;
    ctx["members_index"].get(user)?["name"].as_str().map(|s| s.to_owned())
}

// A most wanted entry's user list, empty when the game is not in the master list.
fn users_of(field: &'static str) -> render::Source {
    list(move |entry, ctx| match game_of(entry, ctx).and_then(|g| g[field].as_array()) {
        Some(users) => users.clone(),
        None => Vec::new(),
    })
}

fn member_links() -> Result<Vec<Directive>, RenderError> {
    Ok(vec![
        Directive::bind("a", compute(member_name))?,
        Directive::bind("a@href+", compute(|user, _| user.as_str().map(|u| u.to_owned())))?,
    ])
}

pub fn table() -> Result<Vec<Directive>, RenderError> {
    Ok(vec![
        Directive::repeat("#most-wanted-list > li", "entry<-analysis.most_wanted", vec![
            Directive::bind("a.game", compute(|entry, ctx| {
                game_of(entry, ctx)?["name"].as_str().map(|s| s.to_owned())
            }))?,
            Directive::bind("a.game@href", compute(|entry, _| {
                entry["game_id"].as_str().map(|id| format!("{}{}", GAME_BASE, id))
            }))?,
            Directive::repeat_with(".wanted-by > li", "user", users_of("wanted_by"), member_links()?)?,
            Directive::repeat_with(".possible-hosts > li", "user", users_of("owned_by"), member_links()?)?,
        ])?,
        Directive::repeat("#all-games-list > li", "game<-analysis.master_list", vec![
            Directive::bind("a", path("game.name"))?,
            Directive::bind("a@href", compute(|game, _| {
                game["id"].as_str().map(|id| format!("{}{}", GAME_BASE, id))
            }))?,
        ])?,
        Directive::repeat("#members-list > li", "member<-members", vec![
            Directive::bind("a", path("member.name"))?,
            Directive::bind("a@href+", path("member.bgg_username"))?,
        ])?,
    ])
}

/// Joins the documents and renders them into `template`.
pub fn render_page(template: &str, members: &[Member], analysis: &Analysis,
                   options: &RenderOptions) -> Result<String, Error> {
    let index = join::index_members(members);
    let ctx = context(members, &index, analysis)?;
    let mut doc = dom::parse(template)?;
    render::render(&mut doc.root, &ctx, &table()?, options)?;
    Ok(doc.to_html())
}
