use crate::fetch::{self, Locations, Transport, WebTransport};
use crate::join;
use crate::model::{Analysis, Member};
use crate::page;
use crate::render::RenderOptions;
use failure::{Error, ResultExt};
use serde_derive::{Deserialize, Serialize};
use serde_json::{from_str, to_string_pretty};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const CONFIG_FILE_NAME: &str = "app.config";
const TEMPLATE_FILE_NAME: &str = "page.html";
const OUTPUT_FILE_NAME: &str = "index.html";

const MEMBERS_URL: &str = "https://firebasestorage.googleapis.com/v0/b/hebg-e2b7c.appspot.com/o/members.json?alt=media&token=ed61964b-e1da-47da-8dcd-7a3bbda15606";
const ANALYSIS_URL: &str = "https://firebasestorage.googleapis.com/v0/b/hebg-e2b7c.appspot.com/o/analysis.json?alt=media&token=cf32d84c-ace5-428a-9119-1695e408779a";

pub fn create_structure() -> Result<(), Error> {
    // create config file
    let new_conf = to_string_pretty(&Config::default())?;
    fs::write(CONFIG_FILE_NAME, new_conf)?;
    // keep a template somebody already edited
    if !Path::new(TEMPLATE_FILE_NAME).exists() {
        fs::write(TEMPLATE_FILE_NAME, page::DEFAULT_TEMPLATE)?;
    }
    Ok(())
}

pub fn config() -> Result<Config, Error> {
    let conf = fs::read_to_string(CONFIG_FILE_NAME)
        .with_context(|_| format!("Can't open: {}", CONFIG_FILE_NAME))?;
    let conf = from_str(&conf)
        .with_context(|_| format!("Can't parse: {}", CONFIG_FILE_NAME))?;
    Ok(conf)
}

/// Fetches, joins and renders the page. Returns where it was written.
pub fn render(config: &Config, output: Option<PathBuf>) -> Result<PathBuf, Error> {
    render_with(Arc::new(WebTransport::new()), config, output)
}

fn render_with<T: Transport>(transport: Arc<T>, config: &Config, output: Option<PathBuf>) -> Result<PathBuf, Error> {
    let template = fs::read_to_string(&config.template)
        .with_context(|_| format!("Can't open template: {}", config.template.display()))?;
    let (members, analysis) = fetch::fetch_all(transport, &config.locations())?;
    let html = page::render_page(&template, &members, &analysis, &config.render_options())?;
    let output = output.unwrap_or_else(|| config.output.clone());
    fs::write(&output, html)
        .with_context(|_| format!("Can't write: {}", output.display()))?;
    info!(output = %output.display(), "page rendered");
    Ok(output)
}

pub fn report(config: &Config) -> Result<Vec<ReportRow>, Error> {
    let (members, analysis) = fetch::fetch_all(Arc::new(WebTransport::new()), &config.locations())?;
    Ok(build_report(&members, &analysis, &config.missing))
}

/// One row per most wanted game, in list order.
pub fn build_report(members: &[Member], analysis: &Analysis, missing: &str) -> Vec<ReportRow> {
    let index = join::index_members(members);
    analysis.most_wanted.iter().map(|entry| match analysis.game(entry) {
        Some(game) => ReportRow {
            id: entry.game_id.clone(),
            name: game.name.clone(),
            wanted_by: join::member_names(&index, &game.wanted_by, missing),
            hosts: join::member_names(&index, &game.owned_by, missing),
        },
        None => ReportRow {
            id: entry.game_id.clone(),
            name: missing.to_owned(),
            wanted_by: Vec::new(),
            hosts: Vec::new(),
        },
    }).collect()
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReportRow {
    pub id: String,
    pub name: String,
    pub wanted_by: Vec<String>,
    pub hosts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub members_url: String, // members.json, url or local path
    pub analysis_url: String, // analysis.json, url or local path
    pub template: PathBuf,
    pub output: PathBuf, // overridden by render --output
    #[serde(default = "default_missing")]
    pub missing: String, // shown for unknown games and users
}

fn default_missing() -> String {
    RenderOptions::default().missing
}

impl Default for Config {
    fn default() -> Config {
        Config {
            members_url: MEMBERS_URL.to_owned(),
            analysis_url: ANALYSIS_URL.to_owned(),
            template: PathBuf::from(TEMPLATE_FILE_NAME),
            output: PathBuf::from(OUTPUT_FILE_NAME),
            missing: default_missing(),
        }
    }
}

impl Config {
    pub fn locations(&self) -> Locations {
        Locations { members: self.members_url.clone(), analysis: self.analysis_url.clone() }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions { missing: self.missing.clone() }
    }
}
