use crate::model::{Analysis, Member};
use failure::{bail, Error, ResultExt};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fs;
use std::sync::mpsc;
use std::sync::Arc;
use threadpool::ThreadPool;
use tracing::{debug, info};

/// Gets the raw body behind a locator.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, locator: &str) -> Result<String, Error>;
}

/// http(s) locators go over the network, anything else is read from disk.
pub struct WebTransport {
    client: Client,
}

impl WebTransport {
    pub fn new() -> WebTransport {
        WebTransport { client: Client::new() }
    }
}

impl Transport for WebTransport {
    fn get(&self, locator: &str) -> Result<String, Error> {
        if !is_remote(locator) {
            let body = fs::read_to_string(locator)
                .with_context(|_| format!("could not read `{}`", locator))?;
            return Ok(body);
        }
        let mut resp = self.client.get(locator).send()
            .with_context(|_| format!("could not download `{}`", locator))?;
        if resp.status() != StatusCode::OK {
            bail!("Can't get {}. Status: {}", locator, resp.status());
        }
        let body = resp.text()
            .with_context(|_| format!("could not read body of `{}`", locator))?;
        Ok(body)
    }
}

fn is_remote(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

/// Where the two documents live.
#[derive(Debug, Clone)]
pub struct Locations {
    pub members: String,
    pub analysis: String,
}

enum Fetched {
    Members(Result<Vec<Member>, Error>),
    Analysis(Result<Analysis, Error>),
}

fn get_json<T: Transport, D: DeserializeOwned>(transport: &T, what: &str, locator: &str) -> Result<D, Error> {
    debug!(%locator, "requesting {}", what);
    let body = transport.get(locator)?;
    let doc = serde_json::from_str(&body)
        .with_context(|_| format!("{} document is not valid: `{}`", what, locator))?;
    Ok(doc)
}

/// Fetches roster and analysis concurrently. Either both arrive or the
/// first failure is returned.
pub fn fetch_all<T: Transport>(transport: Arc<T>, locations: &Locations) -> Result<(Vec<Member>, Analysis), Error> {
    // NB. A send fails only after we bailed on the other document.
    let (tx, rx) = mpsc::channel();
    let pool = ThreadPool::new(2);

    info!("fetching members and analysis");
    {
        let tx = tx.clone();
        let transport = transport.clone();
        let locator = locations.members.clone();
        pool.execute(move || {
            let members = get_json(&*transport, "members", &locator);
            let _ = tx.send(Fetched::Members(members));
        });
    }
    {
        let tx = tx.clone();
        let locator = locations.analysis.clone();
        pool.execute(move || {
            let analysis = get_json(&*transport, "analysis", &locator);
            let _ = tx.send(Fetched::Analysis(analysis));
        });
    }
    // rx ends when both workers are gone
    drop(tx);

    let mut members = None;
    let mut analysis = None;
    for received in rx {
        match received {
            Fetched::Members(r) => members = Some(r?),
            Fetched::Analysis(r) => analysis = Some(r?),
        }
        if members.is_some() && analysis.is_some() {
            break;
        }
    }
    match (members, analysis) {
        (Some(members), Some(analysis)) => {
            info!(members = members.len(), games = analysis.master_list.len(), "fetched");
            Ok((members, analysis))
        }
        _ => bail!("A fetch worker stopped without a result."),
    }
}
