mod cli;
mod core;
mod dom;
mod fetch;
mod join;
mod logging;
mod model;
mod page;
mod render;
mod selector;

use cli::Cli;
use structopt::StructOpt;
use failure::Error;
use exitfailure::ExitFailure;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), ExitFailure> {
    let cli = Cli::from_args();
    logging::init();
    match cli {
        Cli::New { } => create_structure()?,
        Cli::Render { output } => render_page(output)?,
        Cli::Report { } => print_report()?,
    }
    Ok(())
}

fn create_structure() -> Result<(), Error> {
    core::create_structure()?;
    println!("Created config and template files.");
    Ok(())
}

fn render_page(output: Option<PathBuf>) -> Result<(), Error> {
    let config = core::config()?;
    println!("Fetching members and analysis.");
    let written = core::render(&config, output)?;
    println!("Page written to {}", written.display());
    Ok(())
}

fn print_report() -> Result<(), Error> {
    let config = core::config()?;
    let rows = core::report(&config)?;
    if rows.is_empty() {
        println!("Nothing is wanted at the moment.");
        return Ok(());
    }
    // Prettify output a bit
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for row in rows {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        writeln!(&mut stdout, "{} ({})", row.name, row.id)?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(&mut stdout, "\twanted by: {}", list_or_nobody(&row.wanted_by))?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        writeln!(&mut stdout, "\tpossible hosts: {}", list_or_nobody(&row.hosts))?;
    }
    stdout.reset()?;
    Ok(())
}

fn list_or_nobody(names: &[String]) -> String {
    if names.is_empty() {
        "nobody".to_owned()
    } else {
        names.join(", ")
    }
}
