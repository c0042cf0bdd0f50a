use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
/// Builds the group's board game page from the
/// member roster and the game analysis.
pub enum Cli {
    #[structopt(name = "new")]
    /// Creates app.config and a default page.html
    /// template.
    New { },
    #[structopt(name = "render")]
    /// Fetches members and analysis and renders
    /// them into the template.
    Render {
        #[structopt(short = "o", long = "output", parse(from_os_str))]
        /// Where to write the page, instead of the
        /// configured output.
        output: Option<PathBuf>
    },
    #[structopt(name = "report")]
    /// Prints most wanted games with the members
    /// who want them and possible hosts.
    Report { }
}
