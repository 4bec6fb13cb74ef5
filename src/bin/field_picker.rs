//! Command-line front end: synthesize selectors and scrape fields from saved pages.
//!
//! Every command prints a JSON response (`{"success": ..., "data": ...}`) on
//! stdout; logs go to stderr and follow `RUST_LOG`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rs_field_picker::encoding::load_page;
use rs_field_picker::{
    dom, Error, Field, ListingSynthesizer, Options, Response, Result, SelectorLanguage, Session, Verifier,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "field-picker")]
#[command(about = "Selector synthesis and field extraction for saved HTML pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Page URL used to resolve relative links and gate site rules
    #[arg(long, global = true)]
    page_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a field as if the first match of CSS_SELECTOR were clicked
    Pick {
        html_file: PathBuf,

        /// CSS selector locating the clicked element
        css_selector: String,

        /// Synthesize an XPath selector (default)
        #[arg(long, conflicts_with = "path")]
        axis: bool,

        /// Synthesize a CSS selector
        #[arg(long)]
        path: bool,
    },

    /// Scrape the fields stored in FIELDS_JSON
    Scrape { html_file: PathBuf, fields_json: PathBuf },

    /// Find the listing pattern shared by the first matches of two CSS selectors
    Common {
        html_file: PathBuf,
        first_css: String,
        second_css: String,
    },
}

fn first_match<'a>(doc: &'a dom::Document, css: &str) -> Result<dom::NodeRef<'a>> {
    dom::select_all(doc, css)
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoMatch(css.to_string()))
}

fn read_fields(path: &PathBuf) -> Result<Vec<Field>> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::PageLoad(format!("{}: {e}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}

fn run(cli: Cli) -> Result<serde_json::Value> {
    let options = Options {
        page_url: cli.page_url,
        ..Options::default()
    };

    match cli.command {
        Commands::Pick {
            html_file,
            css_selector,
            axis: _,
            path,
        } => {
            let doc = load_page(&html_file)?;
            let node = first_match(&doc, &css_selector)?;
            let language = if path { SelectorLanguage::Path } else { SelectorLanguage::Axis };
            let mut session = Session::new(options);
            session.toggle_selecting(&doc, true, Some(language));
            let outcome = session.try_click(&doc, &node)?;
            Ok(serde_json::to_value(outcome)?)
        }
        Commands::Scrape {
            html_file,
            fields_json,
        } => {
            let doc = load_page(&html_file)?;
            let fields = read_fields(&fields_json)?;
            Ok(serde_json::Value::Object(rs_field_picker::scrape(&doc, &fields, &options)))
        }
        Commands::Common {
            html_file,
            first_css,
            second_css,
        } => {
            let doc = load_page(&html_file)?;
            let first = first_match(&doc, &first_css)?;
            let second = first_match(&doc, &second_css)?;
            let verifier = Verifier::new(&doc);
            let selector = ListingSynthesizer::new(verifier, &options).find_common_selector(&first, &second)?;
            Ok(serde_json::json!({
                "selector": selector,
                "matchCount": verifier.count(&selector),
            }))
        }
    }
}

fn print<T: Serialize>(response: &Response<T>) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize response: {err}"),
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "rs_field_picker=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let response: Response<serde_json::Value> = run(Cli::parse()).into();
    print(&response);
    if !response.success {
        std::process::exit(EXIT_FAILURE);
    }
}
