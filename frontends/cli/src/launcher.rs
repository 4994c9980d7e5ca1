use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::config::CliConfig;
use crate::render::render_page;
use tabula::{FetchParams, ListEngine, SortDirection, Value};
use tabula_rest::{AppContext, ResourceKind};

pub const USAGE: &str = "usage: tabula-cli [--config PATH] [users|posts|comments] \
[--search Q] [--sort FIELD] [--desc] [--page N] [--page-size N] [--filter KEY=VALUE]...";

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub resource: ResourceKind,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
    pub page: usize,
    pub page_size: Option<usize>,
    pub filters: Vec<(String, Value)>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config_path: None,
            resource: ResourceKind::Users,
            search: None,
            sort: None,
            descending: false,
            page: 1,
            page_size: None,
            filters: Vec::new(),
        }
    }
}

impl CliArgs {
    /// Parse arguments (without the program name)
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    parsed.config_path = Some(PathBuf::from(value_of(&mut args, &arg)?));
                }
                "--search" | "-s" => parsed.search = Some(value_of(&mut args, &arg)?),
                "--sort" => parsed.sort = Some(value_of(&mut args, &arg)?),
                "--desc" => parsed.descending = true,
                "--page" | "-p" => parsed.page = number_of(&mut args, &arg)?,
                "--page-size" => parsed.page_size = Some(number_of(&mut args, &arg)?),
                "--filter" | "-f" => {
                    let raw = value_of(&mut args, &arg)?;
                    let (key, value) = raw
                        .split_once('=')
                        .with_context(|| format!("--filter expects KEY=VALUE, got {:?}", raw))?;
                    parsed.filters.push((key.to_string(), parse_filter_value(value)));
                }
                other if other.starts_with('-') => bail!("unknown option {}\n{}", other, USAGE),
                // Positional argument is the resource name
                other => parsed.resource = other.parse()?,
            }
        }

        Ok(parsed)
    }
}

fn value_of(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("{} expects a value\n{}", flag, USAGE))
}

fn number_of(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<usize> {
    let raw = value_of(args, flag)?;
    raw.parse()
        .with_context(|| format!("{} expects a number, got {:?}", flag, raw))
}

/// `true`/`false` and integers are typed, comma separated values become a
/// membership filter, everything else is a string
pub fn parse_filter_value(raw: &str) -> Value {
    if raw.contains(',') {
        return Value::Array(raw.split(',').map(parse_filter_value).collect());
    }
    match raw {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => raw
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::from(raw)),
    }
}

/// Apply everything except the page to a freshly created engine
pub fn apply_view(engine: &mut ListEngine, args: &CliArgs) {
    if let Some(page_size) = args.page_size {
        engine.set_page_size(page_size);
    }
    for (key, value) in &args.filters {
        engine.set_filter(key, value.clone());
    }
    if let Some(search) = &args.search {
        engine.search(search);
    }
    if let Some(field) = &args.sort {
        let direction = if args.descending {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        engine.set_sorting(field, direction);
    }
}

/// Load the requested resource and render the requested page
pub async fn run_app(args: CliArgs, config: CliConfig) -> Result<String> {
    let ctx = AppContext::init(config.rest.clone())?;
    let list_config = config.list.clone().with_auto_load(false);
    let mut engine = ctx.engine(args.resource, list_config).await;

    let output = load_and_render(&mut engine, &args).await;
    ctx.shutdown().await?;
    output
}

/// Apply the view, load `engine` and render the page asked for in `args`
pub async fn load_and_render(engine: &mut ListEngine, args: &CliArgs) -> Result<String> {
    apply_view(engine, args);
    let loaded = engine
        .load(FetchParams::new())
        .await
        .with_context(|| format!("Failed to load {}", args.resource.name()))?;
    info!("Loaded {} {}", loaded, args.resource.name());

    if !engine.go_to_page(args.page) {
        bail!(
            "page {} is out of range (1..={})",
            args.page,
            engine.total_pages()
        );
    }
    Ok(render_page(engine))
}
