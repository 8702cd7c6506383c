use anyhow::{anyhow, Context, Result};
use clap::Parser;
use facetmap::parser::parse_facet_spec;
use facetmap::runtime::render_facets;
use facetmap::{Dataset, GridOptions, RenderOptions};
use std::io::{self, Read, Write};

#[derive(Parser, Debug)]
#[command(name = "facetmap")]
#[command(about = "Facet a labeled dataset and map distribution visuals over it", long_about = None)]
struct Args {
    /// Faceting DSL string (e.g., 'wrap(cols: [team]) | aes(color: [chain]) | kde()')
    dsl: String,

    /// Read a long-format CSV table instead of JSON
    #[arg(long)]
    csv: bool,

    /// CSV column holding the values
    #[arg(long, default_value = "value")]
    value: String,

    /// JSON object with render and grid options (e.g. '{"width": 1024, "sharex": true}')
    #[arg(long)]
    options: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (render_options, grid_options) = match &args.options {
        Some(raw) => {
            let value: serde_json::Value =
                serde_json::from_str(raw).context("Failed to parse --options as JSON")?;
            let render: RenderOptions =
                serde_json::from_value(value.clone()).context("Invalid render options")?;
            let grid: GridOptions = serde_json::from_value(value).context("Invalid grid options")?;
            (render, grid)
        }
        None => (RenderOptions::default(), GridOptions::default()),
    };

    // Read the dataset from stdin
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read dataset from stdin")?;
    let dataset = if args.csv {
        Dataset::from_csv(input.as_bytes(), &args.value).context("Failed to load CSV dataset")?
    } else {
        let json: serde_json::Value =
            serde_json::from_str(&input).context("Failed to parse stdin as JSON")?;
        Dataset::from_json(&json).context("Failed to load JSON dataset")?
    };

    // Parse the DSL string
    let spec = match parse_facet_spec(&args.dsl) {
        Ok((_, spec)) => spec,
        Err(e) => return Err(anyhow!("Parse error: {:?}", e)),
    };

    let bytes = render_facets(&spec, &dataset, grid_options, &render_options)
        .context("Failed to render facets")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(&bytes)
        .context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
