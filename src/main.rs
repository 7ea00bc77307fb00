use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xycalc::{
    parse_with_depth,
    request::{format_value, handle, CalcRequest, CalcResponse, Limits},
};

/// Evaluate two arithmetic expressions over the variables X and Y
#[derive(Parser, Debug)]
#[command(name = "xycalc")]
struct Args {
    /// Value bound to X
    #[arg(long = "x", allow_hyphen_values = true)]
    x: Option<String>,

    /// Value bound to Y
    #[arg(long = "y", allow_hyphen_values = true)]
    y: Option<String>,

    /// First expression (defaults to X**2)
    #[arg(allow_hyphen_values = true)]
    expr1: Option<String>,

    /// Second expression (defaults to 2*Y)
    #[arg(allow_hyphen_values = true)]
    expr2: Option<String>,

    /// Read the request from a JSON file; other arguments override its fields
    #[arg(long)]
    request: Option<PathBuf>,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,

    /// Print the restricted expression trees
    #[arg(long)]
    tree: bool,

    /// Longest accepted expression, in bytes
    #[arg(long, default_value_t = Limits::default().max_expr_len)]
    max_len: usize,

    /// Deepest accepted nesting of parentheses and prefix operators
    #[arg(long, default_value_t = Limits::default().max_depth)]
    max_depth: usize,
}

fn load_request(args: &Args) -> Result<CalcRequest> {
    let mut request = match &args.request {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading request file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing request file {}", path.display()))?
        }
        None => CalcRequest::default(),
    };
    let fields = [
        (&args.x, &mut request.x),
        (&args.y, &mut request.y),
        (&args.expr1, &mut request.expr1),
        (&args.expr2, &mut request.expr2),
    ];
    for (arg, field) in fields {
        if let Some(value) = arg {
            *field = value.clone();
        }
    }
    Ok(request)
}

fn print_report(response: &CalcResponse) {
    println!("X = {}, Y = {}", response.x, response.y);
    if let Some(error) = &response.error {
        println!("{}", error);
        return;
    }
    for (expr, value) in [&response.expr1, &response.expr2]
        .into_iter()
        .zip(&response.results)
    {
        println!("{} = {}", expr, format_value(*value));
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let request = load_request(&args)?;
    let limits = Limits {
        max_expr_len: args.max_len,
        max_depth: args.max_depth,
    };
    let response = handle(&request, &limits);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_report(&response);
    }
    if args.tree {
        for expr in [&response.expr1, &response.expr2] {
            if let Ok(tree) = parse_with_depth(expr, limits.max_depth) {
                println!("{}\n{}", expr, tree.render_tree());
            }
        }
    }
    Ok(if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
