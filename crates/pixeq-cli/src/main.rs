use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pixeq_core::{FormulaError, PixeqConfig, SizeVariables, CONFIG_FILE_NAME};
use pixeq_lang::{Compiler, FloatFormula, Formatter, ImageScope, Tokenizer};

#[derive(Parser)]
#[command(
    name = "pixeq",
    version,
    about = "Pixeq: compile image formulas to shader expressions",
    long_about = "Pixeq turns per-pixel image formulas such as `I0/(sqrt(I1)+1)` into HLSL\nexpressions, and evaluates numeric formulas over image sizes."
)]
struct Cli {
    /// Config file (default: ./pixeq.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of image slots, overriding the config
    #[arg(long, global = true)]
    images: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an image formula and print the shader expression
    Compile {
        formula: String,

        /// Print a JSON object with the expression and the image usage
        #[arg(long)]
        json: bool,
    },

    /// Check a formula for errors without printing the expression
    Check { formula: String },

    /// Evaluate a numeric formula over width/height/depth
    Eval {
        formula: String,

        #[arg(long, default_value_t = 0.0)]
        width: f32,

        #[arg(long, default_value_t = 0.0)]
        height: f32,

        #[arg(long, default_value_t = 0.0)]
        depth: f32,
    },

    /// Show how a formula was grouped
    Tree {
        formula: String,

        /// Print the expression tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the token sequence of a formula
    Tokens { formula: String },

    /// Rewrite every reference to image OLD as image NEW
    ReplaceImage { formula: String, old: u32, new: u32 },

    /// Print the shader helpers and texture accessors the expressions rely on
    Prelude,

    /// Print the effective configuration as TOML
    Config {
        /// Save it to the --config path, or ./pixeq.toml
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PixeqConfig::load_or_default(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("failed to load config: {}", path.display()),
            None => format!("failed to load {CONFIG_FILE_NAME}"),
        }
    })?;
    if let Some(images) = cli.images {
        config.compiler.max_image_slots = images;
    }

    // Logs go to stderr so stdout stays clean for piping the output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(
        max_image_slots = config.compiler.max_image_slots,
        max_depth = config.compiler.max_depth,
        log_level = %config.log.level,
        "configuration loaded"
    );

    let compiler = Compiler::from_config(&config.compiler);

    match cli.command {
        Commands::Compile { formula, json } => cmd_compile(&compiler, &formula, json),
        Commands::Check { formula } => cmd_check(&compiler, &formula),
        Commands::Eval {
            formula,
            width,
            height,
            depth,
        } => cmd_eval(&formula, SizeVariables::new(width, height, depth)),
        Commands::Tree { formula, json } => cmd_tree(&compiler, &formula, json),
        Commands::Tokens { formula } => cmd_tokens(&compiler, &formula),
        Commands::ReplaceImage { formula, old, new } => {
            let replaced = pixeq_lang::replace_image(&formula, old, new)
                .map_err(|e| formula_error(&formula, e))?;
            println!("{replaced}");
            Ok(())
        }
        Commands::Prelude => {
            print!("{}", pixeq_lang::prelude::texture_getters(compiler.max_image_slots()));
            print!("{}", pixeq_lang::prelude::helper_functions());
            Ok(())
        }
        Commands::Config { write } => cmd_config(&config, cli.config, write),
    }
}

/// Attach the formula and a caret marker under the offending token.
fn formula_error(formula: &str, err: FormulaError) -> anyhow::Error {
    let Some(span) = err.span() else {
        return anyhow::Error::new(err).context(format!("invalid formula: {formula}"));
    };
    let width = span.len().max(1);
    let marker = format!("{}{}", " ".repeat(span.start), "^".repeat(width));
    anyhow::Error::new(err).context(format!("invalid formula:\n  {formula}\n  {marker}"))
}

fn cmd_compile(compiler: &Compiler, formula: &str, json: bool) -> Result<()> {
    let equation = compiler
        .compile(formula)
        .map_err(|e| formula_error(formula, e))?;
    let expression = equation
        .shader_expression()
        .map_err(|e| formula_error(formula, e))?;

    if json {
        let value = serde_json::json!({
            "expression": expression,
            "min_image_id": equation.min_image_id(),
            "max_image_id": equation.max_image_id(),
            "first_image_id": equation.first_image_id(),
            "image_ids": equation.image_ids(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{expression}");
    }
    Ok(())
}

fn cmd_check(compiler: &Compiler, formula: &str) -> Result<()> {
    let equation = compiler
        .compile(formula)
        .map_err(|e| formula_error(formula, e))?;
    println!("✓ structure OK");

    equation
        .validate()
        .map_err(|e| formula_error(formula, e))?;
    println!("✓ functions OK");

    match (equation.min_image_id(), equation.max_image_id()) {
        (Some(min), Some(max)) => {
            println!("  images: I{min}..I{max} ({} used)", equation.image_ids().len())
        }
        _ => println!("  images: none"),
    }
    Ok(())
}

fn cmd_eval(formula: &str, sizes: SizeVariables) -> Result<()> {
    let value = FloatFormula::parse(formula)
        .and_then(|f| f.evaluate(sizes))
        .map_err(|e| formula_error(formula, e))?;
    println!("{value}");
    Ok(())
}

fn cmd_tree(compiler: &Compiler, formula: &str, json: bool) -> Result<()> {
    let equation = compiler
        .compile(formula)
        .map_err(|e| formula_error(formula, e))?;
    if json {
        println!("{}", serde_json::to_string_pretty(equation.root())?);
    } else {
        println!("{}", Formatter::format(equation.root()));
    }
    Ok(())
}

fn cmd_tokens(compiler: &Compiler, formula: &str) -> Result<()> {
    let mut scope = ImageScope::new(compiler.max_image_slots());
    let tokens = Tokenizer::new(formula)
        .tokenize(&mut scope)
        .map_err(|e| formula_error(formula, e))?;
    for token in tokens {
        println!("{:<8} {:?} {}", token.span.to_string(), token.class(), token.kind);
    }
    Ok(())
}

fn cmd_config(config: &PixeqConfig, path: Option<PathBuf>, write: bool) -> Result<()> {
    if !write {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }
    let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    config
        .save_to_file(&path)
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
