//! calcnote CLI - evaluate notebook files from the command line

use anyhow::{Context, Result};
use calcnote::prelude::*;
use calcnote::DisplayOptions;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "calcnote")]
#[command(author, version, about = "Calculation notebook evaluator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a notebook and print each block's result
    Eval {
        /// Input notebook file (JSON)
        input: PathBuf,

        /// Write the evaluated notebook to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Digits after the decimal point
        #[arg(short, long, default_value = "2")]
        decimals: usize,

        /// Show coherent SI units instead of prefixed ones
        #[arg(long)]
        no_compact: bool,

        /// Disable the tolerant parsing fallback
        #[arg(long)]
        strict: bool,

        /// Print the typeset form of each block
        #[arg(long)]
        latex: bool,
    },

    /// Show information about a notebook
    Info {
        /// Input notebook file
        input: PathBuf,
    },

    /// Evaluate a notebook and list the names it defines
    Vars {
        /// Input notebook file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            input,
            output,
            decimals,
            no_compact,
            strict,
            latex,
        } => {
            let options = EvaluationOptions {
                decimals,
                compact_units: !no_compact,
                tolerant_fallback: !strict,
                ..Default::default()
            };
            eval(&input, output.as_deref(), &options, latex)
        }
        Commands::Info { input } => show_info(&input),
        Commands::Vars { input } => list_vars(&input),
    }
}

fn open(input: &Path) -> Result<Document> {
    Document::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn eval(
    input: &Path,
    output: Option<&Path>,
    options: &EvaluationOptions,
    latex: bool,
) -> Result<()> {
    let mut doc = open(input)?;
    let ctx = doc.evaluate_with_options(options);

    write_report(
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
        &doc,
        &ctx,
        latex,
    )
    .context("Failed to write report")?;

    if let Some(output_path) = output {
        doc.save(output_path)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!("Wrote '{}'", output_path.display());
    }

    Ok(())
}

/// Block results go to `out`; errors, notices and the summary go to `diag`
fn write_report(
    out: &mut impl Write,
    diag: &mut impl Write,
    doc: &Document,
    ctx: &EvaluationContext,
    latex: bool,
) -> io::Result<()> {
    for (index, block) in doc.blocks().enumerate() {
        let formula = match block {
            Block::Text(text) => {
                writeln!(out, "[{}] {}", index, text.content)?;
                continue;
            }
            Block::Formula(formula) => formula,
        };

        writeln!(out, "[{}] {}", index, formula.source().replace('\n', "\n    "))?;
        if latex {
            if let Some(typeset) = formula.typeset() {
                writeln!(out, "    $ {}", typeset)?;
            }
        }
        if let Some(display) = formula.display() {
            writeln!(out, "    = {}", display)?;
        }
    }

    for error in ctx.errors() {
        writeln!(
            diag,
            "error: block {}: {}: {}",
            error.block, error.kind, error.message
        )?;
    }
    for log in ctx.logs() {
        writeln!(diag, "note: block {}: {}", log.block, log.message)?;
    }

    let stats = EvaluationStats::collect(doc, ctx);
    writeln!(
        diag,
        "Evaluated {} formulas ({} errors)",
        stats.formula_count, stats.errors
    )
}

fn show_info(input: &Path) -> Result<()> {
    let doc = open(input)?;
    let formulas = doc.formula_blocks().count();

    println!("File: {}", input.display());
    println!("Blocks: {}", doc.len());
    println!("  Text: {}", doc.len() - formulas);
    println!("  Formulas: {}", formulas);

    // Statuses cached in the file, before any evaluation
    let cached_errors = doc
        .formula_blocks()
        .filter(|(_, block)| block.is_error())
        .count();
    let pending = doc
        .formula_blocks()
        .filter(|(_, block)| block.status() == BlockStatus::Pending)
        .count();
    println!("  Cached errors: {}", cached_errors);
    println!("  Not yet evaluated: {}", pending);

    Ok(())
}

fn list_vars(input: &Path) -> Result<()> {
    let mut doc = open(input)?;
    let ctx = doc.evaluate();
    let display = DisplayOptions::default();

    for (name, record) in ctx.variables() {
        println!("{}\t{}", name, display.format_value(&record.value));
    }
    for (name, record) in ctx.arrays() {
        println!(
            "{}\t{}",
            name,
            display.format_value(&Value::Array(record.values.clone()))
        );
    }
    for (name, function) in ctx.functions() {
        println!("{}({})\t{}", name, function.params.join(", "), function.typeset);
    }
    for error in ctx.errors() {
        eprintln!("error: block {}: {}: {}", error.block, error.kind, error.message);
    }

    Ok(())
}
