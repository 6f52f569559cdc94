//! Classify command - run the field classifiers on free text.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use invostar_core::extract::analyze_observations;
use invostar_core::{load_invoices, FieldExtractor};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    #[command(subcommand)]
    command: ClassifyCommand,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum ClassifyCommand {
    /// Client type and tax regime from invoice observations
    Client {
        /// Observation text
        text: String,
    },

    /// Category of a payment method name
    Payment {
        /// Payment method name
        name: String,
    },

    /// Category of a product description
    Product {
        /// Product description
        description: String,
    },

    /// Label distribution over the observations of an invoice file
    Observations {
        /// Invoice JSON file
        input: PathBuf,
    },
}

pub fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let extractor = FieldExtractor::new();

    match args.command {
        ClassifyCommand::Client { text } => {
            let info = extractor.extract_client_info(&text);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Client type: {}", style(&info.client_type).cyan());
                println!("Tax regime:  {}", style(&info.tax_regime).cyan());
            }
        }
        ClassifyCommand::Payment { name } => {
            print_label(extractor.extract_payment_category(&name), args.json)?;
        }
        ClassifyCommand::Product { description } => {
            print_label(extractor.extract_product_category(&description), args.json)?;
        }
        ClassifyCommand::Observations { input } => {
            let file = File::open(&input)
                .map_err(|e| anyhow::anyhow!("Cannot open {}: {}", input.display(), e))?;
            let invoices = load_invoices(BufReader::new(file))?;
            let observations: Vec<&str> = invoices.iter().map(|i| i.observations.as_str()).collect();
            let summary = analyze_observations(&observations);

            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!(
                "{} {} observations ({} empty)",
                style("ℹ").blue(),
                summary.total,
                summary.empty
            );
            println!();
            println!("{}", style("Client types:").bold());
            for (label, count) in &summary.client_types {
                println!("  {:<28} {}", label, count);
            }
            println!("{}", style("Tax regimes:").bold());
            for (label, count) in &summary.tax_regimes {
                println!("  {:<28} {}", label, count);
            }
        }
    }

    Ok(())
}

fn print_label(label: &str, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(&serde_json::json!({ "category": label }))?);
    } else {
        println!("{}", label);
    }
    Ok(())
}
