//! Pricing command: show the effective price table

use anyhow::Result;
use rightsizer_lib::{PricingTable, RegionPricing};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::output::{format_rate, print_info, print_json, print_table, OutputFormat};

#[derive(Tabled, Serialize)]
struct RegionRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "vCPU/hour")]
    #[serde(skip)]
    cpu: String,
    #[tabled(rename = "GB RAM/hour")]
    #[serde(skip)]
    memory: String,
    #[tabled(rename = "GB disk/month")]
    #[serde(skip)]
    storage: String,
    #[tabled(skip)]
    #[serde(flatten)]
    prices: RegionPricing,
}

impl RegionRow {
    fn new(region: impl Into<String>, prices: &RegionPricing) -> Self {
        Self {
            region: region.into(),
            cpu: format_rate(prices.cpu_price_per_vcpu_hour),
            memory: format_rate(prices.memory_price_per_gb_hour),
            storage: format_rate(prices.storage_price_per_gb_month),
            prices: *prices,
        }
    }
}

#[derive(Tabled)]
struct ModifierRow {
    #[tabled(rename = "Version contains")]
    pattern: String,
    #[tabled(rename = "Compute multiplier")]
    multiplier: String,
}

#[derive(Serialize)]
struct RegionLookup<'a> {
    region: &'a str,
    known: bool,
    #[serde(flatten)]
    prices: RegionPricing,
}

/// Print the pricing table, or the prices a single region resolves to
pub fn show_pricing(pricing: &PricingTable, region: Option<&str>, format: OutputFormat) -> Result<()> {
    if let Some(region) = region {
        return show_region(pricing, region, format);
    }

    if format == OutputFormat::Json {
        return print_json(pricing);
    }

    let mut rows: Vec<RegionRow> = pricing
        .regions
        .iter()
        .map(|(name, prices)| RegionRow::new(name.clone(), prices))
        .collect();
    rows.push(RegionRow::new("(default)", &pricing.default_region));
    print_table(&rows, format)?;

    let modifiers: Vec<ModifierRow> = pricing
        .version_modifiers
        .iter()
        .map(|m| ModifierRow {
            pattern: m.pattern.clone(),
            multiplier: format!("{:.2}x", m.multiplier),
        })
        .collect();
    if !modifiers.is_empty() {
        println!();
        println!("{}", Table::new(&modifiers).with(Style::rounded()));
    }

    println!();
    println!("Other versions: {:.2}x", pricing.default_version_modifier);
    println!("Regional (HA) multiplier: {:.2}x", pricing.ha_multiplier);
    println!("Hours per month: {}", pricing.hours_per_month);
    Ok(())
}

fn show_region(pricing: &PricingTable, region: &str, format: OutputFormat) -> Result<()> {
    let known = pricing.is_known_region(region);
    let prices = *pricing.region(region);

    match format {
        OutputFormat::Json => print_json(&RegionLookup {
            region,
            known,
            prices,
        }),
        OutputFormat::Table => {
            if !known {
                print_info(&format!(
                    "Region '{}' is not in the pricing table; default prices apply",
                    region
                ));
            }
            print_table(&[RegionRow::new(region, &prices)], format)
        }
    }
}
