//! Command handlers for the pidmint CLI.

use anyhow::{bail, Result};
use colored::Colorize;
use pidmint_core::provider::{EzidDoiProvider, PidProvider};
use pidmint_core::record::PidRecord;

use crate::{IdentifierArgs, MetadataArgs};

/// Assemble an in-memory record from command-line arguments.
fn record_from_args(id: &IdentifierArgs, metadata: Option<&MetadataArgs>) -> PidRecord {
    let mut record = PidRecord::new(&id.protocol, &id.authority, &id.separator);
    if let Some(metadata) = metadata {
        if !metadata.title.is_empty() {
            record = record.with_field("title", &metadata.title);
        }
        for author in &metadata.authors {
            record = record.with_field("author", author);
        }
    }
    record.assign_identifier(&id.local);
    record
}

fn print_metadata(metadata: &pidmint_core::anvl::MetadataMap) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(metadata)?);
    Ok(())
}

pub fn reserve(
    provider: &EzidDoiProvider,
    id: &IdentifierArgs,
    metadata: &MetadataArgs,
) -> Result<()> {
    let mut record = record_from_args(id, Some(metadata));
    let receipt = provider.create_identifier(&mut record)?;
    println!("{} {}", "reserved".green().bold(), receipt);
    Ok(())
}

pub fn status(provider: &EzidDoiProvider, id: &IdentifierArgs) -> Result<()> {
    let record = record_from_args(id, None);
    let metadata = provider.get_identifier_metadata(&record);
    if metadata.is_empty() {
        bail!(
            "no registry entry for {}",
            provider.identifier_from_record(&record)?
        );
    }
    print_metadata(&metadata)
}

pub fn publish(
    provider: &EzidDoiProvider,
    id: &IdentifierArgs,
    metadata: &MetadataArgs,
) -> Result<()> {
    let record = record_from_args(id, Some(metadata));
    let identifier = provider.identifier_from_record(&record)?;
    if provider.publicize_identifier(&record) {
        println!("{} {}", "public".green().bold(), identifier);
        Ok(())
    } else {
        bail!("failed to publicize {}; see warnings above", identifier);
    }
}

pub fn withdraw(
    provider: &EzidDoiProvider,
    id: &IdentifierArgs,
    metadata: &MetadataArgs,
) -> Result<()> {
    let record = record_from_args(id, Some(metadata));
    let identifier = provider.identifier_from_record(&record)?;
    provider.delete_identifier(&record)?;
    println!("{} {}", "withdrawn".yellow().bold(), identifier);
    Ok(())
}

pub fn lookup(provider: &EzidDoiProvider, id: &IdentifierArgs) -> Result<()> {
    let metadata = provider.lookup_metadata_from_identifier(
        &id.protocol,
        &id.authority,
        &id.separator,
        &id.local,
    );
    if metadata.is_empty() {
        println!(
            "{} {}:{}{}{}",
            "available".green().bold(),
            id.protocol,
            id.authority,
            id.separator,
            id.local
        );
        return Ok(());
    }
    println!("{}", "taken".red().bold());
    print_metadata(&metadata)
}
