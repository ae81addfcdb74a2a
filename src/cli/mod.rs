//! Command-line surface of `shop-admin`.
//!
//! Argument definitions live here; [`commands`] executes them against an
//! [`crate::core::AdminData`].

/// Command execution
pub mod commands;

use crate::errors::{Error, Result};
use crate::models::Fields;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

/// Administration tool for the shop's catalog, users and notifications.
#[derive(Parser, Debug)]
#[command(name = "shop-admin", version, about, long_about = None)]
pub struct Cli {
    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every record in a collection.
    List {
        /// Collection to read
        collection: Collection,
    },
    /// Show one record.
    Get {
        /// Collection to read
        collection: Collection,
        /// Record id
        id: String,
    },
    /// Create a record and print its id.
    Add {
        /// Collection to write
        collection: Collection,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Change some fields of a record.
    Edit {
        /// Collection to write
        collection: Collection,
        /// Record id
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a record.
    Delete {
        /// Collection to write
        collection: Collection,
        /// Record id
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// User account actions.
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Broadcast a notification to every shopper.
    Notify {
        /// Headline
        title: String,
        /// Message text
        body: String,
    },
    /// List notifications, newest first.
    Notifications,
    /// Print a collection now and after every change, until Ctrl-C.
    Watch {
        /// Collection to follow
        collection: Collection,
    },
    /// Create the categories listed in config.toml that do not exist yet.
    Seed,
}

/// `shop-admin user ...`
#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Switch a user between active and banned.
    Toggle {
        /// User id
        id: String,
    },
}

/// Collections reachable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// `products`
    Products,
    /// `categories`
    Categories,
    /// `brands`
    Brands,
    /// `users`
    Users,
    /// `orders` (read-only)
    Orders,
    /// `notifications`
    Notifications,
    /// `banners`
    Banners,
}

/// Field values given as repeated `-f key=value` and `-j key=<json>` options.
#[derive(Args, Debug, Default, Clone)]
pub struct FieldArgs {
    /// String field, e.g. `-f name=Pen`
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub strings: Vec<(String, String)>,
    /// JSON field, e.g. `-j price=1.5`; `-j key=null` deletes on edit
    #[arg(short = 'j', long = "json", value_name = "KEY=JSON", value_parser = parse_pair)]
    pub json: Vec<(String, String)>,
}

impl FieldArgs {
    /// Collects the options into field values; later options win.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] naming the key whose JSON does not parse.
    pub fn into_fields(self) -> Result<Fields> {
        let mut fields = Fields::new();
        for (key, value) in self.strings {
            fields.insert(key, Value::String(value));
        }
        for (key, raw) in self.json {
            let value = serde_json::from_str(&raw)
                .map_err(|e| Error::validation(key.as_str(), format!("is not valid JSON: {e}")))?;
            fields.insert(key, value);
        }
        Ok(fields)
    }
}

fn parse_pair(arg: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{arg}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
