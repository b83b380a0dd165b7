//! Scope commands.
//!
//! Expand selections into scope URLs and fold scope lists back into
//! selections, using the built-in catalog.

use anyhow::Result;
use clap::{Args, Subcommand};
use gkepool_scopes::{
    parse_scope_assignment, short_scope_name, GoogleCatalog, OauthScopesSelection, ScopeMapper,
    ScopeSelection,
};
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_info, print_output, print_single, OutputFormat};

use super::CommandContext;

/// Scope commands.
#[derive(Debug, Args)]
pub struct ScopesCommand {
    #[command(subcommand)]
    command: ScopesSubcommand,
}

#[derive(Debug, Subcommand)]
enum ScopesSubcommand {
    /// Expand a selection into scope URLs.
    Map(MapArgs),

    /// Fold scope URLs or short names into a selection.
    Unmap(UnmapArgs),
}

#[derive(Debug, Args)]
struct MapArgs {
    /// Selection mode (default, full, or custom).
    #[arg(long, default_value = "default")]
    selection: String,

    /// Custom scope as api=scope. Repeatable.
    #[arg(long = "scope", value_name = "API=SCOPE")]
    scopes: Vec<String>,
}

#[derive(Debug, Args)]
struct UnmapArgs {
    /// Scope URLs or short names.
    #[arg(required = true)]
    scopes: Vec<String>,
}

impl ScopesCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let catalog = GoogleCatalog::new();
        match self.command {
            ScopesSubcommand::Map(args) => map_scopes(&catalog, ctx, args),
            ScopesSubcommand::Unmap(args) => unmap_scopes(&catalog, ctx, args),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct ScopeRow {
    #[tabled(rename = "Scope")]
    scope: String,

    #[tabled(rename = "URL")]
    url: String,
}

#[derive(Debug, Serialize, Tabled)]
struct ConfigRow {
    #[tabled(rename = "API")]
    api: String,

    #[tabled(rename = "Label")]
    label: String,

    #[tabled(rename = "Scopes")]
    scopes: String,
}

fn parse_selection(args: &MapArgs) -> Result<ScopeSelection, CliError> {
    let mode: OauthScopesSelection = args.selection.parse()?;
    let pairs = args
        .scopes
        .iter()
        .map(|s| parse_scope_assignment(s))
        .collect::<Result<Vec<_>, _>>()?;

    let mut selection = ScopeSelection::custom(pairs.iter().map(|(a, s)| (a.as_str(), s.as_str())));
    selection.oauth_scopes_selection = mode;
    Ok(selection)
}

fn map_scopes(catalog: &GoogleCatalog, ctx: CommandContext, args: MapArgs) -> Result<()> {
    let selection = parse_selection(&args)?;
    if selection.oauth_scopes_selection != OauthScopesSelection::Custom
        && !selection.scope_config.is_empty()
    {
        print_info("--scope only applies to the custom selection");
    }

    let urls =
        catalog.map_oauth_scopes(selection.oauth_scopes_selection, &selection.scope_config);
    let rows: Vec<ScopeRow> = urls
        .iter()
        .map(|url| ScopeRow {
            scope: short_scope_name(url).to_string(),
            url: url.clone(),
        })
        .collect();

    match ctx.format {
        OutputFormat::Json => print_single(&urls),
        OutputFormat::Table => print_output(&rows, ctx.format),
    }
    Ok(())
}

fn config_rows(catalog: &GoogleCatalog, selection: &ScopeSelection) -> Vec<ConfigRow> {
    selection
        .scope_config
        .iter()
        .map(|(api, scopes)| {
            let label = catalog
                .scope_apis()
                .iter()
                .find(|entry| entry.key == api.as_str())
                .map_or("-", |entry| entry.label);
            ConfigRow {
                api: api.clone(),
                label: label.to_string(),
                scopes: scopes.join(", "),
            }
        })
        .collect()
}

fn unmap_scopes(catalog: &GoogleCatalog, ctx: CommandContext, args: UnmapArgs) -> Result<()> {
    let selection = catalog.unmap_oauth_scopes(&args.scopes);

    match ctx.format {
        OutputFormat::Json => print_single(&selection),
        OutputFormat::Table => {
            print_info(&format!("selection: {}", selection.oauth_scopes_selection));
            if selection.oauth_scopes_selection == OauthScopesSelection::Custom {
                print_output(&config_rows(catalog, &selection), ctx.format);
            }
        }
    }
    Ok(())
}
