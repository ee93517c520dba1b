use super::*;
use crate::input::parse_levels;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["catsync", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["catsync", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["catsync"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn inspect_headers_takes_file_and_sheet() {
    let cli = Cli::try_parse_from([
        "catsync",
        "inspect",
        "headers",
        "--file",
        "phc.xlsx",
        "--sheet",
        "Folha1",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Inspect {
            command: InspectCommands::Headers { ref input }
        }) if input.file.as_deref() == Some(std::path::Path::new("phc.xlsx"))
            && input.sheet.as_deref() == Some("Folha1")
    ));
}

#[test]
fn facets_rebuild_defaults_to_four_levels() {
    let cli = Cli::try_parse_from(["catsync", "facets", "rebuild"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Facets {
            command: FacetsCommands::Rebuild {
                levels: 4,
                dry_run: false,
                ..
            }
        })
    ));
}

#[test]
fn facets_apply_with_levels_and_dry_run() {
    let cli =
        Cli::try_parse_from(["catsync", "facets", "apply", "--levels", "2", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Facets {
            command: FacetsCommands::Apply {
                levels: 2,
                dry_run: true,
                ..
            }
        })
    ));
}

#[test]
fn levels_out_of_range_is_rejected() {
    assert!(Cli::try_parse_from(["catsync", "facets", "rebuild", "--levels", "5"]).is_err());
    assert!(Cli::try_parse_from(["catsync", "facets", "rebuild", "--levels", "0"]).is_err());
}

#[test]
fn facets_clear_with_delete_values() {
    let cli = Cli::try_parse_from(["catsync", "facets", "clear", "--delete-values"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Facets {
            command: FacetsCommands::Clear {
                levels: 4,
                delete_values: true,
                dry_run: false
            }
        })
    ));
}

#[test]
fn facets_tag_requires_rule_arguments() {
    assert!(Cli::try_parse_from(["catsync", "facets", "tag", "--column", "Marca"]).is_err());

    let cli = Cli::try_parse_from([
        "catsync",
        "facets",
        "tag",
        "--column",
        "Marca",
        "--value",
        "ACME",
        "--facet",
        "brand",
        "--facet-value",
        "acme",
        "--ignore-case",
        "--skip-products",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Facets {
            command: FacetsCommands::Tag {
                ref column,
                ref facet_value,
                ignore_case: true,
                skip_products: true,
                skip_variants: false,
                ..
            }
        }) if column == "Marca" && facet_value == "acme"
    ));
}

#[test]
fn collections_sync_additive() {
    let cli = Cli::try_parse_from(["catsync", "collections", "sync", "--additive"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collections {
            command: CollectionsCommands::Sync {
                additive: true,
                levels: 4,
                ..
            }
        })
    ));
}

#[test]
fn collections_filters_levels() {
    let cli = Cli::try_parse_from(["catsync", "collections", "filters", "--levels", "3"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collections {
            command: CollectionsCommands::Filters {
                levels: 3,
                dry_run: false
            }
        })
    ));
}

#[test]
fn reset_membership_collects_repeated_ids() {
    let cli = Cli::try_parse_from([
        "catsync",
        "collections",
        "reset-membership",
        "--collection",
        "12",
        "--collection",
        "40",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collections {
            command: CollectionsCommands::ResetMembership {
                ref collections,
                dry_run: false
            }
        }) if collections == &vec![12, 40]
    ));
}

#[test]
fn reset_membership_without_ids_means_all() {
    let cli = Cli::try_parse_from(["catsync", "collections", "reset-membership"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collections {
            command: CollectionsCommands::ResetMembership { ref collections, .. }
        }) if collections.is_empty()
    ));
}

#[test]
fn images_fill_missing_requires_asset_id() {
    assert!(Cli::try_parse_from(["catsync", "images", "fill-missing"]).is_err());

    let cli = Cli::try_parse_from([
        "catsync",
        "images",
        "fill-missing",
        "--asset-id",
        "7",
        "--skip-variants",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Images {
            command: ImagesCommands::FillMissing {
                asset_id: 7,
                skip_products: false,
                skip_variants: true,
                skip_collections: false,
                dry_run: false
            }
        })
    ));
}

#[test]
fn images_fill_missing_can_skip_collections() {
    let cli = Cli::try_parse_from([
        "catsync",
        "images",
        "fill-missing",
        "--asset-id",
        "7",
        "--skip-collections",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Images {
            command: ImagesCommands::FillMissing {
                skip_products: false,
                skip_variants: false,
                skip_collections: true,
                dry_run: true,
                ..
            }
        })
    ));
}

#[test]
fn parse_levels_messages() {
    assert_eq!(parse_levels("3"), Ok(3));
    assert!(parse_levels("x").unwrap_err().contains("not a number"));
    assert!(parse_levels("9").unwrap_err().contains("between 1 and 4"));
}
