use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["trendscout-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_scan_defaults() {
    let cli = Cli::try_parse_from(["trendscout-cli", "scan"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Scan {
            region: None,
            listings: None,
            dry_run: false
        })
    ));
}

#[test]
fn parses_scan_with_region_file_and_dry_run() {
    let cli = Cli::try_parse_from([
        "trendscout-cli",
        "scan",
        "--region",
        "uk",
        "--listings",
        "fixtures/listings.json",
        "--dry-run",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Scan {
            region: Some(Region::Uk),
            listings: Some(ref p),
            dry_run: true
        }) if p == &PathBuf::from("fixtures/listings.json")
    ));
}

#[test]
fn rejects_unknown_region() {
    assert!(Cli::try_parse_from(["trendscout-cli", "scan", "--region", "FR"]).is_err());
}

#[test]
fn top_limit_defaults_to_ten() {
    let cli = Cli::try_parse_from(["trendscout-cli", "top"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Top { limit: 10 })));
}

#[test]
fn history_requires_product_id() {
    assert!(Cli::try_parse_from(["trendscout-cli", "history"]).is_err());
    let cli = Cli::try_parse_from(["trendscout-cli", "history", "--product-id", "42"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::History {
            product_id: 42,
            limit: 20
        })
    ));
}

#[test]
fn parses_archive_overrides() {
    let cli = Cli::try_parse_from([
        "trendscout-cli",
        "archive",
        "--days",
        "14",
        "--below",
        "40",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Archive {
            days: Some(14),
            below: Some(b)
        }) if (b - 40.0).abs() < f64::EPSILON
    ));
}

#[test]
fn parses_migrate() {
    let cli = Cli::try_parse_from(["trendscout-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}
