use super::*;

use chrono::TimeZone;

#[test]
fn purge_cutoff_subtracts_whole_hours() {
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
    let cutoff = purge_cutoff(now, 36).expect("cutoff");
    assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    assert_eq!(purge_cutoff(now, 0).expect("zero"), now);
}

#[test]
fn purge_cutoff_reports_out_of_range_ages() {
    let error = purge_cutoff(Utc::now(), i64::MAX).expect_err("too large");
    assert!(error.to_string().contains("out of range"));

    let error = purge_cutoff(Utc::now(), 9_000_000_000).expect_err("before min date");
    assert!(error.to_string().contains("9000000000"));
}

#[test]
fn purge_rejects_negative_ages() {
    let parsed = Cli::try_parse_from(["tools", "purge", "--older-than-hours", "-3"]);
    assert!(parsed.is_err());

    let parsed = Cli::try_parse_from(["tools", "purge", "--older-than-hours", "48"]).expect("cli");
    assert!(matches!(parsed.command, Command::Purge { older_than_hours: 48 }));
}

#[test]
fn validate_manifest_takes_a_path() {
    let parsed =
        Cli::try_parse_from(["tools", "validate-manifest", "demos/contact_steps.toml"]).expect("cli");
    assert!(matches!(parsed.command, Command::ValidateManifest { .. }));
    assert_eq!(parsed.database_url, "sqlite://./data/sessions.db");
}
