use clap::ArgMatches;

use crate::error::{Error, Result};
use crate::models::Record;
use crate::query;
use crate::store::Store;

use super::print_table;

pub fn list(store: &Store, matches: &ArgMatches) -> Result<()> {
    let playbook = matches.get_one::<i64>("playbook").copied();
    let records = query::records(store, playbook)?;

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| vec![r.id.to_string(), r.playbook_id.to_string(), r.key.clone()])
        .collect();
    print_table(&["ID", "Playbook", "Key"], &rows);
    Ok(())
}

pub fn show(store: &Store, matches: &ArgMatches) -> Result<()> {
    let record = resolve(store, matches)?;

    println!("Record {}", record.id);
    println!("  Key:      {}", record.key);
    println!("  Playbook: {}", record.playbook_id);
    if matches.get_flag("long") {
        println!("  Value:\n{}", serde_json::to_string_pretty(&record.value)?);
    }
    Ok(())
}

/// With `--playbook` the positional argument is a record key scoped to that
/// playbook; otherwise it must be a numeric record id.
fn resolve(store: &Store, matches: &ArgMatches) -> Result<Record> {
    let reference = matches.get_one::<String>("record").unwrap();
    match matches.get_one::<i64>("playbook") {
        Some(playbook) => store.get_record_by_key(*playbook, reference),
        None => {
            let id: i64 = reference
                .parse()
                .map_err(|_| Error::not_found("record", reference))?;
            store.get_record(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build_cli;
    use crate::testing::FakeRun;

    fn leaf_matches(args: &[&str]) -> ArgMatches {
        let matches = build_cli().try_get_matches_from(args).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let (_, leaf) = sub.subcommand().unwrap();
        leaf.clone()
    }

    #[test]
    fn test_resolve_by_key_within_playbook() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();

        let pb = run.playbook.id.to_string();
        let record = resolve(
            &store,
            &leaf_matches(&[
                "playback",
                "record",
                "show",
                "-b",
                pb.as_str(),
                run.record.key.as_str(),
            ]),
        )
        .unwrap();
        assert_eq!(record.id, run.record.id);
    }

    #[test]
    fn test_resolve_missing_id_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = resolve(&store, &leaf_matches(&["playback", "record", "show", "404"]))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_resolve_missing_key_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();

        let pb = run.playbook.id.to_string();
        let err = resolve(
            &store,
            &leaf_matches(&["playback", "record", "show", "-b", pb.as_str(), "no_such_key"]),
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
