use clap::ArgMatches;

use crate::error::{Error, Result};
use crate::models::Host;
use crate::query;
use crate::store::Store;

use super::print_table;

pub fn list(store: &Store, matches: &ArgMatches) -> Result<()> {
    let playbook = matches.get_one::<i64>("playbook").copied();
    let hosts = query::hosts(store, playbook)?;

    let rows: Vec<Vec<String>> = hosts
        .iter()
        .map(|h| vec![h.id.to_string(), h.playbook_id.to_string(), h.name.clone()])
        .collect();
    print_table(&["ID", "Playbook", "Name"], &rows);
    Ok(())
}

pub fn show(store: &Store, matches: &ArgMatches) -> Result<()> {
    let host = resolve(store, matches)?;

    println!("Host {}", host.id);
    println!("  Name:     {}", host.name);
    println!("  Playbook: {}", host.playbook_id);
    if matches.get_flag("long") {
        match &host.facts {
            Some(facts) => println!("  Facts:\n{}", serde_json::to_string_pretty(facts)?),
            None => println!("  Facts:    none recorded"),
        }
    }
    Ok(())
}

/// With `--playbook` the positional argument is a host name scoped to that
/// playbook; otherwise it must be a numeric host id.
fn resolve(store: &Store, matches: &ArgMatches) -> Result<Host> {
    let reference = matches.get_one::<String>("host").unwrap();
    match matches.get_one::<i64>("playbook") {
        Some(playbook) => store.get_host_by_name(*playbook, reference),
        None => {
            let id: i64 = reference
                .parse()
                .map_err(|_| Error::not_found("host", reference))?;
            store.get_host(id)
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
    fn test_resolve_by_id() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();

        let id = run.hosts[0].id.to_string();
        let host =
            resolve(&store, &leaf_matches(&["playback", "host", "show", id.as_str()])).unwrap();
        assert_eq!(host.name, run.hosts[0].name);
    }

    #[test]
    fn test_resolve_by_name_within_playbook() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();

        let pb = run.playbook.id.to_string();
        let host = resolve(
            &store,
            &leaf_matches(&[
                "playback",
                "host",
                "show",
                "-b",
                pb.as_str(),
                run.hosts[1].name.as_str(),
            ]),
        )
        .unwrap();
        assert_eq!(host.id, run.hosts[1].id);
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        FakeRun::record(&store).unwrap();

        let err = resolve(&store, &leaf_matches(&["playback", "host", "show", "999"]))
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
