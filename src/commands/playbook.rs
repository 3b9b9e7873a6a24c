use clap::ArgMatches;
use log::info;

use crate::error::Result;
use crate::query::{self, Completion, ResultFilter, TaskFilter};
use crate::store::Store;

use super::{duration, format_time, print_table};

pub fn list(store: &Store, matches: &ArgMatches) -> Result<()> {
    let completion = if matches.get_flag("complete") {
        Completion::Complete
    } else if matches.get_flag("incomplete") {
        Completion::Incomplete
    } else {
        Completion::All
    };

    let playbooks = query::playbooks(store, completion)?;
    let rows: Vec<Vec<String>> = playbooks
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.path.clone(),
                if p.completed { "complete" } else { "incomplete" }.to_string(),
                format_time(Some(p.started_at)),
                duration(p.started_at, p.ended_at),
            ]
        })
        .collect();
    print_table(&["ID", "Path", "Status", "Started", "Duration"], &rows);
    Ok(())
}

pub fn show(store: &Store, matches: &ArgMatches) -> Result<()> {
    let id = *matches.get_one::<i64>("id").unwrap();
    let playbook = store.get_playbook(id)?;

    let plays = query::plays(store, Some(id))?.len();
    let tasks = query::tasks(store, &TaskFilter { playbook: Some(id), play: None })?.len();
    let results =
        query::results(store, &ResultFilter { playbook: Some(id), ..Default::default() })?.len();
    let hosts = query::hosts(store, Some(id))?.len();

    println!("Playbook {}", playbook.id);
    println!("  Path:     {}", playbook.path);
    println!(
        "  Status:   {}",
        if playbook.completed { "complete" } else { "incomplete" }
    );
    println!("  Started:  {}", format_time(Some(playbook.started_at)));
    println!("  Ended:    {}", format_time(playbook.ended_at));
    println!("  Duration: {}", duration(playbook.started_at, playbook.ended_at));
    println!(
        "  Contains: {} plays, {} tasks, {} results, {} hosts",
        plays, tasks, results, hosts
    );
    Ok(())
}

pub fn delete(store: &Store, matches: &ArgMatches) -> Result<()> {
    let id = *matches.get_one::<i64>("id").unwrap();
    store.delete_playbook(id)?;
    info!("Playbook {} deleted", id);
    println!("Deleted playbook {} and all data recorded for it", id);
    Ok(())
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
    fn test_delete_cascades() {
        let store = Store::open_in_memory().unwrap();
        let run = FakeRun::record(&store).unwrap();
        let keep = FakeRun::record(&store).unwrap();

        let id = run.playbook.id.to_string();
        delete(&store, &leaf_matches(&["playback", "playbook", "delete", id.as_str()])).unwrap();

        assert!(store.get_playbook(run.playbook.id).unwrap_err().is_not_found());
        assert!(store.get_play(run.play.id).unwrap_err().is_not_found());
        assert!(store.get_task(run.task_ok.id).unwrap_err().is_not_found());
        assert!(store.get_host(run.hosts[0].id).unwrap_err().is_not_found());
        assert!(store.get_result(run.results[0].id).unwrap_err().is_not_found());
        assert!(store.get_file(run.file.id).unwrap_err().is_not_found());
        assert!(store.get_record(run.record.id).unwrap_err().is_not_found());

        // The other playbook is untouched.
        assert!(store.get_playbook(keep.playbook.id).is_ok());
        assert!(store.get_result(keep.results[0].id).is_ok());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = delete(&store, &leaf_matches(&["playback", "playbook", "delete", "7"]))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_show_missing_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err =
            show(&store, &leaf_matches(&["playback", "playbook", "show", "7"])).unwrap_err();
        assert!(err.is_not_found());
    }
}
