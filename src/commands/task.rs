use clap::ArgMatches;

use crate::error::Result;
use crate::query::{self, TaskFilter};
use crate::store::Store;

use super::{duration, format_time, print_table};

pub fn list(store: &Store, matches: &ArgMatches) -> Result<()> {
    let filter = TaskFilter {
        playbook: matches.get_one::<i64>("playbook").copied(),
        play: matches.get_one::<i64>("play").copied(),
    };
    let tasks = query::tasks(store, &filter)?;

    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.play_id.to_string(),
                t.name.clone(),
                t.action.clone(),
                format!("{}:{}", t.path, t.lineno),
            ]
        })
        .collect();
    print_table(&["ID", "Play", "Name", "Action", "Source"], &rows);
    Ok(())
}

pub fn show(store: &Store, matches: &ArgMatches) -> Result<()> {
    let id = *matches.get_one::<i64>("id").unwrap();
    let task = store.get_task(id)?;

    println!("Task {}", task.id);
    println!("  Name:     {}", task.name);
    println!("  Action:   {}", task.action);
    println!("  Source:   {}:{}", task.path, task.lineno);
    println!("  Play:     {}", task.play_id);
    println!("  Playbook: {}", task.playbook_id);
    println!("  Started:  {}", format_time(Some(task.started_at)));
    println!("  Duration: {}", duration(task.started_at, task.ended_at));
    Ok(())
}
