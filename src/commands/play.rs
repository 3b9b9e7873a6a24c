use clap::ArgMatches;

use crate::error::Result;
use crate::query;
use crate::store::Store;

use super::{duration, format_time, print_table};

pub fn list(store: &Store, matches: &ArgMatches) -> Result<()> {
    let playbook = matches.get_one::<i64>("playbook").copied();
    let plays = query::plays(store, playbook)?;

    let rows: Vec<Vec<String>> = plays
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.playbook_id.to_string(),
                p.name.clone(),
                format_time(Some(p.started_at)),
                duration(p.started_at, p.ended_at),
            ]
        })
        .collect();
    print_table(&["ID", "Playbook", "Name", "Started", "Duration"], &rows);
    Ok(())
}

pub fn show(store: &Store, matches: &ArgMatches) -> Result<()> {
    let id = *matches.get_one::<i64>("id").unwrap();
    let play = store.get_play(id)?;

    println!("Play {}", play.id);
    println!("  Name:     {}", play.name);
    println!("  Playbook: {}", play.playbook_id);
    println!("  Started:  {}", format_time(Some(play.started_at)));
    println!("  Duration: {}", duration(play.started_at, play.ended_at));
    Ok(())
}
