use std::path::PathBuf;

use clap::ArgMatches;

use crate::config::Config;
use crate::error::Result;
use crate::report;
use crate::store::Store;

pub fn html(store: &Store, matches: &ArgMatches, config: &Config) -> Result<()> {
    let dest = PathBuf::from(matches.get_one::<String>("destination").unwrap());
    let playbook = matches.get_one::<i64>("playbook").copied();
    report::html::generate(store, playbook, &dest, config)?;
    println!("HTML report generated at {}", dest.display());
    Ok(())
}

pub fn junit(store: &Store, matches: &ArgMatches, config: &Config) -> Result<()> {
    let path = PathBuf::from(matches.get_one::<String>("file").unwrap());
    let playbook = matches.get_one::<i64>("playbook").copied();
    report::junit::write(store, playbook, &path, config)?;
    println!("JUnit report written to {}", path.display());
    Ok(())
}

pub fn subunit(store: &Store, matches: &ArgMatches, config: &Config) -> Result<()> {
    let path = PathBuf::from(matches.get_one::<String>("file").unwrap());
    let playbook = matches.get_one::<i64>("playbook").copied();
    report::subunit::write(store, playbook, &path, config)?;
    println!("Subunit stream written to {}", path.display());
    Ok(())
}
