use clap::{value_parser, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("playback")
        .about("Record and report on Ansible-compatible playbook runs")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase verbosity (up to -vvv)"),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .global(true)
                .value_name("PATH")
                .help("Run database to use (default: the platform data directory)"),
        )
        .subcommand(playbook_cmd())
        .subcommand(play_cmd())
        .subcommand(task_cmd())
        .subcommand(host_cmd())
        .subcommand(result_cmd())
        .subcommand(record_cmd())
        .subcommand(generate_cmd())
}

fn playbook_cmd() -> Command {
    Command::new("playbook")
        .about("Query and manage recorded playbooks")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List recorded playbooks")
                .arg(
                    Arg::new("complete")
                        .long("complete")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("incomplete")
                        .help("Only show completed playbooks"),
                )
                .arg(
                    Arg::new("incomplete")
                        .long("incomplete")
                        .action(ArgAction::SetTrue)
                        .help("Only show playbooks that never completed"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show one playbook")
                .arg(id_arg("Playbook id")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a playbook and everything recorded for it")
                .arg(id_arg("Playbook id")),
        )
}

fn play_cmd() -> Command {
    Command::new("play")
        .about("Query recorded plays")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List plays")
                .arg(all_flag())
                .arg(playbook_flag()),
        )
        .subcommand(Command::new("show").about("Show one play").arg(id_arg("Play id")))
}

fn task_cmd() -> Command {
    Command::new("task")
        .about("Query recorded tasks")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List tasks")
                .arg(all_flag())
                .arg(playbook_flag())
                .arg(
                    Arg::new("play")
                        .long("play")
                        .value_name("ID")
                        .value_parser(value_parser!(i64))
                        .help("Restrict to one play"),
                ),
        )
        .subcommand(Command::new("show").about("Show one task").arg(id_arg("Task id")))
}

fn host_cmd() -> Command {
    Command::new("host")
        .about("Query recorded hosts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List hosts")
                .arg(all_flag())
                .arg(playbook_flag()),
        )
        .subcommand(
            Command::new("show")
                .about("Show one host, by id or by name within a playbook")
                .arg(
                    Arg::new("host")
                        .help("Host id, or host name when --playbook is given")
                        .required(true)
                        .index(1),
                )
                .arg(playbook_flag())
                .arg(long_flag("Include recorded host facts")),
        )
}

fn result_cmd() -> Command {
    Command::new("result")
        .about("Query recorded task results")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List results")
                .arg(all_flag())
                .arg(playbook_flag())
                .arg(
                    Arg::new("play")
                        .long("play")
                        .value_name("ID")
                        .value_parser(value_parser!(i64))
                        .help("Restrict to one play"),
                )
                .arg(
                    Arg::new("task")
                        .long("task")
                        .value_name("ID")
                        .value_parser(value_parser!(i64))
                        .help("Restrict to one task"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show one result")
                .arg(id_arg("Result id"))
                .arg(long_flag("Include the full module output")),
        )
}

fn record_cmd() -> Command {
    Command::new("record")
        .about("Query key/value records saved against playbooks")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List records")
                .arg(all_flag())
                .arg(playbook_flag()),
        )
        .subcommand(
            Command::new("show")
                .about("Show one record, by id or by key within a playbook")
                .arg(
                    Arg::new("record")
                        .help("Record id, or record key when --playbook is given")
                        .required(true)
                        .index(1),
                )
                .arg(playbook_flag())
                .arg(long_flag("Include the full record value")),
        )
}

fn generate_cmd() -> Command {
    Command::new("generate")
        .about("Generate reports from recorded runs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("html")
                .about("Generate a static HTML report site")
                .arg(
                    Arg::new("destination")
                        .help("Directory to generate the report into")
                        .required(true)
                        .index(1),
                )
                .arg(playbook_flag()),
        )
        .subcommand(
            Command::new("junit")
                .about("Generate a JUnit XML report")
                .arg(
                    Arg::new("file")
                        .help("File to write the XML document to")
                        .required(true)
                        .index(1),
                )
                .arg(playbook_flag()),
        )
        .subcommand(
            Command::new("subunit")
                .about("Generate a subunit v2 stream")
                .arg(
                    Arg::new("file")
                        .help("File to write the binary stream to")
                        .required(true)
                        .index(1),
                )
                .arg(playbook_flag()),
        )
}

fn id_arg(help: &'static str) -> Arg {
    Arg::new("id")
        .help(help)
        .required(true)
        .index(1)
        .value_parser(value_parser!(i64))
}

fn all_flag() -> Arg {
    Arg::new("all")
        .short('a')
        .long("all")
        .action(ArgAction::SetTrue)
        .help("List across every playbook")
}

fn playbook_flag() -> Arg {
    Arg::new("playbook")
        .short('b')
        .long("playbook")
        .value_name("ID")
        .value_parser(value_parser!(i64))
        .help("Restrict to one playbook")
}

fn long_flag(help: &'static str) -> Arg {
    Arg::new("long").long("long").action(ArgAction::SetTrue).help(help)
}

#[cfg(test)]
mod tests {
    use super::build_cli;

    #[test]
    fn test_build_cli_subcommands() {
        let cmd = build_cli();
        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        for name in ["playbook", "play", "task", "host", "result", "record", "generate"] {
            assert!(subcommands.contains(&name), "missing subcommand {}", name);
        }
    }

    #[test]
    fn test_generate_html_requires_destination() {
        let cmd = build_cli();
        let result = cmd.try_get_matches_from(["playback", "generate", "html"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_playbook_completion_flags_conflict() {
        let cmd = build_cli();
        let result = cmd.try_get_matches_from(
            ["playback", "playbook", "list", "--complete", "--incomplete"],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_result_list_filters_parse() {
        let cmd = build_cli();
        let matches = cmd
            .try_get_matches_from(["playback", "result", "list", "-b", "3", "--task", "7"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let (_, list) = sub.subcommand().unwrap();
        assert_eq!(list.get_one::<i64>("playbook"), Some(&3));
        assert_eq!(list.get_one::<i64>("task"), Some(&7));
    }
}
