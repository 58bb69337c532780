use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitereel")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitereel")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(with_exploration_args(
            command!("explore").about("Explore a site and report its navigation graph"),
        ))
        .subcommand(with_exploration_args(
            command!("plan")
                .about("Explore a site and emit a timed demo-reel plan for a recorder")
                .arg(
                    arg!(--"duration" <SECONDS>)
                        .required(false)
                        .help("Total recording budget in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("60"),
                )
                .arg(
                    arg!(--"min-page" <SECONDS>)
                        .required(false)
                        .help("Minimum dwell time per page in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"max-page" <SECONDS>)
                        .required(false)
                        .help("Maximum dwell time per page in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("15"),
                )
                .arg(
                    arg!(--"transition" <MILLIS>)
                        .required(false)
                        .help("Gap reserved between pages in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("1500"),
                )
                .arg(
                    arg!(--"style" <STYLE>)
                        .required(false)
                        .help("Narrative voice for seed text")
                        .value_parser(["professional", "casual", "technical"])
                        .default_value("professional"),
                )
                .arg(
                    arg!(--"narrative")
                        .required(false)
                        .help("Attach narrative seed text to each page")
                        .action(clap::ArgAction::SetTrue),
                ),
        ))
}

/// Arguments shared by every command that runs an exploration.
fn with_exploration_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-u --"url" <URL>)
            .required(true)
            .help("The URL to start exploring from"),
    )
    .arg(
        arg!(-p --"max-pages" <N>)
            .required(false)
            .help("Ceiling on discovered states")
            .value_parser(clap::value_parser!(usize))
            .default_value("20"),
    )
    .arg(
        arg!(-d --"max-depth" <N>)
            .required(false)
            .help("Maximum link depth from the start page")
            .value_parser(clap::value_parser!(usize))
            .default_value("3"),
    )
    .arg(
        arg!(-s --"strategy" <STRATEGY>)
            .required(false)
            .help("Link-selection policy")
            .value_parser(["breadth", "depth", "priority", "ai"])
            .default_value("priority"),
    )
    .arg(
        arg!(--"focus" <TOPIC>)
            .required(false)
            .help("Bias exploration toward links mentioning this topic"),
    )
    .arg(
        arg!(--"flat")
            .required(false)
            .help("Legacy mode: homepage plus top-ranked pages, no recursion")
            .action(clap::ArgAction::SetTrue),
    )
    .arg(
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Per-request timeout in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("10"),
    )
    .arg(
        arg!(-f --"format" <FORMAT>)
            .required(false)
            .help("Report format")
            .value_parser(["text", "json", "markdown", "mermaid"])
            .default_value("text"),
    )
    .arg(
        arg!(-o --"output" <PATH>)
            .required(false)
            .help("Save the report to a file (default: print to screen)"),
    )
}
