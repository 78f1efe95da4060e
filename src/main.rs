extern crate clap;

use std::fs::File;
use std::io::prelude::*;
use std::io::stdin;
use std::process;

use clap::{App, Arg};
use log::info;

use enum_spanner_rs::mapping::IndexedDag;
use enum_spanner_rs::{compile, Match, SpannerEnumerator};

#[derive(PartialEq, Eq)]
enum DisplayFormat {
    /// Print only the number of matches.
    Count,
    /// Print only the text of the overall match span, one per line.
    OnlyMatching,
    /// Print only named-group spans/text, skipping the overall match.
    OnlyGroups,
    /// Run the enumeration without printing anything.
    NoPrint,
    /// Human-readable format: overall match plus every group.
    Verbose,
}

fn main() {
    //  ____
    // |  _ \ __ _ _ __ ___  ___ _ __
    // | |_) / _` | '__/ __|/ _ \ '__|
    // |  __/ (_| | |  \__ \  __/ |
    // |_|   \__,_|_|  |___/\___|_|
    //
    let matches = App::new("enum-spanner-rs")
        .version("0.1")
        .author("Rémi Dupré <remi.dupre@ens-paris-saclay.fr>\n\
		         Matthias Niewerth <matthias.niewerth@uni-bayreuth.de>")
        .about("Enumerate all matches of a regular document spanner on a text.")
        .arg(
            Arg::with_name("regex")
                .help("The pattern to look for.")
                .required(true),
        )
        .arg(Arg::with_name("file").help("The file to be read, if none is specified, STDIN is used."))
        .arg(
            Arg::with_name("byte_offset")
                .short("b")
                .long("byte-offset")
                .help("Print byte offsets instead of matched text for the overall span and every group."),
        )
        .arg(
            Arg::with_name("count")
                .short("c")
                .long("count")
                .help("Print only the number of matches."),
        )
        .arg(
            Arg::with_name("only_matching")
                .short("o")
                .long("only-matching")
                .help("Print only the text of the overall match span, one per line."),
        )
        .arg(
            Arg::with_name("only_groups")
                .short("O")
                .long("only-groups")
                .help("Print only named-group spans/text, skipping the overall match."),
        )
        .arg(
            Arg::with_name("no_print")
                .short("p")
                .long("no-print")
                .help("Run the enumeration without printing anything. Takes priority over -c/-o/-O."),
        )
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .help("Raise the log level to debug, overriding RUST_LOG."),
        )
        .arg(
            Arg::with_name("no_debug")
                .long("no-debug")
                .conflicts_with("debug")
                .help("Silence logging entirely, overriding RUST_LOG."),
        )
        .arg(
            Arg::with_name("show_automata")
                .long("show-automata")
                .help("Dump the compiled automaton as Graphviz DOT to stdout before matching."),
        )
        .arg(
            Arg::with_name("show_dag")
                .long("show-dag")
                .help("Dump a textual summary of the built indexed DAG to stderr."),
        )
        .get_matches();

    let mut logger = env_logger::Builder::from_default_env();
    if matches.is_present("debug") {
        logger.filter_level(log::LevelFilter::Debug);
    } else if matches.is_present("no_debug") {
        logger.filter_level(log::LevelFilter::Off);
    }
    logger.init();

    let display_format = if matches.is_present("no_print") {
        DisplayFormat::NoPrint
    } else if matches.is_present("count") {
        DisplayFormat::Count
    } else if matches.is_present("only_matching") {
        DisplayFormat::OnlyMatching
    } else if matches.is_present("only_groups") {
        DisplayFormat::OnlyGroups
    } else {
        DisplayFormat::Verbose
    };

    let byte_offset = matches.is_present("byte_offset");

    //  ___                   _
    // |_ _|_ __  _ __  _   _| |_ ___
    //  | || '_ \| '_ \| | | | __/ __|
    //  | || | | | |_) | |_| | |_\__ \
    // |___|_| |_| .__/ \__,_|\__|___/
    //           |_|

    let regex_str = matches.value_of("regex").unwrap();

    let mut text = String::new();
    let read_result = match matches.value_of("file") {
        Some(filename) => File::open(filename).and_then(|mut file| file.read_to_string(&mut text)),
        None => stdin().read_to_string(&mut text),
    };

    if let Err(err) = read_result {
        eprintln!("could not read input: {}", err);
        process::exit(1);
    }

    while text.as_bytes().last() == Some(&b'\n') {
        text.pop();
    }

    //  __  __       _       _
    // |  \/  | __ _| |_ ___| |__
    // | |\/| |/ _` | __/ __| '_ \
    // | |  | | (_| | || (__| | | |
    // |_|  |_|\__,_|\__\___|_| |_|
    //

    let va = match compile(regex_str) {
        Ok(va) => va,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    if matches.is_present("show_automata") {
        print!("{}", va.to_dot());
    }

    info!(
        "compiled pattern into an automaton with {} states over a document of {} bytes",
        va.num_states(),
        text.len()
    );

    let mut indexed_dag = IndexedDag::new(&va, &text);
    indexed_dag.preprocess();

    if matches.is_present("show_dag") {
        match indexed_dag.debug_summary() {
            Some((counts, nb_reach_matrices)) => {
                eprintln!("levels: {}", counts.len());
                for (level, count) in counts.iter().enumerate() {
                    eprintln!("  level {}: {} vertices", level, count);
                }
                eprintln!("live reach matrices: {}", nb_reach_matrices);
            }
            None => eprintln!("indexed DAG is empty"),
        }
    }

    let match_iter = indexed_dag.iter().map(Match::from);

    handle_matches(match_iter, display_format, byte_offset);

    process::exit(0);
}

fn handle_matches<'t>(matches: impl Iterator<Item = Match<'t>>, display_format: DisplayFormat, byte_offset: bool) {
    match display_format {
        DisplayFormat::Count => {
            let count = matches.count();
            println!("{}", count);
        }
        DisplayFormat::NoPrint => {
            for _ in matches {}
        }
        DisplayFormat::OnlyMatching => {
            for m in matches {
                if byte_offset {
                    println!("{},{}", m.span.start, m.span.end);
                } else {
                    println!("{}", &m.document[m.span.clone()]);
                }
            }
        }
        DisplayFormat::OnlyGroups => {
            for m in matches {
                for (name, range) in &m.group_spans {
                    if byte_offset {
                        print!(" {}:{},{}", name, range.start, range.end);
                    } else {
                        print!(" {}:{:?}", name, &m.document[range.clone()]);
                    }
                }
                println!();
            }
        }
        DisplayFormat::Verbose => {
            for (count, m) in matches.enumerate() {
                print!("{} -", count + 1);

                if byte_offset {
                    print!(" match:{},{}", m.span.start, m.span.end);
                    for (name, range) in &m.group_spans {
                        print!(" {}:{},{}", name, range.start, range.end);
                    }
                } else {
                    print!(" match:{:?}", &m.document[m.span.clone()]);
                    for (name, range) in &m.group_spans {
                        print!(" {}:{:?}", name, &m.document[range.clone()]);
                    }
                }

                println!();
            }
        }
    }
}
