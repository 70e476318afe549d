//! Command-line argument parsing.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Extract {
        text: String,
    },
    Diagnose {
        text: String,
        age_group: Option<String>,
        gender: Option<String>,
    },
    Validate {
        cases: Option<PathBuf>,
    },
    FitModel {
        out: PathBuf,
    },
    Help,
}

pub const USAGE: &str = "\
Symptomatch: symptom-to-diagnosis matching engine

Usage: symptomatch <command> [args]

Commands:
  extract <text>                          Print symptoms found in text
  diagnose <text> [--age-group G] [--gender G]
                                          Print a ranked differential diagnosis
  validate [cases.csv]                    Check a case table and print its load report
  fit-model <out.json>                    Fit the naive Bayes model and save it as an artifact
  help                                    Show this help message

Environment:
  SYMPTOMATCH_CONFIG    config file (default symptomatch.json)
  RUST_LOG              log filter (default info), logs go to stderr";

/// Parse `args` without the program name.
pub fn parse(args: &[String]) -> Result<Command, String> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "extract" => Ok(Command::Extract {
            text: join_text(rest, "extract")?,
        }),
        "diagnose" => {
            let mut words = Vec::new();
            let mut age_group = None;
            let mut gender = None;
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--age-group" | "--gender" => {
                        let value = iter
                            .next()
                            .ok_or_else(|| format!("{} needs a value", arg))?
                            .clone();
                        if arg == "--age-group" {
                            age_group = Some(value);
                        } else {
                            gender = Some(value);
                        }
                    }
                    _ => words.push(arg.clone()),
                }
            }
            Ok(Command::Diagnose {
                text: join_text(&words, "diagnose")?,
                age_group,
                gender,
            })
        }
        "validate" | "--validate" => Ok(Command::Validate {
            cases: rest.first().map(PathBuf::from),
        }),
        "fit-model" => match rest.first() {
            Some(out) => Ok(Command::FitModel { out: PathBuf::from(out) }),
            None => Err("Usage: symptomatch fit-model <out.json>".into()),
        },
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(format!("Unknown command: {}. Use 'symptomatch help' for usage.", other)),
    }
}

fn join_text(words: &[String], command: &str) -> Result<String, String> {
    if words.is_empty() {
        return Err(format!("Usage: symptomatch {} <text>", command));
    }
    Ok(words.join(" "))
}
