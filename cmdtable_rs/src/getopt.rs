//! GNU-style argv tokenizer.
//!
//! Splits an argument list into flag occurrences and positional tokens:
//!
//! - short flags cluster (`-dv`), values attach (`-l0.0.0.0`) or follow (`-l 0.0.0.0`)
//! - long flags take `--name=value` or `--name value`
//! - long flags may be abbreviated to any unique prefix (`--pi` -> `--pid-file`)
//! - positional tokens may be interspersed with flags
//! - `--` ends flag processing; a lone `-` is positional
//!
//! Positional tokens keep their index in the input so callers can remove
//! exactly the token they picked.

use crate::error::OptionError;
use crate::option::OptSpec;

/// Flag names known to the tokenizer and whether each one takes a value.
#[derive(Debug, Clone, Default)]
pub struct FlagTable {
    shorts: Vec<(char, bool)>,
    longs: Vec<(String, bool)>,
}

impl FlagTable {
    pub fn from_options(options: &[OptSpec]) -> Self {
        let mut table = FlagTable::default();
        for option in options {
            let takes = option.kind().takes_value();
            if let Some(c) = option.short() {
                table.shorts.push((c, takes));
            }
            table.longs.push((option.long().to_string(), takes));
        }
        table
    }

    fn short(&self, c: char) -> Option<bool> {
        self.shorts
            .iter()
            .find(|(name, _)| *name == c)
            .map(|(_, takes)| *takes)
    }

    /// Resolve a (possibly abbreviated) long name: exact match first, then a unique prefix.
    fn long(&self, typed: &str, index: usize) -> Result<(&str, bool), OptionError> {
        let possible: Vec<&(String, bool)> = self
            .longs
            .iter()
            .filter(|(name, _)| name.starts_with(typed))
            .collect();
        if let Some(exact) = possible.iter().copied().find(|(name, _)| name == typed) {
            return Ok((exact.0.as_str(), exact.1));
        }
        match possible.len() {
            0 => Err(OptionError::LongNotRecognized {
                opt: typed.to_string(),
                index,
            }),
            1 => {
                let only = possible[0];
                Ok((only.0.as_str(), only.1))
            }
            _ => Err(OptionError::NotUniquePrefix {
                opt: typed.to_string(),
                index,
            }),
        }
    }
}

/// One flag occurrence: canonical form (`-l` or `--listen`) and its attached value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub flag: String,
    pub value: Option<String>,
}

/// A non-flag token and its index in the tokenized input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positional {
    pub index: usize,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    pub occurrences: Vec<Occurrence>,
    pub positional: Vec<Positional>,
}

impl Tokens {
    pub fn positional_values(&self) -> Vec<String> {
        self.positional.iter().map(|p| p.value.clone()).collect()
    }
}

/// Tokenize `args` against `table`.
pub fn gnu_getopt(args: &[String], table: &FlagTable) -> Result<Tokens, OptionError> {
    let mut tokens = Tokens::default();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if arg == "--" {
            tokens
                .positional
                .extend(args.iter().enumerate().skip(i + 1).map(|(index, value)| {
                    Positional {
                        index,
                        value: value.clone(),
                    }
                }));
            break;
        }

        if let Some(body) = arg.strip_prefix("--") {
            let flag_index = i;
            let (typed, attached) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (body, None),
            };
            let (name, takes) = table.long(typed, flag_index)?;
            let value = if takes {
                match attached {
                    Some(value) => Some(value),
                    None => {
                        i += 1;
                        let next = args.get(i).ok_or_else(|| OptionError::LongRequiresArgument {
                            opt: name.to_string(),
                            index: flag_index,
                        })?;
                        Some(next.clone())
                    }
                }
            } else {
                if attached.is_some() {
                    return Err(OptionError::LongTakesNoArgument {
                        opt: name.to_string(),
                        index: flag_index,
                    });
                }
                None
            };
            tokens.occurrences.push(Occurrence {
                flag: format!("--{name}"),
                value,
            });
        } else if arg.len() > 1 && arg.starts_with('-') {
            let flag_index = i;
            let cluster: Vec<char> = arg[1..].chars().collect();
            let mut k = 0;
            while k < cluster.len() {
                let c = cluster[k];
                let takes = table.short(c).ok_or(OptionError::ShortNotRecognized {
                    opt: c,
                    index: flag_index,
                })?;
                if takes {
                    let rest: String = cluster[k + 1..].iter().collect();
                    let value = if rest.is_empty() {
                        i += 1;
                        args.get(i)
                            .cloned()
                            .ok_or(OptionError::ShortRequiresArgument {
                                opt: c,
                                index: flag_index,
                            })?
                    } else {
                        rest
                    };
                    tokens.occurrences.push(Occurrence {
                        flag: format!("-{c}"),
                        value: Some(value),
                    });
                    break;
                }
                tokens.occurrences.push(Occurrence {
                    flag: format!("-{c}"),
                    value: None,
                });
                k += 1;
            }
        } else {
            tokens.positional.push(Positional {
                index: i,
                value: arg.clone(),
            });
        }

        i += 1;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::OptionKind;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> FlagTable {
        FlagTable::from_options(&[
            OptSpec::new("l", "listen", OptionKind::text("localhost"), ""),
            OptSpec::new("p", "port", OptionKind::Int(8000), ""),
            OptSpec::new("d", "daemonize", OptionKind::Flag(false), ""),
            OptSpec::new("", "pid-file", OptionKind::text(""), ""),
            OptSpec::new("", "pidless", OptionKind::Flag(false), ""),
        ])
    }

    fn occ(flag: &str, value: Option<&str>) -> Occurrence {
        Occurrence {
            flag: flag.to_string(),
            value: value.map(str::to_string),
        }
    }

    #[test]
    fn test_interspersed_positionals() {
        let tokens = gnu_getopt(&args(&["a", "-d", "b", "--port", "1", "c"]), &table()).unwrap();
        assert_eq!(tokens.positional_values(), vec!["a", "b", "c"]);
        assert_eq!(tokens.positional[1].index, 2);
        assert_eq!(
            tokens.occurrences,
            vec![occ("-d", None), occ("--port", Some("1"))]
        );
    }

    #[test]
    fn test_short_cluster_with_attached_value() {
        let tokens = gnu_getopt(&args(&["-dl0.0.0.0"]), &table()).unwrap();
        assert_eq!(
            tokens.occurrences,
            vec![occ("-d", None), occ("-l", Some("0.0.0.0"))]
        );
    }

    #[test]
    fn test_long_with_equals_and_unique_prefix() {
        let tokens = gnu_getopt(&args(&["--lis=x", "--pid-f", "y"]), &table()).unwrap();
        assert_eq!(
            tokens.occurrences,
            vec![occ("--listen", Some("x")), occ("--pid-file", Some("y"))]
        );
    }

    #[test]
    fn test_ambiguous_prefix() {
        let err = gnu_getopt(&args(&["x", "--pid"]), &table()).unwrap_err();
        assert_eq!(
            err,
            OptionError::NotUniquePrefix {
                opt: "pid".into(),
                index: 1
            }
        );
    }

    #[test]
    fn test_exact_name_beats_longer_prefix_match() {
        let table = FlagTable::from_options(&[
            OptSpec::new("", "all", OptionKind::Flag(false), ""),
            OptSpec::new("", "all-files", OptionKind::Flag(false), ""),
        ]);
        let tokens = gnu_getopt(&args(&["--all"]), &table).unwrap();
        assert_eq!(tokens.occurrences, vec![occ("--all", None)]);
    }

    #[test]
    fn test_double_dash_terminates() {
        let tokens = gnu_getopt(&args(&["-d", "--", "-p", "--port"]), &table()).unwrap();
        assert_eq!(tokens.positional_values(), vec!["-p", "--port"]);
        assert_eq!(tokens.positional[0].index, 2);
    }

    #[test]
    fn test_lone_dash_is_positional() {
        let tokens = gnu_getopt(&args(&["-"]), &table()).unwrap();
        assert_eq!(tokens.positional_values(), vec!["-"]);
    }

    #[test]
    fn test_errors_carry_token_index() {
        let err = gnu_getopt(&args(&["a", "-x"]), &table()).unwrap_err();
        assert_eq!(err, OptionError::ShortNotRecognized { opt: 'x', index: 1 });

        let err = gnu_getopt(&args(&["--port"]), &table()).unwrap_err();
        assert_eq!(
            err,
            OptionError::LongRequiresArgument {
                opt: "port".into(),
                index: 0
            }
        );

        let err = gnu_getopt(&args(&["-p"]), &table()).unwrap_err();
        assert_eq!(err, OptionError::ShortRequiresArgument { opt: 'p', index: 0 });

        let err = gnu_getopt(&args(&["--daemonize=yes"]), &table()).unwrap_err();
        assert_eq!(err.to_string(), "option --daemonize must not have an argument");

        let err = gnu_getopt(&args(&["--nope"]), &table()).unwrap_err();
        assert_eq!(err.to_string(), "option --nope not recognized");
    }

    #[test]
    fn test_value_may_look_like_a_flag() {
        let tokens = gnu_getopt(&args(&["-l", "-d"]), &table()).unwrap();
        assert_eq!(tokens.occurrences, vec![occ("-l", Some("-d"))]);
    }
}
