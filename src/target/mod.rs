pub mod classify;
pub mod registry;

use crate::{ClassifyError, Result};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, Command};
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;
use tracing::debug;

/// Address family a target descriptor is registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Family::Ipv4 => "ipv4",
            Family::Ipv6 => "ipv6",
        }
    }

    /// `AF_INET` / `AF_INET6`
    pub const fn af(&self) -> u8 {
        match self {
            Family::Ipv4 => 2,
            Family::Ipv6 => 10,
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ipv4" | "inet" | "4" => Ok(Family::Ipv4),
            "ipv6" | "inet6" | "6" => Ok(Family::Ipv6),
            other => Err(format!("unknown family `{}' (use ipv4 or ipv6)", other)),
        }
    }
}

/// A long option a target understands, `getopt_long` style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub has_arg: bool,
    pub id: char,
}

/// One rule's instance of a target: its payload and the option flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    name: String,
    family: Family,
    data: Vec<u8>,
    pub flags: u32,
}

impl TargetEntry {
    /// Allocate a zeroed payload of the descriptor's size
    pub fn new(target: &dyn Target) -> Self {
        Self {
            name: target.name().to_string(),
            family: target.family(),
            data: vec![0; target.size()],
            flags: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Extension interface the host drives for every rule using a target
pub trait Target: Send + Sync {
    fn name(&self) -> &str;

    fn family(&self) -> Family;

    fn version(&self) -> &str;

    /// Payload size in the kernel blob
    fn size(&self) -> usize;

    /// Leading part of the payload compared when matching rules
    fn userspace_size(&self) -> usize;

    fn options(&self) -> &[OptionSpec];

    fn help(&self, out: &mut dyn Write) -> Result<()>;

    fn init(&self, _entry: &mut TargetEntry) {}

    /// Handle one option. Returns `Ok(false)` if `id` is not ours.
    fn parse(&self, id: char, arg: Option<&str>, entry: &mut TargetEntry) -> Result<bool>;

    fn final_check(&self, flags: u32) -> Result<()>;

    fn print(&self, entry: &TargetEntry, numeric: bool, out: &mut dyn Write) -> Result<()>;

    fn save(&self, entry: &TargetEntry, out: &mut dyn Write) -> Result<()>;
}

/// Host-side option scanner feeding a target's `parse`/`final_check`
///
/// Scans like `getopt_long`: `--name VALUE`, `--name=VALUE`, unique
/// abbreviations, and `--` ends the scan.
pub struct OptionParser<'a> {
    target: &'a dyn Target,
}

const TRAILING: &str = "__trailing";

impl<'a> OptionParser<'a> {
    pub fn new(target: &'a dyn Target) -> Self {
        Self { target }
    }

    fn command(&self) -> Command {
        let cmd = Command::new("target-options")
            .no_binary_name(true)
            .infer_long_args(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .arg(
                Arg::new(TRAILING)
                    .num_args(1..)
                    .last(true)
                    .hide(true)
                    .action(ArgAction::Append),
            );

        self.target.options().iter().fold(cmd, |cmd, o| {
            let arg = Arg::new(o.name).long(o.name);
            let arg = if o.has_arg {
                arg.num_args(1)
                    .allow_hyphen_values(true)
                    .action(ArgAction::Append)
            } else {
                arg.action(ArgAction::Count)
            };
            cmd.arg(arg)
        })
    }

    /// Run a full argument vector through the target and finalize it
    pub fn parse_args<I, S>(&self, args: I) -> Result<TargetEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let matches = self
            .command()
            .try_get_matches_from(args.into_iter().map(|a| a.as_ref().to_string()))
            .map_err(|e| self.scan_error(e))?;

        // every occurrence, in command-line order
        let mut occurrences: Vec<(usize, &OptionSpec, Option<String>)> = Vec::new();
        for spec in self.target.options() {
            let Some(indices) = matches.indices_of(spec.name) else {
                continue;
            };
            if spec.has_arg {
                let values = matches
                    .get_many::<String>(spec.name)
                    .into_iter()
                    .flatten()
                    .cloned();
                occurrences.extend(indices.zip(values).map(|(i, v)| (i, spec, Some(v))));
            } else {
                occurrences.extend(indices.map(|i| (i, spec, None)));
            }
        }
        occurrences.sort_by_key(|(index, _, _)| *index);

        if let Some(rest) = matches.get_many::<String>(TRAILING) {
            debug!("{}: stopped at `--', {} args left", self.target.name(), rest.len());
        }

        let mut entry = TargetEntry::new(self.target);
        self.target.init(&mut entry);

        for (_, spec, value) in occurrences {
            debug!("{}: option --{} {:?}", self.target.name(), spec.name, value);

            if !self.target.parse(spec.id, value.as_deref(), &mut entry)? {
                return Err(ClassifyError::UnknownOption(format!("--{}", spec.name)));
            }
        }

        self.target.final_check(entry.flags)?;
        Ok(entry)
    }

    fn scan_error(&self, err: clap::Error) -> ClassifyError {
        let offending = match err.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(arg)) => arg.clone(),
            _ => String::new(),
        };

        match err.kind() {
            ErrorKind::InvalidValue | ErrorKind::TooFewValues | ErrorKind::WrongNumberOfValues => {
                // clap names the argument as `--name <name>`
                let name = self
                    .target
                    .options()
                    .iter()
                    .filter(|o| offending.starts_with(&format!("--{}", o.name)))
                    .max_by_key(|o| o.name.len())
                    .map(|o| o.name.to_string())
                    .unwrap_or(offending);
                ClassifyError::MissingArgument(name)
            }
            ErrorKind::UnknownArgument => {
                let prefix = offending
                    .strip_prefix("--")
                    .map(|body| body.split('=').next().unwrap_or(body))
                    .filter(|name| !name.is_empty());
                match prefix {
                    Some(name) if self.candidates(name) > 1 => {
                        ClassifyError::AmbiguousOption(name.to_string())
                    }
                    _ => ClassifyError::UnknownOption(offending),
                }
            }
            _ => ClassifyError::UnknownOption(offending),
        }
    }

    fn candidates(&self, prefix: &str) -> usize {
        self.target
            .options()
            .iter()
            .filter(|o| o.name.starts_with(prefix))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    const DUMMY_OPTS: &[OptionSpec] = &[
        OptionSpec {
            name: "set-mark",
            has_arg: true,
            id: 'm',
        },
        OptionSpec {
            name: "set-mask",
            has_arg: true,
            id: 'k',
        },
        OptionSpec {
            name: "verbose",
            has_arg: false,
            id: 'v',
        },
    ];

    impl Target for Dummy {
        fn name(&self) -> &str {
            "DUMMY"
        }
        fn family(&self) -> Family {
            Family::Ipv4
        }
        fn version(&self) -> &str {
            "0"
        }
        fn size(&self) -> usize {
            8
        }
        fn userspace_size(&self) -> usize {
            8
        }
        fn options(&self) -> &[OptionSpec] {
            DUMMY_OPTS
        }
        fn help(&self, _out: &mut dyn Write) -> Result<()> {
            Ok(())
        }
        fn parse(&self, id: char, arg: Option<&str>, entry: &mut TargetEntry) -> Result<bool> {
            match id {
                'm' | 'k' => {
                    entry.data_mut()[0] = arg.map(|a| a.len() as u8).unwrap_or(0);
                    entry.flags |= 1;
                }
                'v' => entry.flags |= 2,
                _ => return Ok(false),
            }
            Ok(true)
        }
        fn final_check(&self, _flags: u32) -> Result<()> {
            Ok(())
        }
        fn print(&self, _entry: &TargetEntry, _numeric: bool, _out: &mut dyn Write) -> Result<()> {
            Ok(())
        }
        fn save(&self, _entry: &TargetEntry, _out: &mut dyn Write) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_family_parse() {
        assert_eq!("IPv6".parse::<Family>(), Ok(Family::Ipv6));
        assert_eq!("inet".parse::<Family>(), Ok(Family::Ipv4));
        assert!("ipx".parse::<Family>().is_err());
        assert_eq!(Family::Ipv4.af(), 2);
        assert_eq!(Family::Ipv6.af(), 10);
    }

    #[test]
    fn test_inline_and_separate_values() {
        let parser = OptionParser::new(&Dummy);

        let entry = parser.parse_args(["--set-mark=abc"]).unwrap();
        assert_eq!(entry.data()[0], 3);

        let entry = parser.parse_args(["--set-mark", "abcd", "--verbose"]).unwrap();
        assert_eq!(entry.data()[0], 4);
        assert_eq!(entry.flags, 3);
    }

    #[test]
    fn test_abbreviations() {
        let parser = OptionParser::new(&Dummy);

        assert_eq!(parser.parse_args(["--verb"]).unwrap().flags, 2);
        assert!(matches!(
            parser.parse_args(["--set-ma", "x"]),
            Err(ClassifyError::AmbiguousOption(_))
        ));
        assert_eq!(parser.parse_args(["--set-mar", "x"]).unwrap().flags, 1);
    }

    #[test]
    fn test_scan_errors() {
        let parser = OptionParser::new(&Dummy);

        assert!(matches!(
            parser.parse_args(["--set-mark"]),
            Err(ClassifyError::MissingArgument(name)) if name == "set-mark"
        ));
        assert!(matches!(
            parser.parse_args(["--nope"]),
            Err(ClassifyError::UnknownOption(_))
        ));
        assert!(matches!(
            parser.parse_args(["set-mark"]),
            Err(ClassifyError::UnknownOption(_))
        ));
        let err = parser.parse_args(["--verbose=1"]).unwrap_err();
        assert_eq!(err.exit_status(), crate::ExitStatus::ParameterProblem);
    }

    #[test]
    fn test_double_dash_ends_scan() {
        let parser = OptionParser::new(&Dummy);

        let entry = parser
            .parse_args(["--set-mark", "a", "--", "--set-mark", "abcdef"])
            .unwrap();
        assert_eq!(entry.data()[0], 1);
        assert_eq!(entry.flags, 1);

        assert_eq!(parser.parse_args(["--"]).unwrap().flags, 0);
    }

    #[test]
    fn test_occurrences_keep_order() {
        let parser = OptionParser::new(&Dummy);

        // the last value given wins in the dummy payload
        let entry = parser
            .parse_args(["--set-mask=abcdef", "--verbose", "--set-mark", "ab"])
            .unwrap();
        assert_eq!(entry.data()[0], 2);

        let entry = parser
            .parse_args(["--set-mark", "ab", "--set-mask", "abcdef"])
            .unwrap();
        assert_eq!(entry.data()[0], 6);
    }
}
