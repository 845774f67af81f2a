use crate::cli::{Commands, OutputFormat};
use crate::handle::Priority;
use crate::target::classify::{ClassifyTarget, NAME};
use crate::target::registry::TargetRegistry;
use crate::target::{Family, OptionParser, Target, TargetEntry};
use crate::{ClassifyError, Result};
use std::io::Write;
use tracing::{debug, info};

pub fn handle_command(command: Commands, out: &mut dyn Write) -> Result<()> {
    let registry = TargetRegistry::with_builtin()?;

    match command {
        Commands::Parse {
            family,
            numeric,
            args,
        } => handle_parse(&registry, family, numeric, &args, out),
        Commands::Decode { numeric, handle } => handle_decode(&registry, numeric, &handle, out),
        Commands::Options { family } => registry.find(NAME, family)?.help(out),
        Commands::Targets { format } => handle_targets(&registry, format, out),
    }
}

fn handle_parse(
    registry: &TargetRegistry,
    family: Family,
    numeric: bool,
    args: &[String],
    out: &mut dyn Write,
) -> Result<()> {
    let target = registry.find(NAME, family)?;
    info!("Parsing {} options for {}", target.name(), family);

    let entry = OptionParser::new(target).parse_args(args)?;
    render_entry(target, &entry, numeric, out)
}

fn handle_decode(
    registry: &TargetRegistry,
    numeric: bool,
    handle: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let raw = parse_raw_handle(handle)?;
    debug!("Decoding handle {:#010x}", raw);

    let target = registry.find(NAME, Family::Ipv4)?;
    let mut entry = TargetEntry::new(target);
    ClassifyTarget::set_priority(&mut entry, Priority::from_raw(raw))?;

    target.print(&entry, numeric, out)?;
    writeln!(out)?;
    target.save(&entry, out)?;
    writeln!(out)?;
    Ok(())
}

fn handle_targets(
    registry: &TargetRegistry,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let summaries = registry.summaries();

    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&summaries)
                .map_err(|e| ClassifyError::SerializeError(e.to_string()))?;
            writeln!(out, "{}", text)?;
        }
        OutputFormat::Yaml => {
            let text = serde_yaml::to_string(&summaries)
                .map_err(|e| ClassifyError::SerializeError(e.to_string()))?;
            write!(out, "{}", text)?;
        }
        OutputFormat::Text => {
            writeln!(
                out,
                "{:<12} {:<6} {:>3} {:>4} {:>9} OPTIONS",
                "NAME", "FAMILY", "AF", "SIZE", "USERSPACE"
            )?;
            for s in summaries {
                writeln!(
                    out,
                    "{:<12} {:<6} {:>3} {:>4} {:>9} {}",
                    s.name,
                    s.family,
                    s.af,
                    s.size,
                    s.userspace_size,
                    s.options.join(" ")
                )?;
            }
        }
    }
    Ok(())
}

/// Print form, save form and payload bytes, one per line
fn render_entry(
    target: &dyn Target,
    entry: &TargetEntry,
    numeric: bool,
    out: &mut dyn Write,
) -> Result<()> {
    target.print(entry, numeric, out)?;
    writeln!(out)?;
    target.save(entry, out)?;
    writeln!(out)?;

    let bytes: Vec<String> = entry.data().iter().map(|b| format!("{:02x}", b)).collect();
    writeln!(
        out,
        "payload: {} (priority {:#010x})",
        bytes.join(" "),
        ClassifyTarget::priority(entry)?.raw()
    )?;
    Ok(())
}

fn parse_raw_handle(s: &str) -> Result<u32> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|_| ClassifyError::BadHandle(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(command: Commands) -> Result<String> {
        let mut out: Vec<u8> = Vec::new();
        handle_command(command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_command() {
        let text = run(Commands::Parse {
            family: Family::Ipv6,
            numeric: false,
            args: vec!["--set-class".to_string(), "1:a".to_string()],
        })
        .unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "CLASSIFY set 1:a ");
        assert_eq!(lines[1], "--set-class 0001:000a ");
        assert!(lines[2].ends_with("(priority 0x0001000a)"));
    }

    #[test]
    fn test_parse_command_requires_set_class() {
        let err = run(Commands::Parse {
            family: Family::Ipv4,
            numeric: true,
            args: Vec::new(),
        })
        .unwrap_err();
        assert_eq!(err.exit_status().code(), 2);
    }

    #[test]
    fn test_decode_command() {
        let text = run(Commands::Decode {
            numeric: false,
            handle: "0x00100001".to_string(),
        })
        .unwrap();
        assert_eq!(text, "CLASSIFY set 10:1 \n--set-class 0010:0001 \n");

        let text = run(Commands::Decode {
            numeric: false,
            handle: "65537".to_string(),
        })
        .unwrap();
        assert!(text.starts_with("CLASSIFY set 1:1 "));
    }

    #[test]
    fn test_raw_handle_errors() {
        assert_eq!(parse_raw_handle(" 0xFFFFFFFF ").unwrap(), u32::MAX);
        assert!(matches!(
            parse_raw_handle("0x1_0000_0000"),
            Err(ClassifyError::BadHandle(_))
        ));
        assert!(parse_raw_handle("1:1").is_err());
    }

    #[test]
    fn test_targets_command() {
        let text = run(Commands::Targets {
            format: OutputFormat::Json,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["name"], "CLASSIFY");
        assert_eq!(value[0]["family"], "ipv4");
        assert_eq!(value[1]["family"], "ipv6");
        assert_eq!(value[1]["size"], 8);
        assert_eq!(value[1]["af"], 10);

        let text = run(Commands::Targets {
            format: OutputFormat::Text,
        })
        .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("CLASSIFY     ipv6    10    8         8"));
    }
}
