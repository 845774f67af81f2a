pub mod commands;

use crate::target::Family;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "xt-classify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLASSIFY firewall target: parse, print and save --set-class", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Parse target options the way the firewall tool would")]
    Parse {
        #[arg(short, long, default_value = "ipv4", help = "Address family (ipv4, ipv6)")]
        family: Family,

        #[arg(short, long, help = "Numeric output")]
        numeric: bool,

        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            help = "Target options, e.g. -- --set-class 1:10"
        )]
        args: Vec<String>,
    },
    #[command(about = "Render a raw 32-bit priority handle")]
    Decode {
        #[arg(short, long, help = "Numeric output")]
        numeric: bool,

        #[arg(help = "Handle as 0x-prefixed hex or decimal")]
        handle: String,
    },
    #[command(about = "Show the target's option help")]
    Options {
        #[arg(short, long, default_value = "ipv4", help = "Address family (ipv4, ipv6)")]
        family: Family,
    },
    #[command(about = "List registered target descriptors")]
    Targets {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, help = "Output format")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}
