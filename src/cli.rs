use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "swiftdown",
    version,
    about = "Read a serialized book chapter by chapter from the book API.",
    long_about = None
)]
pub struct Cli {
    /// Book id on the server
    #[clap(name = "BOOK_ID")]
    pub book_id: String,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE", default_value = "conf/config.toml")]
    pub config: PathBuf,

    /// Chapter to open first (1-based)
    #[clap(long, value_name = "N")]
    pub chapter: Option<usize>,

    /// Print every page of the chapter and exit
    #[clap(short, long)]
    pub dump: bool,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Filter directive implied by `-v`, if any.
    pub fn verbosity_filter(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_book_and_flags() {
        let cli = Cli::parse_from(["swiftdown", "1024", "--chapter", "3", "-vv"]);
        assert_eq!(cli.book_id, "1024");
        assert_eq!(cli.chapter, Some(3));
        assert_eq!(cli.config, PathBuf::from("conf/config.toml"));
        assert!(!cli.dump);
        assert_eq!(cli.verbosity_filter(), Some("trace"));
    }

    #[test]
    fn book_id_is_required() {
        assert!(Cli::try_parse_from(["swiftdown"]).is_err());
    }
}
