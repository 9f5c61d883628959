pub mod commands;

use clap::Args;
use std::path::PathBuf;

use crate::config::LaunchOptions;

pub use commands::{format_stats, handle_serve, handle_stats};

/// Options shared by `annotate` and `adjudicate`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Language code of the documents (e.g. amh)
    pub lang: String,

    /// Directory holding the documents to annotate
    pub data: PathBuf,

    /// Hints file (tab separated text and hint)
    #[arg(short = 'd', long)]
    pub hints: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Extension of the document files
    #[arg(short, long = "ext")]
    pub extension: Option<String>,

    /// Comma separated entity tags
    #[arg(short, long)]
    pub tags: Option<String>,

    /// URL prefix when served behind a proxy
    #[arg(long)]
    pub prefix: Option<String>,

    /// Right-to-left script
    #[arg(long)]
    pub rtl: bool,

    /// Verbose request logging and template reloading
    #[arg(long)]
    pub debug: bool,
}

impl ServeArgs {
    pub fn into_options(
        self,
        output: Option<PathBuf>,
        annotation_dirs: Option<Vec<PathBuf>>,
    ) -> LaunchOptions {
        LaunchOptions {
            lang: self.lang,
            data: self.data,
            output,
            hints: self.hints,
            port: self.port,
            extension: self.extension,
            tags: self.tags,
            prefix: self.prefix,
            rtl: self.rtl,
            debug: self.debug,
            annotation_dirs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn test_flags_map_onto_launch_options() {
        let cli = TestCli::parse_from([
            "dragonfly", "amh", "data", "-p", "8000", "-e", "conll", "-t", "per,loc", "--rtl",
            "--prefix", "ner",
        ]);
        let options = cli.serve.into_options(None, None);

        assert_eq!(options.lang, "amh");
        assert_eq!(options.data, PathBuf::from("data"));
        assert_eq!(options.port, Some(8000));
        assert_eq!(options.extension.as_deref(), Some("conll"));
        assert_eq!(options.tags.as_deref(), Some("per,loc"));
        assert_eq!(options.prefix.as_deref(), Some("ner"));
        assert!(options.rtl);
        assert!(!options.debug);
        assert!(options.annotation_dirs.is_none());
    }
}
