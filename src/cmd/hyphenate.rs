use clap::Args;
use patgen_tuner::error::TunerResult;
use patgen_tuner::hyphenator::{Hyphenator, TranslationTable};
use std::io::{self, BufRead};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct HyphenateArgs {
    #[arg(short, long)]
    pub patterns: PathBuf,

    #[arg(short, long, default_value = "data/words.tra")]
    pub translate: PathBuf,

    #[arg(long, default_value_t = '-')]
    pub mark: char,

    /// Words to hyphenate; read from stdin, one per line, when omitted.
    pub words: Vec<String>,
}

pub fn run(args: &HyphenateArgs) -> TunerResult<()> {
    let table = TranslationTable::load(&args.translate)?;
    let hyphenator = Hyphenator::from_files(&args.patterns, &table, args.mark)?;

    if !args.words.is_empty() {
        for word in &args.words {
            println!("{}", hyphenator.hyphenate(word));
        }
        return Ok(());
    }
    for line in io::stdin().lock().lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            println!("{}", hyphenator.hyphenate(word));
        }
    }
    Ok(())
}
