use clap::Args;
use patgen_tuner::error::TunerResult;
use patgen_tuner::translate::make_translation_file;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct TranslateArgs {
    pub wordlist: PathBuf,

    #[arg(long, default_value_t = '-')]
    pub marker: char,

    /// Fixed value instead of the one observed in the wordlist.
    #[arg(long)]
    pub left_hyphen_min: Option<usize>,

    #[arg(long)]
    pub right_hyphen_min: Option<usize>,
}

pub fn run(args: &TranslateArgs) -> TunerResult<()> {
    let path = make_translation_file(
        &args.wordlist,
        args.marker,
        args.left_hyphen_min,
        args.right_hyphen_min,
    )?;
    println!("{}", path.display());
    Ok(())
}
