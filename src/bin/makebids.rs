use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use indicatif::ProgressBar;
use rayon::prelude::*;

use bidsmock::config::{read_plan_file, work_units, Plan};

#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "makebids",
    about = "Create mock BIDS fixture trees for pipeline testing",
)]
pub struct Args {
    /// Root directory of the generated tree
    pub out: PathBuf,

    /// TOML plan with subjects, sessions, contrasts and labels.
    /// Without one, the built-in example study is generated.
    #[clap(short, long)]
    pub plan: Option<PathBuf>,

    /// Maximum number of rayon threads (0: let rayon decide)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub num_threads: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if args.num_threads > 0 {
        match rayon::ThreadPoolBuilder::new().num_threads(args.num_threads).build_global() {
            Err(e) => println!("{e}"),
            Ok(_) => println!("Using up to {} threads.", args.num_threads),
        }
    }

    let plan = match &args.plan {
        Some(path) => read_plan_file(path)?,
        None => Plan::example(),
    };

    let units = work_units(&plan, &args.out)?;
    let progress = ProgressBar::new(units.len() as u64)
        .with_message(args.out.display().to_string());

    units.par_iter().try_for_each(|unit| {
        let outcome = unit.run();
        progress.inc(1);
        outcome
    })?;

    progress.finish_with_message(format!("wrote {} subject trees", units.len()));
    Ok(())
}
