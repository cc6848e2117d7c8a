// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to a Layer 2 use case.
//
//   `train`       - train on a tab-separated sentence-pair corpus
//   `translate`   - greedy-decode one sentence from a checkpoint
//   `shape-check` - forward a random batch, print logits shape

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ShapeCheckArgs, TrainArgs, TranslateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "seq2seq-translate",
    version,
    about = "Train an encoder-decoder transformer on sentence pairs, then translate."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)      => run_train(args),
            Commands::Translate(args)  => run_translate(args),
            Commands::ShapeCheck(args) => run_shape_check(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus: {}", args.corpus);

    let history = TrainUseCase::new(args.into()).execute()?;

    if let (Some(train), Some(val)) = (history.train.last(), history.valid.last()) {
        println!("Training complete. Final train loss {train:.4}, val loss {val:.4}.");
    } else {
        println!("Training complete.");
    }
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;
    use crate::domain::traits::Translator;

    let use_case = TranslateUseCase::new(&args.checkpoint_dir, args.max_new_tokens)?;
    let translation = use_case.translate(&args.sentence)?;
    println!("\n{translation}");
    Ok(())
}

fn run_shape_check(args: ShapeCheckArgs) -> Result<()> {
    use crate::application::shape_check_use_case::ShapeCheckUseCase;

    let dims = ShapeCheckUseCase::new(args.into()).execute()?;
    println!("Logits shape: {dims:?}");
    Ok(())
}
