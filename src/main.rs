use anyhow::Result;
use clap::{Parser, Subcommand};

use gushi::commands::generate;
use gushi::llm::story::StoryParams;

#[derive(Parser, Debug)]
#[command(
    name = "gushi",
    version,
    about = "Bedtime stories and comprehension questions for young readers.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a story and its comprehension questions
    Generate {
        /// Story protagonist
        #[arg(long, value_name = "WHO")]
        character: String,
        /// Where the story takes place
        #[arg(long, value_name = "WHERE")]
        location: String,
        /// When the story takes place
        #[arg(long, value_name = "WHEN")]
        time: String,
        /// The main event of the story
        #[arg(long, value_name = "WHAT")]
        event: String,
        /// Reader age, used to calibrate length and vocabulary
        #[arg(long, value_name = "YEARS")]
        age: u8,
        /// Print only the story, skipping comprehension questions
        #[arg(long, default_value_t = false)]
        story_only: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run_cli().await {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            character,
            location,
            time,
            event,
            age,
            story_only,
        } => {
            let params = StoryParams {
                character,
                location,
                time,
                event,
                age,
            };
            generate::run(params, story_only).await?;
        }
    }

    Ok(())
}
