//! Ask command handler.
//!
//! Answers a single question, crawling the site first if it is not indexed.

use super::{print_answer, print_json, progress_reporter, ready_pipeline};
use clap::Args;
use webrag_core::{config::AppConfig, AppError, AppResult};
use webrag_knowledge::{build_pipeline, ContextFormatter};

/// Ask one question about a website
#[derive(Args, Debug)]
pub struct AskCommand {
    /// URL of the website
    pub url: String,

    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command for {}", self.url);
        tracing::debug!("Question: {}", self.question);

        let mut pipeline = build_pipeline(config, progress_reporter(self.json))?;
        ready_pipeline(&mut pipeline, &self.url).await?;

        let answer = pipeline.answer_question(&self.question).await;

        if self.json {
            print_json(&serde_json::to_value(&answer)?)?;
        } else if answer.success {
            print_answer(&answer, &ContextFormatter::from(&config.retrieval));
        }

        if !answer.success {
            return Err(AppError::Other(answer.answer));
        }
        Ok(())
    }
}
