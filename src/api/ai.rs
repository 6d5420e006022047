//! AI-assisted editing routes.
//!
//! Open to any signed-in user. Upstream failures never surface here; the
//! [`Assistant`](crate::ai::Assistant) answers with its fallback instead.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ai::{Seo, Sentiment};
use crate::error::{Error, Result};
use crate::module::Module;
use crate::procedure::{Meta, Procedure};
use crate::router::{Context, Router};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TextInput {
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TitledInput {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SummaryOutput {
    pub summary: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct TagsOutput {
    pub tags: Vec<String>,
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

impl TitledInput {
    fn validate(&self) -> Result<()> {
        required("title", &self.title)?;
        required("content", &self.content)
    }
}

pub struct Summarize;

impl Procedure for Summarize {
    fn meta() -> Meta {
        Meta::post("/api/ai/summarize")
            .summary("Two-sentence summary of a text")
            .tag("ai")
    }

    type Input = TextInput;
    type Output = SummaryOutput;

    async fn handle(ctx: Context, input: TextInput) -> Result<SummaryOutput> {
        required("content", &input.content)?;
        Ok(SummaryOutput {
            summary: ctx.assistant.summarize(&input.content).await,
        })
    }
}

pub struct SeoHints;

impl Procedure for SeoHints {
    fn meta() -> Meta {
        Meta::post("/api/ai/seo")
            .summary("Meta description, keywords and an SEO score")
            .tag("ai")
    }

    type Input = TitledInput;
    type Output = Seo;

    async fn handle(ctx: Context, input: TitledInput) -> Result<Seo> {
        input.validate()?;
        Ok(ctx.assistant.seo(&input.title, &input.content).await)
    }
}

pub struct Mood;

impl Procedure for Mood {
    fn meta() -> Meta {
        Meta::post("/api/ai/sentiment")
            .summary("Sentiment of a text")
            .tag("ai")
    }

    type Input = TextInput;
    type Output = Sentiment;

    async fn handle(ctx: Context, input: TextInput) -> Result<Sentiment> {
        required("content", &input.content)?;
        Ok(ctx.assistant.sentiment(&input.content).await)
    }
}

pub struct SuggestTags;

impl Procedure for SuggestTags {
    fn meta() -> Meta {
        Meta::post("/api/ai/tags")
            .summary("Suggested tags")
            .tag("ai")
    }

    type Input = TitledInput;
    type Output = TagsOutput;

    async fn handle(ctx: Context, input: TitledInput) -> Result<TagsOutput> {
        input.validate()?;
        Ok(TagsOutput {
            tags: ctx.assistant.tags(&input.title, &input.content).await,
        })
    }
}

pub struct AiModule;

impl Module for AiModule {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<Summarize>();
        router.procedure::<SeoHints>();
        router.procedure::<Mood>();
        router.procedure::<SuggestTags>();
    }
}
