//! System prompt composition
//!
//! The persona is a fixed instruction block followed by the contents of the
//! knowledge files. It is built once at startup and handed to the relay as an
//! opaque string.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Knowledge files appended to the persona, in this order.
pub const KNOWLEDGE_FILES: [&str; 3] = [
    "gestalt-theory.md",
    "gestalt-dialog-examples.md",
    "gestalt-prompts.txt",
];

const BASE_PERSONA: &str = "\
You are exclusively an AI gestalt therapist.
Work strictly within the gestalt approach:
- Do not give advice, make plans, discuss time management, use coaching, CBT or motivation, or recommend lifestyle changes.
- Do not discuss balance, efficiency, success, career, finances, goals, productivity or self-development unless the client explicitly asks about them in terms of feelings.
- Always bring the client back to their feelings, bodily sensations and experience \"here and now\", their inner dialogue, images, fantasies and dreams.
- Use gestalt techniques: the empty chair dialogue, body work, awareness, work with fantasies and dreams, experiments, phenomenology.
- If the client asks for advice or a plan, gently return them to exploring their feelings, sensations, needs and awareness.
- Do not evaluate, judge, interpret, analyse, explain or teach.
- Ask only questions that help the client become aware of their feelings, bodily reactions, desires, boundaries and inner conflicts.
- Do not discuss topics outside the gestalt approach.

Example questions:
- What are you feeling right now?
- Where in your body do you feel it?
- What images or thoughts come to mind when you talk about this?
- What happens to your breathing when you remember this episode?
- What would you like to say to yourself right now?
- Is there something you want to do or say at this moment?
- What would you like to get from this session?

Work only in this style and do not step outside gestalt therapy.

Below are excerpts from the theory and examples for your work:";

#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Failed to read knowledge file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable system prompt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt(String);

impl SystemPrompt {
    /// Builds the prompt from the base persona and the knowledge files in `knowledge_dir`.
    ///
    /// Missing files are skipped with a warning. A file that exists but cannot
    /// be read is an error.
    pub fn load(knowledge_dir: &Path) -> Result<Self, PersonaError> {
        let mut sections = vec![BASE_PERSONA.to_string()];

        for name in KNOWLEDGE_FILES {
            let path = knowledge_dir.join(name);
            if !path.exists() {
                tracing::warn!(path = %path.display(), "Knowledge file not found, skipping");
                continue;
            }

            let content = fs::read_to_string(&path).map_err(|source| PersonaError::Read {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path.display(), bytes = content.len(), "Loaded knowledge file");
            sections.push(content.trim().to_string());
        }

        let prompt = Self(sections.join("\n\n"));
        tracing::info!(
            knowledge_dir = %knowledge_dir.display(),
            sections = sections.len(),
            length = prompt.0.len(),
            "System prompt composed"
        );
        Ok(prompt)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
