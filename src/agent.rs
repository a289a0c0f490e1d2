//! Role descriptors for the fixed pipelines.
//!
//! An agent is a role name, a goal, a backstory, and the model bound to it.
//! Descriptors are immutable once built and live for a single run.

use serde::{Deserialize, Serialize};

pub const STORYTELLER: &str = "Storyteller";
pub const LITERARY_CRITIC: &str = "Literary Critic";
pub const CARD_CREATOR: &str = "Card Creator";
pub const PERSONALITY_CRITIC: &str = "Personality Critic";
pub const SCENARIO_CRITIC: &str = "Scenario Critic";
pub const MESSAGE_CRITIC: &str = "Message Critic";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Role name, unique within a run
    pub role: String,

    /// What this agent is asked to achieve
    pub goal: String,

    /// Persona context injected into every prompt
    pub backstory: String,

    /// Model identifier this agent is bound to
    pub model: String,
}

impl Agent {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            model: model.into(),
        }
    }

    /// Render the system prompt from role, backstory, and goal
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}.\n\n{}\n\nYour goal: {}",
            self.role,
            self.backstory.trim(),
            self.goal
        )
    }
}

const STORYTELLER_BACKSTORY: &str = "\
You are a versatile and imaginative agent committed to artistic freedom and creativity. \
Your goal is to fully immerse in the scenario provided by the user, crafting a narrative \
that aligns with the given themes. Your stories are characterized by their originality, \
emotional depth, and adherence to the core elements of the user-defined scenario. \
You draw inspiration from a broad spectrum of literature and storytelling traditions, \
ensuring that each story is unique and true to its intended genre.";

const LITERARY_CRITIC_BACKSTORY: &str = "\
The critic agent, named \"Aurelius,\" embodies the analytical prowess of history's \
greatest literary critics and scholars. Aurelius has spent its development in virtual \
literary salons, absorbing insights from classical and contemporary critiques. It \
evaluates narrative structure, character development, dialogue, style, coherence, and \
analytical rigor. Aurelius' mission is to guide writers on their creative journeys, \
helping them polish their narratives to shine with clarity, depth, and artistic merit.";

const CARD_CREATOR_BACKSTORY: &str = "\
You are an expert in creating rich, detailed character profiles for role-playing games \
and interactive fiction. You understand the importance of using placeholders for dynamic \
character interactions.";

const PERSONALITY_CRITIC_BACKSTORY: &str = "\
You are a master of character development, skilled at identifying and enhancing \
personality traits to create compelling characters.";

const SCENARIO_CRITIC_BACKSTORY: &str = "\
You are an experienced storyteller, adept at crafting intriguing scenarios that bring \
characters to life.";

const MESSAGE_CRITIC_BACKSTORY: &str = "\
You are a dialogue expert, skilled at crafting authentic and captivating character \
speech with proper formatting and placeholder usage.";

/// The two roles of the story pipeline. The storyteller both drafts and revises.
pub fn story_agents(storyteller_model: &str, critic_model: &str) -> Vec<Agent> {
    vec![
        Agent::new(
            STORYTELLER,
            "Create a compelling story based on the described scenario, embracing artistic freedom.",
            STORYTELLER_BACKSTORY,
            storyteller_model,
        ),
        Agent::new(
            LITERARY_CRITIC,
            "Provide insightful and detailed feedback to enhance the quality of the story.",
            LITERARY_CRITIC_BACKSTORY,
            critic_model,
        ),
    ]
}

/// The four distinct roles of the card pipeline.
pub fn card_agents(creator_model: &str, critic_model: &str) -> Vec<Agent> {
    vec![
        Agent::new(
            CARD_CREATOR,
            "Create a detailed and engaging character card based on the user's free-form input.",
            CARD_CREATOR_BACKSTORY,
            creator_model,
        ),
        Agent::new(
            PERSONALITY_CRITIC,
            "Ensure the character has a well-rounded and interesting personality.",
            PERSONALITY_CRITIC_BACKSTORY,
            critic_model,
        ),
        Agent::new(
            SCENARIO_CRITIC,
            "Ensure the character's scenario is engaging, interesting, and consistent with their personality.",
            SCENARIO_CRITIC_BACKSTORY,
            critic_model,
        ),
        Agent::new(
            MESSAGE_CRITIC,
            "Ensure the opening message is engaging and properly formatted.",
            MESSAGE_CRITIC_BACKSTORY,
            critic_model,
        ),
    ]
}
