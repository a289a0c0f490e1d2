//! TavernAI `chara_card_v2` assembly and persistence.
//!
//! Every field has a non-null default, so a partially parseable or entirely
//! unparseable upstream payload still yields a complete card at both the top
//! level and the nested `data` record.

use chrono::Local;
use eyre::{Context, Result};
use indexmap::IndexMap;
use lazy_regex::regex_replace_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::TaskOutput;

const DEFAULT_NAME: &str = "Unnamed Character";
const DEFAULT_TALKATIVENESS: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterCard {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,
    pub creatorcomment: String,
    pub avatar: String,
    pub chat: String,
    pub talkativeness: f64,
    pub fav: bool,
    pub tags: Vec<String>,
    pub spec: String,
    pub spec_version: String,
    pub data: CardData,
    pub create_date: String,
}

/// Nested mirror of the top-level fields, required by the card format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardData {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,
    pub creator_notes: String,
    pub system_prompt: String,
    pub post_history_instructions: String,
    pub tags: Vec<String>,
    pub creator: String,
    pub character_version: String,
    pub alternate_greetings: Vec<String>,
    pub extensions: CardExtensions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardExtensions {
    pub talkativeness: f64,
    pub fav: bool,
    pub world: String,
    pub depth_prompt: DepthPrompt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthPrompt {
    pub prompt: String,
    pub depth: u32,
    pub role: String,
}

/// What the terminal card task gave us: either a parsed field mapping, or the
/// raw text when the model did not produce valid JSON. No partial extraction
/// is attempted on the fallback branch.
#[derive(Debug, Clone)]
pub enum CardSource {
    Fields(IndexMap<String, Value>),
    Fallback(String),
}

impl CardSource {
    pub fn from_output(output: &TaskOutput) -> Self {
        match output {
            TaskOutput::Structured(value) => {
                match serde_json::from_value::<IndexMap<String, Value>>(value.clone()) {
                    Ok(fields) => CardSource::Fields(fields),
                    Err(_) => CardSource::Fallback(output.as_text().into_owned()),
                }
            }
            TaskOutput::Text(text) => CardSource::Fallback(text.clone()),
        }
    }
}

/// Run timestamps, captured once so the chat label and create_date agree.
#[derive(Debug, Clone)]
pub struct CardTimestamps {
    pub chat: String,
    pub create_date: String,
}

impl CardTimestamps {
    pub fn now() -> Self {
        let stamp = Local::now().format("%Y-%m-%d @%Hh %Mm %Ss %6fms").to_string();
        Self {
            chat: format!("Character - {}", stamp),
            create_date: stamp,
        }
    }
}

/// Build the full card, filling every missing field with its default.
pub fn assemble(source: &CardSource, timestamps: &CardTimestamps) -> CharacterCard {
    let (fields, fallback_description) = match source {
        CardSource::Fields(fields) => (Some(fields), None),
        CardSource::Fallback(raw) => (None, Some(raw.clone())),
    };

    let get_str = |key: &str| -> String {
        fields
            .and_then(|f| f.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let name = match get_str("name") {
        n if n.is_empty() => DEFAULT_NAME.to_string(),
        n => n,
    };
    let description = fallback_description.unwrap_or_else(|| get_str("description"));
    let personality = get_str("personality");
    let scenario = get_str("scenario");
    let first_mes = get_str("first_message");
    let mes_example = get_str("example_message");
    let creatorcomment = get_str("creator_comment");

    let talkativeness = fields
        .and_then(|f| f.get("talkativeness"))
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_TALKATIVENESS);
    let fav = fields
        .and_then(|f| f.get("fav"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let tags: Vec<String> = fields
        .and_then(|f| f.get("tags"))
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    CharacterCard {
        data: CardData {
            name: name.clone(),
            description: description.clone(),
            personality: personality.clone(),
            scenario: scenario.clone(),
            first_mes: first_mes.clone(),
            mes_example: mes_example.clone(),
            creator_notes: creatorcomment.clone(),
            system_prompt: String::new(),
            post_history_instructions: String::new(),
            tags: tags.clone(),
            creator: String::new(),
            character_version: String::new(),
            alternate_greetings: Vec::new(),
            extensions: CardExtensions {
                talkativeness,
                fav,
                world: String::new(),
                depth_prompt: DepthPrompt {
                    prompt: String::new(),
                    depth: 1,
                    role: "system".to_string(),
                },
            },
        },
        name,
        description,
        personality,
        scenario,
        first_mes,
        mes_example,
        creatorcomment,
        avatar: "none".to_string(),
        chat: timestamps.chat.clone(),
        talkativeness,
        fav,
        tags,
        spec: "chara_card_v2".to_string(),
        spec_version: "2.0".to_string(),
        create_date: timestamps.create_date.clone(),
    }
}

/// Lowercased name with whitespace runs collapsed to underscores.
pub fn card_filename(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let slug = regex_replace_all!(r"\s+", &lowered, "_");
    format!("{}_character_card.json", slug)
}

/// Write the card as 2-space-indented JSON and return the path.
pub fn save(card: &CharacterCard, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(card_filename(&card.name));
    let json = serde_json::to_string_pretty(card).context("Failed to serialize character card")?;
    fs::write(&path, json).context(format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_timestamps() -> CardTimestamps {
        CardTimestamps {
            chat: "Character - 2024-06-01 @12h 00m 00s 000000ms".to_string(),
            create_date: "2024-06-01 @12h 00m 00s 000000ms".to_string(),
        }
    }

    #[test]
    fn test_assemble_empty_mapping_all_defaults() {
        let source = CardSource::Fields(IndexMap::new());
        let card = assemble(&source, &test_timestamps());

        assert_eq!(card.name, "Unnamed Character");
        assert_eq!(card.description, "");
        assert_eq!(card.personality, "");
        assert_eq!(card.scenario, "");
        assert_eq!(card.first_mes, "");
        assert_eq!(card.mes_example, "");
        assert_eq!(card.creatorcomment, "");
        assert_eq!(card.avatar, "none");
        assert_eq!(card.talkativeness, 0.5);
        assert!(!card.fav);
        assert!(card.tags.is_empty());
        assert_eq!(card.spec, "chara_card_v2");
        assert_eq!(card.spec_version, "2.0");
        assert_eq!(card.data.extensions.depth_prompt.depth, 1);
        assert_eq!(card.data.extensions.depth_prompt.role, "system");
    }

    #[test]
    fn test_assemble_no_key_absent_at_either_level() {
        let source = CardSource::Fields(IndexMap::new());
        let card = assemble(&source, &test_timestamps());
        let value = serde_json::to_value(&card).unwrap();

        for key in [
            "name",
            "description",
            "personality",
            "scenario",
            "first_mes",
            "mes_example",
            "creatorcomment",
            "avatar",
            "chat",
            "talkativeness",
            "fav",
            "tags",
            "spec",
            "spec_version",
            "data",
            "create_date",
        ] {
            assert!(!value[key].is_null(), "top-level key {} missing", key);
        }

        for key in [
            "name",
            "description",
            "personality",
            "scenario",
            "first_mes",
            "mes_example",
            "creator_notes",
            "system_prompt",
            "post_history_instructions",
            "tags",
            "creator",
            "character_version",
            "alternate_greetings",
            "extensions",
        ] {
            assert!(!value["data"][key].is_null(), "data key {} missing", key);
        }

        assert_eq!(value["data"]["extensions"]["world"], "");
        assert_eq!(value["data"]["extensions"]["fav"], false);
    }

    #[test]
    fn test_assemble_partial_mapping() {
        let mut fields = IndexMap::new();
        fields.insert("name".to_string(), Value::from("Zara"));
        fields.insert("personality".to_string(), Value::from("bold"));
        let card = assemble(&CardSource::Fields(fields), &test_timestamps());

        assert_eq!(card.name, "Zara");
        assert_eq!(card.personality, "bold");
        assert_eq!(card.description, "");
        assert_eq!(card.scenario, "");
        assert_eq!(card.talkativeness, 0.5);
        assert!(!card.fav);
        assert_eq!(card.data.name, "Zara");
        assert_eq!(card.data.personality, "bold");
    }

    #[test]
    fn test_assemble_full_mapping() {
        let mut fields = IndexMap::new();
        fields.insert("name".to_string(), Value::from("Mira"));
        fields.insert("description".to_string(), Value::from("a sky pirate"));
        fields.insert("first_message".to_string(), Value::from("*waves* \"Hello there.\""));
        fields.insert("talkativeness".to_string(), Value::from(0.9));
        fields.insert("fav".to_string(), Value::from(true));
        fields.insert("tags".to_string(), serde_json::json!(["pirate", "airship"]));
        let card = assemble(&CardSource::Fields(fields), &test_timestamps());

        assert_eq!(card.first_mes, "*waves* \"Hello there.\"");
        assert_eq!(card.talkativeness, 0.9);
        assert!(card.fav);
        assert_eq!(card.tags, vec!["pirate", "airship"]);
        assert_eq!(card.data.first_mes, card.first_mes);
        assert_eq!(card.data.extensions.talkativeness, 0.9);
    }

    #[test]
    fn test_assemble_fallback_uses_raw_text_as_description() {
        let raw = "Sorry, I can only describe the character in prose.";
        let card = assemble(&CardSource::Fallback(raw.to_string()), &test_timestamps());

        assert_eq!(card.name, "Unnamed Character");
        assert_eq!(card.description, raw);
        assert_eq!(card.personality, "");
        assert_eq!(card.talkativeness, 0.5);
    }

    #[test]
    fn test_card_source_from_structured() {
        let output = crate::pipeline::TaskOutput::Structured(serde_json::json!({"name": "Zara"}));
        match CardSource::from_output(&output) {
            CardSource::Fields(fields) => assert_eq!(fields["name"], "Zara"),
            CardSource::Fallback(_) => panic!("expected fields"),
        }
    }

    #[test]
    fn test_card_source_from_text() {
        let output = crate::pipeline::TaskOutput::Text("not json".to_string());
        match CardSource::from_output(&output) {
            CardSource::Fallback(raw) => assert_eq!(raw, "not json"),
            CardSource::Fields(_) => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_card_filename() {
        assert_eq!(card_filename("Sir Reginald"), "sir_reginald_character_card.json");
        assert_eq!(card_filename("Zara"), "zara_character_card.json");
        assert_eq!(card_filename("  Lady  of the Lake "), "lady_of_the_lake_character_card.json");
    }

    #[test]
    fn test_save_writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let card = assemble(&CardSource::Fields(IndexMap::new()), &test_timestamps());
        let path = save(&card, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), "unnamed_character_character_card.json");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"name\": \"Unnamed Character\""));

        let parsed: CharacterCard = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.spec, "chara_card_v2");
    }
}
