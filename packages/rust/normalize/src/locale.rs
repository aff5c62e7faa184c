//! Locale flattening: per-language content blocks → `<field>_<lang>` keys.
//!
//! The upstream API delivers locales either as an ordered sequence of
//! blocks (each carrying its own `lang`) or as a language-keyed mapping.
//! Shape detection is concentrated in [`collect_blocks`]; everything
//! downstream sees one normalized list.

use serde_json::{Map, Value};
use tracing::warn;

use cairn_shared::{ContentType, value_is_present};

use crate::schema::{self, PipelineConfig};

/// Output of flattening one record's locale collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedLocales {
    /// Exactly one key per (field, language) pair, explicit null when unknown.
    pub fields: Map<String, Value>,
    /// Languages with at least one non-null title or summary, in closed-set order.
    pub available_languages: Vec<String>,
    /// Whether two or more languages have content.
    pub is_multilingual: bool,
}

/// Flatten a record's locale collection over the closed field and language
/// sets of its content type.
///
/// Duplicate blocks for the same language are a data-quality anomaly, not
/// an error: the later block in original sequence order wins. Blocks with
/// a language code outside the closed set are logged and dropped.
pub fn flatten(raw: &Value, content_type: ContentType, cfg: &PipelineConfig) -> FlattenedLocales {
    let blocks = collect_blocks(raw.get("locales"), cfg);
    let fields = schema::locale_fields(content_type);

    let mut out = Map::new();
    let mut available = Vec::new();

    for lang in &cfg.languages {
        // Last-write-wins: scan from the end for the effective block.
        let block = blocks
            .iter()
            .rev()
            .find(|(block_lang, _)| block_lang == lang)
            .map(|(_, block)| block);

        let mut has_content = false;
        for field in fields {
            let value = block
                .and_then(|b| b.get(*field))
                .filter(|v| value_is_present(v))
                .cloned()
                .unwrap_or(Value::Null);

            if !value.is_null() && (*field == "title" || *field == "summary") {
                has_content = true;
            }
            out.insert(format!("{field}_{lang}"), value);
        }

        if has_content {
            available.push(lang.clone());
        }
    }

    let is_multilingual = available.len() >= 2;

    FlattenedLocales {
        fields: out,
        available_languages: available,
        is_multilingual,
    }
}

/// Normalize either input shape to an ordered `(lang, block)` list.
///
/// For the mapping form the outer key is authoritative; an inner `lang`
/// field, if any, is ignored. Unknown language codes are dropped here so
/// no later stage needs to re-validate.
fn collect_blocks<'a>(
    locales: Option<&'a Value>,
    cfg: &PipelineConfig,
) -> Vec<(String, &'a Map<String, Value>)> {
    let mut blocks = Vec::new();

    match locales {
        Some(Value::Array(items)) => {
            for item in items {
                let Some(block) = item.as_object() else {
                    continue;
                };
                match block.get("lang").and_then(Value::as_str) {
                    Some(lang) if cfg.is_known_language(lang) => {
                        blocks.push((lang.to_string(), block));
                    }
                    Some(lang) => {
                        warn!(lang, "dropping locale block with unrecognized language code");
                    }
                    None => {
                        warn!("dropping locale block without a language code");
                    }
                }
            }
        }
        Some(Value::Object(map)) => {
            for (lang, item) in map {
                let Some(block) = item.as_object() else {
                    continue;
                };
                if cfg.is_known_language(lang) {
                    blocks.push((lang.clone(), block));
                } else {
                    warn!(lang, "dropping locale block with unrecognized language code");
                }
            }
        }
        _ => {}
    }

    blocks
}
