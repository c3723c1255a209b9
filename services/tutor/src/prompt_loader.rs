use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Key of the prompt that overrides the built-in session summary template.
pub const SESSION_SUMMARY_PROMPT: &str = "session_summary";

/// Loads every `.md` file in `dir_path`, keyed by file stem.
pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem for prompt file")?
                .to_string();

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

            prompts.insert(prompt_key, content);
        }
    }

    Ok(prompts)
}

/// The summary template from `prompts`, if one is present and carries the
/// `{transcript}` placeholder.
pub fn summary_template(prompts: &HashMap<String, String>) -> Option<&str> {
    let template = prompts.get(SESSION_SUMMARY_PROMPT)?;
    if !template.contains("{transcript}") {
        tracing::warn!(
            "{}.md has no {{transcript}} placeholder, using the built-in prompt",
            SESSION_SUMMARY_PROMPT
        );
        return None;
    }
    Some(template.as_str())
}
