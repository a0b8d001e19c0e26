//! MCP tool argument structs for the pkb knowledge base
//!
//! Simple structs for deserializing tool arguments.

use serde::{Deserialize, Serialize};

/// Create a "Today I Learned" entry
#[derive(Debug, Deserialize, Serialize)]
pub struct AddTilTool {
    /// Short descriptive title for the TIL entry
    pub title: String,
    /// Markdown body of the entry
    pub content: String,
    /// Tags/keywords for categorization
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Save a reusable prompt
#[derive(Debug, Deserialize, Serialize)]
pub struct AddPromptTool {
    /// Short name for the prompt
    pub title: String,
    /// Full prompt text
    pub content: String,
    /// Category bucket (e.g. coding, infrastructure, documentation)
    pub category: String,
    /// Optional tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Document a reusable pattern
#[derive(Debug, Deserialize, Serialize)]
pub struct AddPatternTool {
    /// Short name for the pattern
    pub title: String,
    /// Pattern description in Markdown
    pub content: String,
    /// Category bucket (e.g. agent, cloud, devops)
    pub category: String,
    /// Optional tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Search the knowledge base by keyword
#[derive(Debug, Deserialize, Serialize)]
pub struct SearchPkbTool {
    /// Keyword to look for across titles, tags and bodies
    pub query: String,
    /// Sections to search (default: all)
    #[serde(default)]
    pub sections: Vec<String>,
}

/// List entries in a section
#[derive(Debug, Deserialize, Serialize)]
pub struct ListEntriesTool {
    /// Section to list: til, prompt or pattern
    pub section: String,
    /// Optional category filter (prompts/patterns only)
    #[serde(default)]
    pub category: Option<String>,
}
