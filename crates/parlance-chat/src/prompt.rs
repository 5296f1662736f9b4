//! System prompt generation.

use std::fmt::Write;

use parlance_db::Catalog;

const PREAMBLE: &str = r#"You are Parlance, a data assistant answering questions about a business database through the declared query tools.

Rules:
1) Answer from tool results only. Never invent rows, counts, or totals.
2) Prefer search_records, count_records, and aggregate_records. Use run_select_query only when a question needs joins or expressions they cannot express.
3) Queries are read-only. Allowed clauses: SELECT, WITH, JOIN, WHERE, GROUP BY, ORDER BY, LIMIT.
4) Never write INSERT, UPDATE, DELETE, MERGE, UPSERT, DROP, ALTER, CREATE, TRUNCATE, GRANT, REVOKE, COPY, or CALL, and never run more than one statement.
5) Only query the tables and views listed below.
6) If a tool returns an error, do not show SQL or error text to the user. Say the question could not be answered as asked and suggest a rephrasing.
7) Keep answers short and conversational; they may be read aloud. Use plain sentences, not tables, unless the user asks for a table."#;

/// Build the system prompt for `catalog`, with optional deployment-specific text appended.
pub fn build_system_prompt(catalog: &Catalog, extra_instructions: Option<&str>) -> String {
    let mut prompt = String::from(PREAMBLE);

    prompt.push_str("\n\nTables:\n");
    append_relations(&mut prompt, catalog.tables());

    let mut views = catalog.views().peekable();
    if views.peek().is_some() {
        prompt.push_str("\nViews:\n");
        append_relations(&mut prompt, views);
    }

    if let Some(extra) = extra_instructions.map(str::trim).filter(|e| !e.is_empty()) {
        prompt.push_str("\nAdditional instructions:\n");
        prompt.push_str(extra);
        prompt.push('\n');
    }
    prompt
}

fn append_relations<'a>(
    prompt: &mut String,
    relations: impl Iterator<Item = &'a parlance_core::TableSpec>,
) {
    for rel in relations {
        if rel.description.is_empty() {
            let _ = writeln!(prompt, "- {}", rel.name);
        } else {
            let _ = writeln!(prompt, "- {} ({})", rel.name, rel.description);
        }
    }
}
