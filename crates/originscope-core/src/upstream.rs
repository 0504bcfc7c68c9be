//! Source-table extraction for captured query fragments.
//!
//! INSERT ... SELECT and MERGE writers carry the text of their source query.
//! This module pulls the referenced table names out of that fragment: first
//! by parsing it as a query and walking the FROM/JOIN tree, and — because
//! routine bodies routinely contain constructs the parser rejects — falling
//! back to a token-level FROM/JOIN scan when parsing fails.

use sqlparser::ast::{SetExpr, Statement, TableFactor};
use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::Parser;

use crate::detector::{tokenize, TokenKind};

/// Extract the tables a query fragment reads from, in first-seen order.
pub(crate) fn extract_source_tables(fragment: &str) -> Vec<String> {
    let trimmed = fragment.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut tables = Vec::new();
    match Parser::parse_sql(&MsSqlDialect {}, trimmed) {
        Ok(statements) => {
            for statement in &statements {
                if let Statement::Query(query) = statement {
                    walk_query_body(&query.body, &mut tables);
                }
            }
            if tables.is_empty() {
                tables = token_scan_sources(trimmed);
            }
        }
        Err(_) => {
            tables = token_scan_sources(trimmed);
        }
    }

    dedup_case_insensitive(tables)
}

fn walk_query_body(body: &SetExpr, tables: &mut Vec<String>) {
    match body {
        SetExpr::Select(select) => {
            for table_with_joins in &select.from {
                walk_table_factor(&table_with_joins.relation, tables);
                for join in &table_with_joins.joins {
                    walk_table_factor(&join.relation, tables);
                }
            }
        }
        SetExpr::Query(query) => {
            walk_query_body(&query.body, tables);
        }
        SetExpr::SetOperation { left, right, .. } => {
            walk_query_body(left, tables);
            walk_query_body(right, tables);
        }
        _ => {}
    }
}

fn walk_table_factor(factor: &TableFactor, tables: &mut Vec<String>) {
    match factor {
        TableFactor::Table { name, .. } => {
            tables.push(normalize_qualified_name(&name.to_string()));
        }
        TableFactor::Derived { subquery, .. } => {
            walk_query_body(&subquery.body, tables);
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            walk_table_factor(&table_with_joins.relation, tables);
            for join in &table_with_joins.joins {
                walk_table_factor(&join.relation, tables);
            }
        }
        _ => {}
    }
}

/// Fallback: read the qualified name after each top-level FROM / JOIN.
/// Derived tables (a `(` after the keyword) are skipped; the subquery's own
/// FROM is found by the continuing scan.
fn token_scan_sources(fragment: &str) -> Vec<String> {
    let tokens = tokenize(fragment);
    let mut tables = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        if token.is_keyword("FROM") || token.is_keyword("JOIN") {
            let mut j = i + 1;
            let mut parts = Vec::new();
            while let Some(TokenKind::Word { value, .. }) = tokens.get(j).map(|t| &t.kind) {
                parts.push(value.clone());
                if matches!(tokens.get(j + 1).map(|t| &t.kind), Some(TokenKind::Dot)) {
                    j += 2;
                } else {
                    break;
                }
            }
            // a `(` right after FROM/JOIN is a derived table or function
            let is_call = matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::LParen));
            if !parts.is_empty() && !is_call {
                tables.push(parts.join("."));
            }
        }
        i += 1;
    }

    tables
}

/// Strip brackets/quotes from each dotted segment of a rendered object name.
fn normalize_qualified_name(name: &str) -> String {
    split_qualified_identifiers(name)
        .iter()
        .map(|part| unquote_identifier(part))
        .collect::<Vec<_>>()
        .join(".")
}

fn split_qualified_identifiers(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars().peekable();
    let mut active_quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(q) = active_quote {
            current.push(ch);
            if ch == q {
                if matches!(q, '"' | '\'' | '`') {
                    if let Some(next) = chars.peek() {
                        if *next == q {
                            current.push(chars.next().unwrap());
                            continue;
                        }
                    }
                }
                active_quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' | '`' => {
                active_quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                active_quote = Some(']');
                current.push(ch);
            }
            '.' => {
                if !current.is_empty() {
                    parts.push(current.trim().to_string());
                    current.clear();
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        parts.push(current.trim().to_string());
    }

    if parts.is_empty() && !name.is_empty() {
        vec![name.trim().to_string()]
    } else {
        parts
    }
}

fn unquote_identifier(part: &str) -> String {
    let trimmed = part.trim();
    if trimmed.len() < 2 {
        return trimmed.to_string();
    }
    let first = trimmed.chars().next().unwrap();
    let last = trimmed.chars().last().unwrap();
    if matches!(
        (first, last),
        ('"', '"') | ('`', '`') | ('[', ']') | ('\'', '\'')
    ) {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

fn dedup_case_insensitive(tables: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for table in tables {
        if seen.insert(table.to_lowercase()) {
            out.push(table);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_single_table() {
        let tables = extract_source_tables("SELECT Id, Pay FROM staging.Pay");
        assert_eq!(tables, vec!["staging.Pay".to_string()]);
    }

    #[test]
    fn test_extract_join_tables() {
        let tables =
            extract_source_tables("SELECT * FROM staging.Pay p JOIN dbo.Grades g ON g.Id = p.Id");
        assert_eq!(
            tables,
            vec!["staging.Pay".to_string(), "dbo.Grades".to_string()]
        );
    }

    #[test]
    fn test_extract_bracketed_names_are_unquoted() {
        let tables = extract_source_tables("SELECT * FROM [staging].[Pay]");
        assert_eq!(tables, vec!["staging.Pay".to_string()]);
    }

    #[test]
    fn test_extract_from_subquery() {
        let tables = extract_source_tables("SELECT * FROM (SELECT Id FROM staging.Pay) x");
        assert_eq!(tables, vec!["staging.Pay".to_string()]);
    }

    #[test]
    fn test_token_fallback_on_unparsable_text() {
        let tables = extract_source_tables(
            "SELECT TOP 1 Pay INTO #tmp FROM staging.Pay WITH (NOLOCK) OPTION (MAXDOP 1) ???",
        );
        assert!(tables.contains(&"staging.Pay".to_string()));
    }

    #[test]
    fn test_duplicates_collapse_case_insensitively() {
        let tables = extract_source_tables(
            "SELECT * FROM staging.Pay UNION ALL SELECT * FROM STAGING.PAY",
        );
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn test_empty_fragment() {
        assert!(extract_source_tables("   ").is_empty());
    }
}
