//! Static writer detection over routine source text.
//!
//! The detector finds write-patterns for a target column inside one routine's
//! text: `UPDATE ... SET`, `INSERT INTO (...) SELECT`, `INSERT INTO (...)
//! VALUES`, `MERGE ... WHEN MATCHED THEN UPDATE SET`, `MERGE ... WHEN NOT
//! MATCHED THEN INSERT`, and a dynamic-SQL heuristic. It works on the token
//! stream from [`tokenize`], so matches inside comments and string literals
//! are never reported (except through the dynamic heuristic, which looks at
//! literals on purpose).
//!
//! This is deliberately a structural scanner rather than a validating
//! parser: it accepts false negatives over brittleness against dialect
//! variation, performs no semantic validation, and never executes SQL.

mod tokenizer;

pub use tokenizer::{tokenize, Span, Token, TokenKind};

use crate::types::WriterKind;
use crate::upstream;

/// The column a detection run is looking for.
#[derive(Debug, Clone)]
pub struct DetectTarget {
    pub column: String,
    pub table: Option<String>,
    pub schema: Option<String>,
    /// Other names (synonyms) that identify the same table in routine text.
    pub aliases: Vec<String>,
}

impl DetectTarget {
    /// Build a target from a possibly qualified column name
    /// (`Salary`, `Employees.Salary`, `dbo.Employees.Salary`).
    pub fn for_column(name: &str) -> Self {
        let mut parts: Vec<&str> = name.split('.').map(str::trim).collect();
        let column = parts.pop().unwrap_or(name).to_string();
        let table = parts.pop().map(str::to_string);
        let schema = parts.pop().map(str::to_string);
        Self {
            column,
            table,
            schema,
            aliases: Vec::new(),
        }
    }

    pub fn with_table(mut self, schema: impl Into<String>, table: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self.table = Some(table.into());
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Lowercase names that identify the target table in text.
    fn table_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(table) = &self.table {
            names.push(table.to_lowercase());
            if let Some(schema) = &self.schema {
                names.push(format!("{}.{}", schema.to_lowercase(), table.to_lowercase()));
            }
        }
        for alias in &self.aliases {
            names.push(alias.to_lowercase());
        }
        names
    }

    fn matches_column(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.column)
    }
}

/// One detected write-pattern, before it is tied to a routine.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub kind: WriterKind,
    /// Assignment expression text; `None` for dynamic-SQL suspicions.
    pub expression: Option<String>,
    /// Excerpt around the match, trimmed to line boundaries.
    pub excerpt: String,
    /// Tables referenced by the source query, for INSERT_SELECT / MERGE.
    pub source_tables: Vec<String>,
    pub note: Option<String>,
}

/// Scan one routine's text for writers of the target column.
///
/// `excerpt_context` is the byte radius around a match before trimming to
/// line boundaries.
pub fn detect_writers(source: &str, target: &DetectTarget, excerpt_context: usize) -> Vec<Detection> {
    let tokens = tokenize(source);
    let mut detections = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let after_then = i > 0 && tokens[i - 1].is_keyword("THEN");
        let token = &tokens[i];

        if token.is_keyword("MERGE") {
            if let Some((found, end)) = scan_merge(&tokens, source, i, target, excerpt_context) {
                detections.extend(found);
                i = end.max(i + 1);
                continue;
            }
        } else if token.is_keyword("UPDATE") && !after_then {
            if let Some((assignments, end)) = scan_update(&tokens, source, i) {
                for a in assignments {
                    if target.matches_column(&a.column) {
                        detections.push(Detection {
                            kind: WriterKind::Update,
                            expression: Some(a.expression),
                            excerpt: excerpt_around(source, a.span, excerpt_context),
                            source_tables: Vec::new(),
                            note: None,
                        });
                    }
                }
                i = end.max(i + 1);
                continue;
            }
        } else if token.is_keyword("INSERT") && !after_then {
            if let Some((found, end)) = scan_insert(&tokens, source, i, target, excerpt_context) {
                detections.extend(found);
                i = end.max(i + 1);
                continue;
            }
        }

        i += 1;
    }

    if detections.is_empty() {
        if let Some(dynamic) = dynamic_detection(source, &tokens, target, excerpt_context) {
            detections.push(dynamic);
        }
    }

    detections
}

/// A dotted identifier read from the token stream.
struct QualifiedName {
    /// Unquoted dotted text.
    text: String,
    /// Final segment.
    last: String,
    span: Span,
}

/// Read `word (. word)*` starting at `i`. Returns the name and the index of
/// the first token after it.
fn read_qualified(tokens: &[Token], mut i: usize) -> Option<(QualifiedName, usize)> {
    let first = tokens.get(i)?;
    let mut parts = vec![first.word()?.to_string()];
    let start = first.span.start;
    let mut end = first.span.end;
    i += 1;
    while matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::Dot)) {
        let part = tokens.get(i + 1)?;
        parts.push(part.word()?.to_string());
        end = part.span.end;
        i += 2;
    }
    let last = parts.last().cloned().unwrap_or_default();
    Some((
        QualifiedName {
            text: parts.join("."),
            last,
            span: Span::new(start, end),
        },
        i,
    ))
}

/// Index just past the `)` matching the `(` at `i`.
fn skip_parens(tokens: &[Token], i: usize) -> usize {
    debug_assert!(matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::LParen)));
    let mut depth = 0usize;
    let mut j = i;
    while j < tokens.len() {
        match tokens[j].kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return j + 1;
                }
            }
            _ => {}
        }
        j += 1;
    }
    tokens.len()
}

fn is_statement_starter(token: &Token) -> bool {
    const STARTERS: &[&str] = &[
        "SELECT", "INSERT", "UPDATE", "DELETE", "MERGE", "DECLARE", "IF", "WHILE", "BEGIN",
        "RETURN", "PRINT", "EXEC", "EXECUTE", "GO", "CREATE", "ALTER", "WITH", "COMMIT",
        "ROLLBACK", "FETCH", "OPEN", "CLOSE", "DEALLOCATE", "VALUES", "TRUNCATE",
    ];
    STARTERS.iter().any(|kw| token.is_keyword(kw))
}

fn is_clause_boundary(token: &Token) -> bool {
    const CLAUSES: &[&str] = &[
        "FROM", "WHERE", "OUTPUT", "OPTION", "GROUP", "ORDER", "HAVING", "UNION", "EXCEPT",
        "INTERSECT", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "JOIN", "ON", "WHEN", "SET",
    ];
    CLAUSES.iter().any(|kw| token.is_keyword(kw))
}

/// Collect one expression starting at `start`, stopping at a top-level comma,
/// clause boundary, or statement boundary. `CASE ... END` is tracked so its
/// inner `WHEN`/`THEN`/`END` keywords do not terminate the expression.
///
/// Returns the last token index of the expression (if any), the index where
/// scanning stopped, and whether a comma indicated another item follows.
fn collect_expression(tokens: &[Token], start: usize) -> (Option<usize>, usize, bool) {
    let mut depth = 0usize;
    let mut case_depth = 0usize;
    let mut last = None;
    let mut k = start;

    while k < tokens.len() {
        let token = &tokens[k];
        match &token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                if depth == 0 {
                    return (last, k, false);
                }
                depth -= 1;
            }
            TokenKind::Comma if depth == 0 => return (last, k + 1, true),
            TokenKind::Semicolon if depth == 0 => return (last, k, false),
            TokenKind::Word { .. } if depth == 0 => {
                if token.is_keyword("CASE") {
                    case_depth += 1;
                } else if token.is_keyword("END") {
                    if case_depth == 0 {
                        return (last, k, false);
                    }
                    case_depth -= 1;
                } else if case_depth == 0
                    && (is_clause_boundary(token) || is_statement_starter(token))
                {
                    return (last, k, false);
                }
            }
            _ => {}
        }
        last = Some(k);
        k += 1;
    }

    (last, k, false)
}

struct Assignment {
    column: String,
    expression: String,
    span: Span,
}

/// Parse `col = expr [, col = expr ...]` starting at `i`. Returns the
/// assignments and the index where the list ended.
fn parse_set_list(tokens: &[Token], src: &str, mut i: usize) -> (Vec<Assignment>, usize) {
    let mut out = Vec::new();

    loop {
        let Some((name, after_name)) = read_qualified(tokens, i) else {
            break;
        };
        let mut j = after_name;
        // compound assignment (`+=`, `-=`, ...) arrives as operator + eq
        if matches!(tokens.get(j).map(|t| &t.kind), Some(TokenKind::Operator(_)))
            && matches!(tokens.get(j + 1).map(|t| &t.kind), Some(TokenKind::Eq))
        {
            j += 1;
        }
        if !matches!(tokens.get(j).map(|t| &t.kind), Some(TokenKind::Eq)) {
            break;
        }
        let (last, next, more) = collect_expression(tokens, j + 1);
        let Some(last) = last else {
            i = next;
            break;
        };
        let expr_span = Span::new(tokens[j + 1].span.start, tokens[last].span.end);
        out.push(Assignment {
            column: name.last,
            expression: src[expr_span.start..expr_span.end].trim().to_string(),
            span: Span::new(name.span.start, expr_span.end),
        });
        i = next;
        if !more {
            break;
        }
    }

    (out, i)
}

/// Parse a parenthesized identifier list starting at the `(` at `i`.
/// Returns the final name segments and the index just past the `)`.
fn parse_name_list(tokens: &[Token], i: usize) -> Option<(Vec<String>, usize)> {
    if !matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::LParen)) {
        return None;
    }
    let mut names = Vec::new();
    let mut j = i + 1;
    loop {
        let (name, after) = read_qualified(tokens, j)?;
        names.push(name.last);
        match tokens.get(after).map(|t| &t.kind) {
            Some(TokenKind::Comma) => j = after + 1,
            Some(TokenKind::RParen) => return Some((names, after + 1)),
            _ => return None,
        }
    }
}

/// Parse a parenthesized expression list starting at the `(` at `i`,
/// splitting at depth-one commas. Returns `(text, span)` items and the index
/// just past the `)`.
fn parse_expr_list(tokens: &[Token], src: &str, i: usize) -> Option<(Vec<(String, Span)>, usize)> {
    if !matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::LParen)) {
        return None;
    }
    let mut items = Vec::new();
    let mut depth = 1usize;
    let mut item_start: Option<usize> = None;
    let mut item_last: Option<usize> = None;
    let mut j = i + 1;

    let mut push_item = |start: Option<usize>, last: Option<usize>, items: &mut Vec<(String, Span)>| {
        if let (Some(s), Some(l)) = (start, last) {
            let span = Span::new(tokens[s].span.start, tokens[l].span.end);
            items.push((src[span.start..span.end].trim().to_string(), span));
        }
    };

    while j < tokens.len() {
        match tokens[j].kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    push_item(item_start, item_last, &mut items);
                    return Some((items, j + 1));
                }
            }
            TokenKind::Comma if depth == 1 => {
                push_item(item_start, item_last, &mut items);
                item_start = None;
                item_last = None;
                j += 1;
                continue;
            }
            _ => {}
        }
        if item_start.is_none() {
            item_start = Some(j);
        }
        item_last = Some(j);
        j += 1;
    }

    None
}

/// Skip `TOP (n) [PERCENT]` if present at `i`.
fn skip_top(tokens: &[Token], mut i: usize) -> usize {
    if tokens.get(i).is_some_and(|t| t.is_keyword("TOP"))
        && matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::LParen))
    {
        i = skip_parens(tokens, i + 1);
        if tokens.get(i).is_some_and(|t| t.is_keyword("PERCENT")) {
            i += 1;
        }
    }
    i
}

/// `UPDATE <target> SET col = expr [, ...]` — returns all assignments in the
/// SET list and the index where scanning should resume.
fn scan_update(tokens: &[Token], src: &str, start: usize) -> Option<(Vec<Assignment>, usize)> {
    let mut i = skip_top(tokens, start + 1);
    let (target, after) = read_qualified(tokens, i)?;
    if target.last.eq_ignore_ascii_case("SET") {
        return None;
    }
    i = after;

    // scan forward to SET at depth zero, tolerating table hints
    let mut depth = 0usize;
    loop {
        let token = tokens.get(i)?;
        match &token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => return None,
            TokenKind::Word { .. } if depth == 0 => {
                if token.is_keyword("SET") {
                    break;
                }
                if token.is_keyword("WITH")
                    && matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::LParen))
                {
                    i = skip_parens(tokens, i + 1);
                    continue;
                }
                if is_statement_starter(token) {
                    return None;
                }
            }
            _ => {}
        }
        i += 1;
    }

    let (assignments, end) = parse_set_list(tokens, src, i + 1);
    Some((assignments, end))
}

/// `INSERT [INTO] <target> (<cols>) { VALUES (<exprs>) | ... SELECT <exprs> }`
fn scan_insert(
    tokens: &[Token],
    src: &str,
    start: usize,
    target: &DetectTarget,
    excerpt_context: usize,
) -> Option<(Vec<Detection>, usize)> {
    let mut i = start + 1;
    loop {
        if tokens.get(i).is_some_and(|t| t.is_keyword("INTO")) {
            i += 1;
        } else {
            let skipped = skip_top(tokens, i);
            if skipped == i {
                break;
            }
            i = skipped;
        }
    }
    let (_table, after) = read_qualified(tokens, i)?;
    let (columns, after_cols) = parse_name_list(tokens, after)?;

    // find VALUES or SELECT at depth zero, tolerating OUTPUT clauses
    let mut depth = 0usize;
    let mut j = after_cols;
    loop {
        let token = tokens.get(j)?;
        match &token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => return None,
            TokenKind::Word { .. } if depth == 0 => {
                if token.is_keyword("VALUES") || token.is_keyword("SELECT") {
                    break;
                }
                if is_statement_starter(token) && !token.is_keyword("OUTPUT") {
                    return None;
                }
            }
            _ => {}
        }
        j += 1;
    }

    let mut detections = Vec::new();
    if tokens[j].is_keyword("VALUES") {
        let (values, end) = parse_expr_list(tokens, src, j + 1)?;
        if let Some(idx) = columns
            .iter()
            .position(|c| target.matches_column(c))
        {
            if let Some((expression, span)) = values.get(idx) {
                detections.push(Detection {
                    kind: WriterKind::InsertValues,
                    expression: Some(expression.clone()),
                    excerpt: excerpt_around(src, *span, excerpt_context),
                    source_tables: Vec::new(),
                    note: None,
                });
            }
        }
        return Some((detections, end));
    }

    // SELECT branch: positional match against the select list, then hand the
    // whole query text to the upstream extractor
    let select_start = tokens[j].span.start;
    let mut items = Vec::new();
    let mut k = j + 1;
    if tokens.get(k).is_some_and(|t| t.is_keyword("DISTINCT")) {
        k += 1;
    }
    k = skip_top(tokens, k);
    loop {
        let (last, next, more) = collect_expression(tokens, k);
        if let Some(last) = last {
            let span = Span::new(tokens[k].span.start, tokens[last].span.end);
            items.push((src[span.start..span.end].trim().to_string(), span));
        }
        k = next;
        if !more {
            break;
        }
    }

    // statement end: semicolon or next statement at depth zero
    let mut depth = 0usize;
    let mut end_byte = tokens
        .get(k.saturating_sub(1))
        .map(|t| t.span.end)
        .unwrap_or(src.len());
    let mut m = k;
    while let Some(token) = tokens.get(m) {
        match &token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => break,
            TokenKind::Word { .. }
                if depth == 0 && is_statement_starter(token) && !token.is_keyword("SELECT") =>
            {
                break
            }
            _ => {}
        }
        end_byte = token.span.end;
        m += 1;
    }

    if let Some(idx) = columns.iter().position(|c| target.matches_column(c)) {
        if let Some((expression, span)) = items.get(idx) {
            let fragment = &src[select_start..end_byte];
            detections.push(Detection {
                kind: WriterKind::InsertSelect,
                expression: Some(expression.clone()),
                excerpt: excerpt_around(src, *span, excerpt_context),
                source_tables: upstream::extract_source_tables(fragment),
                note: None,
            });
        }
    }

    Some((detections, m))
}

/// `MERGE <target> USING <source> ... WHEN ... THEN UPDATE SET / INSERT`
fn scan_merge(
    tokens: &[Token],
    src: &str,
    start: usize,
    target: &DetectTarget,
    excerpt_context: usize,
) -> Option<(Vec<Detection>, usize)> {
    let mut i = start + 1;
    if tokens.get(i).is_some_and(|t| t.is_keyword("INTO")) {
        i += 1;
    }
    i = skip_top(tokens, i);
    let (merge_target, after) = read_qualified(tokens, i)?;
    if merge_target.last.eq_ignore_ascii_case("USING") {
        return None;
    }
    i = after;

    // scan forward to USING at depth zero, tolerating table hints
    let mut depth = 0usize;
    loop {
        let token = tokens.get(i)?;
        match &token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => return None,
            TokenKind::Word { .. } if depth == 0 => {
                if token.is_keyword("USING") {
                    break;
                }
                if token.is_keyword("WITH")
                    && matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::LParen))
                {
                    i = skip_parens(tokens, i + 1);
                    continue;
                }
                if is_statement_starter(token) {
                    return None;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i += 1;

    // merge source: table name or derived query
    let mut source_tables = Vec::new();
    match tokens.get(i).map(|t| &t.kind) {
        Some(TokenKind::LParen) => {
            let after_close = skip_parens(tokens, i);
            let close = after_close.saturating_sub(1);
            if close > i {
                let fragment = &src[tokens[i].span.end..tokens[close].span.start];
                source_tables = upstream::extract_source_tables(fragment);
            }
            i = after_close;
        }
        Some(TokenKind::Word { .. }) => {
            if let Some((name, after_name)) = read_qualified(tokens, i) {
                source_tables.push(name.text);
                i = after_name;
            }
        }
        _ => {}
    }

    // walk WHEN clauses until the statement ends
    let mut detections = Vec::new();
    let mut depth = 0usize;
    while let Some(token) = tokens.get(i) {
        match &token.kind {
            TokenKind::LParen => {
                depth += 1;
                i += 1;
            }
            TokenKind::RParen => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            TokenKind::Semicolon if depth == 0 => {
                i += 1;
                break;
            }
            TokenKind::Word { .. } if depth == 0 && token.is_keyword("WHEN") => {
                // skip the match condition up to THEN
                let mut j = i + 1;
                let mut inner = 0usize;
                let found_then = loop {
                    let Some(t) = tokens.get(j) else { break false };
                    match &t.kind {
                        TokenKind::LParen => inner += 1,
                        TokenKind::RParen => inner = inner.saturating_sub(1),
                        TokenKind::Semicolon if inner == 0 => break false,
                        TokenKind::Word { .. } if inner == 0 && t.is_keyword("THEN") => break true,
                        _ => {}
                    }
                    j += 1;
                };
                if !found_then {
                    i = j;
                    continue;
                }
                let mut j = j + 1;
                if tokens.get(j).is_some_and(|t| t.is_keyword("UPDATE")) {
                    if tokens.get(j + 1).is_some_and(|t| t.is_keyword("SET")) {
                        let (assignments, end) = parse_set_list(tokens, src, j + 2);
                        for a in assignments {
                            if target.matches_column(&a.column) {
                                detections.push(Detection {
                                    kind: WriterKind::MergeUpdate,
                                    expression: Some(a.expression),
                                    excerpt: excerpt_around(src, a.span, excerpt_context),
                                    source_tables: source_tables.clone(),
                                    note: None,
                                });
                            }
                        }
                        i = end;
                        continue;
                    }
                    i = j + 1;
                    continue;
                }
                if tokens.get(j).is_some_and(|t| t.is_keyword("INSERT")) {
                    j += 1;
                    if let Some((columns, after_cols)) = parse_name_list(tokens, j) {
                        if tokens.get(after_cols).is_some_and(|t| t.is_keyword("VALUES")) {
                            if let Some((values, end)) =
                                parse_expr_list(tokens, src, after_cols + 1)
                            {
                                if let Some(idx) =
                                    columns.iter().position(|c| target.matches_column(c))
                                {
                                    if let Some((expression, span)) = values.get(idx) {
                                        detections.push(Detection {
                                            kind: WriterKind::MergeInsert,
                                            expression: Some(expression.clone()),
                                            excerpt: excerpt_around(src, *span, excerpt_context),
                                            source_tables: source_tables.clone(),
                                            note: None,
                                        });
                                    }
                                }
                                i = end;
                                continue;
                            }
                        }
                    }
                    i = j;
                    continue;
                }
                i = j;
            }
            _ => {
                i += 1;
            }
        }
    }

    Some((detections, i))
}

/// Dynamic-SQL heuristic: an execute invocation plus the target names
/// appearing only inside string literals yields a single low-confidence
/// suspicion, never a parsed expression.
fn dynamic_detection(
    src: &str,
    tokens: &[Token],
    target: &DetectTarget,
    excerpt_context: usize,
) -> Option<Detection> {
    let column_lower = target.column.to_lowercase();
    let table_names = target.table_names();

    let mut exec_span: Option<Span> = None;
    let mut column_in_literal = false;
    let mut column_outside = false;
    let mut table_in_literal = table_names.is_empty();
    let mut verb_in_literal = false;

    for token in tokens {
        match &token.kind {
            TokenKind::Word { value, .. } => {
                if value.eq_ignore_ascii_case("sp_executesql")
                    || token.is_keyword("EXEC")
                    || token.is_keyword("EXECUTE")
                {
                    exec_span.get_or_insert(token.span);
                }
                if value.eq_ignore_ascii_case(&target.column) {
                    column_outside = true;
                }
            }
            TokenKind::StringLiteral(content) => {
                let lower = content.to_lowercase();
                if lower.contains(&column_lower) {
                    column_in_literal = true;
                }
                if table_names.iter().any(|t| lower.contains(t)) {
                    table_in_literal = true;
                }
                if ["update", "insert", "merge"].iter().any(|v| lower.contains(v)) {
                    verb_in_literal = true;
                }
            }
            _ => {}
        }
    }

    let exec_span = exec_span?;
    if column_in_literal && !column_outside && table_in_literal && verb_in_literal {
        Some(Detection {
            kind: WriterKind::Dynamic,
            expression: None,
            excerpt: excerpt_around(src, exec_span, excerpt_context),
            source_tables: Vec::new(),
            note: Some("dynamic SQL suspected; manual review required".to_string()),
        })
    } else {
        None
    }
}

/// Excerpt around `span`, expanded by `context` bytes on each side and then
/// trimmed to line boundaries.
pub(crate) fn excerpt_around(src: &str, span: Span, context: usize) -> String {
    let mut start = span.start.saturating_sub(context);
    let mut end = (span.end + context).min(src.len());
    while start > 0 && !src.is_char_boundary(start) {
        start -= 1;
    }
    while end < src.len() && !src.is_char_boundary(end) {
        end += 1;
    }
    if let Some(nl) = src[..start].rfind('\n') {
        start = nl + 1;
    } else {
        start = 0;
    }
    if let Some(nl) = src[end..].find('\n') {
        end += nl;
    } else {
        end = src.len();
    }
    src[start..end].trim().to_string()
}
