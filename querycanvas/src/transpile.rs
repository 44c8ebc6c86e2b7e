//! Rewrites applied to raw SQL fragments typed by the user.

use once_cell::sync::Lazy;
use regex::Regex;

static IIF_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bIIF\s*\(").expect("static regex is valid"));

static AGGREGATE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(SUM|AVG|MIN|MAX|COUNT)\s*\(").expect("static regex is valid")
});

/// Rewrite every `IIF(cond, a, b)` into `CASE WHEN cond THEN a ELSE b END`.
///
/// Arguments are split on top-level commas only, so nested calls and quoted
/// commas survive. A call that does not close or has other than three
/// arguments is left as written.
pub fn transpile_iif(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(m) = IIF_CALL.find(rest) {
        out.push_str(&rest[..m.start()]);
        let after_open = &rest[m.end()..];
        match split_call_args(after_open) {
            Some((args, consumed)) if args.len() == 3 => {
                let cond = transpile_iif(args[0].trim());
                let then = transpile_iif(args[1].trim());
                let otherwise = transpile_iif(args[2].trim());
                out.push_str(&format!("CASE WHEN {cond} THEN {then} ELSE {otherwise} END"));
                rest = &after_open[consumed..];
            }
            _ => {
                out.push_str(m.as_str());
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Heuristic: does the expression start with an aggregate function call?
pub fn is_aggregate_expression(expr: &str) -> bool {
    AGGREGATE_CALL.is_match(expr)
}

/// Split the argument list following an opening parenthesis. Returns the raw
/// arguments and the number of bytes consumed including the closing `)`.
fn split_call_args(input: &str) -> Option<(Vec<String>, usize)> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0usize;

    let mut chars = input.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if in_quote {
            if ch == '\'' {
                // '' is an escaped quote inside a literal
                if matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                } else {
                    in_quote = false;
                }
            }
            continue;
        }
        match ch {
            '\'' => in_quote = true,
            '(' => depth += 1,
            ')' if depth == 0 => {
                args.push(input[start..idx].to_string());
                return Some((args, idx + 1));
            }
            ')' => depth -= 1,
            ',' if depth == 0 => {
                args.push(input[start..idx].to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    None
}
