//! License declarations and SPDX expression splitting.
//!
//! Licenses arrive in three shapes across the two formats: an SPDX id
//! (`{id}`), a free-form name (`{name}`), or a boolean expression string
//! (`{expression}`, also SPDX `licenseConcluded`/`licenseDeclared`). The
//! parse boundary models this as a tagged variant; the flat token list the
//! canonical model carries is produced by [`LicenseDecl::tokens`].
//!
//! Expression splitting is best-effort extraction, not license-compliance
//! evaluation: `AND`/`OR` operands are collected as individual tokens, with
//! operator semantics discarded. Uses the `spdx` crate in lax mode, falling
//! back to a plain word split for non-standard expressions.

/// A license as declared in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseDecl {
    /// A single license id or name (`MIT`, `Apache License 2.0`).
    Named(String),
    /// An SPDX-style boolean expression (`MIT OR GPL-2.0-only`).
    Expression(String),
}

impl LicenseDecl {
    /// Flatten this declaration into license tokens.
    ///
    /// `NOASSERTION`/`NONE` placeholders yield no token.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::Named(name) => {
                let name = name.trim();
                if name.is_empty() || is_placeholder(name) {
                    Vec::new()
                } else {
                    vec![name.to_string()]
                }
            }
            Self::Expression(expr) => split_expression(expr),
        }
    }
}

/// SPDX placeholder values that carry no license information.
fn is_placeholder(token: &str) -> bool {
    token.eq_ignore_ascii_case("NOASSERTION") || token.eq_ignore_ascii_case("NONE")
}

/// Split a boolean license expression into its constituent identifiers.
///
/// Lax SPDX parsing accepts common non-standard spellings; expressions the
/// `spdx` crate cannot parse at all fall back to a whitespace split that
/// drops `AND`/`OR`/`WITH` operator words and parentheses.
pub fn split_expression(expr: &str) -> Vec<String> {
    let expr = expr.trim();
    if expr.is_empty() || is_placeholder(expr) {
        return Vec::new();
    }

    if let Ok(parsed) = spdx::Expression::parse_mode(expr, spdx::ParseMode::LAX) {
        let tokens: Vec<String> = parsed
            .requirements()
            .map(|req| req.req.to_string())
            .filter(|t| !is_placeholder(t))
            .collect();
        if !tokens.is_empty() {
            return tokens;
        }
    }

    // Fallback for expressions outside the SPDX grammar.
    expr.split_whitespace()
        .map(|word| word.trim_matches(|c| c == '(' || c == ')'))
        .filter(|word| {
            !word.is_empty()
                && !word.eq_ignore_ascii_case("AND")
                && !word.eq_ignore_ascii_case("OR")
                && !word.eq_ignore_ascii_case("WITH")
                && !is_placeholder(word)
        })
        .map(str::to_string)
        .collect()
}
