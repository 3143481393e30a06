//! Filter expressions: `status='active' AND serial>10 OR name='John Doe'`.
//!
//! A filter is a flat sequence `term (op term)*` where each term is
//! `<column><comparator><value>` with no spaces around the comparator, `op` is
//! `AND` or `OR` (any case), the comparator is one of `=`, `>`, `<`, and the
//! value is a single-quoted string or a decimal number.
//!
//! Terms are split on whitespace outside quoted literals, so a literal may
//! contain spaces. Inside a literal `''` stands for one quote.

use super::{GrammarError, Whitelist};
use crate::dialect::Dialect;
use crate::value::Value;

/// Comparison operator of a filter term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Equal: `=`
    Eq,
    /// Greater than: `>`
    Gt,
    /// Less than: `<`
    Lt,
}

impl Comparator {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(Self::Eq),
            '>' => Some(Self::Gt),
            '<' => Some(Self::Lt),
            _ => None,
        }
    }

    /// SQL spelling.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }
}

/// Boolean operator between filter terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Connective {
    fn parse(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else {
            None
        }
    }

    /// SQL spelling.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// A filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer.
    Int(i64),
    /// Decimal number with a fractional part, or an integer too large for `i64`.
    Float(f64),
    /// Quoted string, quotes removed and `''` unescaped.
    Text(String),
}

impl Literal {
    fn parse(raw: &str) -> Option<Self> {
        if let Some(body) = raw.strip_prefix('\'') {
            return unquote(body.strip_suffix('\'')?).map(Self::Text);
        }
        if !is_decimal(raw) {
            return None;
        }
        if !raw.contains('.')
            && let Ok(i) = raw.parse::<i64>()
        {
            return Some(Self::Int(i));
        }
        // Out-of-range decimals parse to infinity.
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Self::Float)
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::Int(*i),
            Self::Float(f) => Value::Float(*f),
            Self::Text(s) => Value::Text(s.clone()),
        }
    }
}

/// Undo `''` escaping; a lone quote inside the literal is invalid.
fn unquote(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\'' && chars.next() != Some('\'') {
            return None;
        }
        out.push(c);
    }
    Some(out)
}

/// `-?digits(.digits)?`; rejects `inf`, `NaN`, exponents and bare dots.
fn is_decimal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.is_none_or(digits)
}

/// One `<column><comparator><value>` term.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Whitelisted column.
    pub column: String,
    /// Comparator.
    pub comparator: Comparator,
    /// Value, bound as a parameter.
    pub value: Literal,
}

impl Predicate {
    fn parse(whitelist: &Whitelist, term: &str) -> Result<Self, GrammarError> {
        let (idx, comparator) = term
            .char_indices()
            .find_map(|(i, c)| Comparator::from_char(c).map(|cmp| (i, cmp)))
            .ok_or_else(|| GrammarError::MissingComparator(term.to_string()))?;

        let column = &term[..idx];
        let raw_value = &term[idx + 1..];

        if !whitelist.contains(column) {
            return Err(GrammarError::ColumnNotAllowed(column.to_string()));
        }
        let value =
            Literal::parse(raw_value).ok_or_else(|| GrammarError::InvalidValue(term.to_string()))?;

        Ok(Self {
            column: column.to_string(),
            comparator,
            value,
        })
    }
}

/// A validated filter: one or more terms joined by `AND`/`OR`.
///
/// `N` terms always carry exactly `N - 1` connectives. Connectives keep SQL
/// precedence (`AND` binds tighter than `OR`) when rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    first: Predicate,
    rest: Vec<(Connective, Predicate)>,
}

impl FilterExpression {
    /// All terms in order.
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, p)| p))
    }

    /// Connectives in order.
    pub fn connectives(&self) -> impl Iterator<Item = Connective> + '_ {
        self.rest.iter().map(|(c, _)| *c)
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    /// Always `false`; a filter has at least one term.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Render with bind placeholders starting at `start_idx`.
    ///
    /// Columns are emitted unqualified; values become parameters.
    /// Returns `(sql, params, next_idx)`.
    pub fn to_sql<D: Dialect>(&self, dialect: &D, start_idx: usize) -> (String, Vec<Value>, usize) {
        let mut idx = start_idx;
        let mut params = Vec::with_capacity(self.len());
        let mut sql = String::new();

        let mut render = |sql: &mut String, p: &Predicate| {
            sql.push_str(&format!(
                "{} {} {}",
                p.column,
                p.comparator.as_sql(),
                dialect.param(idx)
            ));
            params.push(p.value.to_value());
            idx += 1;
        };

        render(&mut sql, &self.first);
        for (op, predicate) in &self.rest {
            sql.push(' ');
            sql.push_str(op.as_sql());
            sql.push(' ');
            render(&mut sql, predicate);
        }

        (sql, params, idx)
    }
}

/// Split on whitespace outside single-quoted literals.
fn tokenize(input: &str) -> Result<Vec<&str>, GrammarError> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quote = false;

    for (i, c) in input.char_indices() {
        if c == '\'' {
            in_quote = !in_quote;
        }
        if c.is_whitespace() && !in_quote {
            if let Some(s) = start.take() {
                tokens.push(&input[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if in_quote {
        return Err(GrammarError::UnterminatedQuote);
    }
    if let Some(s) = start {
        tokens.push(&input[s..]);
    }
    Ok(tokens)
}

/// Parse a filter string against a whitelist. Empty input yields `None`.
pub fn parse_filter(
    whitelist: &Whitelist,
    input: &str,
) -> Result<Option<FilterExpression>, GrammarError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    if whitelist.is_empty() {
        return Err(GrammarError::EmptyWhitelist);
    }

    let tokens = tokenize(input)?;
    let mut tokens = tokens.into_iter();

    let Some(head) = tokens.next() else {
        return Ok(None);
    };
    if Connective::parse(head).is_some() {
        return Err(GrammarError::LeadingOperator(head.to_string()));
    }
    let first = Predicate::parse(whitelist, head)?;

    let mut rest = Vec::new();
    while let Some(word) = tokens.next() {
        let Some(op) = Connective::parse(word) else {
            return Err(if word.chars().any(|c| Comparator::from_char(c).is_some()) {
                GrammarError::MissingOperator(word.to_string())
            } else {
                GrammarError::UnknownOperator(word.to_string())
            });
        };

        let term = match tokens.next() {
            Some(term) if Connective::parse(term).is_none() => term,
            _ => return Err(GrammarError::DanglingOperator(word.to_string())),
        };
        rest.push((op, Predicate::parse(whitelist, term)?));
    }

    Ok(Some(FilterExpression { first, rest }))
}

/// Whether `input` is a valid filter for `whitelist`.
pub fn validate_filter(whitelist: &Whitelist, input: &str) -> bool {
    parse_filter(whitelist, input).is_ok()
}
