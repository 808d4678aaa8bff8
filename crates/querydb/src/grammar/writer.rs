//! SQL text assembly with deferred placeholder numbering.

use std::fmt::Write;

/// Positional placeholder syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `$1, $2, ...` (PostgreSQL)
    #[default]
    Dollar,
    /// `?` for every value
    Question,
}

#[derive(Debug)]
enum SqlPart {
    Raw(String),
    Placeholder,
}

/// Collects SQL pieces and placeholder slots separately, so fragments rendered for union
/// members can be spliced into the parent and numbered once at the end.
#[derive(Debug, Default)]
pub(crate) struct SqlWriter {
    parts: Vec<SqlPart>,
    placeholders: usize,
}

impl SqlWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append raw SQL.
    pub(crate) fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append one placeholder slot.
    pub(crate) fn push_placeholder(&mut self) -> &mut Self {
        self.parts.push(SqlPart::Placeholder);
        self.placeholders += 1;
        self
    }

    /// Append `count` comma-separated placeholder slots.
    pub(crate) fn push_placeholder_list(&mut self, count: usize) -> &mut Self {
        for i in 0..count {
            if i > 0 {
                self.push(", ");
            }
            self.push_placeholder();
        }
        self
    }

    /// Append another writer, consuming it.
    pub(crate) fn push_writer(&mut self, other: SqlWriter) -> &mut Self {
        for part in other.parts {
            match part {
                SqlPart::Raw(s) => {
                    self.push(&s);
                }
                SqlPart::Placeholder => {
                    self.push_placeholder();
                }
            }
        }
        self
    }

    /// Append another writer wrapped in parentheses.
    pub(crate) fn push_parenthesized(&mut self, other: SqlWriter) -> &mut Self {
        self.push("(");
        self.push_writer(other);
        self.push(")")
    }

    pub(crate) fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Render the SQL text, numbering placeholders left to right.
    pub(crate) fn render(&self, style: Placeholder) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Placeholder => match style {
                    Placeholder::Dollar => {
                        idx += 1;
                        let _ = write!(&mut out, "${}", idx);
                    }
                    Placeholder::Question => out.push('?'),
                },
            }
        }
        out
    }
}
