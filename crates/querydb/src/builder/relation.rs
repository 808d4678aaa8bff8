//! Joins and union members.

use super::QueryBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// A JOIN clause. The ON text is rendered verbatim and binds nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: String,
    pub on: String,
    pub kind: JoinKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    Union,
    UnionAll,
}

impl UnionKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            UnionKind::Union => "UNION",
            UnionKind::UnionAll => "UNION ALL",
        }
    }
}

/// A builder combined into its parent with UNION / UNION ALL.
#[derive(Debug, Clone)]
pub struct UnionMember {
    pub(crate) query: QueryBuilder,
    pub(crate) kind: UnionKind,
}

impl UnionMember {
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn kind(&self) -> UnionKind {
        self.kind
    }
}

impl QueryBuilder {
    fn push_join(mut self, table: &str, on: &str, kind: JoinKind) -> Self {
        self.joins.push(Join {
            table: table.to_string(),
            on: on.to_string(),
            kind,
        });
        self
    }

    /// Add INNER JOIN.
    pub fn join(self, table: &str, on: &str) -> Self {
        self.push_join(table, on, JoinKind::Inner)
    }

    /// Add LEFT JOIN.
    pub fn left_join(self, table: &str, on: &str) -> Self {
        self.push_join(table, on, JoinKind::Left)
    }

    /// Add RIGHT JOIN.
    pub fn right_join(self, table: &str, on: &str) -> Self {
        self.push_join(table, on, JoinKind::Right)
    }

    fn attach_unions(
        mut self,
        members: impl IntoIterator<Item = QueryBuilder>,
        kind: UnionKind,
    ) -> Self {
        for query in members {
            // The member's values are copied now; its placeholders render after ours.
            self.args.extend(&query.args);
            self.union_args += query.args.len();
            self.unions.push(UnionMember { query, kind });
        }
        self
    }

    /// Combine with one or more SELECTs using UNION.
    pub fn union(self, members: impl IntoIterator<Item = QueryBuilder>) -> Self {
        self.attach_unions(members, UnionKind::Union)
    }

    /// Combine with one or more SELECTs using UNION ALL (keeps duplicates).
    pub fn union_all(self, members: impl IntoIterator<Item = QueryBuilder>) -> Self {
        self.attach_unions(members, UnionKind::UnionAll)
    }
}
