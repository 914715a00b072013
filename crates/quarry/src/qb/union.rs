use super::{Query, QueryBuilder, Subquery, TableRef};
use crate::buffer::PooledBuffer;
use crate::error::OrmResult;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    Distinct,
    All,
}

impl UnionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnionKind::Distinct => "UNION",
            UnionKind::All => "UNION ALL",
        }
    }
}

/// `(left) UNION [ALL] (right)`. Chains to the left.
#[derive(Clone)]
pub struct Union {
    left: Arc<dyn QueryBuilder>,
    kind: UnionKind,
    right: Arc<dyn QueryBuilder>,
}

impl Union {
    pub(crate) fn new(
        left: Arc<dyn QueryBuilder>,
        kind: UnionKind,
        right: Arc<dyn QueryBuilder>,
    ) -> Self {
        Self { left, kind, right }
    }

    pub fn union(self, q: impl QueryBuilder + 'static) -> Union {
        Union::new(Arc::new(self), UnionKind::Distinct, Arc::new(q))
    }

    pub fn union_all(self, q: impl QueryBuilder + 'static) -> Union {
        Union::new(Arc::new(self), UnionKind::All, Arc::new(q))
    }

    /// Use the union as a derived table named `alias`.
    ///
    /// It exposes the columns of its leftmost statement's source.
    pub fn as_subquery(self, alias: impl Into<String>) -> Subquery {
        let table = self.source();
        Subquery::new(Arc::new(self), table, Vec::new(), alias.into())
    }
}

impl QueryBuilder for Union {
    fn build(&self) -> OrmResult<Query> {
        let left = self.left.build()?;
        let right = self.right.build()?;

        let mut buf = PooledBuffer::acquire();
        buf.push('(');
        buf.push_str(left.body());
        buf.push_str(") ");
        buf.push_str(self.kind.as_str());
        buf.push_str(" (");
        buf.push_str(right.body());
        buf.push_str(");");

        let mut args = left.args;
        args.extend(right.args);
        Ok(Query {
            sql: buf.as_str().to_string(),
            args,
        })
    }

    fn source(&self) -> Option<TableRef> {
        self.left.source()
    }
}

impl fmt::Debug for Union {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Union")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
