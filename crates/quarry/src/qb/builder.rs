use super::table::{Join, Subquery};
use super::{Query, QueryBuilder, TableRef};
use crate::buffer::PooledBuffer;
use crate::error::{OrmError, OrmResult};
use crate::expr::{Aggregate, Assignment, Column, Expr, Op, Predicate};
use crate::model::{Model, Registry};
use crate::session::Core;
use crate::value::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Renders expression trees and table references into SQL text and args.
///
/// One builder renders one statement. Text and arguments are produced in a
/// single pass so that argument order always matches placeholder order. The
/// output buffer comes from a shared pool and goes back when the builder is
/// dropped, whether rendering succeeded or not.
pub struct Builder<'a> {
    core: &'a Core,
    model: Arc<Model>,
    quoter: char,
    buf: PooledBuffer,
    args: Vec<Value>,
    aliases: HashSet<String>,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(core: &'a Core, model: Arc<Model>) -> Self {
        Self {
            core,
            model,
            quoter: core.dialect.quoter(),
            buf: PooledBuffer::acquire(),
            args: Vec::new(),
            aliases: HashSet::new(),
        }
    }

    /// Model unqualified columns resolve against.
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.core.registry
    }

    pub fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn write_char(&mut self, c: char) {
        self.buf.push(c);
    }

    /// Write `name` wrapped in the dialect's quote character.
    pub fn quote(&mut self, name: &str) {
        self.buf.push(self.quoter);
        self.buf.push_str(name);
        self.buf.push(self.quoter);
    }

    /// Write a placeholder bound to `value`.
    pub fn push_arg(&mut self, value: Value) {
        self.buf.push('?');
        self.args.push(value);
    }

    pub(crate) fn add_args(&mut self, args: impl IntoIterator<Item = Value>) {
        self.args.extend(args);
    }

    /// Terminate the statement and hand out the rendered query.
    pub(crate) fn finish(mut self) -> Query {
        self.buf.push(';');
        Query {
            sql: self.buf.as_str().to_string(),
            args: std::mem::take(&mut self.args),
        }
    }

    /// ` AS `alias``, registering the alias. Empty aliases render nothing.
    pub(crate) fn build_as(&mut self, alias: &str) -> OrmResult<()> {
        if alias.is_empty() {
            return Ok(());
        }
        if !self.aliases.insert(alias.to_string()) {
            return Err(OrmError::DuplicateAlias(alias.to_string()));
        }
        self.write_str(" AS ");
        self.quote(alias);
        Ok(())
    }

    /// Resolve a logical field name to the column name to render.
    ///
    /// With `use_alias`, an unqualified name matching an alias already
    /// introduced in this statement resolves to the alias itself.
    pub(crate) fn col_name(
        &self,
        table: Option<&TableRef>,
        name: &str,
        use_alias: bool,
    ) -> OrmResult<String> {
        match table {
            None => {
                if use_alias && self.aliases.contains(name) {
                    return Ok(name.to_string());
                }
                Ok(self.model.require_field(name)?.column.clone())
            }
            Some(TableRef::Table(t)) => {
                let model = t.model(self.registry())?;
                Ok(model.require_field(name)?.column.clone())
            }
            Some(TableRef::Subquery(sub)) => {
                if sub.columns.is_empty() {
                    return self.col_name(sub.table.as_deref(), name, use_alias);
                }
                for col in &sub.columns {
                    if col.selected_alias() == name {
                        return Ok(name.to_string());
                    }
                    if col.field_name() == name {
                        let target = col.target().or(sub.table.as_deref());
                        return self.col_name(target, name, use_alias);
                    }
                }
                Err(OrmError::unknown_field(name))
            }
            Some(TableRef::Union(u)) => {
                let source = u.source();
                self.col_name(source.as_ref(), name, use_alias)
            }
            Some(TableRef::Join(_)) => Err(OrmError::UnsupportedExpression(format!(
                "column `{name}` cannot be resolved through a join"
            ))),
        }
    }

    pub(crate) fn build_column_ref(
        &mut self,
        table: Option<&TableRef>,
        name: &str,
        use_alias: bool,
    ) -> OrmResult<()> {
        if let Some(alias) = table.map(TableRef::alias).filter(|a| !a.is_empty()) {
            self.quote(alias);
            self.write_char('.');
        }
        let column = self.col_name(table, name, use_alias)?;
        self.quote(&column);
        Ok(())
    }

    pub(crate) fn build_column(&mut self, col: &Column, use_alias: bool) -> OrmResult<()> {
        self.build_column_ref(col.table.as_ref(), &col.name, use_alias)
    }

    pub(crate) fn build_aggregate(&mut self, agg: &Aggregate, use_alias: bool) -> OrmResult<()> {
        self.write_str(agg.func);
        self.write_char('(');
        self.build_column_ref(agg.table.as_ref(), &agg.arg, use_alias)?;
        self.write_char(')');
        if use_alias {
            self.build_as(&agg.alias)?;
        }
        Ok(())
    }

    /// `(inner)`, splicing the inner args at this position.
    pub(crate) fn build_subquery(&mut self, sub: &Subquery, use_alias: bool) -> OrmResult<()> {
        let q = sub.builder.build()?;
        self.write_char('(');
        self.write_str(q.body());
        self.write_char(')');
        self.add_args(q.args);
        if use_alias {
            self.build_as(&sub.alias)?;
        }
        Ok(())
    }

    /// Fold `ps` with AND, left to right, and render the result.
    pub(crate) fn build_predicates(
        &mut self,
        ps: &[Predicate],
        cols_alias: bool,
        aggre_alias: bool,
    ) -> OrmResult<()> {
        let Some((first, rest)) = ps.split_first() else {
            return Ok(());
        };
        let folded = rest
            .iter()
            .cloned()
            .fold(first.clone(), |acc, p| acc.and(p));
        self.build_expression(&Expr::Predicate(folded), cols_alias, aggre_alias)
    }

    /// `` `column` = expr `` against the builder's model.
    pub fn build_assignment(&mut self, a: &Assignment) -> OrmResult<()> {
        let column = self.model.require_field(&a.column)?.column.clone();
        self.quote(&column);
        self.write_str(" = ");
        self.build_expression(&a.value, false, false)
    }

    /// Render any expression node.
    ///
    /// `cols_alias` lets bare columns resolve to select aliases; `aggre_alias`
    /// renders aggregate aliases with `AS`.
    pub(crate) fn build_expression(
        &mut self,
        e: &Expr,
        cols_alias: bool,
        aggre_alias: bool,
    ) -> OrmResult<()> {
        match e {
            Expr::Column(c) => self.build_column(c, cols_alias),
            Expr::Aggregate(a) => self.build_aggregate(a, aggre_alias),
            Expr::Value(v) => {
                self.push_arg(v.clone());
                Ok(())
            }
            Expr::Raw(r) => {
                self.write_str(&r.sql);
                self.add_args(r.args.iter().cloned());
                Ok(())
            }
            Expr::Math(m) => self.build_binary(
                Some(&*m.left),
                Some(m.op),
                Some(&*m.right),
                cols_alias,
                aggre_alias,
            ),
            Expr::Predicate(p) => self.build_binary(
                p.left.as_deref(),
                p.op,
                p.right.as_deref(),
                cols_alias,
                aggre_alias,
            ),
            Expr::Subquery(s) => self.build_subquery(s, false),
            Expr::SubqueryExpr(s) => {
                self.write_str(s.quantifier.as_str());
                self.write_char(' ');
                self.build_subquery(&s.sub, false)
            }
        }
    }

    fn build_binary(
        &mut self,
        left: Option<&Expr>,
        op: Option<Op>,
        right: Option<&Expr>,
        cols_alias: bool,
        aggre_alias: bool,
    ) -> OrmResult<()> {
        if let Some(left) = left {
            self.build_sub_expr(left, cols_alias, aggre_alias)?;
        }
        if let Some(op) = op {
            if left.is_some() {
                self.write_char(' ');
            }
            self.write_str(op.as_str());
            if right.is_some() {
                self.write_char(' ');
            }
        }
        if let Some(right) = right {
            self.build_sub_expr(right, cols_alias, aggre_alias)?;
        }
        Ok(())
    }

    /// Operands that are themselves binary nodes get parentheses; leaves don't.
    fn build_sub_expr(&mut self, e: &Expr, cols_alias: bool, aggre_alias: bool) -> OrmResult<()> {
        match e {
            Expr::Math(_) | Expr::Predicate(_) => {
                self.write_char('(');
                self.build_expression(e, cols_alias, aggre_alias)?;
                self.write_char(')');
                Ok(())
            }
            _ => self.build_expression(e, cols_alias, aggre_alias),
        }
    }

    /// Render a FROM target; `None` is the model's own table.
    pub(crate) fn build_table(&mut self, table: Option<&TableRef>) -> OrmResult<()> {
        match table {
            None => {
                let model = Arc::clone(&self.model);
                self.quote(&model.table_name);
                Ok(())
            }
            Some(TableRef::Table(t)) => {
                let model = t.model(self.registry())?;
                self.quote(&model.table_name);
                self.build_as(&t.alias)
            }
            Some(TableRef::Join(j)) => self.build_join(j),
            Some(TableRef::Subquery(s)) => self.build_subquery(s, true),
            Some(TableRef::Union(u)) => {
                let q = u.build()?;
                self.write_char('(');
                self.write_str(q.body());
                self.write_char(')');
                self.add_args(q.args);
                Ok(())
            }
        }
    }

    fn build_join(&mut self, j: &Join) -> OrmResult<()> {
        self.write_char('(');
        self.build_table(Some(&j.left))?;
        self.write_char(' ');
        self.write_str(j.kind.as_str());
        self.write_char(' ');
        self.build_table(Some(&j.right))?;
        if !j.using.is_empty() {
            self.write_str(" USING (");
            for (i, col) in j.using.iter().enumerate() {
                if i > 0 {
                    self.write_char(',');
                }
                self.build_column_ref(None, col, false)?;
            }
            self.write_char(')');
        }
        if !j.on.is_empty() {
            self.write_str(" ON ");
            self.build_predicates(&j.on, false, false)?;
        }
        self.write_char(')');
        Ok(())
    }
}
