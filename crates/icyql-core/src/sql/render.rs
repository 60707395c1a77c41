use crate::{
    query::SortDirection,
    sql::{Condition, Expr, OrderTerm, Quantifier},
    value::Value,
};
use std::fmt;

///
/// Sql
///
/// Rendered statement fragment with positional (`$n`) bind parameters.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sql {
    pub text: String,
    pub params: Vec<Value>,
}

/// Render a condition with bind parameters.
#[must_use]
pub fn render(condition: &Condition) -> Sql {
    let mut renderer = Renderer::bind();
    renderer.condition(condition);
    renderer.finish()
}

/// Render a value expression with bind parameters.
#[must_use]
pub fn render_expr(expr: &Expr) -> Sql {
    let mut renderer = Renderer::bind();
    renderer.expr(expr);
    renderer.finish()
}

/// Render an ORDER BY list with bind parameters.
#[must_use]
pub fn render_ordering(ordering: &[OrderTerm]) -> Sql {
    let mut renderer = Renderer::bind();
    for (i, term) in ordering.iter().enumerate() {
        if i > 0 {
            renderer.text.push_str(", ");
        }
        renderer.order_term(term);
    }
    renderer.finish()
}

/// Render a `SELECT` over one table. A `TRUE` filter emits no `WHERE`.
pub(crate) fn render_select(
    table: &str,
    columns: &[Expr],
    filter: &Condition,
    ordering: &[OrderTerm],
) -> Sql {
    let mut renderer = Renderer::bind();

    renderer.text.push_str("SELECT ");
    if columns.is_empty() {
        renderer.text.push('*');
    } else {
        renderer.expr_list(columns);
    }

    renderer.text.push_str(" FROM ");
    renderer.identifier(table);

    if *filter != Condition::Const(true) {
        renderer.text.push_str(" WHERE ");
        renderer.condition(filter);
    }

    for (i, term) in ordering.iter().enumerate() {
        renderer
            .text
            .push_str(if i == 0 { " ORDER BY " } else { ", " });
        renderer.order_term(term);
    }

    renderer.finish()
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::inline();
        renderer.condition(self);
        f.write_str(&renderer.text)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::inline();
        renderer.expr(self);
        f.write_str(&renderer.text)
    }
}

impl fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::inline();
        renderer.order_term(self);
        f.write_str(&renderer.text)
    }
}

///
/// Renderer
///
/// Literals are either inlined (Display, logging) or collected as bind
/// parameters (`render`). NULL is always inlined.
///

struct Renderer {
    text: String,
    params: Option<Vec<Value>>,
}

impl Renderer {
    const fn inline() -> Self {
        Self {
            text: String::new(),
            params: None,
        }
    }

    const fn bind() -> Self {
        Self {
            text: String::new(),
            params: Some(Vec::new()),
        }
    }

    fn finish(self) -> Sql {
        Sql {
            text: self.text,
            params: self.params.unwrap_or_default(),
        }
    }

    fn literal(&mut self, value: &Value) {
        match (&mut self.params, value) {
            (_, Value::Null) | (None, _) => self.text.push_str(&value.to_string()),
            (Some(params), _) => {
                params.push(value.clone());
                self.text.push_str(&format!("${}", params.len()));
            }
        }
    }

    fn identifier(&mut self, name: &str) {
        let plain = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if plain {
            self.text.push_str(name);
        } else {
            self.text
                .push_str(&format!("\"{}\"", name.replace('"', "\"\"")));
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Column(name) => self.identifier(name),
            Expr::Literal(value) => self.literal(value),
            Expr::Array(items) => {
                self.text.push_str("ARRAY[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.text.push_str(", ");
                    }
                    self.literal(item);
                }
                self.text.push(']');
            }
            Expr::Cast { expr, ty } => {
                self.text.push_str("CAST(");
                self.expr(expr);
                self.text.push_str(" AS ");
                self.text.push_str(&ty.sql_name());
                self.text.push(')');
            }
            Expr::JsonPath { column, path } => {
                self.text.push('(');
                self.expr(column);
                self.text.push_str(" #>> ");
                if self.params.is_some() {
                    self.literal(&Value::list(path.iter().map(String::as_str)));
                } else {
                    self.text.push_str(&text_array_literal(path));
                }
                self.text.push(')');
            }
            Expr::ArrayLength(inner) => {
                self.text.push_str("array_length(");
                self.expr(inner);
                self.text.push_str(", 1)");
            }
            Expr::Func { name, args } => {
                self.text.push_str(name);
                self.text.push('(');
                self.expr_list(args);
                self.text.push(')');
            }
        }
    }

    fn expr_list(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.text.push_str(", ");
            }
            self.expr(expr);
        }
    }

    fn condition(&mut self, condition: &Condition) {
        match condition {
            Condition::Const(true) => self.text.push_str("TRUE"),
            Condition::Const(false) => self.text.push_str("FALSE"),
            Condition::Compare { lhs, op, rhs } => {
                self.expr(lhs);
                self.operator(op.symbol());
                self.expr(rhs);
            }
            Condition::Quantified {
                lhs,
                op,
                quantifier,
                array,
            } => {
                self.expr(lhs);
                let quantifier = match quantifier {
                    Quantifier::Any => "ANY",
                    Quantifier::All => "ALL",
                };
                self.operator(op.symbol());
                self.text.push_str(quantifier);
                self.text.push('(');
                self.expr(array);
                self.text.push(')');
            }
            Condition::InList {
                list,
                negated,
                expr: _,
            } if list.is_empty() => {
                self.text.push_str(if *negated { "TRUE" } else { "FALSE" });
            }
            Condition::InList {
                expr,
                list,
                negated,
            } => {
                self.expr(expr);
                self.text
                    .push_str(if *negated { " NOT IN (" } else { " IN (" });
                self.expr_list(list);
                self.text.push(')');
            }
            Condition::IsNull { expr, negated } => {
                self.expr(expr);
                self.text
                    .push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            // Correlation between the outer row and the relation alias belongs
            // to the executor, which owns relation loading.
            Condition::Exists {
                relation,
                target,
                condition,
                cardinality: _,
            } => {
                self.text.push_str("EXISTS (SELECT 1 FROM ");
                self.identifier(target);
                self.text.push_str(" AS ");
                self.identifier(relation);
                self.text.push_str(" WHERE ");
                self.condition(condition);
                self.text.push(')');
            }
            Condition::And(children) => self.connective(children, " AND ", "TRUE"),
            Condition::Or(children) => self.connective(children, " OR ", "FALSE"),
            Condition::Not(inner) => {
                self.text.push_str("NOT ");
                if matches!(**inner, Condition::Group(_)) {
                    self.condition(inner);
                } else {
                    self.text.push('(');
                    self.condition(inner);
                    self.text.push(')');
                }
            }
            Condition::Group(inner) => {
                self.text.push('(');
                self.condition(inner);
                self.text.push(')');
            }
        }
    }

    fn operator(&mut self, symbol: &str) {
        self.text.push(' ');
        self.text.push_str(symbol);
        self.text.push(' ');
    }

    fn connective(&mut self, children: &[Condition], separator: &str, empty: &str) {
        if children.is_empty() {
            self.text.push_str(empty);
            return;
        }

        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.text.push_str(separator);
            }
            // Nested connectives without an explicit group still need parens.
            if matches!(child, Condition::And(_) | Condition::Or(_)) {
                self.text.push('(');
                self.condition(child);
                self.text.push(')');
            } else {
                self.condition(child);
            }
        }
    }

    fn order_term(&mut self, term: &OrderTerm) {
        self.expr(&term.expr);
        self.text.push_str(match term.direction {
            SortDirection::Asc => " ASC",
            SortDirection::Desc => " DESC",
        });
    }
}

// Postgres text[] literal: '{"a","b"}'.
fn text_array_literal(items: &[String]) -> String {
    let body = items
        .iter()
        .map(|item| format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(",");

    format!("'{{{}}}'", body.replace('\'', "''"))
}
