use crate::{
    model::{Cardinality, ColumnType},
    query::SortDirection,
    value::Value,
};

///
/// Expr
///
/// Value-producing backend expression.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Value),
    /// Untyped array constructor; typed arrays wrap it in a `Cast`.
    Array(Vec<Value>),
    Cast {
        expr: Box<Self>,
        ty: ColumnType,
    },
    /// Text extraction from a structured column (`col #>> '{a,b}'`).
    JsonPath {
        column: Box<Self>,
        path: Vec<String>,
    },
    /// First-dimension length; NULL for NULL and for empty arrays.
    ArrayLength(Box<Self>),
    Func {
        name: String,
        args: Vec<Self>,
    },
}

impl Expr {
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub fn cast(self, ty: ColumnType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            ty,
        }
    }

    #[must_use]
    pub fn json_path(self, path: Vec<String>) -> Self {
        Self::JsonPath {
            column: Box::new(self),
            path,
        }
    }

    #[must_use]
    pub fn array_length(self) -> Self {
        Self::ArrayLength(Box::new(self))
    }

    #[must_use]
    pub fn func(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Func {
            name: name.into(),
            args,
        }
    }

    /// Column name of a plain column reference.
    #[must_use]
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Self::Column(name) => Some(name),
            _ => None,
        }
    }

    // ---- condition builders ----------------------------------------------

    #[must_use]
    pub fn compare(self, op: CompareOp, rhs: Self) -> Condition {
        Condition::Compare { lhs: self, op, rhs }
    }

    #[must_use]
    pub fn eq(self, rhs: Self) -> Condition {
        self.compare(CompareOp::Eq, rhs)
    }

    #[must_use]
    pub fn ne(self, rhs: Self) -> Condition {
        self.compare(CompareOp::Ne, rhs)
    }

    #[must_use]
    pub fn is_distinct_from(self, rhs: Self) -> Condition {
        self.compare(CompareOp::IsDistinctFrom, rhs)
    }

    #[must_use]
    pub const fn is_null(self) -> Condition {
        Condition::IsNull {
            expr: self,
            negated: false,
        }
    }

    #[must_use]
    pub const fn is_not_null(self) -> Condition {
        Condition::IsNull {
            expr: self,
            negated: true,
        }
    }

    #[must_use]
    pub const fn in_list(self, list: Vec<Self>, negated: bool) -> Condition {
        Condition::InList {
            expr: self,
            list,
            negated,
        }
    }

    /// `self op ANY(array)` / `self op ALL(array)`.
    #[must_use]
    pub const fn quantified(self, op: CompareOp, quantifier: Quantifier, array: Self) -> Condition {
        Condition::Quantified {
            lhs: self,
            op,
            quantifier,
            array,
        }
    }
}

///
/// CompareOp
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    IsDistinctFrom,
    IsNotDistinctFrom,
    Like,
    /// Array overlap (`&&`).
    Overlaps,
    /// Array containment (`@>`).
    Contains,
    ContainedBy,
    /// Backend-specific binary operator emitted by a custom operator.
    Custom(String),
}

impl CompareOp {
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::IsDistinctFrom => "IS DISTINCT FROM",
            Self::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
            Self::Like => "LIKE",
            Self::Overlaps => "&&",
            Self::Contains => "@>",
            Self::ContainedBy => "<@",
            Self::Custom(symbol) => symbol,
        }
    }
}

///
/// Quantifier
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Quantifier {
    Any,
    All,
}

///
/// Condition
///
/// Boolean backend predicate. `Group` marks an explicit parenthesisation
/// required to keep precedence when the node is combined with an outer
/// connective.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Const(bool),
    Compare {
        lhs: Expr,
        op: CompareOp,
        rhs: Expr,
    },
    Quantified {
        lhs: Expr,
        op: CompareOp,
        quantifier: Quantifier,
        array: Expr,
    },
    InList {
        expr: Expr,
        list: Vec<Expr>,
        negated: bool,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    /// Holds when a row reached through `relation` satisfies `condition`:
    /// any related row for `Many`, the related row for `One`. Never UNKNOWN.
    Exists {
        relation: String,
        target: String,
        cardinality: Cardinality,
        condition: Box<Self>,
    },
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Group(Box<Self>),
}

impl Condition {
    #[must_use]
    #[expect(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    #[must_use]
    pub fn group(self) -> Self {
        Self::Group(Box::new(self))
    }

    /// Evaluate `self` against the rows `relation` points to.
    #[must_use]
    pub fn through(
        self,
        relation: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self::Exists {
            relation: relation.into(),
            target: target.into(),
            cardinality,
            condition: Box::new(self),
        }
    }
}

///
/// OrderTerm
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderTerm {
    pub expr: Expr,
    pub direction: SortDirection,
}
