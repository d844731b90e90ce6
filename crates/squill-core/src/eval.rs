//! Query-difficulty classification.
//!
//! Parsing is delegated to the `sqlparser` crate; this module only counts
//! query components over the parsed tree and maps the counts to the four
//! benchmark buckets. Aggregate multiplicity, projection width, predicate
//! width, join fan-out, and nesting each push a query toward the harder
//! buckets, matching the reference evaluation tool's thresholds.

use crate::records::Difficulty;
use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr,
    JoinConstraint, JoinOperator, Query, Select, SelectItem, SetExpr, Statement,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to parse query: {0}")]
    Parse(#[from] sqlparser::parser::ParserError),

    #[error("statement is not a select query")]
    NotAQuery,
}

/// Classifies one SQL query into a difficulty bucket.
///
/// # Errors
/// Returns `EvalError` when the query cannot be parsed or is not a select
/// statement; callers treat that as an absent difficulty, not a fatal error.
pub fn classify_difficulty(query: &str) -> Result<Difficulty, EvalError> {
    let statements = Parser::parse_sql(&GenericDialect {}, query)?;
    let query = statements
        .into_iter()
        .find_map(|statement| match statement {
            Statement::Query(q) => Some(q),
            _ => None,
        })
        .ok_or(EvalError::NotAQuery)?;

    Ok(bucket(count_query(&query)))
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    /// Joins, filters, grouping, ordering, limits, disjunctions, patterns.
    surface: usize,
    /// Nested query blocks: set operations and condition subqueries.
    nested: usize,
    /// Multiplicity extras: >1 aggregate, projection, predicate, grouping.
    extras: usize,
}

fn bucket(c: Counts) -> Difficulty {
    if c.surface <= 1 && c.extras == 0 && c.nested == 0 {
        Difficulty::Easy
    } else if (c.extras <= 2 && c.surface <= 1 && c.nested == 0)
        || (c.surface <= 2 && c.extras < 2 && c.nested == 0)
    {
        Difficulty::Medium
    } else if (c.extras > 2 && c.surface <= 2 && c.nested == 0)
        || (c.surface > 2 && c.surface <= 3 && c.extras <= 2 && c.nested == 0)
        || (c.surface <= 1 && c.extras == 0 && c.nested <= 1)
    {
        Difficulty::Hard
    } else {
        Difficulty::Extra
    }
}

fn count_query(query: &Query) -> Counts {
    let mut counts = Counts::default();

    if !query.order_by.is_empty() {
        counts.surface += 1;
    }
    if query.limit.is_some() {
        counts.surface += 1;
    }

    let mut agg_count = 0;
    for order in &query.order_by {
        agg_count += count_aggregates(&order.expr);
    }

    if let Some(select) = main_select(&query.body, &mut counts.nested) {
        count_select(select, &mut counts, &mut agg_count);
    }

    if agg_count > 1 {
        counts.extras += 1;
    }

    counts
}

/// Walks to the leftmost select block, counting each set operation along the
/// way as a nested query.
fn main_select<'a>(body: &'a SetExpr, nested: &mut usize) -> Option<&'a Select> {
    match body {
        SetExpr::Select(select) => Some(select.as_ref()),
        SetExpr::Query(query) => main_select(&query.body, nested),
        SetExpr::SetOperation { left, .. } => {
            *nested += 1;
            main_select(left, nested)
        }
        _ => None,
    }
}

fn count_select(select: &Select, counts: &mut Counts, agg_count: &mut usize) {
    // Joins: every table unit beyond the first.
    let table_units: usize = select.from.iter().map(|twj| 1 + twj.joins.len()).sum();
    if table_units > 1 {
        counts.surface += table_units - 1;
    }

    if select.selection.is_some() {
        counts.surface += 1;
    }

    let group_exprs: &[Expr] = match &select.group_by {
        GroupByExpr::Expressions(exprs) => exprs.as_slice(),
        GroupByExpr::All => &[],
    };
    if !group_exprs.is_empty() {
        counts.surface += 1;
    }
    if group_exprs.len() > 1 {
        counts.extras += 1;
    }

    // Condition expressions: WHERE, HAVING, and join ON constraints all
    // contribute disjunctions, pattern matches, and nested subqueries.
    let mut conditions: Vec<&Expr> = Vec::new();
    if let Some(selection) = &select.selection {
        conditions.push(selection);
    }
    if let Some(having) = &select.having {
        conditions.push(having);
    }
    for twj in &select.from {
        for join in &twj.joins {
            if let Some(on_expr) = join_on_expr(&join.join_operator) {
                conditions.push(on_expr);
            }
        }
    }

    for condition in conditions {
        for_each_expr(condition, &mut |expr| match expr {
            Expr::BinaryOp { op: BinaryOperator::Or, .. } => counts.surface += 1,
            Expr::Like { .. } | Expr::ILike { .. } => counts.surface += 1,
            Expr::Subquery(_) | Expr::InSubquery { .. } | Expr::Exists { .. } => {
                counts.nested += 1;
            }
            _ => {}
        });
        *agg_count += count_aggregates(condition);
    }

    if select.projection.len() > 1 {
        counts.extras += 1;
    }
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                *agg_count += count_aggregates(expr);
            }
            _ => {}
        }
    }

    for expr in group_exprs {
        *agg_count += count_aggregates(expr);
    }

    if let Some(selection) = &select.selection {
        if predicate_count(selection) > 1 {
            counts.extras += 1;
        }
    }
}

fn join_on_expr(operator: &JoinOperator) -> Option<&Expr> {
    let constraint = match operator {
        JoinOperator::Inner(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c) => c,
        _ => return None,
    };
    match constraint {
        JoinConstraint::On(expr) => Some(expr),
        _ => None,
    }
}

/// Number of leaf predicates in a condition tree (AND/OR split).
fn predicate_count(expr: &Expr) -> usize {
    match expr {
        Expr::BinaryOp { left, op: BinaryOperator::And | BinaryOperator::Or, right } => {
            predicate_count(left) + predicate_count(right)
        }
        Expr::Nested(inner) => predicate_count(inner),
        _ => 1,
    }
}

const AGGREGATES: [&str; 5] = ["count", "sum", "avg", "min", "max"];

fn count_aggregates(expr: &Expr) -> usize {
    let mut count = 0;
    for_each_expr(expr, &mut |e| {
        if let Expr::Function(function) = e {
            let name = function
                .name
                .0
                .last()
                .map(|ident| ident.value.to_lowercase())
                .unwrap_or_default();
            if AGGREGATES.contains(&name.as_str()) {
                count += 1;
            }
        }
    });
    count
}

/// Pre-order walk over one expression tree. Subquery bodies are a boundary:
/// the subquery node itself is visited, its internals are not.
fn for_each_expr<'a>(expr: &'a Expr, visit: &mut impl FnMut(&'a Expr)) {
    visit(expr);
    match expr {
        Expr::BinaryOp { left, right, .. } => {
            for_each_expr(left, visit);
            for_each_expr(right, visit);
        }
        Expr::UnaryOp { expr: inner, .. }
        | Expr::Nested(inner)
        | Expr::Cast { expr: inner, .. }
        | Expr::IsNull(inner)
        | Expr::IsNotNull(inner) => for_each_expr(inner, visit),
        Expr::Like { expr: inner, pattern, .. } | Expr::ILike { expr: inner, pattern, .. } => {
            for_each_expr(inner, visit);
            for_each_expr(pattern, visit);
        }
        Expr::Between { expr: inner, low, high, .. } => {
            for_each_expr(inner, visit);
            for_each_expr(low, visit);
            for_each_expr(high, visit);
        }
        Expr::InList { expr: inner, list, .. } => {
            for_each_expr(inner, visit);
            for item in list {
                for_each_expr(item, visit);
            }
        }
        Expr::InSubquery { expr: inner, .. } => for_each_expr(inner, visit),
        Expr::Tuple(items) => {
            for item in items {
                for_each_expr(item, visit);
            }
        }
        Expr::Function(function) => {
            if let FunctionArguments::List(list) = &function.args {
                for arg in &list.args {
                    match arg {
                        FunctionArg::Unnamed(FunctionArgExpr::Expr(inner))
                        | FunctionArg::Named { arg: FunctionArgExpr::Expr(inner), .. } => {
                            for_each_expr(inner, visit);
                        }
                        _ => {}
                    }
                }
            }
        }
        Expr::Case { operand, conditions, results, else_result, .. } => {
            if let Some(operand) = operand {
                for_each_expr(operand, visit);
            }
            for condition in conditions {
                for_each_expr(condition, visit);
            }
            for result in results {
                for_each_expr(result, visit);
            }
            if let Some(else_result) = else_result {
                for_each_expr(else_result, visit);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_aggregate_is_easy() {
        assert_eq!(classify_difficulty("SELECT count(*) FROM farm").unwrap(), Difficulty::Easy);
    }

    #[test]
    fn test_simple_filter_is_easy() {
        assert_eq!(
            classify_difficulty("SELECT name FROM singer WHERE age > 20").unwrap(),
            Difficulty::Easy
        );
    }

    #[test]
    fn test_wide_projection_is_medium() {
        assert_eq!(
            classify_difficulty("SELECT name, country FROM singer WHERE age > 20").unwrap(),
            Difficulty::Medium
        );
    }

    #[test]
    fn test_multiple_aggregates_are_medium() {
        assert_eq!(
            classify_difficulty(
                "SELECT avg(age), min(age), max(age) FROM singer WHERE country = 'France'"
            )
            .unwrap(),
            Difficulty::Medium
        );
    }

    #[test]
    fn test_disjunction_is_medium() {
        assert_eq!(
            classify_difficulty("SELECT name FROM farm WHERE size > 10 OR cows > 50").unwrap(),
            Difficulty::Medium
        );
    }

    #[test]
    fn test_condition_subquery_is_hard() {
        assert_eq!(
            classify_difficulty(
                "SELECT name FROM singer WHERE singer_id IN (SELECT singer_id FROM concert)"
            )
            .unwrap(),
            Difficulty::Hard
        );
    }

    #[test]
    fn test_join_group_order_limit_is_extra() {
        let query = "SELECT T1.name FROM singer AS T1 JOIN concert AS T2 ON T1.singer_id = \
                     T2.singer_id WHERE T2.year > 2000 GROUP BY T1.name ORDER BY count(*) DESC \
                     LIMIT 5";
        assert_eq!(classify_difficulty(query).unwrap(), Difficulty::Extra);
    }

    #[test]
    fn test_set_operation_counts_as_nested() {
        let query = "SELECT name FROM singer WHERE age > 40 EXCEPT SELECT name FROM singer \
                     WHERE country = 'France'";
        // Surface: one WHERE. Nested: one set operation.
        assert_eq!(classify_difficulty(query).unwrap(), Difficulty::Hard);
    }

    #[test]
    fn test_unparseable_query_is_an_error() {
        assert!(classify_difficulty("SELEC nmae FRM farm").is_err());
    }

    #[test]
    fn test_non_query_statement_is_an_error() {
        assert!(matches!(
            classify_difficulty("DELETE FROM farm"),
            Err(EvalError::NotAQuery)
        ));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let query = "SELECT name, count(*) FROM farm GROUP BY name";
        let first = classify_difficulty(query).unwrap();
        let second = classify_difficulty(query).unwrap();
        assert_eq!(first, second);
    }
}
