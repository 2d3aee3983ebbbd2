//! Result-clause indexer: label checks and accessor naming.

use std::collections::HashSet;

use bridgespec_types::ir::{ResultClause, SendSpec};

use crate::error::{DeclError, DeclResult};
use crate::normalize::RawClause;

/// Function name reported for errors in a `sends` declaration.
pub const SENDS: &str = "sends";

/// `<function>_result_<label>_<label>...`
pub fn accessor_name(function: &str, clause: &RawClause) -> String {
    format!("{function}_result_{}", joined_labels(clause))
}

/// `send_<label>_<label>...`
pub fn send_accessor_name(clause: &RawClause) -> String {
    format!("send_{}", joined_labels(clause))
}

fn joined_labels(clause: &RawClause) -> String {
    clause
        .items
        .iter()
        .filter_map(|item| item.label.as_deref())
        .collect::<Vec<_>>()
        .join("_")
}

/// Check every clause of `function` and attach accessor names, in order.
pub fn index_results(function: &str, clauses: Vec<RawClause>) -> DeclResult<Vec<ResultClause>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut indexed = Vec::with_capacity(clauses.len());

    for (clause_index, clause) in clauses.into_iter().enumerate() {
        check_clause(function, clause_index, &clause)?;
        let name = accessor_name(function, &clause);
        if !seen.insert(name.clone()) {
            return Err(DeclError::DuplicateAccessorName {
                function: function.to_string(),
                name,
                span: clause.span,
            });
        }
        indexed.push(ResultClause {
            items: clause.items,
            accessor_name: name,
        });
    }
    Ok(indexed)
}

/// Check a `sends` clause and attach its accessor name.
pub fn index_send(clause: RawClause) -> DeclResult<SendSpec> {
    check_clause(SENDS, 0, &clause)?;
    let accessor_name = send_accessor_name(&clause);
    Ok(ResultClause {
        items: clause.items,
        accessor_name,
    })
}

fn check_clause(function: &str, clause_index: usize, clause: &RawClause) -> DeclResult<()> {
    if !clause.items.iter().any(|item| item.is_label()) {
        return Err(DeclError::EmptyLabelSet {
            function: function.to_string(),
            clause_index,
            span: clause.span,
        });
    }

    let mut names: HashSet<&str> = HashSet::new();
    for value in clause.items.iter().filter(|item| !item.is_label()) {
        if !names.insert(&value.name) {
            return Err(DeclError::DuplicateResultName {
                function: function.to_string(),
                name: value.name.clone(),
                span: clause.span,
            });
        }
    }
    Ok(())
}
