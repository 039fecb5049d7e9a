use super::field_validators::{
    constraint_clause_operators, data_type_exists, in_range_shape, pattern_compiles,
};
use crate::data_types::Constraint;
use doc::Value;
use issues::Level;
use presentation::{presentation, FieldCheck, ValidateCx};

presentation! {
    /// One entry of the `imports` list; a plain string is the short form
    /// of `file`.
    pub struct Import (short_form "file") {
        file "file": prim(Str) [required];
        repository "repository": prim(Str);
        namespace_uri "namespace_uri": prim(Str);
        namespace_prefix "namespace_prefix": prim(Str);
    }
}

presentation! {
    /// Schema of entries of a list or map property; a plain string is the
    /// short form of `type`.
    pub struct EntrySchema (short_form "type") {
        type_name "type": prim(Str) [required, check(FieldCheck::Custom(data_type_exists))];
        description "description": prim(Str);
        constraints "constraints": obj_list(ConstraintClause);
    }
}

presentation! {
    /// A single constraint clause: a one-operator mapping such as
    /// `{greater_or_equal: 2}`.
    pub struct ConstraintClause (extra_validate constraint_clause_operators) {
        equal "equal": prim(Any);
        greater_than "greater_than": prim(Any);
        greater_or_equal "greater_or_equal": prim(Any);
        less_than "less_than": prim(Any);
        less_or_equal "less_or_equal": prim(Any);
        in_range "in_range": prim(Any) [check(FieldCheck::Custom(in_range_shape))];
        valid_values "valid_values": prim_list(Any);
        length "length": prim(Int);
        min_length "min_length": prim(Int);
        max_length "max_length": prim(Int);
        pattern "pattern": prim(Str) [check(FieldCheck::Custom(pattern_compiles))];
    }
}

impl ConstraintClause {
    /// Convert to an evaluable constraint; None when no operator parses.
    pub fn to_constraint(&self) -> Option<Constraint> {
        let map = self.raw().as_map()?;
        let (operator, argument) = map.iter().next()?;
        Constraint::from_clause(operator, argument)
    }
}

/// Convert a list of presented clauses, reporting the unusable ones.
pub fn constraints_of(clauses: &[ConstraintClause], cx_issues: &issues::IssueSink) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    for clause in clauses {
        match clause.to_constraint() {
            Some(constraint) => constraints.push(constraint),
            None => cx_issues.report(
                issues::Issue::new(
                    Level::Field,
                    format!("malformed constraint clause in {:?}", clause.fullname()),
                )
                .at_locator(clause.locator()),
            ),
        }
    }
    constraints
}

/// Parse an `occurrences` value: `[lower, upper]` where upper may be the
/// keyword UNBOUNDED. Returns (lower, upper), upper None when unbounded.
pub fn parse_occurrences(raw: &Value) -> Option<(u32, Option<u32>)> {
    let items = raw.as_seq()?;
    if items.len() != 2 {
        return None;
    }
    let lower = items[0].as_int().filter(|l| *l >= 0)? as u32;
    match &items[1] {
        Value::Str(s) if s == "UNBOUNDED" => Some((lower, None)),
        upper => {
            let upper = upper.as_int().filter(|u| *u >= 0)? as u32;
            (lower <= upper).then(|| (lower, Some(upper)))
        }
    }
}

/// Shared extra-validation: `occurrences` fields must parse.
pub fn occurrences_shape(
    core: &presentation::Core,
    field: &presentation::FieldDescriptor,
    value: &Value,
    locator: &doc::Locator,
    cx: &mut ValidateCx,
) {
    if parse_occurrences(value).is_none() {
        cx.report(
            Level::Field,
            format!(
                "field {:?} of {:?} must be [lower, upper] with upper an integer or UNBOUNDED",
                field.name,
                core.fullname()
            ),
            locator,
        );
    }
}
