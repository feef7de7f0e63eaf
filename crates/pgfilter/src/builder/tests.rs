use super::*;
use crate::config::BuilderConfig;
use crate::placeholder::PlaceholderStyle;
use crate::value::Value;

fn post_schema() -> Arc<TableSchema> {
    Arc::new(TableSchema::new("post", &["id", "title", "text", "likesCount"]).unwrap())
}

#[test]
fn single_condition() {
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("id", Op::Eq, 1, None).unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.text(), r#""id" = $1"#);
    assert_eq!(q.values(), &[Value::Int(1)]);
}

#[test]
fn two_conditions_without_combinator_are_ambiguous() {
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("id", Op::Eq, 1, None).unwrap();
    let err = qb.add_condition("likesCount", Op::Eq, 10, None).unwrap_err();
    assert!(err.is_ambiguous_combinator());

    // The first condition is kept and the builder is still usable.
    qb.add_condition("likesCount", Op::Eq, 10, Some(Combinator::And))
        .unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.text(), r#""id" = $1 AND "likesCount" = $2"#);
}

#[test]
fn explicit_and_is_never_or() {
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("id", Op::Eq, 1, None)
        .unwrap()
        .and_where("likesCount", Op::Eq, 10)
        .unwrap();
    let q = qb.build().unwrap();
    assert!(!q.text().contains("OR"));
    assert_eq!(q.values(), &[Value::Int(1), Value::Int(10)]);
}

#[test]
fn all_of_defaults_to_and() {
    let mut qb = PredicateBuilder::all_of(post_schema());
    qb.add_condition("id", Op::Eq, 1, None).unwrap();
    qb.add_condition("likesCount", Op::Eq, 10, None).unwrap();
    assert_eq!(qb.build().unwrap().text(), r#""id" = $1 AND "likesCount" = $2"#);
}

#[test]
fn any_of_defaults_to_or_and_allows_override() {
    let mut qb = PredicateBuilder::any_of(post_schema());
    qb.add_condition("id", Op::Eq, 1, None).unwrap();
    qb.add_condition("id", Op::Eq, 2, None).unwrap();
    qb.add_condition("likesCount", Op::Gt, 5, Some(Combinator::And))
        .unwrap();
    assert_eq!(
        qb.build().unwrap().text(),
        r#"("id" = $1 OR "id" = $2) AND "likesCount" > $3"#
    );
}

#[test]
fn same_column_different_values_keep_both() {
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("id", Op::Gte, 4, None)
        .unwrap()
        .and_where("id", Op::Lte, 5)
        .unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.text(), r#""id" >= $1 AND "id" <= $2"#);
    assert_eq!(q.values(), &[Value::Int(4), Value::Int(5)]);
}

#[test]
fn same_column_same_value_still_gets_two_placeholders() {
    let mut qb = PredicateBuilder::all_of(post_schema());
    qb.add_condition("id", Op::Ne, 3, None).unwrap();
    qb.add_condition("id", Op::Ne, 3, None).unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.text(), r#""id" != $1 AND "id" != $2"#);
    assert_eq!(q.values().len(), 2);
}

#[test]
fn unknown_column_is_rejected_and_not_embedded() {
    let mut qb = PredicateBuilder::new(post_schema());
    let err = qb
        .add_condition("id UNION SELECT", Op::Eq, 1, None)
        .unwrap_err();
    assert!(err.is_unknown_column());
    assert_eq!(qb.state(), BuilderState::Empty);
    assert!(qb.build().unwrap_err().is_empty_predicate());
}

#[test]
fn injection_string_as_column_is_rejected() {
    let mut qb = PredicateBuilder::new(post_schema());
    let column_from_client = "1 = 1 OR id = :id UNION select * from post --";
    assert!(
        qb.add_condition(column_from_client, Op::Eq, 1, None)
            .unwrap_err()
            .is_unknown_column()
    );
}

#[test]
fn hostile_value_only_travels_as_parameter() {
    let hostile = "1 OR 1=1 UNION SELECT * FROM post --";
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("title", Op::Eq, hostile, None).unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.text(), r#""title" = $1"#);
    assert_eq!(q.values(), &[Value::Text(hostile.to_string())]);
}

#[test]
fn column_names_are_matched_exactly() {
    let mut qb = PredicateBuilder::new(post_schema());
    assert!(
        qb.add_condition("likescount", Op::Eq, 1, None)
            .unwrap_err()
            .is_unknown_column()
    );
    assert!(
        qb.add_condition("\"id\"", Op::Eq, 1, None)
            .unwrap_err()
            .is_unknown_column()
    );
}

#[test]
fn arity_errors() {
    let mut qb = PredicateBuilder::new(post_schema());
    assert!(
        qb.add_condition("id", Op::In, Vec::<i64>::new(), None)
            .unwrap_err()
            .is_arity()
    );
    assert!(qb.add_condition("id", Op::In, 1, None).unwrap_err().is_arity());
    assert!(
        qb.add_condition("id", Op::Eq, vec![1, 2], None)
            .unwrap_err()
            .is_arity()
    );
    assert_eq!(qb.state(), BuilderState::Empty);
}

#[test]
fn in_list_placeholders() {
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("id", Op::In, vec![1, 2, 3], None).unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.text(), r#""id" IN ($1, $2, $3)"#);
    assert_eq!(q.placeholder_count(), 3);
}

#[test]
fn empty_builder_fails() {
    let mut qb = PredicateBuilder::new(post_schema());
    assert!(qb.build().unwrap_err().is_empty_predicate());
    // A failed build does not finalize.
    assert_eq!(qb.state(), BuilderState::Empty);
    qb.add_condition("id", Op::Eq, 1, None).unwrap();
    assert!(qb.build().is_ok());
}

#[test]
fn match_all_builds_true() {
    let mut qb = PredicateBuilder::match_all(post_schema());
    let q = qb.build().unwrap();
    assert_eq!(q.text(), "TRUE");
    assert!(q.values().is_empty());
    assert_eq!(qb.state(), BuilderState::Finalized);
}

#[test]
fn match_all_with_conditions_uses_them() {
    let mut qb = PredicateBuilder::match_all(post_schema());
    qb.add_condition("id", Op::Lt, 3, None).unwrap();
    assert_eq!(qb.state(), BuilderState::Accumulating);
    assert_eq!(qb.build().unwrap().text(), r#""id" < $1"#);
}

#[test]
fn finalized_rejects_mutation_and_rebuild() {
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("id", Op::Eq, 1, None).unwrap();
    assert_eq!(qb.build().unwrap().text(), r#""id" = $1"#);
    assert_eq!(qb.state(), BuilderState::Finalized);

    assert!(
        qb.add_condition("id", Op::Eq, 2, Some(Combinator::And))
            .unwrap_err()
            .is_finalized()
    );
    assert!(qb.and_where("id", Op::Eq, 2).unwrap_err().is_finalized());
    assert!(qb.build().unwrap_err().is_finalized());
}

#[test]
fn finalized_rejects_add_predicate() {
    let mut qb = PredicateBuilder::all_of(post_schema());
    qb.add_condition("id", Op::Eq, 1, None).unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.values().len(), 1);

    let err = qb
        .add_predicate(Condition::eq("likesCount", 10).unwrap(), Some(Combinator::And))
        .unwrap_err();
    assert!(err.is_finalized());
    assert_eq!(qb.state(), BuilderState::Finalized);
    assert_eq!(qb.predicate().map(|p| p.param_count()), Some(1));
}

#[test]
fn finalized_check_precedes_column_check() {
    let mut qb = PredicateBuilder::match_all(post_schema());
    assert_eq!(qb.build().unwrap().text(), "TRUE");
    assert!(
        qb.add_condition("nope", Op::Eq, 1, None)
            .unwrap_err()
            .is_finalized()
    );
}

#[test]
fn state_transitions() {
    let mut qb = PredicateBuilder::new(post_schema());
    assert_eq!(qb.state(), BuilderState::Empty);
    qb.add_condition("id", Op::Eq, 1, None).unwrap();
    assert_eq!(qb.state(), BuilderState::Accumulating);
    assert_eq!(qb.build().unwrap().values(), &[Value::Int(1)]);
    assert_eq!(qb.state(), BuilderState::Finalized);
}

#[test]
fn left_associative_chain() {
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("id", Op::Eq, 1, None)
        .unwrap()
        .and_where("likesCount", Op::Eq, 10)
        .unwrap()
        .or_where("title", Op::Eq, "pinned")
        .unwrap();
    assert_eq!(
        qb.build().unwrap().text(),
        r#"("id" = $1 AND "likesCount" = $2) OR "title" = $3"#
    );
}

#[test]
fn add_predicate_subtree() {
    let mut qb = PredicateBuilder::new(post_schema());
    qb.add_condition("likesCount", Op::Eq, 10, None).unwrap();
    qb.add_predicate(
        Predicate::any([
            Predicate::from(Condition::eq("id", 1).unwrap()),
            Predicate::from(Condition::eq("id", 3).unwrap()),
        ]),
        Some(Combinator::And),
    )
    .unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.text(), r#""likesCount" = $1 AND ("id" = $2 OR "id" = $3)"#);
    assert_eq!(q.values(), &[Value::Int(10), Value::Int(1), Value::Int(3)]);
}

#[test]
fn add_predicate_validates_columns() {
    let mut qb = PredicateBuilder::new(post_schema());
    let err = qb
        .add_predicate(Condition::eq("password", "x").unwrap(), None)
        .unwrap_err();
    assert!(err.is_unknown_column());

    let err = qb.add_predicate(Predicate::all([]), None).unwrap_err();
    assert!(err.is_empty_predicate());
    assert_eq!(qb.state(), BuilderState::Empty);
}

#[test]
fn question_placeholder_style() {
    let mut qb = PredicateBuilder::all_of(post_schema())
        .with_config(BuilderConfig::new().placeholder_style(PlaceholderStyle::Question));
    qb.add_condition("id", Op::Gte, 4, None).unwrap();
    qb.add_condition("id", Op::In, [5, 6], None).unwrap();
    let q = qb.build().unwrap();
    assert_eq!(q.text(), r#""id" >= ? AND "id" IN (?, ?)"#);
    assert_eq!(q.placeholder_count(), 3);
    assert_eq!(q.placeholder_style(), PlaceholderStyle::Question);
}

#[test]
fn max_params_limit() {
    let mut qb = PredicateBuilder::new(post_schema()).with_config(BuilderConfig::new().max_params(2));
    qb.add_condition("id", Op::In, vec![1, 2, 3], None).unwrap();
    match qb.build().unwrap_err() {
        FilterError::TooManyParams { limit, got } => {
            assert_eq!(limit, 2);
            assert_eq!(got, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(qb.state(), BuilderState::Accumulating);
}

#[test]
fn builder_accepts_owned_schema() {
    let schema = TableSchema::new("post", &["id"]).unwrap();
    let mut qb = PredicateBuilder::new(schema);
    qb.add_condition("id", Op::Eq, 1_i64, None).unwrap();
    assert_eq!(qb.schema().table().as_str(), "post");
    assert!(qb.predicate().is_some());
}

#[test]
fn shared_schema_across_threads() {
    let schema = post_schema();
    let handles: Vec<_> = (0..4_i64)
        .map(|i| {
            let schema = Arc::clone(&schema);
            std::thread::spawn(move || {
                let mut qb = PredicateBuilder::new(schema);
                qb.add_condition("id", Op::Eq, i, None).unwrap();
                qb.build().unwrap()
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let q = h.join().unwrap();
        assert_eq!(q.values(), &[Value::Int(i as i64)]);
    }
}
