use pgfilter::{
    BuilderConfig, Combinator, Condition, Op, Operand, Predicate, PlaceholderStyle,
    PredicateBuilder, TableSchema, Value,
};
use proptest::prelude::*;
use std::sync::Arc;

const COLUMNS: &[&str] = &["id", "title", "text", "likesCount"];

fn schema() -> Arc<TableSchema> {
    Arc::new(TableSchema::new("post", COLUMNS).unwrap())
}

fn hostile_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("1 OR 1=1".to_string()),
        Just("x' UNION SELECT * FROM post --".to_string()),
        Just("\"; DROP TABLE post; --".to_string()),
        Just("$1".to_string()),
        Just("?".to_string()),
        "[ -~]{0,24}",
    ]
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e6..1.0e6_f64).prop_map(Value::Float),
        hostile_text().prop_map(Value::Text),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Eq),
        Just(Op::Ne),
        Just(Op::Lt),
        Just(Op::Lte),
        Just(Op::Gt),
        Just(Op::Gte),
        Just(Op::In),
    ]
}

fn combinator() -> impl Strategy<Value = Combinator> {
    prop_oneof![Just(Combinator::And), Just(Combinator::Or)]
}

#[derive(Debug, Clone)]
struct Step {
    column: &'static str,
    op: Op,
    values: Vec<Value>,
    combinator: Combinator,
}

fn step() -> impl Strategy<Value = Step> {
    (
        prop::sample::select(COLUMNS),
        op(),
        prop::collection::vec(value(), 1..4),
        combinator(),
    )
        .prop_map(|(column, op, values, combinator)| Step {
            column,
            op,
            values,
            combinator,
        })
}

impl Step {
    /// The operand to bind and the values it contributes, in order.
    fn operand(&self) -> (Operand, Vec<Value>) {
        if self.op == Op::In {
            (self.values.clone().into(), self.values.clone())
        } else {
            (self.values[0].clone().into(), vec![self.values[0].clone()])
        }
    }
}

/// A caller-built subtree handed to `add_predicate`.
#[derive(Debug, Clone)]
enum Tree {
    Leaf(Step),
    Group(Combinator, Vec<Tree>),
}

fn tree() -> impl Strategy<Value = Tree> {
    step().prop_map(Tree::Leaf).prop_recursive(3, 24, 4, |inner| {
        (combinator(), prop::collection::vec(inner, 1..4))
            .prop_map(|(combinator, children)| Tree::Group(combinator, children))
    })
}

fn to_predicate(tree: &Tree, expected: &mut Vec<Value>) -> Predicate {
    match tree {
        Tree::Leaf(step) => {
            let (operand, values) = step.operand();
            expected.extend(values);
            Predicate::from(Condition::new(step.column, step.op, operand).unwrap())
        }
        Tree::Group(combinator, children) => {
            let children: Vec<Predicate> =
                children.iter().map(|c| to_predicate(c, expected)).collect();
            match combinator {
                Combinator::And => Predicate::all(children),
                Combinator::Or => Predicate::any(children),
            }
        }
    }
}

fn balanced(text: &str) -> bool {
    let mut depth = 0_i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

fn style() -> impl Strategy<Value = PlaceholderStyle> {
    prop_oneof![Just(PlaceholderStyle::Dollar), Just(PlaceholderStyle::Question)]
}

/// Strip quoted identifiers, placeholders and SQL keywords; only punctuation may remain.
fn residue(text: &str) -> String {
    let mut out = text.to_string();
    for col in COLUMNS {
        out = out.replace(&format!("\"{col}\""), "");
    }
    for word in ["AND", "OR", "IN"] {
        out = out.replace(word, "");
    }
    out.chars()
        .filter(|c| !c.is_ascii_digit() && !matches!(c, '$' | '?'))
        .collect()
}

proptest! {
    #[test]
    fn values_never_reach_text_and_placeholders_match(
        steps in prop::collection::vec(step(), 1..8),
        style in style(),
    ) {
        let mut qb = PredicateBuilder::new(schema())
            .with_config(BuilderConfig::new().placeholder_style(style));

        let mut expected = Vec::new();
        for (i, s) in steps.iter().enumerate() {
            let combinator = (i > 0).then_some(s.combinator);
            let (operand, values) = s.operand();
            qb.add_condition(s.column, s.op, operand, combinator).unwrap();
            expected.extend(values);
        }

        let q = qb.build().unwrap();
        prop_assert_eq!(q.values(), expected.as_slice());
        prop_assert_eq!(q.placeholder_count(), q.values().len());

        for v in q.values() {
            if let Value::Text(t) = v {
                if t.contains("UNION") || t.contains("DROP") || t.contains("1=1") {
                    prop_assert!(!q.text().contains(t.as_str()));
                }
            }
        }

        let rest = residue(q.text());
        prop_assert!(
            rest.chars().all(|c| matches!(c, ' ' | '(' | ')' | ',' | '=' | '!' | '<' | '>')),
            "unexpected residue {:?} in {}", rest, q.text()
        );
    }

    #[test]
    fn nested_subtrees_keep_count_and_order(
        trees in prop::collection::vec((tree(), combinator()), 1..5),
        style in style(),
    ) {
        let mut qb = PredicateBuilder::new(schema())
            .with_config(BuilderConfig::new().placeholder_style(style));

        let mut expected = Vec::new();
        for (i, (tree, combinator)) in trees.iter().enumerate() {
            let predicate = to_predicate(tree, &mut expected);
            qb.add_predicate(predicate, (i > 0).then_some(*combinator)).unwrap();
        }

        let q = qb.build().unwrap();
        prop_assert_eq!(q.values(), expected.as_slice());
        prop_assert_eq!(q.placeholder_count(), expected.len());
        prop_assert!(balanced(q.text()), "unbalanced parentheses in {}", q.text());

        if style == PlaceholderStyle::Dollar {
            // Placeholders appear as $1, $2, ... in text order.
            let numbers: Vec<usize> = q
                .text()
                .split('$')
                .skip(1)
                .map(|rest| {
                    rest.chars()
                        .take_while(|c| c.is_ascii_digit())
                        .collect::<String>()
                        .parse()
                        .unwrap()
                })
                .collect();
            let in_order: Vec<usize> = (1..=expected.len()).collect();
            prop_assert_eq!(numbers, in_order);
        }

        let rest = residue(q.text());
        prop_assert!(
            rest.chars().all(|c| matches!(c, ' ' | '(' | ')' | ',' | '=' | '!' | '<' | '>')),
            "unexpected residue {:?} in {}", rest, q.text()
        );
    }

    #[test]
    fn unknown_columns_are_always_refused(column in "[ -~]{1,32}") {
        prop_assume!(!COLUMNS.contains(&column.as_str()));
        let mut qb = PredicateBuilder::new(schema());
        let err = qb.add_condition(&column, Op::Eq, 1, None).unwrap_err();
        prop_assert!(err.is_unknown_column());
    }
}
