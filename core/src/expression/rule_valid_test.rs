// Valid inputs for each rule of the expression grammar.

use super::parser::{ExpressionParser, Rule};
use pest::Parser;
use pest::iterators::Pair;

fn contains_rule(pair: Pair<Rule>, target: Rule) -> bool {
    if pair.as_rule() == target {
        return true;
    }
    pair.into_inner().any(|inner| contains_rule(inner, target))
}

macro_rules! rule_examples {
    ( $($rule:ident => [$($expr:expr),* $(,)?]),* $(,)? ) => {
        $(
            #[test]
            fn $rule() {
                for input in [$($expr),*] {
                    let result = ExpressionParser::parse(Rule::input, input)
                        .unwrap_or_else(|e| panic!("Failed to parse '{}': {}", input, e));
                    let root = result.into_iter().next().unwrap();
                    assert!(
                        contains_rule(root.clone(), Rule::$rule),
                        "Expected to find rule {:?} in parse tree for input '{}'",
                        Rule::$rule,
                        input
                    );
                }
            }
        )*
    };
}

rule_examples! {
    integer => ["0", "42", "-7"],
    float => ["3.14", "-0.5", "10.0"],
    string => ["\"hello\"", "'world'", "''", "\"it's\""],
    kw_true => ["true"],
    kw_nil => ["nil", "x == nil"],
    identifier => ["foo", "_bar1", "truthy", "order", "nil_count"],
    path => ["user", "user.name", "items[0]", "a.b[c].d"],
    field => ["user.name", "a.b.c"],
    index => ["items[0]", "m['key']", "grid[i][j]", "items[n | minus: 1]"],
    range => ["(1..5)", "(start..end)", "(1..items.size)"],
    group => ["(a or b) and c", "(x | size) > 2"],
    comparison_op => ["a == b", "a != b", "a <> b", "a <= b", "a >= b", "a < b", "a > b", "tags contains 'x'"],
    logical_op => ["a and b", "a or b", "a and b or c"],
    filter => ["x | upcase", "x | append: '!'", "x | slice: 1, 2", "x | a | b: c"],
    statement => ["%assign x = 1", "%assign name = user.name | upcase"],
}
