use tenet::{Condition, Value};

fn main() {
    // A rule built in code...
    let rule = Condition::field("age", Condition::greater_than(18_i64))
        .and(Condition::field("status", Condition::equal("active")));

    let json = rule.to_json_pretty().expect("failed to encode rule");
    println!("encoded:\n{json}\n");

    // ...decodes back to the same tree
    let decoded = Condition::from_json(&json).expect("failed to decode rule");
    assert_eq!(decoded, rule);

    // Documents written elsewhere load the same way
    let stored = r#"{
        "type": "or",
        "conditions": [
            { "type": "lessthan", "threshold": 10 },
            { "type": "between", "min": 90, "max": 100 }
        ]
    }"#;
    let screen = Condition::from_json(stored).expect("failed to decode document");

    for score in [5_i64, 50, 95] {
        let subject = Value::Int(score);
        let verdict = screen.evaluate(&subject).expect("evaluation failed");
        println!("score {score}: {verdict}");
    }
}
