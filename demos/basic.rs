use std::sync::LazyLock;

use tenet::{Condition, Fact, Object, RuleBuilder, TypeDef, TypeDefBuilder, Value};

struct User {
    name: String,
    age: i64,
    status: String,
}

impl Fact for User {
    fn scalar(&self) -> Option<Value> {
        None
    }

    fn object(&self) -> Option<Object<'_>> {
        static DEF: LazyLock<TypeDef> = LazyLock::new(|| {
            TypeDefBuilder::new("User")
                .field("name", |u: &User| &u.name)
                .field("age", |u: &User| &u.age)
                .field("status", |u: &User| &u.status)
                .build()
        });
        Some(Object::new(self, &DEF))
    }
}

fn main() {
    // Compose a rule: adults with an active account, minus test fixtures
    let rule = RuleBuilder::new()
        .field("age", Condition::greater_than_or_equal(18_i64))
        .field("status", Condition::equal("active"))
        .not()
        .field("name", Condition::starts_with("test_"))
        .build()
        .expect("failed to build rule");

    println!("{rule}");

    // Evaluate against live objects
    let alice = User {
        name: "alice".to_owned(),
        age: 25,
        status: "active".to_owned(),
    };
    let probe = User {
        name: "test_probe".to_owned(),
        age: 40,
        status: "active".to_owned(),
    };

    for user in [&alice, &probe] {
        match rule.evaluate(user) {
            Ok(verdict) => println!("{}: {verdict}", user.name),
            Err(err) => println!("{}: {err}", user.name),
        }
    }
}
