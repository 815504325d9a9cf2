use super::condition::Condition;
use super::error::RuleError;

/// Logic tag pending on the open-group stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Logic {
    And,
    Or,
    Not,
}

impl Logic {
    fn wrap(self, children: Vec<Condition>) -> Result<Condition, RuleError> {
        match self {
            Logic::And => Ok(Condition::And(children)),
            Logic::Or => Ok(Condition::Or(children)),
            Logic::Not => {
                let mut children = children.into_iter();
                match (children.next(), children.next()) {
                    (Some(only), None) => Ok(Condition::Not(Box::new(only))),
                    (None, _) => {
                        Err(RuleError::imbalanced("a NOT group closed with no condition"))
                    }
                    (Some(_), Some(_)) => Err(RuleError::imbalanced(
                        "a NOT group holds exactly one condition",
                    )),
                }
            }
        }
    }
}

/// Builder turning a linear chain of `and()`/`or()`/`not()`/`field()` calls
/// into a [`Condition`] tree.
///
/// Each `and()`, `or()` or `not()` closes the group opened by the previous
/// such call and opens a fresh one, so consecutive groups become siblings
/// under an implicit root conjunction rather than nesting. Structural
/// mistakes are held back and reported by [`build`](RuleBuilder::build).
///
/// # Example
///
/// ```
/// use tenet::{Condition, RuleBuilder};
///
/// let rule = RuleBuilder::new()
///     .and()
///     .field("age", Condition::greater_than(18_i64))
///     .field("status", Condition::equal("active"))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct RuleBuilder {
    frames: Vec<Vec<Condition>>,
    tags: Vec<Logic>,
    poisoned: Option<RuleError>,
}

impl RuleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
            tags: Vec::new(),
            poisoned: None,
        }
    }

    /// Closes the open group, if any, and opens a conjunction group.
    #[must_use]
    pub fn and(self) -> Self {
        self.open(Logic::And)
    }

    /// Closes the open group, if any, and opens a disjunction group.
    #[must_use]
    pub fn or(self) -> Self {
        self.open(Logic::Or)
    }

    /// Closes the open group, if any, and opens a negation group. The new
    /// group must receive exactly one condition before it closes.
    #[must_use]
    pub fn not(self) -> Self {
        self.open(Logic::Not)
    }

    /// Appends a field condition to the open group. Legal with no group
    /// open; the condition then lands directly under the implicit root.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, inner: Condition) -> Self {
        if self.poisoned.is_some() {
            return self;
        }
        if let Some(top) = self.frames.last_mut() {
            top.push(Condition::field(name, inner));
        }
        self
    }

    /// Closes the remaining group and returns the finished tree. A root
    /// frame holding a single node is returned as that node; anything else
    /// is wrapped in a conjunction.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::ImbalancedRule`] for the first structural
    /// mistake in the chain, such as a NOT group holding zero or several
    /// conditions.
    pub fn build(mut self) -> Result<Condition, RuleError> {
        self.close_top();
        if let Some(err) = self.poisoned {
            return Err(err);
        }
        if !self.tags.is_empty() {
            return Err(RuleError::imbalanced("unclosed logic group at build"));
        }
        let Some(mut root) = self.frames.pop() else {
            return Err(RuleError::imbalanced("unbalanced group stack at build"));
        };
        if !self.frames.is_empty() {
            return Err(RuleError::imbalanced("unbalanced group stack at build"));
        }
        if root.len() == 1 {
            if let Some(only) = root.pop() {
                return Ok(only);
            }
        }
        Ok(Condition::And(root))
    }

    fn open(mut self, tag: Logic) -> Self {
        if self.poisoned.is_some() {
            return self;
        }
        self.close_top();
        self.frames.push(Vec::new());
        self.tags.push(tag);
        self
    }

    fn close_top(&mut self) {
        let Some(tag) = self.tags.pop() else {
            return;
        };
        let Some(children) = self.frames.pop() else {
            return;
        };
        match tag.wrap(children) {
            Ok(node) => {
                if let Some(top) = self.frames.last_mut() {
                    top.push(node);
                }
            }
            Err(err) => self.poison(err),
        }
    }

    // First structural error wins; later calls keep chaining but change
    // nothing.
    fn poison(&mut self, err: RuleError) {
        if self.poisoned.is_none() {
            self.poisoned = Some(err);
        }
    }
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
