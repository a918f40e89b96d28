use crate::memo::{Memo, MemoExpr};
use crate::operator::Operator;

pub type OperatorMatcher = fn(&Operator) -> bool;

/// A pattern defines the shape of expressions a rule operates on.
///
/// If we want to match `Select(Scan, Filters)`, the pattern tree should be defined like:
/// ```
/// use dolomite_norm::operator::Operator;
/// use dolomite_norm::rules::{any, pattern, PatternBuilder};
///
/// pattern(|op| matches!(op, Operator::Select))
///   .leaf(|op| matches!(op, Operator::Scan(_)))
///   .leaf(any)
/// .finish();
/// ```
///
/// Children of a memo expression are groups, so matching a child pattern looks at the normalized
/// expression of the child group. A leaf pattern does not look at the inputs at all.
pub struct Pattern {
    /// Matches against an operator.
    pub predict: OperatorMatcher,
    /// `None` for leaf node.
    pub children: Option<Vec<Pattern>>,
}

impl Pattern {
    pub fn new_leaf(matcher: OperatorMatcher) -> Pattern {
        Pattern {
            predict: matcher,
            children: None,
        }
    }

    pub fn new<I: IntoIterator<Item = Pattern>>(
        matcher: OperatorMatcher,
        children: I,
    ) -> Pattern {
        let children = children.into_iter().collect::<Vec<Pattern>>();
        let children_pattern = if !children.is_empty() {
            Some(children)
        } else {
            None
        };

        Pattern {
            predict: matcher,
            children: children_pattern,
        }
    }

    /// Whether `expr`, whose inputs live in `memo`, has the shape of this pattern.
    pub fn matches(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        if !(self.predict)(expr.operator()) {
            return false;
        }

        match &self.children {
            None => true,
            Some(children) => {
                children.len() == expr.children().len()
                    && children
                        .iter()
                        .zip(expr.children())
                        .all(|(p, c)| p.matches(memo, memo.expr(*c)))
            }
        }
    }
}

pub fn any(_: &Operator) -> bool {
    true
}

pub fn pattern(matcher: OperatorMatcher) -> RootPatternBuilder {
    RootPatternBuilder {
        matcher,
        inputs: vec![],
    }
}

pub trait PatternBuilder {
    type Child;
    type Output;
    fn pattern(self, matcher: OperatorMatcher) -> Self::Child;
    fn leaf(self, matcher: OperatorMatcher) -> Self;
    fn finish(self) -> Self::Output;
}

pub struct RootPatternBuilder {
    matcher: OperatorMatcher,
    inputs: Vec<Pattern>,
}

pub trait AddChild {
    fn add_child(&mut self, pattern: Pattern);
}

pub struct NonRootPatternBuilder<P> {
    parent_builder: P,
    matcher: OperatorMatcher,
    inputs: Vec<Pattern>,
}

impl<P: PatternBuilder + AddChild> PatternBuilder for NonRootPatternBuilder<P> {
    type Child = NonRootPatternBuilder<Self>;
    type Output = P;

    fn pattern(self, matcher: OperatorMatcher) -> NonRootPatternBuilder<Self> {
        NonRootPatternBuilder {
            parent_builder: self,
            matcher,
            inputs: vec![],
        }
    }

    fn leaf(mut self, matcher: OperatorMatcher) -> Self {
        self.inputs.push(Pattern::new_leaf(matcher));
        self
    }

    fn finish(mut self) -> Self::Output {
        let pattern = Pattern::new(self.matcher, self.inputs);
        self.parent_builder.add_child(pattern);
        self.parent_builder
    }
}

impl<P> AddChild for NonRootPatternBuilder<P> {
    fn add_child(&mut self, pattern: Pattern) {
        self.inputs.push(pattern)
    }
}

impl PatternBuilder for RootPatternBuilder {
    type Child = NonRootPatternBuilder<Self>;
    type Output = Pattern;

    fn pattern(self, matcher: OperatorMatcher) -> Self::Child {
        NonRootPatternBuilder {
            parent_builder: self,
            matcher,
            inputs: vec![],
        }
    }

    fn leaf(mut self, matcher: OperatorMatcher) -> Self {
        self.inputs.push(Pattern::new_leaf(matcher));
        self
    }

    fn finish(self) -> Self::Output {
        Pattern::new(self.matcher, self.inputs)
    }
}

impl AddChild for RootPatternBuilder {
    fn add_child(&mut self, pattern: Pattern) {
        self.inputs.push(pattern)
    }
}
