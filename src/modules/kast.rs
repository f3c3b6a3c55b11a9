use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KSort(pub String);

impl KSort {
  pub fn new(name: &str) -> Self {
    KSort(name.to_string())
  }

  pub fn int() -> Self {
    KSort::new("Int")
  }

  pub fn bytes() -> Self {
    KSort::new("Bytes")
  }

  pub fn bool() -> Self {
    KSort::new("Bool")
  }

  pub fn string() -> Self {
    KSort::new("String")
  }

  pub fn k() -> Self {
    KSort::new("K")
  }
}

impl fmt::Display for KSort {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A K term. `Seq` is the contents of a `<k>` cell: an ordered list of pending
/// computations, never directly nested inside another `Seq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawKInner")]
pub enum KInner {
  Var(String, Option<KSort>),
  Token(String, KSort),
  Apply(String, Vec<KInner>),
  Seq(Vec<KInner>),
}

// Wire form of `KInner`; sequences are rebuilt through `KInner::seq` on load.
#[derive(Deserialize)]
enum RawKInner {
  Var(String, Option<KSort>),
  Token(String, KSort),
  Apply(String, Vec<KInner>),
  Seq(Vec<KInner>),
}

impl From<RawKInner> for KInner {
  fn from(raw: RawKInner) -> Self {
    match raw {
      RawKInner::Var(name, sort) => KInner::Var(name, sort),
      RawKInner::Token(text, sort) => KInner::Token(text, sort),
      RawKInner::Apply(label, args) => KInner::Apply(label, args),
      RawKInner::Seq(items) => KInner::seq(items),
    }
  }
}

impl KInner {
  pub fn var(name: &str) -> KInner {
    KInner::Var(name.to_string(), None)
  }

  pub fn sorted_var(name: &str, sort: KSort) -> KInner {
    KInner::Var(name.to_string(), Some(sort))
  }

  pub fn token(text: &str, sort: KSort) -> KInner {
    KInner::Token(text.to_string(), sort)
  }

  pub fn apply(label: &str, args: Vec<KInner>) -> KInner {
    KInner::Apply(label.to_string(), args)
  }

  pub fn apply0(label: &str) -> KInner {
    KInner::Apply(label.to_string(), vec![])
  }

  /// Builds a sequence, splicing in the items of any nested sequence.
  pub fn seq(items: Vec<KInner>) -> KInner {
    let mut flat = Vec::with_capacity(items.len());
    for item in items {
      match item {
        KInner::Seq(inner) => flat.extend(inner),
        other => flat.push(other),
      }
    }
    KInner::Seq(flat)
  }

  pub fn is_var(&self) -> bool {
    matches!(self, KInner::Var(..))
  }

  pub fn label(&self) -> Option<&str> {
    match self {
      KInner::Apply(label, _) => Some(label),
      _ => None,
    }
  }

  pub fn args(&self) -> &[KInner] {
    match self {
      KInner::Apply(_, args) => args,
      _ => &[],
    }
  }

  pub fn arity(&self) -> usize {
    match self {
      KInner::Apply(_, args) => args.len(),
      KInner::Seq(items) => items.len(),
      _ => 0,
    }
  }

  fn map_children<F: FnMut(KInner) -> KInner>(self, f: &mut F) -> KInner {
    match self {
      KInner::Apply(label, args) => KInner::Apply(label, args.into_iter().map(|a| f(a)).collect()),
      KInner::Seq(items) => KInner::seq(items.into_iter().map(|a| f(a)).collect()),
      leaf => leaf,
    }
  }
}

impl fmt::Display for KInner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      KInner::Var(name, None) => write!(f, "{}", name),
      KInner::Var(name, Some(sort)) => write!(f, "{}:{}", name, sort),
      KInner::Token(text, _) => write!(f, "{}", text),
      KInner::Apply(label, args) => {
        write!(f, "{}(", label)?;
        for (i, arg) in args.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}", arg)?;
        }
        write!(f, ")")
      }
      KInner::Seq(items) if items.is_empty() => write!(f, ".K"),
      KInner::Seq(items) => {
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            write!(f, " ~> ")?;
          }
          write!(f, "{}", item)?;
        }
        Ok(())
      }
    }
  }
}

/// Splits nested applications of a binary `label` into their leaves, left to right.
pub fn flatten_label(label: &str, term: &KInner) -> Vec<KInner> {
  match term {
    KInner::Apply(l, args) if l == label => args.iter().flat_map(|arg| flatten_label(label, arg)).collect(),
    _ => vec![term.clone()],
  }
}

/// Right-nested chain of `label` over `terms`, skipping units.
pub fn build_assoc(unit: KInner, label: &str, terms: Vec<KInner>) -> KInner {
  let mut rest: Vec<KInner> = terms.into_iter().filter(|t| *t != unit).collect();
  let mut res = match rest.pop() {
    Some(last) => last,
    None => return unit,
  };
  while let Some(t) = rest.pop() {
    res = KInner::apply(label, vec![t, res]);
  }
  res
}

/// Cons list of `terms` terminated by `unit`.
pub fn build_cons(unit: KInner, label: &str, terms: Vec<KInner>) -> KInner {
  terms.into_iter().rev().fold(unit, |acc, t| KInner::apply(label, vec![t, acc]))
}

pub fn top_down<F: FnMut(KInner) -> KInner>(f: &mut F, term: KInner) -> KInner {
  let rewritten = f(term);
  rewritten.map_children(&mut |child| top_down(f, child))
}

pub fn bottom_up<F: FnMut(KInner) -> KInner>(f: &mut F, term: KInner) -> KInner {
  let rebuilt = term.map_children(&mut |child| bottom_up(f, child));
  f(rebuilt)
}
