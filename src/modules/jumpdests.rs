use log::trace;

use crate::modules::error::SemanticsError;
use crate::modules::kast::{KInner, KSort};
use crate::modules::prelude::{bytes_token, pretty_bytes};

pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
pub const JUMPDEST: u8 = 0x5b;

/// One additive piece of a (possibly partially symbolic) program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
  Concrete(Vec<u8>),
  Symbolic { width: usize },
}

impl Section {
  /// Accepts a Bytes token or a `buf(WIDTH, _)` of concrete width.
  pub fn from_term(term: &KInner) -> Result<Section, SemanticsError> {
    match term {
      KInner::Apply(label, args) if label == "buf" && args.len() == 2 => match &args[0] {
        KInner::Token(width, sort) if *sort == KSort::int() => width
          .parse::<usize>()
          .map(|width| Section::Symbolic { width })
          .map_err(|_| SemanticsError::NonConcreteWidth(args[0].to_string())),
        other => Err(SemanticsError::NonConcreteWidth(other.to_string())),
      },
      KInner::Token(_, sort) if *sort == KSort::bytes() => Ok(Section::Concrete(pretty_bytes(term)?)),
      _ => Err(SemanticsError::UnsupportedSection(term.to_string())),
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Section::Concrete(bs) => bs.len(),
      Section::Symbolic { width } => *width,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn jumpdests(&self) -> Vec<u8> {
    match self {
      Section::Concrete(bs) => process_jumpdests(bs),
      // nothing inside an unknown buffer can be a valid target
      Section::Symbolic { width } => vec![0; *width],
    }
  }
}

/// Marks every offset holding a JUMPDEST that is not an operand of a preceding PUSH.
/// The result has the same length as `bytecode`; flagged offsets hold `0x01`.
pub fn process_jumpdests(bytecode: &[u8]) -> Vec<u8> {
  let mut jumpdests = vec![0u8; bytecode.len()];
  let mut i = 0;
  while i < bytecode.len() {
    let op = bytecode[i];
    if (PUSH1..=PUSH32).contains(&op) {
      i += (op - PUSH1) as usize + 2;
    } else {
      if op == JUMPDEST {
        jumpdests[i] = 0x1;
      }
      i += 1;
    }
  }
  jumpdests
}

pub fn jumpdests_of_sections(sections: &[Section]) -> Vec<u8> {
  let mut jumpdests = Vec::with_capacity(sections.iter().map(Section::len).sum());
  for section in sections {
    jumpdests.extend(section.jumpdests());
  }
  jumpdests
}

/// Computes the JUMPDESTS cell value for the sections of a `+Bytes` chain.
pub fn compute_jumpdests(sections: &[KInner]) -> Result<KInner, SemanticsError> {
  let sections = sections.iter().map(Section::from_term).collect::<Result<Vec<_>, _>>()?;
  let jumpdests = jumpdests_of_sections(&sections);
  trace!("computed {} jumpdest flags over {} sections", jumpdests.len(), sections.len());
  Ok(bytes_token(&jumpdests))
}

pub fn jumpdest_offsets(jumpdests: &[u8]) -> Vec<usize> {
  jumpdests.iter().enumerate().filter(|(_, &flag)| flag == 1).map(|(i, _)| i).collect()
}
