use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::modules::error::SemanticsError;
use crate::modules::kast::KInner;
use crate::modules::prelude::ml_top;

/// A configuration split into named cells, together with its path constraints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CTerm {
  pub cells: BTreeMap<String, KInner>,
  #[serde(default)]
  pub constraints: Vec<KInner>,
}

impl CTerm {
  pub fn new(cells: BTreeMap<String, KInner>, constraints: Vec<KInner>) -> Self {
    constraints.into_iter().fold(CTerm { cells, constraints: vec![] }, |c, p| c.add_constraint(p))
  }

  pub fn from_cells<I: IntoIterator<Item = (&'static str, KInner)>>(cells: I) -> Self {
    CTerm { cells: cells.into_iter().map(|(k, v)| (k.to_string(), v)).collect(), constraints: vec![] }
  }

  pub fn cell(&self, name: &str) -> Option<&KInner> {
    self.cells.get(name)
  }

  pub fn try_cell(&self, name: &str) -> Result<&KInner, SemanticsError> {
    self.cell(name).ok_or_else(|| SemanticsError::MissingCell(name.to_string()))
  }

  pub fn with_cell(&self, name: &str, value: KInner) -> CTerm {
    let mut cells = self.cells.clone();
    cells.insert(name.to_string(), value);
    CTerm { cells, constraints: self.constraints.clone() }
  }

  pub fn add_constraint(mut self, constraint: KInner) -> CTerm {
    if constraint != ml_top() && !self.constraints.contains(&constraint) {
      self.constraints.push(constraint);
    }
    self
  }
}
