use serde::{Deserialize, Serialize};

use crate::modules::error::SemanticsError;
use crate::modules::semantics::KEVMSemantics;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub auto_abstract_gas: bool,
  pub use_hex: bool,
  pub break_on_jumpi: bool,
  pub break_on_calls: bool,
  pub break_on_storage: bool,
  pub break_on_basic_blocks: bool,
  pub break_on_load_program: bool,
  pub break_every_step: bool,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      auto_abstract_gas: false,
      use_hex: false,
      break_on_jumpi: false,
      break_on_calls: true,
      break_on_storage: false,
      break_on_basic_blocks: false,
      break_on_load_program: false,
      break_every_step: false,
    }
  }
}

impl Config {
  pub fn from_json(json: &str) -> Result<Config, SemanticsError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn semantics(&self) -> KEVMSemantics {
    KEVMSemantics::new(self.auto_abstract_gas)
  }

  pub fn cut_point_rules(&self) -> Vec<String> {
    KEVMSemantics::cut_point_rules(
      self.break_on_jumpi,
      self.break_on_calls,
      self.break_on_storage,
      self.break_on_basic_blocks,
      self.break_on_load_program,
    )
  }

  pub fn terminal_rules(&self) -> Vec<String> {
    KEVMSemantics::terminal_rules(self.break_every_step)
  }
}
