#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
  Continuous,
  Step,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
  pub quiet: bool,
  pub step_mode: StepMode,
  pub trace_file: Option<String>,
  pub max_steps: u64,
}

impl Default for SimConfig {
  fn default() -> Self {
    Self {
      quiet: false,
      step_mode: StepMode::Continuous,
      trace_file: None,
      max_steps: 2_000_000,
    }
  }
}
