use crate::config::AccelConfig;
use crate::simulator::mode::{SimConfig, StepMode};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// 加速器几何参数部分
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccelSection {
  #[serde(default = "default_queue_depth")]
  pub queue_depth: usize,
  #[serde(default = "default_num_slots")]
  pub num_slots: usize,
  #[serde(default = "default_tag_depth")]
  pub tag_depth: usize,
  #[serde(default = "default_mem_latency")]
  pub mem_latency: u64,
  #[serde(default = "default_mem_size")]
  pub mem_size: usize,
}

fn default_queue_depth() -> usize {
  AccelConfig::default().queue_depth
}

fn default_num_slots() -> usize {
  AccelConfig::default().num_slots
}

fn default_tag_depth() -> usize {
  AccelConfig::default().tag_depth
}

fn default_mem_latency() -> u64 {
  AccelConfig::default().mem_latency
}

fn default_mem_size() -> usize {
  AccelConfig::default().mem_size
}

impl Default for AccelSection {
  fn default() -> Self {
    let cfg = AccelConfig::default();
    Self {
      queue_depth: cfg.queue_depth,
      num_slots: cfg.num_slots,
      tag_depth: cfg.tag_depth,
      mem_latency: cfg.mem_latency,
      mem_size: cfg.mem_size,
    }
  }
}

/// 模拟配置部分
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSection {
  #[serde(default)]
  pub quiet: bool,
  #[serde(default)]
  pub step_mode: bool,
  #[serde(default)]
  pub trace_file: String,
  #[serde(default = "default_max_steps")]
  pub max_steps: u64,
}

fn default_max_steps() -> u64 {
  2_000_000
}

impl Default for SimulationSection {
  fn default() -> Self {
    Self {
      quiet: false,
      step_mode: false,
      trace_file: String::new(),
      max_steps: default_max_steps(),
    }
  }
}

/// 日志区域开关部分
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
  #[serde(default = "default_true")]
  pub compute: bool,
  #[serde(default = "default_true")]
  pub fetch: bool,
  #[serde(default = "default_true")]
  pub mmio: bool,
}

fn default_true() -> bool {
  true
}

impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      compute: true,
      fetch: true,
      mmio: true,
    }
  }
}

/// 统一的应用配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
  #[serde(default)]
  pub accel: AccelSection,
  #[serde(default)]
  pub simulation: SimulationSection,
  #[serde(default)]
  pub logging: LoggingSection,
}

impl AppConfig {
  pub fn to_accel_config(&self) -> AccelConfig {
    AccelConfig {
      queue_depth: self.accel.queue_depth,
      num_slots: self.accel.num_slots,
      tag_depth: self.accel.tag_depth,
      mem_latency: self.accel.mem_latency,
      mem_size: self.accel.mem_size,
    }
  }

  /// 提取模拟器运行时视图
  pub fn to_sim_config(&self) -> SimConfig {
    SimConfig {
      quiet: self.simulation.quiet,
      step_mode: if self.simulation.step_mode {
        StepMode::Step
      } else {
        StepMode::Continuous
      },
      trace_file: if self.simulation.trace_file.is_empty() {
        None
      } else {
        Some(self.simulation.trace_file.clone())
      },
      max_steps: self.simulation.max_steps,
    }
  }
}

/// 分层加载配置：default.toml -> 自定义文件 -> OPAL_ 环境变量
///
/// 环境变量用双下划线分节，如 OPAL_SIMULATION__MAX_STEPS=5000
pub fn load_layered_config(custom_config_path: Option<&Path>) -> io::Result<AppConfig> {
  let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
  let default_path = manifest_dir
    .join("src")
    .join("simulator")
    .join("config")
    .join("default.toml");

  let mut builder = Config::builder().add_source(File::from(default_path));

  if let Some(path) = custom_config_path {
    builder = builder.add_source(File::from(path.to_path_buf()));
  }

  let merged = builder
    .add_source(Environment::with_prefix("OPAL").separator("__"))
    .build()
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("配置加载失败: {}", e)))?;

  merged
    .try_deserialize::<AppConfig>()
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("配置解析失败: {}", e)))
}

/// 应用CLI参数覆写配置
pub fn apply_cli_overrides(
  config: &mut AppConfig,
  quiet: bool,
  step: bool,
  trace_file: Option<&str>,
  max_steps: Option<u64>,
) {
  if quiet {
    config.simulation.quiet = true;
  }
  if step {
    config.simulation.step_mode = true;
  }
  if let Some(file) = trace_file {
    config.simulation.trace_file = file.to_string();
  }
  if let Some(steps) = max_steps {
    config.simulation.max_steps = steps;
  }
}

/// 验证配置
pub fn validate_config(config: &AppConfig) -> io::Result<()> {
  config
    .to_accel_config()
    .validate()
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

  if config.simulation.max_steps == 0 {
    return Err(io::Error::new(
      io::ErrorKind::InvalidData,
      "max_steps must be greater than 0".to_string(),
    ));
  }

  Ok(())
}

/// 加载并合并配置
///
/// 流程：
/// 1. 加载默认配置
/// 2. 如果提供了自定义配置文件，加载并合并
/// 3. 合并 OPAL_ 前缀环境变量
/// 4. 应用CLI参数覆写
/// 5. 验证配置
pub fn load_and_merge_configs(
  custom_config_path: Option<&str>,
  quiet: bool,
  step: bool,
  trace_file: Option<&str>,
  max_steps: Option<u64>,
) -> io::Result<AppConfig> {
  let mut config = load_layered_config(custom_config_path.map(Path::new))?;

  apply_cli_overrides(&mut config, quiet, step, trace_file, max_steps);

  validate_config(&config)?;

  Ok(config)
}
