/// Workload file format
///
/// A workload is one TOML file describing a matmul problem: shape, fetch
/// mode, and either explicit operand matrices or a seed for deterministic
/// generation.
use crate::frontend::FetchMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Workload {
  pub name: String,
  /// "split" 或 "interleaved"
  #[serde(default = "default_mode")]
  pub mode: String,
  pub m: u32,
  pub n: u32,
  pub k: u32,
  /// a/b 缺省时的生成种子
  #[serde(default)]
  pub seed: u64,
  /// 行主序 m x k，空则按种子生成
  #[serde(default)]
  pub a: Vec<i8>,
  /// 行主序 k x n，空则按种子生成
  #[serde(default)]
  pub b: Vec<i8>,
  #[serde(default = "default_workload_steps")]
  pub max_steps: u64,
}

fn default_mode() -> String {
  "split".to_string()
}

fn default_workload_steps() -> u64 {
  100_000
}

impl Workload {
  /// 从TOML文件加载工作负载
  pub fn load(path: &Path) -> io::Result<Self> {
    let content = fs::read_to_string(path)
      .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("无法读取工作负载文件 {:?}: {}", path, e)))?;

    let workload: Workload = toml::from_str(&content)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("解析工作负载失败: {}", e)))?;

    workload.validate()?;
    Ok(workload)
  }

  pub fn fetch_mode(&self) -> io::Result<FetchMode> {
    match self.mode.to_lowercase().as_str() {
      "split" => Ok(FetchMode::Split),
      "interleaved" => Ok(FetchMode::Interleaved),
      other => Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("unknown fetch mode: {}", other),
      )),
    }
  }

  pub fn validate(&self) -> io::Result<()> {
    self.fetch_mode()?;

    if self.m == 0 || self.n == 0 {
      return Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "m and n must be at least 1".to_string(),
      ));
    }

    // 显式矩阵必须与形状一致；k 为 0 时二者都应为空
    let a_len = (self.m * self.k) as usize;
    if !self.a.is_empty() && self.a.len() != a_len {
      return Err(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("matrix a has {} elements, expected {}", self.a.len(), a_len),
      ));
    }
    let b_len = (self.k * self.n) as usize;
    if !self.b.is_empty() && self.b.len() != b_len {
      return Err(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("matrix b has {} elements, expected {}", self.b.len(), b_len),
      ));
    }

    Ok(())
  }

  /// 取出操作数矩阵，缺省时按种子生成固定小数值
  pub fn materialize(&self) -> (Vec<i8>, Vec<i8>) {
    let a = if self.a.is_empty() {
      gen_matrix(self.seed, (self.m * self.k) as usize)
    } else {
      self.a.clone()
    };
    let b = if self.b.is_empty() {
      gen_matrix(self.seed.wrapping_add(1), (self.k * self.n) as usize)
    } else {
      self.b.clone()
    };
    (a, b)
  }
}

fn splitmix64(state: &mut u64) -> u64 {
  *state = state.wrapping_add(0x9e3779b97f4a7c15);
  let mut z = *state;
  z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
  z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
  z ^ (z >> 31)
}

/// 生成 [-8, 8] 的确定性伪随机元素
fn gen_matrix(seed: u64, len: usize) -> Vec<i8> {
  let mut state = seed;
  (0..len).map(|_| (splitmix64(&mut state) % 17) as i8 - 8).collect()
}
