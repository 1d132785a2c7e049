/// Accelerator commands and the bounded command queue
use crate::config::{BLOCK_LEN, LANES};
use log::warn;
use std::collections::VecDeque;
use std::fmt;

/// 取数模式
/// Split: A/B 各自独立寻址，每个 K-block 两次取数
/// Interleaved: 单次取数同时携带 A/B 两半
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
  #[default]
  Split,
  Interleaved,
}

/// 一条加速器命令，入队后不可变
#[derive(Debug, Clone, Default)]
pub struct Command {
  pub mode: FetchMode,
  pub b_addr: u32,
  pub a_addr: u32,
  pub a_stride: u32,
  pub m: u32,
  pub n: u32,
  pub k: u32,
  pub k_row_len: u32,
}

impl Command {
  /// K-block 总数，K=0 时为 0
  pub fn k_limit(&self) -> u32 {
    let bl = BLOCK_LEN as u32;
    (self.k + bl - 1) / bl
  }
}

/// 命令队列满，本次入队被丢弃
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl fmt::Display for QueueFull {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "command queue full")
  }
}

/// 有界命令队列
/// 满时拒绝入队并置粘滞溢出标志，需驱动显式清除
pub struct CmdQueue {
  depth: usize,
  q: VecDeque<Command>,
  overflow: bool,
  rejects: u64,
}

impl CmdQueue {
  pub fn new(depth: usize) -> Self {
    Self {
      depth,
      q: VecDeque::with_capacity(depth),
      overflow: false,
      rejects: 0,
    }
  }

  pub fn push(&mut self, cmd: Command) -> Result<(), QueueFull> {
    if self.q.len() >= self.depth {
      // 命令被丢弃，置粘滞标志，队列内容不受影响
      self.overflow = true;
      self.rejects += 1;
      warn!(
        "command queue full (depth {}), start dropped (m={} n={} k={})",
        self.depth, cmd.m, cmd.n, cmd.k
      );
      return Err(QueueFull);
    }
    self.q.push_back(cmd);
    Ok(())
  }

  pub fn pop(&mut self) -> Option<Command> {
    self.q.pop_front()
  }

  pub fn is_empty(&self) -> bool {
    self.q.is_empty()
  }

  pub fn is_full(&self) -> bool {
    self.q.len() >= self.depth
  }

  pub fn len(&self) -> usize {
    self.q.len()
  }

  pub fn overflowed(&self) -> bool {
    self.overflow
  }

  /// 清除粘滞溢出标志（驱动侧 error-clear）
  pub fn clear_overflow(&mut self) {
    self.overflow = false;
  }

  pub fn rejects(&self) -> u64 {
    self.rejects
  }

  pub fn reset(&mut self) {
    self.q.clear();
    self.overflow = false;
    self.rejects = 0;
  }
}

/// 结果栅格边长的便捷别名，命令的 m/n 不会超过它
pub const MAX_DIM: u32 = LANES as u32;
