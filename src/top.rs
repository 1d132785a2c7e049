/// Top Module - 顶层模块，连接寄存器面、命令队列、计算引擎与访存域
use crate::builtin::{Module, TraceRecord};
use crate::config::AccelConfig;
use crate::frontend::cmd::CmdQueue;
use crate::frontend::regs::{ctrl, offset, result_index, status, ShadowRegs};
use crate::memdomain::MemDomain;
use crate::mmdomain::ComputeEngine;
use crate::simulator::utils::log_config::is_mmio_log_enabled;
use crate::trace_record;
use log::debug;

/// 运行统计汇总
#[derive(Debug, Clone, Copy, Default)]
pub struct AccelStats {
  pub steps: u64,
  pub commands_done: u64,
  pub mem_requests: u64,
  pub blocks_produced: u64,
  pub blocks_consumed: u64,
  pub stall_steps: u64,
  pub queue_rejects: u64,
}

/// Accelerator - 外积矩阵乘加速器顶层
pub struct Accelerator {
  name: String,

  pub shadow: ShadowRegs,
  pub queue: CmdQueue,
  pub engine: ComputeEngine,
  pub memdomain: MemDomain,

  cfg: AccelConfig,
  time: u64,
  records: Vec<TraceRecord>,
}

impl Accelerator {
  pub fn new(name: impl Into<String>, cfg: &AccelConfig) -> Self {
    Self {
      name: name.into(),
      shadow: ShadowRegs::new(),
      queue: CmdQueue::new(cfg.queue_depth),
      engine: ComputeEngine::new("engine"),
      memdomain: MemDomain::new("memdomain", cfg),
      cfg: cfg.clone(),
      time: 0,
      records: Vec::new(),
    }
  }

  /// 写入数据到操作数存储（用于初始化，不经过信号线）
  pub fn load_image(&mut self, addr: u32, data: &[i8]) {
    self.memdomain.load_image(addr as usize, data);
  }

  pub fn mem_size(&self) -> usize {
    self.cfg.mem_size
  }

  /// 寄存器写。CTRL 立即生效，命令字段写入影子寄存器
  pub fn mmio_write(&mut self, off: u32, value: u32) {
    if is_mmio_log_enabled() {
      trace_record!(self, "mmio_write", format!("off={:#x} value={:#x}", off, value));
    }
    if off == offset::CTRL {
      if value & ctrl::CLEAR_ERR != 0 {
        self.queue.clear_overflow();
        debug!("sticky error cleared");
      }
      // bit1 与 start 同笔写入生效，选择取数模式
      self.shadow.interleaved = value & ctrl::INTERLEAVED != 0;
      if value & ctrl::START != 0 {
        let cmd = self.shadow.to_command();
        // 满则置粘滞标志，命令被丢弃（CmdQueue 负责告警）
        let _ = self.queue.push(cmd);
      }
    } else {
      self.shadow.write(off, value);
    }
  }

  /// 寄存器读。状态位即时拼装，结果寄存器映射累加器栅格
  pub fn mmio_read(&self, off: u32) -> u32 {
    if off == offset::CTRL {
      return self.status();
    }
    if let Some((row, col)) = result_index(off) {
      return self.engine.result(row, col) as u32;
    }
    // 只写或未映射的偏移读出 0
    0
  }

  /// 状态寄存器：done 要求引擎空闲且队列为空
  pub fn status(&self) -> u32 {
    let mut s = 0;
    if !self.engine.is_idle() {
      s |= status::BUSY;
    }
    if self.engine.is_idle() && self.queue.is_empty() {
      s |= status::DONE;
    }
    if self.queue.is_full() {
      s |= status::QUEUE_FULL;
    }
    if self.queue.is_empty() {
      s |= status::QUEUE_EMPTY;
    }
    if self.queue.overflowed() {
      s |= status::STICKY_ERR;
    }
    s
  }

  pub fn is_done(&self) -> bool {
    self.status() & status::DONE != 0
  }

  pub fn result(&self, row: usize, col: usize) -> i32 {
    self.engine.result(row, col)
  }

  pub fn steps(&self) -> u64 {
    self.time
  }

  pub fn stats(&self) -> AccelStats {
    let e = self.engine.stats();
    AccelStats {
      steps: self.time,
      commands_done: e.commands_done,
      mem_requests: self.memdomain.mem_requests(),
      blocks_produced: self.memdomain.blocks_produced_total(),
      blocks_consumed: e.blocks_consumed_total,
      stall_steps: e.stall_steps,
      queue_rejects: self.queue.rejects(),
    }
  }

  /// 汇聚各模块的事件记录（trace/报告用）
  pub fn take_records(&mut self) -> Vec<TraceRecord> {
    let mut out = std::mem::take(&mut self.records);
    out.extend(self.engine.take_records());
    out.extend(self.memdomain.take_records());
    out.sort_by_key(|r| r.time);
    out
  }

  /// 寄存器面打印（shell 用）
  pub fn dump_regs(&self) -> String {
    let mut out = String::new();
    out.push_str(&format!("STATUS     = {:#010x}\n", self.status()));
    out.push_str(&format!("B_ADDR     = {:#010x}\n", self.shadow.b_addr));
    out.push_str(&format!("A_ADDR     = {:#010x}\n", self.shadow.a_addr));
    out.push_str(&format!("M_DIM      = {}\n", self.shadow.m));
    out.push_str(&format!("N_DIM      = {}\n", self.shadow.n));
    out.push_str(&format!("K_DIM      = {}\n", self.shadow.k));
    out.push_str(&format!("A_STRIDE   = {:#010x}\n", self.shadow.a_stride));
    out.push_str(&format!("K_ROW_LEN  = {}\n", self.shadow.k_row_len));
    out.push_str(&format!("MODE       = {}\n", if self.shadow.interleaved { "interleaved" } else { "split" }));
    out.push_str("RESULT:\n");
    for row in 0..4 {
      out.push_str(&format!(
        "  {:>11} {:>11} {:>11} {:>11}\n",
        self.engine.result(row, 0),
        self.engine.result(row, 1),
        self.engine.result(row, 2),
        self.engine.result(row, 3)
      ));
    }
    out
  }

  /// 缓冲池状态打印（shell 用）
  pub fn dump_slots(&self) -> String {
    let mut out = String::new();
    out.push_str(&format!("engine state: {:?}\n", self.engine.state()));
    for idx in 0..self.memdomain.num_slots() {
      let s = self.memdomain.slots.get(idx);
      out.push_str(&format!(
        "slot[{}] has_a={} has_b={} pending_a={} pending_b={} valid={}\n",
        idx,
        s.has_a as u8,
        s.has_b as u8,
        s.pending_a as u8,
        s.pending_b as u8,
        s.valid as u8
      ));
    }
    out
  }
}

impl Module for Accelerator {
  fn run(&mut self) {
    // 从后向前运行：先让引擎消费上一步就绪的槽位，再推进取数域

    // 1. 先运行计算引擎（读取上一步路由产出的就绪槽位）
    self.engine.run_step(&mut self.queue, &mut self.memdomain);

    // 2. 再运行访存域（路由 -> 预取 -> 访存通道，含连线更新）
    self.memdomain.run();

    self.time += 1;
  }

  fn reset(&mut self) {
    self.shadow.reset();
    self.queue.reset();
    self.engine.reset();
    self.memdomain.reset();
    self.time = 0;
    self.records.clear();
  }

  fn name(&self) -> &str {
    &self.name
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::BLOCK_BYTES;
  use crate::frontend::regs::{ctrl, offset, status};

  fn accel() -> Accelerator {
    Accelerator::new("accel", &AccelConfig::default())
  }

  /// 简单 1x1xK 命令：A 全 1，B 全 1，期望 result[0][0] == K
  fn ones_command(acc: &mut Accelerator, k: u32) {
    let k_limit = (k as usize + 3) / 4;
    let a = vec![1i8; k_limit * BLOCK_BYTES];
    let b = vec![1i8; k_limit * BLOCK_BYTES];
    acc.load_image(0, &a);
    acc.load_image(0x1000, &b);
    acc.mmio_write(offset::A_ADDR, 0);
    acc.mmio_write(offset::B_ADDR, 0x1000);
    acc.mmio_write(offset::M_DIM, 1);
    acc.mmio_write(offset::N_DIM, 1);
    acc.mmio_write(offset::K_DIM, k);
    acc.mmio_write(offset::CTRL, ctrl::START);
  }

  fn run_to_done(acc: &mut Accelerator, budget: u64) -> u64 {
    let mut steps = 0;
    while !acc.is_done() && steps < budget {
      acc.run();
      steps += 1;
    }
    steps
  }

  #[test]
  fn test_status_idle() {
    let acc = accel();
    let s = acc.status();
    assert_eq!(s & status::BUSY, 0);
    assert_ne!(s & status::DONE, 0);
    assert_ne!(s & status::QUEUE_EMPTY, 0);
  }

  #[test]
  fn test_simple_command_completes() {
    let mut acc = accel();
    ones_command(&mut acc, 4);
    assert!(!acc.is_done());
    let steps = run_to_done(&mut acc, 1000);
    assert!(steps < 1000, "command did not complete");
    assert_eq!(acc.result(0, 0), 4);
    let st = acc.stats();
    assert_eq!(st.commands_done, 1);
    assert_eq!(st.blocks_produced, 1);
    assert_eq!(st.blocks_consumed, 1);
  }

  #[test]
  fn test_result_readback_via_mmio() {
    let mut acc = accel();
    ones_command(&mut acc, 8);
    run_to_done(&mut acc, 1000);
    assert_eq!(acc.mmio_read(offset::RESULT_BASE) as i32, 8);
    // 未写过的行列保持 0
    assert_eq!(acc.mmio_read(offset::RESULT_LAST), 0);
  }

  #[test]
  fn test_done_requires_empty_queue() {
    let mut acc = accel();
    ones_command(&mut acc, 4);
    ones_command(&mut acc, 4);
    // 全程 done 蕴含 空闲且队列空
    let mut steps = 0;
    while !acc.is_done() && steps < 2000 {
      let s = acc.status();
      if s & status::DONE != 0 {
        assert_eq!(s & status::BUSY, 0);
        assert_ne!(s & status::QUEUE_EMPTY, 0);
      }
      acc.run();
      steps += 1;
    }
    assert!(steps < 2000);
    assert_eq!(acc.stats().commands_done, 2);
  }

  #[test]
  fn test_unmapped_read_zero() {
    let acc = accel();
    assert_eq!(acc.mmio_read(offset::A_ADDR), 0);
    assert_eq!(acc.mmio_read(0x80), 0);
  }
}
