/// Compute engine state machine
///
/// Idle -> Pop -> Latch -> Compute -> Done -> Idle
/// 按序消费就绪槽位，外积累加到 4x4 结果栅格。尾块按余数掩码，
/// rem = min(4, K - 4*block_index) 之外的元素不参与累加。
use crate::builtin::TraceRecord;
use crate::config::{BLOCK_LEN, LANES};
use crate::frontend::cmd::{CmdQueue, Command};
use crate::memdomain::MemDomain;
use crate::simulator::utils::log_config::is_compute_log_enabled;
use crate::trace_record;
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
  Idle,
  Pop,
  Latch,
  Compute,
  Done,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
  pub commands_done: u64,
  pub blocks_consumed_total: u64,
  pub stall_steps: u64,
}

pub struct ComputeEngine {
  name: String,
  state: EngineState,

  // 锁存的活动命令，Done 时清除
  active: Option<Command>,
  // Pop -> Latch 的一拍流水寄存器
  popped: Option<Command>,

  acc: [[i32; LANES]; LANES],
  k_limit: u32,
  blocks_consumed: u32,
  consume_ptr: usize,
  prefilled: bool,

  stats: EngineStats,
  time: u64,
  records: Vec<TraceRecord>,
}

impl ComputeEngine {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      state: EngineState::Idle,
      active: None,
      popped: None,
      acc: [[0; LANES]; LANES],
      k_limit: 0,
      blocks_consumed: 0,
      consume_ptr: 0,
      prefilled: false,
      stats: EngineStats::default(),
      time: 0,
      records: Vec::new(),
    }
  }

  pub fn state(&self) -> EngineState {
    self.state
  }

  pub fn is_idle(&self) -> bool {
    self.state == EngineState::Idle
  }

  /// 结果栅格只读视图，行列越界时返回 0
  pub fn result(&self, row: usize, col: usize) -> i32 {
    if row < LANES && col < LANES {
      self.acc[row][col]
    } else {
      0
    }
  }

  pub fn stats(&self) -> EngineStats {
    self.stats
  }

  pub fn blocks_consumed(&self) -> u32 {
    self.blocks_consumed
  }

  pub fn take_records(&mut self) -> Vec<TraceRecord> {
    std::mem::take(&mut self.records)
  }

  /// 单步推进状态机。队列与取数域由顶层传入，
  /// 槽位写入（路由）与清空（消费）不会发生在同一步的同一槽位。
  pub fn run_step(&mut self, queue: &mut CmdQueue, mem: &mut MemDomain) {
    match self.state {
      EngineState::Idle => {
        if !queue.is_empty() {
          self.state = EngineState::Pop;
        }
      },
      EngineState::Pop => {
        // 出队一条命令，一拍流水延迟
        let Some(cmd) = queue.pop() else {
          debug_assert!(false, "pop from empty command queue");
          self.state = EngineState::Idle;
          self.time += 1;
          return;
        };
        self.popped = Some(cmd);
        self.state = EngineState::Latch;
      },
      EngineState::Latch => {
        let Some(cmd) = self.popped.take() else {
          debug_assert!(false, "latch without popped command");
          self.state = EngineState::Idle;
          self.time += 1;
          return;
        };
        // 累加器每条命令恰好清零一次
        self.acc = [[0; LANES]; LANES];
        self.k_limit = cmd.k_limit();
        self.blocks_consumed = 0;
        self.consume_ptr = 0;
        self.prefilled = false;
        mem.begin_command(&cmd);
        info!(
          "latch command: mode={:?} m={} n={} k={} k_limit={}",
          cmd.mode, cmd.m, cmd.n, cmd.k, self.k_limit
        );
        if is_compute_log_enabled() {
          trace_record!(self, "latch", format!("m={} n={} k={}", cmd.m, cmd.n, cmd.k));
        }
        self.active = Some(cmd);
        self.state = EngineState::Compute;
      },
      EngineState::Compute => {
        self.compute_step(mem);
      },
      EngineState::Done => {
        // 完成校验：产出/消费的 block 数与 k_limit 一致，标签队列已排空
        debug_assert_eq!(mem.blocks_produced(), self.blocks_consumed, "produced/consumed mismatch");
        debug_assert_eq!(self.blocks_consumed, self.k_limit, "consumed != k_limit");
        debug_assert!(mem.tags_empty(), "tags left at command completion");
        self.active = None;
        self.stats.commands_done += 1;
        debug!("command done, total {}", self.stats.commands_done);
        if is_compute_log_enabled() {
          trace_record!(self, "done", format!("blocks={}", self.blocks_consumed));
        }
        self.state = EngineState::Idle;
      },
    }
    self.time += 1;
  }

  fn compute_step(&mut self, mem: &mut MemDomain) {
    // 完成判定先于消费，K=0 时直接收尾
    if self.blocks_consumed == self.k_limit {
      self.state = EngineState::Done;
      return;
    }

    let (m, n, k) = match self.active.as_ref() {
      Some(cmd) => (cmd.m as usize, cmd.n as usize, cmd.k),
      None => {
        debug_assert!(false, "compute without active command");
        self.state = EngineState::Idle;
        return;
      },
    };

    // 流水预热：首个 block 消费前等待足够的就绪槽位
    if !self.prefilled {
      let need = if self.k_limit <= 1 { 1 } else { 2 };
      if mem.valid_blocks() < need {
        self.stats.stall_steps += 1;
        return;
      }
      self.prefilled = true;
    }

    // 按序消费：下一个槽位未就绪则空转，不改动累加器
    if !mem.slot_valid(self.consume_ptr) {
      self.stats.stall_steps += 1;
      return;
    }
    let (a, b) = mem.take_block(self.consume_ptr);

    // 尾块余数掩码
    let done_elems = self.blocks_consumed * BLOCK_LEN as u32;
    let rem = u32::min(BLOCK_LEN as u32, k - done_elems) as usize;

    for i in 0..m {
      for j in 0..n {
        let mut sum = self.acc[i][j];
        for s in 0..rem {
          let prod = (a[i * BLOCK_LEN + s] as i16) * (b[j * BLOCK_LEN + s] as i16);
          sum = sum.wrapping_add(prod as i32);
        }
        self.acc[i][j] = sum;
      }
    }

    if is_compute_log_enabled() {
      trace_record!(
        self,
        "consume",
        format!("slot={} block={} rem={}", self.consume_ptr, self.blocks_consumed, rem)
      );
    }

    self.consume_ptr = (self.consume_ptr + 1) % mem.num_slots();
    self.blocks_consumed += 1;
    self.stats.blocks_consumed_total += 1;

    if self.blocks_consumed == self.k_limit {
      self.state = EngineState::Done;
    }
  }

  pub fn reset(&mut self) {
    self.state = EngineState::Idle;
    self.active = None;
    self.popped = None;
    self.acc = [[0; LANES]; LANES];
    self.k_limit = 0;
    self.blocks_consumed = 0;
    self.consume_ptr = 0;
    self.prefilled = false;
    self.stats = EngineStats::default();
    self.time = 0;
    self.records.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AccelConfig;
  use crate::frontend::cmd::FetchMode;

  fn fixture(latency: u64) -> (ComputeEngine, CmdQueue, MemDomain) {
    let cfg = AccelConfig {
      mem_latency: latency,
      ..AccelConfig::default()
    };
    (
      ComputeEngine::new("engine"),
      CmdQueue::new(cfg.queue_depth),
      MemDomain::new("memdomain", &cfg),
    )
  }

  /// 与顶层相同的推进顺序：引擎先行，取数域随后
  fn step(engine: &mut ComputeEngine, queue: &mut CmdQueue, mem: &mut MemDomain) {
    use crate::builtin::Module;
    engine.run_step(queue, mem);
    mem.run();
  }

  #[test]
  fn test_pop_latch_pipeline() {
    let (mut engine, mut queue, mut mem) = fixture(1);
    queue.push(Command { m: 1, n: 1, k: 0, ..Command::default() }).unwrap();

    assert_eq!(engine.state(), EngineState::Idle);
    step(&mut engine, &mut queue, &mut mem); // Idle -> Pop
    assert_eq!(engine.state(), EngineState::Pop);
    step(&mut engine, &mut queue, &mut mem); // Pop -> Latch
    assert_eq!(engine.state(), EngineState::Latch);
    assert!(queue.is_empty());
    step(&mut engine, &mut queue, &mut mem); // Latch -> Compute
    assert_eq!(engine.state(), EngineState::Compute);
  }

  #[test]
  fn test_zero_k_finishes_without_consuming() {
    let (mut engine, mut queue, mut mem) = fixture(1);
    queue.push(Command { m: 4, n: 4, k: 0, ..Command::default() }).unwrap();

    for _ in 0..10 {
      step(&mut engine, &mut queue, &mut mem);
    }
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.stats().commands_done, 1);
    assert_eq!(engine.stats().blocks_consumed_total, 0);
    assert_eq!(engine.result(0, 0), 0);
  }

  #[test]
  fn test_single_block_dot_product() {
    let (mut engine, mut queue, mut mem) = fixture(1);
    // lane 0 的 A 为 [1,2,3,4]，B 全 1，result[0][0] = 10
    let mut a = [0i8; 16];
    a[..4].copy_from_slice(&[1, 2, 3, 4]);
    let b = [1i8; 16];
    mem.load_image(0, &a);
    mem.load_image(0x100, &b);
    queue
      .push(Command {
        mode: FetchMode::Split,
        a_addr: 0,
        b_addr: 0x100,
        m: 1,
        n: 1,
        k: 4,
        ..Command::default()
      })
      .unwrap();

    for _ in 0..50 {
      step(&mut engine, &mut queue, &mut mem);
    }
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.result(0, 0), 10);
    assert_eq!(engine.result(0, 1), 0);
  }

  #[test]
  fn test_slow_memory_counts_stalls() {
    let (mut engine, mut queue, mut mem) = fixture(8);
    mem.load_image(0, &[1i8; 64]);
    mem.load_image(0x100, &[1i8; 64]);
    queue
      .push(Command {
        mode: FetchMode::Split,
        a_addr: 0,
        b_addr: 0x100,
        m: 4,
        n: 4,
        k: 8,
        ..Command::default()
      })
      .unwrap();

    for _ in 0..200 {
      step(&mut engine, &mut queue, &mut mem);
    }
    assert_eq!(engine.stats().commands_done, 1);
    // 延迟 8 下预热必然产生空转
    assert!(engine.stats().stall_steps > 0);
    assert_eq!(engine.result(0, 0), 8);
  }
}
