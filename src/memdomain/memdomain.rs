/// Memory Domain - 将预取、访存通道、响应路由和缓冲池连接在一起
use super::channel::OperandMemory;
use super::prefetch::PrefetchUnit;
use super::router::ResponseRouter;
use super::slot::SlotPool;
use super::tag::TagQueue;
use crate::builtin::{Module, TraceRecord};
use crate::config::{AccelConfig, BLOCK_BYTES};
use crate::frontend::cmd::Command;

/// Memory Domain - 计算引擎的取数侧
/// 槽位池与标签队列由本模块持有，预取/路由以方法参数访问
pub struct MemDomain {
  name: String,
  pub mem: OperandMemory,
  pub slots: SlotPool,
  pub tags: TagQueue,
  pub prefetch: PrefetchUnit,
  pub router: ResponseRouter,
}

impl MemDomain {
  pub fn new(name: impl Into<String>, cfg: &AccelConfig) -> Self {
    Self {
      name: name.into(),
      mem: OperandMemory::new("operand_mem", cfg.mem_size, cfg.mem_latency),
      slots: SlotPool::new(cfg.num_slots),
      tags: TagQueue::new(cfg.tag_depth),
      prefetch: PrefetchUnit::new("prefetch"),
      router: ResponseRouter::new("router"),
    }
  }

  /// 命令锁存：清空缓冲池簿记，装载取数游标
  /// 上一条命令结束时通道必然已排空
  pub fn begin_command(&mut self, cmd: &Command) {
    debug_assert!(self.mem.idle(), "command latch with in-flight responses");
    debug_assert!(self.tags.is_empty(), "command latch with live tags");
    self.slots.reset();
    self.tags.reset();
    self.router.begin();
    self.prefetch.begin(cmd);
  }

  /// 写入数据到操作数存储（用于初始化，不经过信号线）
  pub fn load_image(&mut self, addr: usize, data: &[i8]) {
    self.mem.load_image(addr, data);
  }

  pub fn num_slots(&self) -> usize {
    self.slots.len()
  }

  /// 就绪槽位数量（流水预热判定用）
  pub fn valid_blocks(&self) -> usize {
    self.slots.valid_count()
  }

  pub fn slot_valid(&self, idx: usize) -> bool {
    self.slots.get(idx).valid
  }

  /// 消费一个就绪槽位：取出 A/B 数据并清空该槽位
  pub fn take_block(&mut self, idx: usize) -> ([i8; BLOCK_BYTES], [i8; BLOCK_BYTES]) {
    let slot = self.slots.get_mut(idx);
    debug_assert!(slot.valid, "consume of an invalid slot");
    let block = (slot.a_data, slot.b_data);
    slot.clear();
    block
  }

  /// 本条命令内就绪的 block 数
  pub fn blocks_produced(&self) -> u32 {
    self.router.produced()
  }

  pub fn tags_empty(&self) -> bool {
    self.tags.is_empty()
  }

  pub fn mem_requests(&self) -> u64 {
    self.mem.requests()
  }

  pub fn blocks_produced_total(&self) -> u64 {
    self.router.produced_total()
  }

  pub fn take_records(&mut self) -> Vec<TraceRecord> {
    let mut out = self.prefetch.take_records();
    out.extend(self.router.take_records());
    out
  }
}

impl Module for MemDomain {
  fn run(&mut self) {
    // 从后向前运行

    // 1. 先运行Router（读取上一步访存通道的响应）
    self.router.run_step(&mut self.slots, &mut self.tags);

    // 2. 再运行Prefetch（依据最新的槽位/标签状态发请求）
    self.prefetch.run_step(&mut self.slots, &mut self.tags);

    // 3. 再运行访存通道（读取上一步预取发出的请求）
    self.mem.run();

    // 4. 连线更新：本步的输出 -> 下步的输入
    self.mem.req = self.prefetch.req_out.clone();
    self.router.resp_in = self.mem.resp.clone();
  }

  fn reset(&mut self) {
    self.mem.reset();
    self.slots.reset();
    self.tags.reset();
    self.prefetch.reset();
    self.router.reset();
  }

  fn name(&self) -> &str {
    &self.name
  }
}
