/// Module trait for lock-step components

/// 每个部件实现 run/reset/name，由上层模块按固定顺序逐步推进。
/// run() 读取上一步写入的输入信号线，产生本步的输出信号线；
/// 信号线的搬运（本步输出 -> 下步输入）由父模块在 run 之后完成。
pub trait Module {
  fn run(&mut self);
  fn reset(&mut self);
  fn name(&self) -> &str;
}
