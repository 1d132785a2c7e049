use crate::builtin::TraceRecord;
use crate::top::AccelStats;

pub fn print_run_report(stats: &AccelStats) {
  println!("\n--- Run Statistics ---");
  println!("  total steps:     {}", stats.steps);
  println!("  commands done:   {}", stats.commands_done);
  println!("  memory requests: {}", stats.mem_requests);
  println!("  blocks produced: {}", stats.blocks_produced);
  println!("  blocks consumed: {}", stats.blocks_consumed);
  println!("  stall steps:     {}", stats.stall_steps);
  println!("  queue rejects:   {}", stats.queue_rejects);
  println!("--- End Statistics ---\n");
}

pub fn print_records(records: &[TraceRecord]) {
  println!("\n--- Simulation Records ---");

  let mut current = "";
  for record in records {
    // 按模块分组打印
    if record.model != current {
      println!("\n[{}]", record.model);
      current = &record.model;
    }
    println!("  Time {}: {} {}", record.time, record.action, record.subject);
  }

  println!("--- End Records ---\n");
}
