use serde::Serialize;

/// 模块事件记录，按步打时间戳，供报告与 trace 输出使用
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
  pub time: u64,
  pub model: String,
  pub action: String,
  pub subject: String,
}

/// Macro to push a TraceRecord with common fields
///
/// Usage:
/// ```ignore
/// trace_record!(self, "action_name", "subject string");
/// trace_record!(self, "action_name", format!("formatted {}", value));
/// ```
/// 要求 $self 带有 records/time/name 三个字段。
#[macro_export]
macro_rules! trace_record {
  ($self:expr, $action:expr, $subject:expr) => {
    $self.records.push($crate::builtin::TraceRecord {
      time: $self.time,
      model: $self.name.clone(),
      action: $action.to_string(),
      subject: $subject.to_string(),
    });
  };
}
