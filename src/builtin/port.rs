/// Port and signal types for module interconnection

/// A wire/signal that carries one value between modules per step
/// 所有信号线自动包含valid标志，无效时下游不采样
#[derive(Clone)]
pub struct Wire<T: Clone> {
  pub value: T,
  pub valid: bool,
}

impl<T: Clone> Wire<T> {
  pub fn new(value: T) -> Self {
    Self { value, valid: false }
  }

  pub fn set(&mut self, value: T) {
    self.value = value;
    self.valid = true;
  }

  pub fn clear(&mut self) {
    self.valid = false;
  }

  /// 有效时采样信号值
  pub fn get(&self) -> Option<&T> {
    if self.valid {
      Some(&self.value)
    } else {
      None
    }
  }
}

impl<T: Clone + Default> Default for Wire<T> {
  fn default() -> Self {
    Self {
      value: T::default(),
      valid: false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_wire_set_clear() {
    let mut w: Wire<u32> = Wire::default();
    assert!(!w.valid);
    assert!(w.get().is_none());

    w.set(7);
    assert!(w.valid);
    assert_eq!(w.get(), Some(&7));

    w.clear();
    assert!(!w.valid);
    // value 保留，仅 valid 翻转
    assert_eq!(w.value, 7);
  }
}
