//! 编码端比特储备
//!
//! 记录前面各帧节省下来的比特数, 上限为配置的储备大小.

/// 比特储备
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitReservoir {
    level: u32,
    size: u32,
}

impl BitReservoir {
    /// 创建储备, `start_full` 为真时初始即为满
    pub fn new(size: u32, start_full: bool) -> Self {
        Self {
            level: if start_full { size } else { 0 },
            size,
        }
    }

    /// 当前储备比特数
    pub fn level(&self) -> u32 {
        self.level
    }

    /// 储备上限
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn reset(&mut self, start_full: bool) {
        self.level = if start_full { self.size } else { 0 };
    }

    /// 一帧结束后更新: 储备 += 预算 - 实际写出, 结果限制在 `[0, limit]`
    ///
    /// `limit` 不超过储备大小. 返回更新后的储备.
    pub fn update(&mut self, budget: u32, written: u32, limit: u32) -> u32 {
        let limit = limit.min(self.size) as i64;
        let next = self.level as i64 + budget as i64 - written as i64;
        self.level = next.clamp(0, limit) as u32;
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_初始状态() {
        assert_eq!(BitReservoir::new(100, true).level(), 100);
        assert_eq!(BitReservoir::new(100, false).level(), 0);
    }

    #[test]
    fn test_更新限制在范围内() {
        let mut res = BitReservoir::new(1000, false);
        assert_eq!(res.update(800, 500, 1000), 300);
        assert_eq!(res.update(800, 2000, 1000), 0);
        assert_eq!(res.update(5000, 0, 1000), 1000);
        assert_eq!(res.update(800, 800, 7), 7);
        res.reset(true);
        assert_eq!(res.level(), 1000);
    }

    #[test]
    fn test_任意序列不越界() {
        let mut res = BitReservoir::new(4096, true);
        let mut seed = 12345u32;
        for _ in 0..1000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let written = (seed >> 8) % 8000;
            let level = res.update(2730, written, 4096);
            assert!(level <= 4096);
        }
    }
}
