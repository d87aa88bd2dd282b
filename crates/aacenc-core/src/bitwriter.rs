//! 比特流写入器.
//!
//! 按大端位序 (MSB first) 向字节缓冲区写入语法元素, 并精确统计已写位数,
//! 供码率控制核对每个元素实际消耗的比特.

/// 比特流写入器
///
/// # 示例
/// ```
/// use aacenc_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b110, 3);
/// bw.write_bits(0x1F, 5);
/// assert_eq!(bw.bits_written(), 8);
/// assert_eq!(bw.finish(), vec![0b1101_1111]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    /// 已完成的字节
    data: Vec<u8>,
    /// 位累加器, 低 `pending` 位有效
    acc: u64,
    /// 累加器中尚未落盘的位数 (0-7 之外的部分会立即写出)
    pending: u32,
}

impl BitWriter {
    /// 创建空写入器
    pub fn new() -> Self {
        Self::default()
    }

    /// 以指定字节容量创建写入器
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            acc: 0,
            pending: 0,
        }
    }

    /// 已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.data.len() * 8 + self.pending as usize
    }

    /// 写入 `value` 的低 `n` 位 (n <= 32)
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={} 超过 32 位", n);
        if n == 0 {
            return;
        }
        let mask = if n == 32 { u32::MAX } else { (1u32 << n) - 1 };
        self.acc = (self.acc << n) | u64::from(value & mask);
        self.pending += n;
        while self.pending >= 8 {
            self.pending -= 8;
            self.data.push((self.acc >> self.pending) as u8);
        }
        self.acc &= (1u64 << self.pending) - 1;
    }

    /// 写入单个位
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u32::from(bit), 1);
    }

    /// 写入整字节
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.pending == 0 {
            self.data.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(u32::from(b), 8);
            }
        }
    }

    /// 对齐到字节边界需要补的位数
    pub fn bits_to_byte_align(&self) -> u32 {
        (8 - self.pending % 8) % 8
    }

    /// 用 0 补齐到字节边界, 返回补齐的位数
    pub fn byte_align(&mut self) -> u32 {
        let pad = self.bits_to_byte_align();
        self.write_bits(0, pad);
        pad
    }

    /// 完成写入, 返回字节数据 (末尾自动补齐)
    pub fn finish(mut self) -> Vec<u8> {
        self.byte_align();
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_跨字节写入() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b101, 3);
        bw.write_bits(0x3FF, 10);
        bw.write_bits(0b011, 3);
        assert_eq!(bw.bits_written(), 16);
        assert_eq!(bw.finish(), vec![0b1011_1111, 0b1111_1011]);
    }

    #[test]
    fn test_32位写入() {
        let mut bw = BitWriter::new();
        bw.write_bit(true);
        bw.write_bits(0xDEAD_BEEF, 32);
        assert_eq!(bw.bits_written(), 33);
        assert_eq!(bw.finish(), vec![0xEF, 0x56, 0xDF, 0x77, 0x80]);
    }

    #[test]
    fn test_对齐统计() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b1, 1);
        assert_eq!(bw.bits_to_byte_align(), 7);
        assert_eq!(bw.byte_align(), 7);
        assert_eq!(bw.bits_to_byte_align(), 0);
        bw.write_bytes(&[0xA5, 0x5A]);
        assert_eq!(bw.bits_written(), 24);
        assert_eq!(bw.finish(), vec![0x80, 0xA5, 0x5A]);
    }

    #[test]
    fn test_非对齐写字节() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b1111, 4);
        bw.write_bytes(&[0x00]);
        assert_eq!(bw.finish(), vec![0xF0, 0x00]);
    }
}
