/// Raw feed bytes to tokenizer text.
///
/// Only 7-bit printable characters survive. `\r\n`, a lone `\r` and `\n`
/// all become a single `\n`, even when the pair is split across reads.
/// Tabs become spaces; every other control byte is dropped.
#[derive(Debug, Default, Clone)]
pub struct TextFilter {
    after_cr: bool,
}

impl TextFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.after_cr = false;
    }

    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());

        for &b in bytes {
            let after_cr = std::mem::take(&mut self.after_cr);
            match b {
                b'\r' => {
                    out.push('\n');
                    self.after_cr = true;
                }
                b'\n' if after_cr => {}
                b'\n' => out.push('\n'),
                b'\t' => out.push(' '),
                0x20..=0x7e => out.push(b as char),
                _ => {}
            }
        }

        out
    }
}
