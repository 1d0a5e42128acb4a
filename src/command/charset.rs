extern crate codepage_437;
extern crate encoding_rs;
extern crate serde;

use crate::Error;
use codepage_437::{IntoCp437, CP437_CONTROL};
use serde::{Serialize, Deserialize};

/// Character encodings the printer firmware understands
///
/// Chinese thermal printers expect GB18030 (a superset of GBK), which covers every unicode scalar value. Western firmwares usually ship code page 437 as their default table.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    Gb18030,
    Cp437
}

impl Charset {
    /// Encodes the text for the printer
    ///
    /// ```rust
    /// use bleprint::command::Charset;
    ///
    /// assert_eq!(b"Total".to_vec(), Charset::Cp437.encode("Total").unwrap());
    /// assert_eq!(vec![0xd6, 0xd0], Charset::Gb18030.encode("中").unwrap());
    /// ```
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, Error> {
        match self {
            Charset::Gb18030 => {
                let (encoded, _, had_errors) = encoding_rs::GB18030.encode(text);
                if had_errors {
                    Err(Error::Encoding(format!("{:?} is not representable in GB18030", text)))
                } else {
                    Ok(encoded.into_owned())
                }
            },
            Charset::Cp437 => text.to_string().into_cp437(&CP437_CONTROL).map_err(|e| Error::Encoding(format!("{:?} is not representable in CP437", e.into_string())))
        }
    }

    /// Longest prefix of `text`, cut at a character boundary, whose encoding fits in `budget` bytes
    ///
    /// Characters that can not be encoded end the prefix.
    pub fn prefix_within(&self, text: &str, budget: usize) -> String {
        let mut used = 0;
        let mut prefix = String::new();
        let mut scratch = [0u8; 4];
        for c in text.chars() {
            let width = match self.encode(c.encode_utf8(&mut scratch)) {
                Ok(bytes) => bytes.len(),
                Err(_) => break
            };
            if used + width > budget {
                break;
            }
            used += width;
            prefix.push(c);
        }
        prefix
    }
}

impl Default for Charset {
    fn default() -> Charset {
        Charset::Gb18030
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_prefix_never_splits_a_character() {
        // Every ideograph takes two bytes in GB18030
        assert_eq!("中文", Charset::Gb18030.prefix_within("中文字", 5));
        assert_eq!("ab中", Charset::Gb18030.prefix_within("ab中文", 4));
    }

    #[test]
    fn cp437_rejects_ideographs() {
        assert!(Charset::Cp437.encode("中").is_err());
        assert_eq!("ab", Charset::Cp437.prefix_within("ab中cd", 10));
    }
}
