//! Class file constant pool access
//!
//! Only the constant pool is decoded. Everything after it (access flags,
//! fields, methods, attributes) refers to constants by index, so a rewrite
//! that keeps every slot in place can copy the remainder verbatim.
//!
//! `CONSTANT_Utf8` payloads are modified UTF-8. Rewriters work on raw bytes:
//! ASCII never occurs inside a multi-byte sequence, so ASCII package names
//! can be searched and replaced without decoding.

mod reader;

use reader::ByteReader;
use thiserror::Error;

/// `0xCAFEBABE`
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Class file major version of Java 1.0/1.1; release N is `N + 44` from Java 5 on
pub const MAJOR_VERSION_OFFSET: u16 = 44;

/// Bytes before the first constant: magic, minor, major, pool count
const HEADER_LEN: usize = 10;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// Class file format errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassFormatError {
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("truncated at offset {offset}")]
    Truncated { offset: usize },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u16 },

    #[error("constant #{index} is {length} bytes after rewriting, over the 65535 limit")]
    ConstantTooLong { index: u16, length: usize },
}

#[derive(Debug, Clone, Copy)]
enum PoolEntry<'a> {
    /// Slot 0 and the second slot of long/double constants
    Unusable,
    Utf8(&'a [u8]),
    /// Tag byte plus fixed-size payload, copied as-is
    Other(&'a [u8]),
}

/// A parsed view over class file bytes
#[derive(Debug)]
pub struct ClassFile<'a> {
    data: &'a [u8],
    minor_version: u16,
    major_version: u16,
    pool: Vec<PoolEntry<'a>>,
    pool_end: usize,
}

impl<'a> ClassFile<'a> {
    /// Parse the header and constant pool
    pub fn parse(data: &'a [u8]) -> Result<Self, ClassFormatError> {
        let mut reader = ByteReader::new(data);
        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(ClassFormatError::BadMagic(magic));
        }
        let minor_version = reader.u16()?;
        let major_version = reader.u16()?;
        let count = reader.u16()?;

        let mut pool = Vec::with_capacity(count as usize);
        pool.push(PoolEntry::Unusable);

        let mut index: u16 = 1;
        while index < count {
            let start = reader.position();
            let tag = reader.u8()?;
            let entry = match tag {
                TAG_UTF8 => {
                    let len = reader.u16()? as usize;
                    PoolEntry::Utf8(reader.take(len)?)
                }
                TAG_INTEGER | TAG_FLOAT => {
                    reader.skip(4)?;
                    PoolEntry::Other(&data[start..reader.position()])
                }
                TAG_LONG | TAG_DOUBLE => {
                    reader.skip(8)?;
                    PoolEntry::Other(&data[start..reader.position()])
                }
                TAG_CLASS | TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => {
                    reader.skip(2)?;
                    PoolEntry::Other(&data[start..reader.position()])
                }
                TAG_METHOD_HANDLE => {
                    reader.skip(3)?;
                    PoolEntry::Other(&data[start..reader.position()])
                }
                TAG_FIELDREF | TAG_METHODREF | TAG_INTERFACE_METHODREF | TAG_NAME_AND_TYPE
                | TAG_DYNAMIC | TAG_INVOKE_DYNAMIC => {
                    reader.skip(4)?;
                    PoolEntry::Other(&data[start..reader.position()])
                }
                other => return Err(ClassFormatError::UnknownTag { tag: other, index }),
            };
            pool.push(entry);

            // Long and double constants take two slots
            if tag == TAG_LONG || tag == TAG_DOUBLE {
                pool.push(PoolEntry::Unusable);
                index = index.saturating_add(1);
            }
            index = index.saturating_add(1);
        }

        Ok(Self {
            data,
            minor_version,
            major_version,
            pool,
            pool_end: reader.position(),
        })
    }

    /// Class file major version
    pub fn major_version(&self) -> u16 {
        self.major_version
    }

    /// Class file minor version
    pub fn minor_version(&self) -> u16 {
        self.minor_version
    }

    /// Number of constant pool slots, including the unusable slot 0
    pub fn constant_pool_count(&self) -> usize {
        self.pool.len()
    }

    /// Raw payloads of every `CONSTANT_Utf8` entry, in pool order
    pub fn utf8_constants(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.pool.iter().filter_map(|entry| match entry {
            PoolEntry::Utf8(bytes) => Some(*bytes),
            _ => None,
        })
    }

    /// Rebuild the class with every `CONSTANT_Utf8` passed through `rewrite`.
    ///
    /// `rewrite` returns `None` to leave a constant untouched. Returns
    /// `Ok(None)` when nothing changed, so callers keep the original bytes.
    pub fn rewrite_utf8<F>(&self, mut rewrite: F) -> Result<Option<Vec<u8>>, ClassFormatError>
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>>,
    {
        let mut replaced: Vec<Option<Vec<u8>>> = Vec::with_capacity(self.pool.len());
        let mut changed = false;
        for entry in &self.pool {
            let new = match entry {
                PoolEntry::Utf8(bytes) => rewrite(bytes).filter(|new| new.as_slice() != *bytes),
                _ => None,
            };
            changed |= new.is_some();
            replaced.push(new);
        }
        if !changed {
            return Ok(None);
        }

        let mut out = Vec::with_capacity(self.data.len() + 64);
        out.extend_from_slice(&self.data[..HEADER_LEN]);
        for (index, (entry, new)) in self.pool.iter().zip(replaced).enumerate() {
            match (entry, new) {
                (PoolEntry::Utf8(_), Some(bytes)) => {
                    let len = u16::try_from(bytes.len()).map_err(|_| {
                        ClassFormatError::ConstantTooLong {
                            index: index as u16,
                            length: bytes.len(),
                        }
                    })?;
                    out.push(TAG_UTF8);
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(&bytes);
                }
                (PoolEntry::Utf8(bytes), None) => {
                    out.push(TAG_UTF8);
                    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    out.extend_from_slice(bytes);
                }
                (PoolEntry::Other(raw), _) => out.extend_from_slice(raw),
                (PoolEntry::Unusable, _) => {}
            }
        }
        out.extend_from_slice(&self.data[self.pool_end..]);
        Ok(Some(out))
    }
}

/// Read only the major version, for target release checks
pub fn major_version(data: &[u8]) -> Result<u16, ClassFormatError> {
    let mut reader = ByteReader::new(data);
    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(ClassFormatError::BadMagic(magic));
    }
    reader.u16()?;
    reader.u16()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal class: `this` extends `java/lang/Object`, plus extra constants
    fn build_class(this: &str, extra_utf8: &[&str], with_long: bool) -> Vec<u8> {
        let mut pool: Vec<Vec<u8>> = Vec::new();
        let utf8 = |s: &str| {
            let mut v = vec![TAG_UTF8];
            v.extend_from_slice(&(s.len() as u16).to_be_bytes());
            v.extend_from_slice(s.as_bytes());
            v
        };
        pool.push(utf8(this)); // #1
        pool.push(vec![TAG_CLASS, 0, 1]); // #2
        pool.push(utf8("java/lang/Object")); // #3
        pool.push(vec![TAG_CLASS, 0, 3]); // #4
        let mut slots = 4u16;
        if with_long {
            pool.push(vec![TAG_LONG, 0, 0, 0, 0, 0, 0, 0, 42]);
            slots += 2;
        }
        for s in extra_utf8 {
            pool.push(utf8(s));
            slots += 1;
        }

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&65u16.to_be_bytes());
        out.extend_from_slice(&(slots + 1).to_be_bytes());
        for entry in pool {
            out.extend_from_slice(&entry);
        }
        // access, this, super, interfaces, fields, methods, attributes
        out.extend_from_slice(&[0x00, 0x21, 0, 2, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0]);
        out
    }

    #[test]
    fn test_parse_minimal_class() {
        let bytes = build_class("org/apache/Foo", &[], false);
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.major_version(), 65);
        assert_eq!(class.minor_version(), 0);
        assert_eq!(class.constant_pool_count(), 5);
        let names: Vec<&[u8]> = class.utf8_constants().collect();
        assert_eq!(names, vec![&b"org/apache/Foo"[..], &b"java/lang/Object"[..]]);
    }

    #[test]
    fn test_parse_long_takes_two_slots() {
        let bytes = build_class("a/B", &["(J)V"], true);
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.constant_pool_count(), 8);
        assert_eq!(class.utf8_constants().count(), 3);
    }

    #[test]
    fn test_bad_magic() {
        let err = ClassFile::parse(&[0, 1, 2, 3, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, ClassFormatError::BadMagic(_)));
    }

    #[test]
    fn test_truncated() {
        let bytes = build_class("a/B", &[], false);
        let err = ClassFile::parse(&bytes[..14]).unwrap_err();
        assert!(matches!(err, ClassFormatError::Truncated { .. }));
    }

    #[test]
    fn test_unknown_tag() {
        let mut bytes = build_class("a/B", &[], false);
        bytes[HEADER_LEN] = 99;
        let err = ClassFile::parse(&bytes).unwrap_err();
        assert_eq!(err, ClassFormatError::UnknownTag { tag: 99, index: 1 });
    }

    #[test]
    fn test_rewrite_nothing_returns_none() {
        let bytes = build_class("a/B", &["()V"], true);
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.rewrite_utf8(|_| None).unwrap(), None);
        // A rewrite to identical bytes is not a change
        assert_eq!(class.rewrite_utf8(|b| Some(b.to_vec())).unwrap(), None);
    }

    #[test]
    fn test_rewrite_changes_length_and_keeps_tail() {
        let bytes = build_class("org/apache/Foo", &["Lorg/apache/Bar;"], true);
        let class = ClassFile::parse(&bytes).unwrap();
        let rewritten = class
            .rewrite_utf8(|b| {
                let s = std::str::from_utf8(b).ok()?;
                s.contains("org/apache")
                    .then(|| s.replace("org/apache", "shaded/org/apache").into_bytes())
            })
            .unwrap()
            .unwrap();

        let again = ClassFile::parse(&rewritten).unwrap();
        let names: Vec<&[u8]> = again.utf8_constants().collect();
        assert_eq!(names[0], b"shaded/org/apache/Foo");
        assert_eq!(names[2], b"Lshaded/org/apache/Bar;");
        assert_eq!(again.constant_pool_count(), class.constant_pool_count());
        assert!(rewritten.ends_with(&[0x00, 0x21, 0, 2, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(rewritten.len(), bytes.len() + 2 * "shaded/".len());
    }

    #[test]
    fn test_rewrite_too_long() {
        let bytes = build_class("a/B", &[], false);
        let class = ClassFile::parse(&bytes).unwrap();
        let err = class
            .rewrite_utf8(|b| (b == b"a/B").then(|| vec![b'x'; 70_000]))
            .unwrap_err();
        assert!(matches!(err, ClassFormatError::ConstantTooLong { index: 1, .. }));
    }

    #[test]
    fn test_major_version_only() {
        let bytes = build_class("a/B", &[], false);
        assert_eq!(major_version(&bytes).unwrap(), 65);
        assert!(major_version(b"nope").is_err());
    }
}
