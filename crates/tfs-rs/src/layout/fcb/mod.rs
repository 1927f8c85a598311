//! File control blocks: the fixed 24-byte directory entry record.


/// Serialized size of one record.
pub const FCB_SIZE: usize = 24;
/// Maximum stored name length in bytes.
pub const MAX_NAME: usize = 15;

/// One directory entry: a NUL-padded name, a kind flag, the starting block of
/// the entry's chain and its size in bytes (for directories, entry count
/// times [`FCB_SIZE`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fcb {
    name: [u8; MAX_NAME],
    is_dir: bool,
    starting_block: i32,
    size: i32,
}

impl Fcb {
    /// Builds a record. Names longer than [`MAX_NAME`] bytes are truncated,
    /// shorter ones zero-padded.
    #[must_use]
    pub fn new(name: &str, is_dir: bool, starting_block: i32, size: i32) -> Self {
        Self {
            name: pack_name(name),
            is_dir,
            starting_block,
            size,
        }
    }

    /// The stored name, lossily decoded, without the NUL padding.
    #[must_use]
    pub fn name(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_NAME);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    #[must_use]
    pub const fn name_bytes(&self) -> &[u8; MAX_NAME] {
        &self.name
    }

    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.is_dir
    }

    #[must_use]
    pub const fn starting_block(&self) -> i32 {
        self.starting_block
    }

    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = pack_name(name);
    }

    pub const fn set_starting_block(&mut self, block: i32) {
        self.starting_block = block;
    }

    pub const fn set_size(&mut self, size: i32) {
        self.size = size;
    }

    /// Whether this record answers to `name` of the given kind. Names compare
    /// case-insensitively over their padded byte form.
    #[must_use]
    pub fn matches(&self, name: &str, is_dir: bool) -> bool {
        self.is_dir == is_dir && self.name.eq_ignore_ascii_case(&pack_name(name))
    }

    /// Whether two records denote the same on-disk entry: same name and kind
    /// at the same starting block.
    #[must_use]
    pub fn same_entry(&self, other: &Self) -> bool {
        self.is_dir == other.is_dir
            && self.starting_block == other.starting_block
            && self.name.eq_ignore_ascii_case(&other.name)
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; FCB_SIZE] {
        let mut buf = [0u8; FCB_SIZE];
        buf[..MAX_NAME].copy_from_slice(&self.name);
        buf[MAX_NAME] = u8::from(self.is_dir);
        buf[16..20].copy_from_slice(&self.starting_block.to_be_bytes());
        buf[20..24].copy_from_slice(&self.size.to_be_bytes());
        buf
    }

    /// # Panics
    /// Panics if `buf` holds fewer than [`FCB_SIZE`] bytes.
    #[must_use]
    pub fn from_bytes(buf: &[u8]) -> Self {
        let mut name = [0u8; MAX_NAME];
        name.copy_from_slice(&buf[..MAX_NAME]);
        Self {
            name,
            is_dir: buf[MAX_NAME] != 0,
            starting_block: i32::from_be_bytes(buf[16..20].try_into().unwrap()),
            size: i32::from_be_bytes(buf[20..24].try_into().unwrap()),
        }
    }
}

fn pack_name(name: &str) -> [u8; MAX_NAME] {
    let mut packed = [0u8; MAX_NAME];
    let bytes = name.as_bytes();
    let n = bytes.len().min(MAX_NAME);
    packed[..n].copy_from_slice(&bytes[..n]);
    packed
}
